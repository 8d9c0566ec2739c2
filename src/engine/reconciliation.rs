// ==========================================
// 备件仓库单据台账系统 - 旧件回收对账引擎
// ==========================================
// 职责: 回收记录的登记/修改/删除,并把数量变化同步回
//       应还台账(outstanding_qty)与领料明细(received_qty)
// 红线: 每个操作一个事务;扣减一律钳制在 0;
//       预计重量快照取登记时刻的库存均重,台账无记录时为 0
// ==========================================

use crate::domain::core_return::{ReceiptInput, ReceiptTransaction};
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::core_return_repo::CoreReturnRepository;
use crate::repository::document_repo::DocumentRepository;
use crate::repository::error::RepositoryError;
use crate::repository::inventory_repo::InventoryRepository;
use crate::repository::receipt_repo::ReceiptRepository;
use rusqlite::{Connection, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;

// ==========================================
// ReceiptReconciliationEngine - 回收对账引擎
// ==========================================
/// 旧件回收对账引擎
///
/// # 职责
/// 1. 校验回收登记输入（字段级错误逐项返回）
/// 2. 快照库存均重,计算预计重量
/// 3. 在单个事务内写回收记录并同步应还/已回收数量
///
/// # 红线
/// - 只读库存台账,永不修改
/// - 关联明细行不存在按校验错误处理,与字段错误共用一个错误表
pub struct ReceiptReconciliationEngine {
    conn: Arc<Mutex<Connection>>,
}

impl ReceiptReconciliationEngine {
    /// 创建新的对账引擎
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> EngineResult<MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| EngineError::Storage(RepositoryError::LockError(e.to_string())))
    }

    /// 登记一笔旧件回收(主入口)
    ///
    /// # 流程
    /// 1. 字段校验 + 关联明细行存在性校验（错误合并返回）
    /// 2. 快照库存均重,预计重量 = 数量 × 均重
    /// 3. 事务内: 写回收记录;若关联明细行,应还 -= 数量、已回收 += 数量
    #[instrument(skip(self, input), fields(item_code = %input.item_code))]
    pub fn record_receipt(&self, input: &ReceiptInput) -> EngineResult<ReceiptTransaction> {
        let mut fields = input.validate();

        let mut conn = self.get_conn()?;
        if let Some(line_id) = input.line_id {
            if DocumentRepository::find_line_on(&conn, line_id)?.is_none() {
                fields.insert("line_id".to_string(), "关联领料明细行不存在".to_string());
            }
        }
        if !fields.is_empty() {
            return Err(EngineError::Validation { fields });
        }

        let now = chrono::Utc::now();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepositoryError::from)?;

        let avg_unit_weight = Self::snapshot_avg_unit_weight(&tx, &input.item_code)?;
        let expected_weight = input.qty * avg_unit_weight;

        let id = ReceiptRepository::insert_tx(&tx, input, avg_unit_weight, expected_weight, now)?;

        if let Some(line_id) = input.line_id {
            CoreReturnRepository::adjust_outstanding_by_line_tx(&tx, line_id, -input.qty, now)?;
            DocumentRepository::adjust_received_qty_tx(&tx, line_id, input.qty)?;
        }

        tx.commit().map_err(RepositoryError::from)?;

        tracing::info!(receipt_id = id, qty = input.qty, "回收登记完成");
        Self::fetch_receipt(&conn, id)
    }

    /// 修改一笔旧件回收
    ///
    /// # 流程
    /// 1. 目标记录存在性校验（NotFound）
    /// 2. 字段校验 + 新关联明细行存在性校验
    /// 3. 以当前库存状态重新快照均重与预计重量
    /// 4. 事务内: 覆盖记录;delta = 新数量 - 旧数量,若关联明细行且
    ///    delta ≠ 0,应还 -= delta、已回收 += delta（均钳制 ≥ 0）
    #[instrument(skip(self, input), fields(receipt_id = %id))]
    pub fn update_receipt(&self, id: i64, input: &ReceiptInput) -> EngineResult<ReceiptTransaction> {
        let mut fields = input.validate();

        let mut conn = self.get_conn()?;
        let old = ReceiptRepository::find_by_id_on(&conn, id)?.ok_or_else(|| {
            EngineError::NotFound {
                entity: "回收记录".to_string(),
                id: id.to_string(),
            }
        })?;

        if let Some(line_id) = input.line_id {
            if DocumentRepository::find_line_on(&conn, line_id)?.is_none() {
                fields.insert("line_id".to_string(), "关联领料明细行不存在".to_string());
            }
        }
        if !fields.is_empty() {
            return Err(EngineError::Validation { fields });
        }

        let now = chrono::Utc::now();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepositoryError::from)?;

        let avg_unit_weight = Self::snapshot_avg_unit_weight(&tx, &input.item_code)?;
        let expected_weight = input.qty * avg_unit_weight;

        ReceiptRepository::update_tx(&tx, id, input, avg_unit_weight, expected_weight, now)?;

        let delta = input.qty - old.qty;
        if let Some(line_id) = input.line_id {
            if delta != 0.0 {
                CoreReturnRepository::adjust_outstanding_by_line_tx(&tx, line_id, -delta, now)?;
                DocumentRepository::adjust_received_qty_tx(&tx, line_id, delta)?;
            }
        }

        tx.commit().map_err(RepositoryError::from)?;

        tracing::info!(receipt_id = id, delta = delta, "回收修改完成");
        Self::fetch_receipt(&conn, id)
    }

    /// 删除一笔旧件回收,并还原其对应的数量变化
    ///
    /// # 流程
    /// 1. 目标记录存在性校验（NotFound）
    /// 2. 事务内: 若关联明细行,应还 += 数量、已回收 -= 数量;删除记录
    #[instrument(skip(self), fields(receipt_id = %id))]
    pub fn delete_receipt(&self, id: i64) -> EngineResult<()> {
        let mut conn = self.get_conn()?;
        let old = ReceiptRepository::find_by_id_on(&conn, id)?.ok_or_else(|| {
            EngineError::NotFound {
                entity: "回收记录".to_string(),
                id: id.to_string(),
            }
        })?;

        let now = chrono::Utc::now();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepositoryError::from)?;

        if let Some(line_id) = old.line_id {
            CoreReturnRepository::adjust_outstanding_by_line_tx(&tx, line_id, old.qty, now)?;
            DocumentRepository::adjust_received_qty_tx(&tx, line_id, -old.qty)?;
        }
        ReceiptRepository::delete_tx(&tx, id)?;

        tx.commit().map_err(RepositoryError::from)?;

        tracing::info!(receipt_id = id, qty = old.qty, "回收删除完成");
        Ok(())
    }

    /// 登记/修改时刻的库存均重快照（台账无该物料时为 0）
    fn snapshot_avg_unit_weight(conn: &Connection, item_code: &str) -> EngineResult<f64> {
        let record = InventoryRepository::find_by_item_code_on(conn, item_code.trim())?;
        Ok(record.map(|r| r.totals.avg_unit_weight).unwrap_or(0.0))
    }

    fn fetch_receipt(conn: &Connection, id: i64) -> EngineResult<ReceiptTransaction> {
        ReceiptRepository::find_by_id_on(conn, id)?.ok_or_else(|| EngineError::NotFound {
            entity: "回收记录".to_string(),
            id: id.to_string(),
        })
    }
}
