// ==========================================
// 备件仓库单据台账系统 - 暂存转正式转换引擎
// ==========================================
// 职责: 暂存行分组 → 去重 → 批次号分配 → 单据头/明细提交 →
//       库存台账折算（入库）/ 应还台账登记（领料）
// 红线: 整次运行一个事务,要么全部落库要么全部回滚;
//       单据号重复不是错误,是计数的跳过
// ==========================================

use crate::domain::conversion::ConversionResult;
use crate::domain::document::{NewDocument, NewDocumentLine};
use crate::domain::staging::StagedRow;
use crate::domain::types::DocFamily;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::weighted_average;
use crate::repository::core_return_repo::CoreReturnRepository;
use crate::repository::document_repo::DocumentRepository;
use crate::repository::error::RepositoryError;
use crate::repository::inventory_repo::InventoryRepository;
use crate::repository::staging_repo::StagingRepository;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tracing::instrument;

// ==========================================
// ConversionEngine - 转换引擎
// ==========================================
/// 暂存转正式转换引擎
///
/// # 职责
/// 1. 读取单据族的暂存分组键（确定顺序）
/// 2. 单事务内分配批次号、去重、提交单据头与明细
/// 3. 入库族折算库存台账,领料族登记应还台账
///
/// # 红线
/// - 运行期间持有连接锁,转换运行彼此串行
/// - 事务内只调用各仓储的 *_tx / *_on 关联函数,不走实例方法
pub struct ConversionEngine {
    conn: Arc<Mutex<Connection>>,
}

impl ConversionEngine {
    /// 创建新的转换引擎
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 将一个单据族的全部暂存行转换为正式单据(主入口)
    ///
    /// # 参数
    /// - family: 单据族（入库单 / 领料单）
    ///
    /// # 返回
    /// - ConversionResult: 各项计数与本次批次号;没有暂存数据时
    ///   batch_no 为 None 且所有计数为 0
    ///
    /// # 流程
    /// 1. 读取去重后的分组键（按键排序）
    /// 2. 开启 IMMEDIATE 事务
    /// 3. 批次号 = 该族现有最大批次号 + 1
    /// 4. 载入已提交单据号去重集
    /// 5. 逐组提交:重复单据号计跳过,否则提交头+明细并折算台账
    /// 6. 提交事务;任何失败整体回滚
    #[instrument(skip(self), fields(family = %family))]
    pub fn convert_batch(&self, family: DocFamily) -> EngineResult<ConversionResult> {
        // 整次运行持锁,转换运行彼此串行（去重检查窗口因此安全）
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| EngineError::Storage(RepositoryError::LockError(e.to_string())))?;

        // === 步骤 1: 读取分组键 ===
        let keys = StagingRepository::distinct_group_keys(&conn, family)?;
        if keys.is_empty() {
            tracing::info!(family = %family, "没有待转换的暂存数据");
            return Ok(ConversionResult::empty(family));
        }

        // === 步骤 2: 整次运行一个 IMMEDIATE 事务（开启即抢写锁） ===
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepositoryError::from)?;

        // === 步骤 3: 批次号分配（同一事务内读取并推进） ===
        let next_batch = DocumentRepository::max_batch_no(&tx, family)? + 1;

        // === 步骤 4: 已提交单据号去重集 ===
        let mut committed_numbers = DocumentRepository::existing_document_numbers(&tx, family)?;

        let mut result = ConversionResult::empty(family);
        let now = Utc::now();

        // === 步骤 5: 逐组提交 ===
        for key in &keys {
            let rows = StagingRepository::rows_for_group(&tx, family, key)?;

            // 空分组不应出现（键来自同一张表）,出现则跳过且不计数
            let Some(header_row) = rows.first() else {
                tracing::warn!(
                    document_number = %key.document_number,
                    "分组键下没有暂存行,跳过"
                );
                continue;
            };

            if committed_numbers.contains(&key.document_number) {
                result.documents_skipped += 1;
                tracing::debug!(document_number = %key.document_number, "单据号已提交,跳过");
                continue;
            }

            let document_id =
                DocumentRepository::insert_document_tx(&tx, &build_header(header_row, next_batch))?;
            committed_numbers.insert(key.document_number.clone());
            result.documents_committed += 1;

            for row in &rows {
                let line_id = DocumentRepository::insert_line_tx(&tx, document_id, &build_line(row))?;
                result.lines_committed += 1;

                match family {
                    DocFamily::Receipt => {
                        Self::fold_into_inventory(&tx, row, &mut result, now)?;
                    }
                    DocFamily::Issue => {
                        Self::register_core_return(&tx, row, line_id, &mut result, now)?;
                    }
                }
            }
        }

        // === 步骤 6: 提交 ===
        tx.commit().map_err(RepositoryError::from)?;

        result.batch_no = Some(next_batch);
        tracing::info!(
            family = %family,
            batch_no = next_batch,
            documents_committed = result.documents_committed,
            documents_skipped = result.documents_skipped,
            lines_committed = result.lines_committed,
            inventory_created = result.inventory_created,
            inventory_updated = result.inventory_updated,
            core_returns_created = result.core_returns_created,
            "转换完成"
        );
        Ok(result)
    }

    /// 将一行入库明细折入库存台账
    ///
    /// 物料编码为空或数量非正的行只提交明细,不触碰台账
    fn fold_into_inventory(
        tx: &Transaction,
        row: &StagedRow,
        result: &mut ConversionResult,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let Some(item_code) = normalized_item_code(row) else {
            return Ok(());
        };
        if row.qty <= 0.0 {
            return Ok(());
        }

        match InventoryRepository::find_by_item_code_on(tx, item_code)? {
            Some(record) => {
                let totals =
                    weighted_average::fold_line(&record.totals, row.qty, row.amount, row.unit_weight);
                InventoryRepository::update_totals_tx(tx, item_code, &totals, now)?;
                result.inventory_updated += 1;
            }
            None => {
                let totals = weighted_average::initial_totals(
                    row.qty,
                    row.unit_price,
                    row.amount,
                    row.unit_weight,
                );
                InventoryRepository::insert_tx(
                    tx,
                    item_code,
                    &row.description,
                    row.uom.as_deref(),
                    &totals,
                    now,
                )?;
                result.inventory_created += 1;
            }
        }
        Ok(())
    }

    /// 为一行领料明细登记应还记录
    ///
    /// 物料编码为空的行只提交明细,不登记应还
    fn register_core_return(
        tx: &Transaction,
        row: &StagedRow,
        line_id: i64,
        result: &mut ConversionResult,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let Some(item_code) = normalized_item_code(row) else {
            return Ok(());
        };

        CoreReturnRepository::upsert_add_tx(
            tx,
            item_code,
            line_id,
            &row.description,
            row.project_code.as_deref(),
            row.qty,
            now,
        )?;
        result.core_returns_created += 1;
        Ok(())
    }
}

/// 以分组首行作为模板构造单据头
fn build_header(row: &StagedRow, batch_no: i64) -> NewDocument {
    NewDocument {
        family: row.family,
        document_number: row.document_number.clone(),
        po_number: row.po_number.clone(),
        wo_number: row.wo_number.clone(),
        unit_no: row.unit_no.clone(),
        project_code: row.project_code.clone(),
        warehouse: row.warehouse.clone(),
        remarks: row.remarks.clone(),
        document_date: row.document_date,
        creation_date: row.creation_date,
        batch_no,
    }
}

fn build_line(row: &StagedRow) -> NewDocumentLine {
    NewDocumentLine {
        line_no: row.line_no,
        item_code: row.item_code.clone(),
        description: row.description.clone(),
        qty: row.qty,
        unit_price: row.unit_price,
        amount: row.amount,
        uom: row.uom.clone(),
        unit_weight: row.unit_weight,
    }
}

/// 去除首尾空白后的物料编码,空串视同无编码
fn normalized_item_code(row: &StagedRow) -> Option<&str> {
    row.item_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
}
