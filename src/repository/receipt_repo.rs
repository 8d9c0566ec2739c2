// ==========================================
// 备件仓库单据台账系统 - 旧件回收记录仓储
// ==========================================
// 红线: 写路径只在对账引擎事务内执行;avg_unit_weight / expected_weight
//       快照由引擎算好后传入,仓储不做业务计算
// ==========================================

use crate::domain::core_return::{ReceiptInput, ReceiptTransaction};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};

/// core_return_receipts 全列 SELECT 列表（与 map_receipt 的列序一致）
const RECEIPT_COLUMNS: &str = "id, receipt_number, receipt_date, item_code, description, qty, \
     total_weight, avg_unit_weight, expected_weight, project_code, remarks, given_by, \
     received_by, line_id, created_at, updated_at";

// ==========================================
// ReceiptRepository - 旧件回收记录仓储
// ==========================================
pub struct ReceiptRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReceiptRepository {
    /// 创建新的回收记录仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 对账引擎专用（在引擎持有的连接/事务上执行）
    // ==========================================

    /// 在事务中新增回收记录,返回新记录 id
    ///
    /// 调用方保证 input 已通过校验（receipt_date 为 Some）
    pub(crate) fn insert_tx(
        tx: &Transaction,
        input: &ReceiptInput,
        avg_unit_weight: f64,
        expected_weight: f64,
        now: DateTime<Utc>,
    ) -> RepositoryResult<i64> {
        tx.execute(
            r#"
            INSERT INTO core_return_receipts (
                receipt_number, receipt_date, item_code, description, qty,
                total_weight, avg_unit_weight, expected_weight,
                project_code, remarks, given_by, received_by, line_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
            "#,
            params![
                input.receipt_number,
                input.receipt_date,
                input.item_code,
                input.description,
                input.qty,
                input.total_weight,
                avg_unit_weight,
                expected_weight,
                input.project_code,
                input.remarks,
                input.given_by,
                input.received_by,
                input.line_id,
                now,
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    /// 在事务中覆盖更新回收记录
    pub(crate) fn update_tx(
        tx: &Transaction,
        id: i64,
        input: &ReceiptInput,
        avg_unit_weight: f64,
        expected_weight: f64,
        now: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let rows = tx.execute(
            r#"
            UPDATE core_return_receipts
            SET receipt_number = ?1, receipt_date = ?2, item_code = ?3, description = ?4,
                qty = ?5, total_weight = ?6, avg_unit_weight = ?7, expected_weight = ?8,
                project_code = ?9, remarks = ?10, given_by = ?11, received_by = ?12,
                line_id = ?13, updated_at = ?14
            WHERE id = ?15
            "#,
            params![
                input.receipt_number,
                input.receipt_date,
                input.item_code,
                input.description,
                input.qty,
                input.total_weight,
                avg_unit_weight,
                expected_weight,
                input.project_code,
                input.remarks,
                input.given_by,
                input.received_by,
                input.line_id,
                now,
                id,
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "回收记录".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 在事务中删除回收记录
    pub(crate) fn delete_tx(tx: &Transaction, id: i64) -> RepositoryResult<()> {
        let rows = tx.execute("DELETE FROM core_return_receipts WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "回收记录".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 在指定连接上按 id 查询回收记录（引擎在开事务前取旧值快照用）
    pub(crate) fn find_by_id_on(
        conn: &Connection,
        id: i64,
    ) -> RepositoryResult<Option<ReceiptTransaction>> {
        let sql = format!(
            "SELECT {} FROM core_return_receipts WHERE id = ?1",
            RECEIPT_COLUMNS
        );
        let result = conn.query_row(&sql, params![id], map_receipt);
        match result {
            Ok(receipt) => Ok(Some(receipt)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 id 查询回收记录
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ReceiptTransaction>> {
        let conn = self.get_conn()?;
        Self::find_by_id_on(&conn, id)
    }

    /// 回收记录列表（最新在前）
    pub fn list(&self) -> RepositoryResult<Vec<ReceiptTransaction>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM core_return_receipts ORDER BY created_at DESC, id DESC",
            RECEIPT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mapped = stmt.query_map([], map_receipt)?;

        let mut receipts = Vec::new();
        for receipt in mapped {
            receipts.push(receipt?);
        }
        Ok(receipts)
    }

    /// 按来源明细行列出回收记录（最新在前）
    pub fn list_by_line(&self, line_id: i64) -> RepositoryResult<Vec<ReceiptTransaction>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM core_return_receipts WHERE line_id = ?1 ORDER BY created_at DESC, id DESC",
            RECEIPT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mapped = stmt.query_map(params![line_id], map_receipt)?;

        let mut receipts = Vec::new();
        for receipt in mapped {
            receipts.push(receipt?);
        }
        Ok(receipts)
    }
}

/// core_return_receipts 行映射（列序与 RECEIPT_COLUMNS 一致）
fn map_receipt(row: &Row) -> rusqlite::Result<ReceiptTransaction> {
    Ok(ReceiptTransaction {
        id: row.get(0)?,
        receipt_number: row.get(1)?,
        receipt_date: row.get(2)?,
        item_code: row.get(3)?,
        description: row.get(4)?,
        qty: row.get(5)?,
        total_weight: row.get(6)?,
        avg_unit_weight: row.get(7)?,
        expected_weight: row.get(8)?,
        project_code: row.get(9)?,
        remarks: row.get(10)?,
        given_by: row.get(11)?,
        received_by: row.get(12)?,
        line_id: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}
