// ==========================================
// 备件仓库单据台账系统 - 库存台账仓储
// ==========================================
// 红线: 累计值/平均值的折叠计算在引擎层完成,
//       本层只负责读取现值与写回折叠结果
// ==========================================

use crate::domain::inventory::{InventoryRecord, LedgerTotals};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};

/// inventory_ledger 全列 SELECT 列表（与 map_inventory_record 的列序一致）
const INVENTORY_COLUMNS: &str = "id, item_code, description, uom, total_qty, total_amount, \
     avg_unit_price, total_weight, avg_unit_weight, created_at, updated_at";

// ==========================================
// InventoryRepository - 库存台账仓储
// ==========================================
pub struct InventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepository {
    /// 创建新的库存台账仓储
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
    // 查询操作
    // ==========================================

    /// 按物料编码查询台账记录
    pub fn find_by_item_code(&self, item_code: &str) -> RepositoryResult<Option<InventoryRecord>> {
        let conn = self.get_conn()?;
        Self::find_by_item_code_on(&conn, item_code)
    }

    /// 全量台账列表（按物料编码排序）
    pub fn list(&self) -> RepositoryResult<Vec<InventoryRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM inventory_ledger ORDER BY item_code",
            INVENTORY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mapped = stmt.query_map([], map_inventory_record)?;

        let mut records = Vec::new();
        for record in mapped {
            records.push(record?);
        }
        Ok(records)
    }

    // ==========================================
    // 转换/对账引擎专用（在引擎持有的连接/事务上执行）
    // ==========================================

    /// 按物料编码查询（引擎在事务内读取现值或快照平均单重）
    pub(crate) fn find_by_item_code_on(
        conn: &Connection,
        item_code: &str,
    ) -> RepositoryResult<Option<InventoryRecord>> {
        let sql = format!(
            "SELECT {} FROM inventory_ledger WHERE item_code = ?1",
            INVENTORY_COLUMNS
        );
        let result = conn.query_row(&sql, params![item_code], map_inventory_record);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 在事务中新建台账记录（首次入库的物料）
    pub(crate) fn insert_tx(
        tx: &Transaction,
        item_code: &str,
        description: &str,
        uom: Option<&str>,
        totals: &LedgerTotals,
        now: DateTime<Utc>,
    ) -> RepositoryResult<i64> {
        tx.execute(
            r#"
            INSERT INTO inventory_ledger (
                item_code, description, uom, total_qty, total_amount,
                avg_unit_price, total_weight, avg_unit_weight, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
            params![
                item_code,
                description,
                uom,
                totals.total_qty,
                totals.total_amount,
                totals.avg_unit_price,
                totals.total_weight,
                totals.avg_unit_weight,
                now,
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    /// 在事务中写回折叠后的累计值与平均值（已有物料）
    ///
    /// 描述/单位保持首次入库的快照,不随折叠刷新
    pub(crate) fn update_totals_tx(
        tx: &Transaction,
        item_code: &str,
        totals: &LedgerTotals,
        now: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        let rows = tx.execute(
            r#"
            UPDATE inventory_ledger SET
                total_qty = ?1,
                total_amount = ?2,
                avg_unit_price = ?3,
                total_weight = ?4,
                avg_unit_weight = ?5,
                updated_at = ?6
            WHERE item_code = ?7
            "#,
            params![
                totals.total_qty,
                totals.total_amount,
                totals.avg_unit_price,
                totals.total_weight,
                totals.avg_unit_weight,
                now,
                item_code,
            ],
        )?;
        Ok(rows)
    }
}

/// inventory_ledger 行映射（列序与 INVENTORY_COLUMNS 一致）
fn map_inventory_record(row: &Row) -> rusqlite::Result<InventoryRecord> {
    Ok(InventoryRecord {
        id: row.get(0)?,
        item_code: row.get(1)?,
        description: row.get(2)?,
        uom: row.get(3)?,
        totals: LedgerTotals {
            total_qty: row.get(4)?,
            total_amount: row.get(5)?,
            avg_unit_price: row.get(6)?,
            total_weight: row.get(7)?,
            avg_unit_weight: row.get(8)?,
        },
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
