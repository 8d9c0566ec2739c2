// ==========================================
// 备件仓库单据台账系统 - 旧件应还台账仓储
// ==========================================
// 红线: (item_code, line_id) 唯一;应还数量的扣减一律 MAX(x, 0) 钳制
// ==========================================

use crate::domain::core_return::{CoreReturnRecord, CoreReturnStats, CoreReturnView, MonthlyQty};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};

/// core_returns 全列 SELECT 列表（与 map_core_return 的列序一致）
const CORE_RETURN_COLUMNS: &str =
    "id, item_code, line_id, description, project_code, outstanding_qty, created_at, updated_at";

// ==========================================
// CoreReturnRepository - 旧件应还台账仓储
// ==========================================
pub struct CoreReturnRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CoreReturnRepository {
    /// 创建新的应还台账仓储
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
    // 转换/对账引擎专用（在引擎持有的连接/事务上执行）
    // ==========================================

    /// 在事务中登记一条领料明细的应还数量
    ///
    /// (item_code, line_id) 已存在则累加 outstanding_qty,否则新建记录
    pub(crate) fn upsert_add_tx(
        tx: &Transaction,
        item_code: &str,
        line_id: i64,
        description: &str,
        project_code: Option<&str>,
        qty: f64,
        now: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO core_returns (
                item_code, line_id, description, project_code, outstanding_qty,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(item_code, line_id) DO UPDATE SET
                outstanding_qty = core_returns.outstanding_qty + excluded.outstanding_qty,
                updated_at = excluded.updated_at
            "#,
            params![item_code, line_id, description, project_code, qty, now],
        )?;
        Ok(())
    }

    /// 在事务中按来源明细行增减应还数量（钳制 ≥ 0）
    ///
    /// # 返回
    /// - `Ok(rows)`: 受影响行数（0 表示该明细行没有应还记录）
    pub(crate) fn adjust_outstanding_by_line_tx(
        tx: &Transaction,
        line_id: i64,
        delta: f64,
        now: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        let rows = tx.execute(
            r#"
            UPDATE core_returns
            SET outstanding_qty = MAX(outstanding_qty + ?1, 0), updated_at = ?2
            WHERE line_id = ?3
            "#,
            params![delta, now, line_id],
        )?;
        Ok(rows)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 (物料编码, 来源明细行) 查询应还记录
    pub fn find_by_item_and_line(
        &self,
        item_code: &str,
        line_id: Option<i64>,
    ) -> RepositoryResult<Option<CoreReturnRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM core_returns WHERE item_code = ?1 AND line_id IS ?2",
            CORE_RETURN_COLUMNS
        );
        let result = conn.query_row(&sql, params![item_code, line_id], map_core_return);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 应还台账列表（最新在前,关联来源明细与单据号）
    pub fn list(&self) -> RepositoryResult<Vec<CoreReturnView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT r.id, r.item_code, r.line_id, r.description, r.project_code,
                   r.outstanding_qty, r.created_at, r.updated_at,
                   d.document_number, d.unit_no, l.qty, l.received_qty
            FROM core_returns r
            LEFT JOIN document_lines l ON r.line_id = l.id
            LEFT JOIN documents d ON l.document_id = d.id
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )?;

        let mapped = stmt.query_map([], |row| {
            Ok(CoreReturnView {
                record: map_core_return(row)?,
                document_number: row.get(8)?,
                unit_no: row.get(9)?,
                line_qty: row.get(10)?,
                received_qty: row.get(11)?,
            })
        })?;

        let mut views = Vec::new();
        for view in mapped {
            views.push(view?);
        }
        Ok(views)
    }

    /// 应还台账统计（记录数 / 应还总量）
    pub fn stats(&self) -> RepositoryResult<CoreReturnStats> {
        let conn = self.get_conn()?;
        let stats = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(outstanding_qty), 0) FROM core_returns",
            [],
            |row| {
                Ok(CoreReturnStats {
                    record_count: row.get(0)?,
                    outstanding_total: row.get(1)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// 指定年份按登记月份汇总的应还数量（12 个月零值补齐）
    pub fn monthly_outstanding(&self, year: i32) -> RepositoryResult<Vec<MonthlyQty>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT CAST(strftime('%m', created_at) AS INTEGER),
                   COALESCE(SUM(outstanding_qty), 0)
            FROM core_returns
            WHERE strftime('%Y', created_at) = ?1
            GROUP BY 1
            "#,
        )?;

        let rows = stmt.query_map(params![format!("{:04}", year)], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut by_month = [0.0f64; 12];
        for row in rows {
            let (month, qty) = row?;
            if (1..=12).contains(&month) {
                by_month[(month - 1) as usize] = qty;
            }
        }

        Ok(by_month
            .iter()
            .enumerate()
            .map(|(i, &total_qty)| MonthlyQty {
                month: (i + 1) as u32,
                total_qty,
            })
            .collect())
    }
}

/// core_returns 行映射（列序与 CORE_RETURN_COLUMNS 一致）
fn map_core_return(row: &Row) -> rusqlite::Result<CoreReturnRecord> {
    Ok(CoreReturnRecord {
        id: row.get(0)?,
        item_code: row.get(1)?,
        line_id: row.get(2)?,
        description: row.get(3)?,
        project_code: row.get(4)?,
        outstanding_qty: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
