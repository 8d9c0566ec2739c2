// ==========================================
// 备件仓库单据台账系统 - 暂存区仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射;
//       准入过滤由 StagingIntake 完成,本层照单全收
// ==========================================

use crate::domain::staging::{GroupKey, StagedRow, StagedRowInput, StagingBatch};
use crate::domain::types::DocFamily;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_family_col;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// staging_rows 全列 SELECT 列表（与 map_staged_row 的列序一致）
const STAGED_ROW_COLUMNS: &str = "id, family, batch_id, po_number, document_number, line_no, \
     document_date, creation_date, item_code, description, qty, unit_price, amount, uom, \
     unit_weight, wo_number, unit_no, project_code, warehouse, remarks, created_at";

// ==========================================
// StagingRepository - 暂存区仓储
// ==========================================
pub struct StagingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StagingRepository {
    /// 创建新的暂存区仓储
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
    // 写入操作
    // ==========================================

    /// 在一个事务内写入暂存批次审计行与全部暂存行
    ///
    /// # 参数
    /// - `batch`: 批次审计信息（行数已由调用方统计）
    /// - `rows`: 通过准入过滤的暂存行
    ///
    /// # 返回
    /// - `Ok(count)`: 实际落库的暂存行数
    pub fn insert_batch_with_rows(
        &self,
        batch: &StagingBatch,
        rows: &[StagedRowInput],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO staging_batches (
                batch_id, family, source_note, total_rows, staged_rows, filtered_rows, staged_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                batch.batch_id,
                batch.family.to_db_str(),
                batch.source_note,
                batch.total_rows,
                batch.staged_rows,
                batch.filtered_rows,
                batch.staged_at,
            ],
        )?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO staging_rows (
                    family, batch_id, po_number, document_number, line_no,
                    document_date, creation_date, item_code, description,
                    qty, unit_price, amount, uom, unit_weight,
                    wo_number, unit_no, project_code, warehouse, remarks
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                    ?15, ?16, ?17, ?18, ?19
                )
                "#,
            )?;

            for row in rows {
                stmt.execute(params![
                    batch.family.to_db_str(),
                    batch.batch_id,
                    row.po_number,
                    row.document_number,
                    row.line_no,
                    row.document_date,
                    row.creation_date,
                    row.item_code,
                    row.description,
                    row.qty,
                    row.unit_price,
                    row.amount,
                    row.uom,
                    row.unit_weight,
                    row.wo_number,
                    row.unit_no,
                    row.project_code,
                    row.warehouse,
                    row.remarks,
                ])?;
                count += 1;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    /// 清空指定单据族的暂存区
    ///
    /// # 返回
    /// - `Ok(rows)`: 被删除的暂存行数
    pub fn clear_family(&self, family: DocFamily) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM staging_rows WHERE family = ?1",
            params![family.to_db_str()],
        )?;
        Ok(rows)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 统计指定单据族的暂存行数
    pub fn count_for_family(&self, family: DocFamily) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM staging_rows WHERE family = ?1",
            params![family.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 指定单据族是否存在暂存数据（调用方的“暂存区有数据”指示）
    pub fn has_rows(&self, family: DocFamily) -> RepositoryResult<bool> {
        Ok(self.count_for_family(family)? > 0)
    }

    /// 按批次 ID 查询暂存批次审计行
    pub fn find_batch(&self, batch_id: &str) -> RepositoryResult<Option<StagingBatch>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT batch_id, family, source_note, total_rows, staged_rows, filtered_rows, staged_at
            FROM staging_batches WHERE batch_id = ?1
            "#,
            params![batch_id],
            |row| {
                Ok(StagingBatch {
                    batch_id: row.get(0)?,
                    family: parse_family_col(1, row.get::<_, String>(1)?)?,
                    source_note: row.get(2)?,
                    total_rows: row.get(3)?,
                    staged_rows: row.get(4)?,
                    filtered_rows: row.get(5)?,
                    staged_at: row.get(6)?,
                })
            },
        );

        match result {
            Ok(batch) => Ok(Some(batch)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ==========================================
    // 转换引擎专用（在引擎持有的连接/事务上执行）
    // ==========================================

    /// 读取指定单据族的全部去重分组键（按分组键排序,保证运行顺序确定）
    ///
    /// 入库单按 (采购单号, 单据号) 分组,领料单仅按单据号分组
    pub(crate) fn distinct_group_keys(
        conn: &Connection,
        family: DocFamily,
    ) -> RepositoryResult<Vec<GroupKey>> {
        let mut keys = Vec::new();
        match family {
            DocFamily::Receipt => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT DISTINCT po_number, document_number
                    FROM staging_rows
                    WHERE family = ?1
                    ORDER BY po_number, document_number
                    "#,
                )?;
                let rows = stmt.query_map(params![family.to_db_str()], |row| {
                    Ok(GroupKey::new(row.get(0)?, row.get(1)?))
                })?;
                for key in rows {
                    keys.push(key?);
                }
            }
            DocFamily::Issue => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT DISTINCT document_number
                    FROM staging_rows
                    WHERE family = ?1
                    ORDER BY document_number
                    "#,
                )?;
                let rows = stmt.query_map(params![family.to_db_str()], |row| {
                    Ok(GroupKey::new(None, row.get(0)?))
                })?;
                for key in rows {
                    keys.push(key?);
                }
            }
        }
        Ok(keys)
    }

    /// 读取一个分组键下的全部暂存行（按 id 升序,首行作为单据头模板）
    pub(crate) fn rows_for_group(
        conn: &Connection,
        family: DocFamily,
        key: &GroupKey,
    ) -> RepositoryResult<Vec<StagedRow>> {
        let mut rows = Vec::new();
        match family {
            DocFamily::Receipt => {
                // po_number 可为 NULL,用 IS 比较保证 NULL 分组可被取回
                let sql = format!(
                    "SELECT {} FROM staging_rows \
                     WHERE family = ?1 AND document_number = ?2 AND po_number IS ?3 \
                     ORDER BY id",
                    STAGED_ROW_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let mapped = stmt.query_map(
                    params![family.to_db_str(), key.document_number, key.po_number],
                    map_staged_row,
                )?;
                for row in mapped {
                    rows.push(row?);
                }
            }
            DocFamily::Issue => {
                let sql = format!(
                    "SELECT {} FROM staging_rows \
                     WHERE family = ?1 AND document_number = ?2 \
                     ORDER BY id",
                    STAGED_ROW_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let mapped = stmt.query_map(
                    params![family.to_db_str(), key.document_number],
                    map_staged_row,
                )?;
                for row in mapped {
                    rows.push(row?);
                }
            }
        }
        Ok(rows)
    }
}

/// staging_rows 行映射（列序与 STAGED_ROW_COLUMNS 一致）
fn map_staged_row(row: &Row) -> rusqlite::Result<StagedRow> {
    Ok(StagedRow {
        id: row.get(0)?,
        family: parse_family_col(1, row.get::<_, String>(1)?)?,
        batch_id: row.get(2)?,
        po_number: row.get(3)?,
        document_number: row.get(4)?,
        line_no: row.get(5)?,
        document_date: row.get(6)?,
        creation_date: row.get(7)?,
        item_code: row.get(8)?,
        description: row.get(9)?,
        qty: row.get(10)?,
        unit_price: row.get(11)?,
        amount: row.get(12)?,
        uom: row.get(13)?,
        unit_weight: row.get(14)?,
        wo_number: row.get(15)?,
        unit_no: row.get(16)?,
        project_code: row.get(17)?,
        warehouse: row.get(18)?,
        remarks: row.get(19)?,
        created_at: row.get(20)?,
    })
}
