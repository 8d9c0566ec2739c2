// ==========================================
// 备件仓库单据台账系统 - 正式单据仓储
// ==========================================
// 红线: 单据头/明细的写入只发生在转换事务内（*_tx 辅助函数）,
//       received_qty 的增减只来自回收对账引擎
// ==========================================

use crate::domain::document::{
    DocumentDetail, DocumentHeader, DocumentLine, DocumentStats, DocumentSummary, MonthlyWeight,
    NewDocument, NewDocumentLine,
};
use crate::domain::types::DocFamily;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_family_col;
use rusqlite::{params, Connection, Row, Transaction};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// documents 全列 SELECT 列表（与 map_document_header 的列序一致）
const DOCUMENT_COLUMNS: &str = "id, family, document_number, po_number, wo_number, unit_no, \
     project_code, warehouse, remarks, document_date, creation_date, batch_no, created_at";

/// document_lines 全列 SELECT 列表（与 map_document_line 的列序一致）
const LINE_COLUMNS: &str = "id, document_id, line_no, item_code, description, qty, unit_price, \
     amount, uom, unit_weight, received_qty, created_at";

// ==========================================
// DocumentRepository - 正式单据仓储
// ==========================================
pub struct DocumentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentRepository {
    /// 创建新的单据仓储
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

    /// 读取指定单据族当前最大批次号（无单据时为 0）
    pub(crate) fn max_batch_no(conn: &Connection, family: DocFamily) -> RepositoryResult<i64> {
        let max: i64 = conn.query_row(
            "SELECT COALESCE(MAX(batch_no), 0) FROM documents WHERE family = ?1",
            params![family.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    /// 读取指定单据族已提交的全部单据号（转换运行的去重集初值）
    pub(crate) fn existing_document_numbers(
        conn: &Connection,
        family: DocFamily,
    ) -> RepositoryResult<HashSet<String>> {
        let mut stmt =
            conn.prepare("SELECT document_number FROM documents WHERE family = ?1")?;
        let rows = stmt.query_map(params![family.to_db_str()], |row| row.get::<_, String>(0))?;

        let mut numbers = HashSet::new();
        for number in rows {
            numbers.insert(number?);
        }
        Ok(numbers)
    }

    /// 在事务中插入单据头
    ///
    /// # 返回
    /// - `Ok(document_id)`: 新单据头的自增主键
    pub(crate) fn insert_document_tx(tx: &Transaction, doc: &NewDocument) -> RepositoryResult<i64> {
        tx.execute(
            r#"
            INSERT INTO documents (
                family, document_number, po_number, wo_number, unit_no,
                project_code, warehouse, remarks, document_date, creation_date, batch_no
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                doc.family.to_db_str(),
                doc.document_number,
                doc.po_number,
                doc.wo_number,
                doc.unit_no,
                doc.project_code,
                doc.warehouse,
                doc.remarks,
                doc.document_date,
                doc.creation_date,
                doc.batch_no,
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    /// 在事务中插入单据明细行
    ///
    /// # 返回
    /// - `Ok(line_id)`: 新明细行的自增主键
    pub(crate) fn insert_line_tx(
        tx: &Transaction,
        document_id: i64,
        line: &NewDocumentLine,
    ) -> RepositoryResult<i64> {
        tx.execute(
            r#"
            INSERT INTO document_lines (
                document_id, line_no, item_code, description, qty,
                unit_price, amount, uom, unit_weight
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                document_id,
                line.line_no,
                line.item_code,
                line.description,
                line.qty,
                line.unit_price,
                line.amount,
                line.uom,
                line.unit_weight,
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    /// 按明细行 ID 查询（对账引擎在事务内校验关联行）
    pub(crate) fn find_line_on(
        conn: &Connection,
        line_id: i64,
    ) -> RepositoryResult<Option<DocumentLine>> {
        let sql = format!("SELECT {} FROM document_lines WHERE id = ?1", LINE_COLUMNS);
        let result = conn.query_row(&sql, params![line_id], map_document_line);
        match result {
            Ok(line) => Ok(Some(line)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 在事务中增减明细行的已回收数量（钳制 ≥ 0）
    ///
    /// # 返回
    /// - `Ok(rows)`: 受影响行数（0 表示明细行不存在）
    pub(crate) fn adjust_received_qty_tx(
        tx: &Transaction,
        line_id: i64,
        delta: f64,
    ) -> RepositoryResult<usize> {
        let rows = tx.execute(
            "UPDATE document_lines SET received_qty = MAX(received_qty + ?1, 0) WHERE id = ?2",
            params![delta, line_id],
        )?;
        Ok(rows)
    }

    // ==========================================
    // 读模型
    // ==========================================

    /// 单据列表（最新在前,含明细行数与总重量）
    pub fn list_documents(&self, family: DocFamily) -> RepositoryResult<Vec<DocumentSummary>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}, COUNT(l.id), COALESCE(SUM(l.unit_weight * l.qty), 0)
            FROM documents d
            LEFT JOIN document_lines l ON l.document_id = d.id
            WHERE d.family = ?1
            GROUP BY d.id
            ORDER BY d.created_at DESC, d.id DESC
            "#,
            qualified_document_columns("d")
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![family.to_db_str()], |row| {
            Ok(DocumentSummary {
                header: map_document_header(row)?,
                line_count: row.get(13)?,
                total_weight: row.get(14)?,
            })
        })?;

        let mut summaries = Vec::new();
        for summary in rows {
            summaries.push(summary?);
        }
        Ok(summaries)
    }

    /// 按 (单据族, 单据号) 查询单据头
    pub fn find_by_number(
        &self,
        family: DocFamily,
        document_number: &str,
    ) -> RepositoryResult<Option<DocumentHeader>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM documents WHERE family = ?1 AND document_number = ?2",
            DOCUMENT_COLUMNS
        );
        let result = conn.query_row(
            &sql,
            params![family.to_db_str(), document_number],
            map_document_header,
        );
        match result {
            Ok(header) => Ok(Some(header)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 单据明细视图（头 + 全部明细行,按行号/主键排序）
    pub fn get_detail(&self, document_id: i64) -> RepositoryResult<Option<DocumentDetail>> {
        let conn = self.get_conn()?;

        let sql = format!("SELECT {} FROM documents WHERE id = ?1", DOCUMENT_COLUMNS);
        let header = match conn.query_row(&sql, params![document_id], map_document_header) {
            Ok(h) => h,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let sql = format!(
            "SELECT {} FROM document_lines WHERE document_id = ?1 ORDER BY line_no, id",
            LINE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mapped = stmt.query_map(params![document_id], map_document_line)?;

        let mut lines = Vec::new();
        for line in mapped {
            lines.push(line?);
        }

        Ok(Some(DocumentDetail { header, lines }))
    }

    /// 按明细行 ID 查询
    pub fn find_line(&self, line_id: i64) -> RepositoryResult<Option<DocumentLine>> {
        let conn = self.get_conn()?;
        Self::find_line_on(&conn, line_id)
    }

    /// 单据族统计（单据数 / 明细行数 / 总重量）
    pub fn stats(&self, family: DocFamily) -> RepositoryResult<DocumentStats> {
        let conn = self.get_conn()?;
        let stats = conn.query_row(
            r#"
            SELECT COUNT(DISTINCT d.id), COUNT(l.id), COALESCE(SUM(l.unit_weight * l.qty), 0)
            FROM documents d
            LEFT JOIN document_lines l ON l.document_id = d.id
            WHERE d.family = ?1
            "#,
            params![family.to_db_str()],
            |row| {
                Ok(DocumentStats {
                    document_count: row.get(0)?,
                    line_count: row.get(1)?,
                    total_weight: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// 指定年份的月度重量统计（按单据日期归月,12 个月零值补齐）
    pub fn monthly_weights(
        &self,
        family: DocFamily,
        year: i32,
    ) -> RepositoryResult<Vec<MonthlyWeight>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT CAST(strftime('%m', d.document_date) AS INTEGER),
                   COALESCE(SUM(l.unit_weight * l.qty), 0)
            FROM documents d
            JOIN document_lines l ON l.document_id = d.id
            WHERE d.family = ?1
              AND d.document_date IS NOT NULL
              AND strftime('%Y', d.document_date) = ?2
            GROUP BY 1
            "#,
        )?;

        let rows = stmt.query_map(
            params![family.to_db_str(), format!("{:04}", year)],
            |row| Ok((row.get::<_, u32>(0)?, row.get::<_, f64>(1)?)),
        )?;

        let mut by_month = [0.0f64; 12];
        for row in rows {
            let (month, weight) = row?;
            if (1..=12).contains(&month) {
                by_month[(month - 1) as usize] = weight;
            }
        }

        Ok(by_month
            .iter()
            .enumerate()
            .map(|(i, &total_weight)| MonthlyWeight {
                month: (i + 1) as u32,
                total_weight,
            })
            .collect())
    }
}

/// 生成带表别名前缀的 documents 列清单（用于 JOIN 查询）
fn qualified_document_columns(alias: &str) -> String {
    DOCUMENT_COLUMNS
        .split(", ")
        .map(|col| format!("{}.{}", alias, col.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// documents 行映射（列序与 DOCUMENT_COLUMNS 一致）
fn map_document_header(row: &Row) -> rusqlite::Result<DocumentHeader> {
    Ok(DocumentHeader {
        id: row.get(0)?,
        family: parse_family_col(1, row.get::<_, String>(1)?)?,
        document_number: row.get(2)?,
        po_number: row.get(3)?,
        wo_number: row.get(4)?,
        unit_no: row.get(5)?,
        project_code: row.get(6)?,
        warehouse: row.get(7)?,
        remarks: row.get(8)?,
        document_date: row.get(9)?,
        creation_date: row.get(10)?,
        batch_no: row.get(11)?,
        created_at: row.get(12)?,
    })
}

/// document_lines 行映射（列序与 LINE_COLUMNS 一致）
fn map_document_line(row: &Row) -> rusqlite::Result<DocumentLine> {
    Ok(DocumentLine {
        id: row.get(0)?,
        document_id: row.get(1)?,
        line_no: row.get(2)?,
        item_code: row.get(3)?,
        description: row.get(4)?,
        qty: row.get(5)?,
        unit_price: row.get(6)?,
        amount: row.get(7)?,
        uom: row.get(8)?,
        unit_weight: row.get(9)?,
        received_qty: row.get(10)?,
        created_at: row.get(11)?,
    })
}
