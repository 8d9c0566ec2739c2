// ==========================================
// 备件仓库单据台账系统 - SQLite 连接与建库
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中 schema DDL：主程序、种子工具、测试共用同一份建表语句
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等，可在空库或已建库上重复执行）
///
/// 表清单：
/// - schema_version / config_scope / config_kv：版本与配置
/// - staging_rows / staging_batches：暂存行与暂存批次审计
/// - documents / document_lines：正式单据头与明细
/// - inventory_ledger：加权平均库存台账
/// - core_returns / core_return_receipts：旧件应还台账与回收记录
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS staging_batches (
            batch_id TEXT PRIMARY KEY,
            family TEXT NOT NULL,
            source_note TEXT,
            total_rows INTEGER NOT NULL,
            staged_rows INTEGER NOT NULL,
            filtered_rows INTEGER NOT NULL,
            staged_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS staging_rows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            family TEXT NOT NULL,
            batch_id TEXT NOT NULL REFERENCES staging_batches(batch_id),
            po_number TEXT,
            document_number TEXT NOT NULL,
            line_no INTEGER,
            document_date TEXT,
            creation_date TEXT,
            item_code TEXT,
            description TEXT NOT NULL DEFAULT '',
            qty REAL NOT NULL DEFAULT 0,
            unit_price REAL NOT NULL DEFAULT 0,
            amount REAL NOT NULL DEFAULT 0,
            uom TEXT,
            unit_weight REAL NOT NULL DEFAULT 0,
            wo_number TEXT,
            unit_no TEXT,
            project_code TEXT,
            warehouse TEXT,
            remarks TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_staging_rows_group
            ON staging_rows (family, po_number, document_number, id);

        CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            family TEXT NOT NULL,
            document_number TEXT NOT NULL,
            po_number TEXT,
            wo_number TEXT,
            unit_no TEXT,
            project_code TEXT,
            warehouse TEXT,
            remarks TEXT,
            document_date TEXT,
            creation_date TEXT,
            batch_no INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(family, document_number)
        );

        CREATE TABLE IF NOT EXISTS document_lines (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            line_no INTEGER,
            item_code TEXT,
            description TEXT NOT NULL DEFAULT '',
            qty REAL NOT NULL DEFAULT 0,
            unit_price REAL NOT NULL DEFAULT 0,
            amount REAL NOT NULL DEFAULT 0,
            uom TEXT,
            unit_weight REAL NOT NULL DEFAULT 0,
            received_qty REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_document_lines_document
            ON document_lines (document_id);

        CREATE TABLE IF NOT EXISTS inventory_ledger (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_code TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            uom TEXT,
            total_qty REAL NOT NULL DEFAULT 0,
            total_amount REAL NOT NULL DEFAULT 0,
            avg_unit_price REAL NOT NULL DEFAULT 0,
            total_weight REAL NOT NULL DEFAULT 0,
            avg_unit_weight REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS core_returns (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_code TEXT NOT NULL,
            line_id INTEGER REFERENCES document_lines(id),
            description TEXT NOT NULL DEFAULT '',
            project_code TEXT,
            outstanding_qty REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(item_code, line_id)
        );

        CREATE TABLE IF NOT EXISTS core_return_receipts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            receipt_number TEXT,
            receipt_date TEXT NOT NULL,
            item_code TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            qty REAL NOT NULL,
            total_weight REAL NOT NULL,
            avg_unit_weight REAL NOT NULL DEFAULT 0,
            expected_weight REAL NOT NULL DEFAULT 0,
            project_code TEXT NOT NULL,
            remarks TEXT,
            given_by TEXT,
            received_by TEXT NOT NULL,
            line_id INTEGER REFERENCES document_lines(id),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
