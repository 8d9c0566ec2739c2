// ==========================================
// 备件仓库单据台账系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::intake_config::IntakeConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 参数
    /// - key: 配置键
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    ///
    /// # 参数
    /// - key: 配置键
    /// - default: 默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值（UPSERT）
    ///
    /// # 参数
    /// - key: 配置键
    /// - value: 配置值（统一按字符串存储）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }
}

// ==========================================
// IntakeConfigReader Trait 实现
// ==========================================
#[async_trait]
impl IntakeConfigReader for ConfigManager {
    async fn get_issue_item_prefixes(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let value =
            self.get_config_or_default(config_keys::ISSUE_ITEM_PREFIXES, "SP-,GT-,UC-,CO-")?;

        let prefixes: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        if prefixes.is_empty() {
            Ok(vec![
                "SP-".to_string(),
                "GT-".to_string(),
                "UC-".to_string(),
                "CO-".to_string(),
            ])
        } else {
            Ok(prefixes)
        }
    }

    async fn get_receipt_min_unit_weight(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::RECEIPT_MIN_UNIT_WEIGHT, "0.0")?;
        Ok(value.parse::<f64>().unwrap_or(0.0))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 暂存接收过滤
    pub const ISSUE_ITEM_PREFIXES: &str = "issue_item_prefixes"; // 领料物料前缀白名单（逗号分隔）
    pub const RECEIPT_MIN_UNIT_WEIGHT: &str = "receipt_min_unit_weight"; // 入库单重下限（千克）
}
