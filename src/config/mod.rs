// ==========================================
// 备件仓库单据台账系统 - 配置层
// ==========================================
// 职责: 系统配置管理与默认数据库路径
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod intake_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use intake_config::IntakeConfigReader;

/// 获取默认数据库路径
///
/// # 返回
/// - 开发环境: 用户数据目录/warehouse-ledger-dev/warehouse_ledger.db
/// - 生产环境: 用户数据目录/warehouse-ledger/warehouse_ledger.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("WAREHOUSE_LEDGER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 先给一个默认回退值，后续如果能拿到 data_dir 再覆盖。
    let mut path = PathBuf::from("./warehouse_ledger.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("warehouse-ledger-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("warehouse-ledger");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("warehouse_ledger.db");
    }

    path.to_string_lossy().to_string()
}
