// ==========================================
// 备件仓库单据台账系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 内部仓库单据与台账记录系统 (导入暂存 → 正式转换 → 滚动台账)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建库 DDL）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::DocFamily;

// 领域实体
pub use domain::{
    ConversionResult, CoreReturnRecord, CoreReturnView, DocumentDetail, DocumentHeader,
    DocumentLine, DocumentSummary, InventoryRecord, LedgerTotals, ReceiptInput,
    ReceiptTransaction, StageResult, StagedRowInput,
};

// 引擎
pub use engine::{
    ConversionEngine, EngineError, EngineResult, ReceiptReconciliationEngine, StagingIntake,
};

// 仓储
pub use repository::{
    CoreReturnRepository, DocumentRepository, InventoryRepository, ReceiptRepository,
    RepositoryError, RepositoryResult, StagingRepository,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "备件仓库单据台账系统";

// ==========================================
// 预编译检查
// ==========================================

// 确保编译时所有模块可见
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
