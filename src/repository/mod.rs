// ==========================================
// 备件仓库单据台账系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod core_return_repo;
pub mod document_repo;
pub mod error;
pub mod inventory_repo;
pub mod receipt_repo;
pub mod staging_repo;

// 重导出核心仓储
pub use core_return_repo::CoreReturnRepository;
pub use document_repo::DocumentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_repo::InventoryRepository;
pub use receipt_repo::ReceiptRepository;
pub use staging_repo::StagingRepository;

use crate::domain::types::DocFamily;

/// 解析行中的单据族列
///
/// 数据库中的 family 值由代码写入,出现未知值说明库被外部改写,按列转换失败处理
pub(crate) fn parse_family_col(idx: usize, raw: String) -> rusqlite::Result<DocFamily> {
    DocFamily::from_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("未知单据族: {}", raw).into(),
        )
    })
}
