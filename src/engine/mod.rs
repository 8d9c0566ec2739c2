// ==========================================
// 备件仓库单据台账系统 - 引擎层
// ==========================================
// 职责: 实现转换/对账/接收的业务规则
// 红线: 引擎通过仓储的 *_tx / *_on 关联函数组合事务,
//       不在引擎里拼 SQL
// ==========================================

pub mod conversion;
pub mod error;
pub mod intake;
pub mod reconciliation;
pub mod weighted_average;

// 重导出核心引擎
pub use conversion::ConversionEngine;
pub use error::{EngineError, EngineResult};
pub use intake::StagingIntake;
pub use reconciliation::ReceiptReconciliationEngine;
