// ==========================================
// 备件仓库单据台账系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、输入校验
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod conversion;
pub mod core_return;
pub mod document;
pub mod inventory;
pub mod staging;
pub mod types;

// 重导出核心类型
pub use conversion::ConversionResult;
pub use core_return::{
    CoreReturnRecord, CoreReturnStats, CoreReturnView, MonthlyQty, ReceiptInput,
    ReceiptTransaction, ITEM_CODE_MAX_LEN,
};
pub use document::{
    DocumentDetail, DocumentHeader, DocumentLine, DocumentStats, DocumentSummary, MonthlyWeight,
    NewDocument, NewDocumentLine,
};
pub use inventory::{InventoryRecord, LedgerTotals};
pub use staging::{GroupKey, StageResult, StagedRow, StagedRowInput, StagingBatch};
pub use types::DocFamily;
