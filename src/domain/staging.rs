// ==========================================
// 备件仓库单据台账系统 - 暂存区领域模型
// ==========================================
// 用途: 外部导入层写入暂存行,转换引擎只读消费
// 对齐: staging_rows / staging_batches 表
// ==========================================

use crate::domain::types::DocFamily;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// GroupKey - 单据分组键
// ==========================================
// 红线: 入库单按 (采购单号, 单据号) 分组,领料单仅按单据号分组;
// 分组键相同的暂存行转换时折叠为同一张单据头
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub po_number: Option<String>, // 采购单号（领料单恒为 None）
    pub document_number: String,   // 单据号
}

impl GroupKey {
    pub fn new(po_number: Option<String>, document_number: String) -> Self {
        Self {
            po_number,
            document_number,
        }
    }
}

// ==========================================
// StagedRowInput - 暂存行输入
// ==========================================
// 用途: 导入管道产物（解析/映射后的扁平行），经准入过滤后落库
// 生命周期: 仅在暂存流程内
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagedRowInput {
    pub po_number: Option<String>,        // 采购单号（入库单分组键之一）
    pub document_number: String,          // 单据号（两族共用分组键）
    pub line_no: Option<i64>,             // 源文件行号
    pub document_date: Option<NaiveDate>, // 单据日期
    pub creation_date: Option<NaiveDate>, // 源系统创建日期
    pub item_code: Option<String>,        // 物料编码（领料行可为空）
    pub description: String,              // 物料描述
    pub qty: f64,                         // 数量
    pub unit_price: f64,                  // 单价
    pub amount: f64,                      // 行金额
    pub uom: Option<String>,              // 计量单位
    pub unit_weight: f64,                 // 单件重量
    pub wo_number: Option<String>,        // 工单号
    pub unit_no: Option<String>,          // 设备/机组编号
    pub project_code: Option<String>,     // 项目代码
    pub warehouse: Option<String>,        // 仓库代码
    pub remarks: Option<String>,          // 备注
}

// ==========================================
// StagedRow - 暂存行
// ==========================================
// 对齐: staging_rows 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedRow {
    pub id: i64,                          // 自增主键
    pub family: DocFamily,                // 所属单据族
    pub batch_id: String,                 // 暂存批次 ID（UUID）
    pub po_number: Option<String>,
    pub document_number: String,
    pub line_no: Option<i64>,
    pub document_date: Option<NaiveDate>,
    pub creation_date: Option<NaiveDate>,
    pub item_code: Option<String>,
    pub description: String,
    pub qty: f64,
    pub unit_price: f64,
    pub amount: f64,
    pub uom: Option<String>,
    pub unit_weight: f64,
    pub wo_number: Option<String>,
    pub unit_no: Option<String>,
    pub project_code: Option<String>,
    pub warehouse: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,        // 暂存时间
}

impl StagedRow {
    /// 本行所属的单据分组键
    ///
    /// 领料单忽略采购单号,仅按单据号分组
    pub fn group_key(&self) -> GroupKey {
        match self.family {
            DocFamily::Receipt => GroupKey::new(self.po_number.clone(), self.document_number.clone()),
            DocFamily::Issue => GroupKey::new(None, self.document_number.clone()),
        }
    }
}

// ==========================================
// StagingBatch - 暂存批次审计
// ==========================================
// 用途: 记录每次暂存调用的来源与行数
// 对齐: staging_batches 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingBatch {
    pub batch_id: String,             // 批次 ID（UUID）
    pub family: DocFamily,            // 单据族
    pub source_note: Option<String>,  // 来源备注（文件名等）
    pub total_rows: i64,              // 提交总行数
    pub staged_rows: i64,             // 实际暂存行数
    pub filtered_rows: i64,           // 被准入规则过滤的行数
    pub staged_at: DateTime<Utc>,     // 暂存时间
}

// ==========================================
// StageResult - 暂存结果
// ==========================================
// 用途: 暂存接口返回值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub batch_id: String,   // 批次 ID（UUID）
    pub total_rows: usize,  // 提交总行数
    pub staged: usize,      // 实际暂存行数
    pub filtered_out: usize, // 被准入规则过滤的行数
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged_row(family: DocFamily, po: Option<&str>, doc: &str) -> StagedRow {
        StagedRow {
            id: 1,
            family,
            batch_id: "b-1".to_string(),
            po_number: po.map(|s| s.to_string()),
            document_number: doc.to_string(),
            line_no: None,
            document_date: None,
            creation_date: None,
            item_code: None,
            description: String::new(),
            qty: 0.0,
            unit_price: 0.0,
            amount: 0.0,
            uom: None,
            unit_weight: 0.0,
            wo_number: None,
            unit_no: None,
            project_code: None,
            warehouse: None,
            remarks: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_receipt_group_key_includes_po() {
        let row = staged_row(DocFamily::Receipt, Some("PO1"), "DOC1");
        assert_eq!(
            row.group_key(),
            GroupKey::new(Some("PO1".to_string()), "DOC1".to_string())
        );
    }

    #[test]
    fn test_issue_group_key_ignores_po() {
        // 领料单即使带了采购单号,分组也只看单据号
        let row = staged_row(DocFamily::Issue, Some("PO1"), "DOC1");
        assert_eq!(row.group_key(), GroupKey::new(None, "DOC1".to_string()));
    }
}
