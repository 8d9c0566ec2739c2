// ==========================================
// 备件仓库单据台账系统 - 旧件应还台账领域模型
// ==========================================
// 红线: 应还数量与已回收数量都表示实物,任何扣减一律钳制在 0,
//       不允许出现负库存
// 对齐: core_returns / core_return_receipts 表
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 物料编码最大长度（与数据库字段约定一致）
pub const ITEM_CODE_MAX_LEN: usize = 50;

// ==========================================
// CoreReturnRecord - 旧件应还记录
// ==========================================
// 红线: (item_code, line_id) 唯一,一条领料明细对应一条应还记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreReturnRecord {
    pub id: i64,                      // 自增主键
    pub item_code: String,            // 物料编码
    pub line_id: Option<i64>,         // 来源领料明细行（FK）
    pub description: String,          // 物料描述快照
    pub project_code: Option<String>, // 项目代码快照
    pub outstanding_qty: f64,         // 应还未还数量（钳制 ≥ 0）
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// CoreReturnView - 应还台账读模型
// ==========================================
// 用途: 列表展示,关联来源明细与单据号
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreReturnView {
    pub record: CoreReturnRecord,
    pub document_number: Option<String>, // 来源领料单号
    pub unit_no: Option<String>,         // 来源设备编号
    pub line_qty: Option<f64>,           // 来源明细数量
    pub received_qty: Option<f64>,       // 来源明细已回收数量
}

// ==========================================
// CoreReturnStats - 应还台账统计
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreReturnStats {
    pub record_count: i64,      // 应还记录数
    pub outstanding_total: f64, // 应还未还总量
}

// ==========================================
// MonthlyQty - 按月汇总数量
// ==========================================
// 用途: 年度图表,12 个月零值补齐
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyQty {
    pub month: u32,     // 1-12
    pub total_qty: f64, // 数量合计
}

// ==========================================
// ReceiptTransaction - 旧件回收记录
// ==========================================
// 用途: 人工登记实物回收;avg_unit_weight / expected_weight 为
//       登记时刻的库存台账快照,用于超差核对
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptTransaction {
    pub id: i64,                        // 自增主键
    pub receipt_number: Option<String>, // 回收单号
    pub receipt_date: NaiveDate,        // 回收日期
    pub item_code: String,              // 物料编码
    pub description: String,            // 物料描述
    pub qty: f64,                       // 回收数量
    pub total_weight: f64,              // 实测总重量
    pub avg_unit_weight: f64,           // 登记时库存平均单重快照
    pub expected_weight: f64,           // 预期重量 = qty × avg_unit_weight
    pub project_code: String,           // 项目代码
    pub remarks: Option<String>,        // 备注
    pub given_by: Option<String>,       // 交回人
    pub received_by: String,            // 接收人
    pub line_id: Option<i64>,           // 关联领料明细行（可空）
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// ReceiptInput - 回收登记输入
// ==========================================
// 用途: record_receipt / update_receipt 的入参
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptInput {
    pub receipt_number: Option<String>,
    pub receipt_date: Option<NaiveDate>,
    pub item_code: String,
    pub description: String,
    pub qty: f64,
    pub total_weight: f64,
    pub project_code: String,
    pub remarks: Option<String>,
    pub given_by: Option<String>,
    pub received_by: String,
    pub line_id: Option<i64>,
}

impl ReceiptInput {
    /// 字段级校验
    ///
    /// # 返回
    /// - 空 map: 校验通过
    /// - 非空 map: 字段名 → 错误消息（line_id 的存在性由引擎层补充校验）
    pub fn validate(&self) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();

        if self.receipt_date.is_none() {
            errors.insert("receipt_date".to_string(), "回收日期不能为空".to_string());
        }
        if self.item_code.trim().is_empty() {
            errors.insert("item_code".to_string(), "物料编码不能为空".to_string());
        } else if self.item_code.chars().count() > ITEM_CODE_MAX_LEN {
            errors.insert(
                "item_code".to_string(),
                format!("物料编码长度不能超过{}个字符", ITEM_CODE_MAX_LEN),
            );
        }
        if self.description.trim().is_empty() {
            errors.insert("description".to_string(), "物料描述不能为空".to_string());
        }
        if !self.qty.is_finite() || self.qty < 0.01 {
            errors.insert("qty".to_string(), "回收数量必须大于0".to_string());
        }
        if !self.total_weight.is_finite() || self.total_weight < 0.01 {
            errors.insert("total_weight".to_string(), "回收总重量必须大于0".to_string());
        }
        if self.project_code.trim().is_empty() {
            errors.insert("project_code".to_string(), "项目代码不能为空".to_string());
        }
        if self.received_by.trim().is_empty() {
            errors.insert("received_by".to_string(), "接收人不能为空".to_string());
        }

        errors
    }
}
