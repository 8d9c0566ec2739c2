// ==========================================
// 测试数据构建器
// ==========================================
// 用途: 以流式 API 构建暂存行,减少测试样板代码
// ==========================================

use chrono::NaiveDate;
use warehouse_ledger::domain::staging::StagedRowInput;

/// 暂存行构建器
///
/// 默认值是一条合法的备件行（SP- 前缀、有重量、数量为正）,
/// 测试只需覆盖自己关心的字段
pub struct StagedRowBuilder {
    row: StagedRowInput,
}

impl StagedRowBuilder {
    /// 创建指定单据号的构建器
    pub fn new(document_number: &str) -> Self {
        Self {
            row: StagedRowInput {
                po_number: None,
                document_number: document_number.to_string(),
                line_no: None,
                document_date: NaiveDate::from_ymd_opt(2025, 3, 10),
                creation_date: None,
                item_code: Some("SP-1001".to_string()),
                description: "齿轮泵".to_string(),
                qty: 1.0,
                unit_price: 100.0,
                amount: 100.0,
                uom: Some("件".to_string()),
                unit_weight: 1.0,
                wo_number: None,
                unit_no: None,
                project_code: None,
                warehouse: None,
                remarks: None,
            },
        }
    }

    pub fn po_number(mut self, po: &str) -> Self {
        self.row.po_number = Some(po.to_string());
        self
    }

    pub fn line_no(mut self, line_no: i64) -> Self {
        self.row.line_no = Some(line_no);
        self
    }

    pub fn document_date(mut self, date: NaiveDate) -> Self {
        self.row.document_date = Some(date);
        self
    }

    pub fn no_document_date(mut self) -> Self {
        self.row.document_date = None;
        self
    }

    pub fn item(mut self, item_code: &str, description: &str) -> Self {
        self.row.item_code = Some(item_code.to_string());
        self.row.description = description.to_string();
        self
    }

    pub fn no_item_code(mut self) -> Self {
        self.row.item_code = None;
        self
    }

    /// 数量与单价（行金额 = 数量 × 单价）
    pub fn qty_price(mut self, qty: f64, unit_price: f64) -> Self {
        self.row.qty = qty;
        self.row.unit_price = unit_price;
        self.row.amount = qty * unit_price;
        self
    }

    /// 覆盖行金额（折扣等金额 ≠ 数量 × 单价的场景）
    pub fn amount(mut self, amount: f64) -> Self {
        self.row.amount = amount;
        self
    }

    pub fn unit_weight(mut self, unit_weight: f64) -> Self {
        self.row.unit_weight = unit_weight;
        self
    }

    pub fn project_code(mut self, project_code: &str) -> Self {
        self.row.project_code = Some(project_code.to_string());
        self
    }

    pub fn unit_no(mut self, unit_no: &str) -> Self {
        self.row.unit_no = Some(unit_no.to_string());
        self
    }

    pub fn warehouse(mut self, warehouse: &str) -> Self {
        self.row.warehouse = Some(warehouse.to_string());
        self
    }

    pub fn wo_number(mut self, wo_number: &str) -> Self {
        self.row.wo_number = Some(wo_number.to_string());
        self
    }

    pub fn remarks(mut self, remarks: &str) -> Self {
        self.row.remarks = Some(remarks.to_string());
        self
    }

    pub fn build(self) -> StagedRowInput {
        self.row
    }
}
