// ==========================================
// 备件仓库单据台账系统 - 正式单据领域模型
// ==========================================
// 红线: 单据头一经转换提交即不可变,明细行不做删除
// 对齐: documents / document_lines 表
// ==========================================

use crate::domain::types::DocFamily;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// DocumentHeader - 单据头
// ==========================================
// 红线: (family, document_number) 唯一,是转换去重的依据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentHeader {
    pub id: i64,                          // 自增主键
    pub family: DocFamily,                // 单据族
    pub document_number: String,          // 单据号（族内唯一）
    pub po_number: Option<String>,        // 采购单号
    pub wo_number: Option<String>,        // 工单号
    pub unit_no: Option<String>,          // 设备/机组编号
    pub project_code: Option<String>,     // 项目代码
    pub warehouse: Option<String>,        // 仓库代码
    pub remarks: Option<String>,          // 备注
    pub document_date: Option<NaiveDate>, // 单据日期
    pub creation_date: Option<NaiveDate>, // 源系统创建日期
    pub batch_no: i64,                    // 转换批次号（同一次运行共享）
    pub created_at: DateTime<Utc>,        // 转换提交时间
}

// ==========================================
// DocumentLine - 单据明细行
// ==========================================
// 用途: received_qty 仅领料族使用,由回收对账引擎增减
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLine {
    pub id: i64,                      // 自增主键
    pub document_id: i64,             // 所属单据头（FK）
    pub line_no: Option<i64>,         // 源行号
    pub item_code: Option<String>,    // 物料编码
    pub description: String,          // 物料描述
    pub qty: f64,                     // 数量
    pub unit_price: f64,              // 单价
    pub amount: f64,                  // 行金额
    pub uom: Option<String>,          // 计量单位
    pub unit_weight: f64,             // 单件重量
    pub received_qty: f64,            // 已回收数量（领料族，对账引擎维护）
    pub created_at: DateTime<Utc>,
}

// ==========================================
// NewDocument / NewDocumentLine - 转换写入载体
// ==========================================
// 用途: 转换引擎从暂存行组装,由仓储在事务内落库
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub family: DocFamily,
    pub document_number: String,
    pub po_number: Option<String>,
    pub wo_number: Option<String>,
    pub unit_no: Option<String>,
    pub project_code: Option<String>,
    pub warehouse: Option<String>,
    pub remarks: Option<String>,
    pub document_date: Option<NaiveDate>,
    pub creation_date: Option<NaiveDate>,
    pub batch_no: i64,
}

#[derive(Debug, Clone)]
pub struct NewDocumentLine {
    pub line_no: Option<i64>,
    pub item_code: Option<String>,
    pub description: String,
    pub qty: f64,
    pub unit_price: f64,
    pub amount: f64,
    pub uom: Option<String>,
    pub unit_weight: f64,
}

// ==========================================
// 读模型：列表 / 明细 / 统计
// ==========================================

/// 单据列表行（含按明细汇总的总重量）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub header: DocumentHeader,
    pub line_count: i64,    // 明细行数
    pub total_weight: f64,  // Σ(单件重量 × 数量)
}

/// 单据明细视图（头 + 全部明细行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDetail {
    pub header: DocumentHeader,
    pub lines: Vec<DocumentLine>,
}

/// 单据族统计
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStats {
    pub document_count: i64, // 单据总数
    pub line_count: i64,     // 明细总行数
    pub total_weight: f64,   // 全部明细总重量
}

/// 月度重量统计（单年 12 个月）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyWeight {
    pub month: u32,        // 1-12
    pub total_weight: f64, // 当月转换明细总重量
}
