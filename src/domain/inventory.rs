// ==========================================
// 备件仓库单据台账系统 - 库存台账领域模型
// ==========================================
// 红线: 平均值永远由累计值重算(total_amount / total_qty),
//       不做增量修正,避免浮点漂移
// 对齐: inventory_ledger 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// LedgerTotals - 台账累计值与派生平均值
// ==========================================
// 用途: 加权折叠的输入/输出载体;平均值是累计值的派生,不单独演化
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub total_qty: f64,       // 累计数量
    pub total_amount: f64,    // 累计金额
    pub avg_unit_price: f64,  // 加权平均单价 = total_amount / total_qty
    pub total_weight: f64,    // 累计重量
    pub avg_unit_weight: f64, // 加权平均单件重量 = total_weight / total_qty
}

// ==========================================
// InventoryRecord - 库存台账记录
// ==========================================
// 用途: 每个物料编码一行;入库单转换时滚动折叠,回收对账只读取快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: i64,                   // 自增主键
    pub item_code: String,         // 物料编码（唯一）
    pub description: String,       // 物料描述快照（最近一次入库）
    pub uom: Option<String>,       // 计量单位快照
    #[serde(flatten)]
    pub totals: LedgerTotals,      // 累计值与加权平均
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
