// ==========================================
// 备件仓库单据台账系统 - 加权平均计算
// ==========================================
// 红线: 均价/均重永远由累计总量重新计算,不做增量修正,
//       避免浮点漂移随折算次数累积
// ==========================================

use crate::domain::inventory::LedgerTotals;

/// 分母为 0 时返回 0 的加权平均
fn weighted_avg(total: f64, qty: f64) -> f64 {
    if qty > 0.0 {
        total / qty
    } else {
        0.0
    }
}

/// 新物料编码的初始台账总量
///
/// # 参数
/// - qty: 首笔数量
/// - unit_price: 首笔单价（直接作为初始均价快照）
/// - amount: 首笔金额
/// - unit_weight: 首笔单重（直接作为初始均重快照）
pub fn initial_totals(qty: f64, unit_price: f64, amount: f64, unit_weight: f64) -> LedgerTotals {
    LedgerTotals {
        total_qty: qty,
        total_amount: amount,
        avg_unit_price: unit_price,
        total_weight: unit_weight * qty,
        avg_unit_weight: unit_weight,
    }
}

/// 将一行入库明细折入现有台账总量
///
/// # 参数
/// - current: 折算前的累计总量
/// - qty: 本行数量
/// - amount: 本行金额
/// - unit_weight: 本行单重
///
/// # 返回
/// - 折算后的累计总量,均价/均重由新的累计值重新计算
pub fn fold_line(current: &LedgerTotals, qty: f64, amount: f64, unit_weight: f64) -> LedgerTotals {
    let total_qty = current.total_qty + qty;
    let total_amount = current.total_amount + amount;
    let total_weight = current.total_weight + unit_weight * qty;

    LedgerTotals {
        total_qty,
        total_amount,
        avg_unit_price: weighted_avg(total_amount, total_qty),
        total_weight,
        avg_unit_weight: weighted_avg(total_weight, total_qty),
    }
}
