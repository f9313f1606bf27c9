// ==========================================
// 3D 打印成本计算器 - 定价引擎
// ==========================================
// 职责: 参数集 → 成本明细（纯函数，无状态，无 I/O）
// 红线: 除零 / 非有限结果一律按 0 成本处理，不报错
// 约定: failure_rate / markup 为乘数语义（1.0 = 不加成）
// ==========================================

use crate::domain::calculation::{Breakdown, ParameterSet};

/// 平台手续费比例（2%）
pub const MARKETPLACE_FEE_RATE: f64 = 0.02;

/// 平台固定附加费
pub const MARKETPLACE_FLAT_FEE: f64 = 20.0;

// ==========================================
// PricingEngine - 定价引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct PricingEngine;

impl PricingEngine {
    /// 创建新的定价引擎
    pub fn new() -> Self {
        Self
    }

    /// 计算成本明细
    pub fn evaluate(&self, params: &ParameterSet) -> Breakdown {
        evaluate(params)
    }
}

/// 安全除法
///
/// 分母为 0 或非有限值、或结果非有限时返回 0
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let result = numerator / denominator;
    if result.is_finite() {
        result
    } else {
        0.0
    }
}

/// 非有限值归零
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// 计算成本明细
///
/// # 公式
/// - material = weight × spool_price / spool_weight
/// - electricity = print_time × power × tariff
/// - depreciation / nozzle / bed = price / lifespan × print_time
/// - labor = (prep + post) × hourly_rate
/// - subtotal = 8 项之和
/// - total = subtotal × failure_rate, final = total × markup
///
/// 每个分项与汇总项溢出为非有限值时按 0 处理
pub fn evaluate(params: &ParameterSet) -> Breakdown {
    // ===== 成本构成 =====
    let material_cost = finite_or_zero(safe_div(
        params.weight * params.spool_price,
        params.spool_weight,
    ));
    let electricity_cost = finite_or_zero(
        params.print_time * params.power_consumption * params.electricity_tariff,
    );
    let depreciation_cost =
        finite_or_zero(safe_div(params.printer_price, params.lifespan) * params.print_time);
    let nozzle_wear_cost =
        finite_or_zero(safe_div(params.nozzle_price, params.nozzle_lifespan) * params.print_time);
    let bed_wear_cost =
        finite_or_zero(safe_div(params.bed_price, params.bed_lifespan) * params.print_time);
    let labor_cost = finite_or_zero((params.prep_time + params.post_time) * params.hourly_rate);
    let consumables_cost = finite_or_zero(params.consumables);
    let custom_expenses_cost = finite_or_zero(params.custom_expenses_total());

    // ===== 汇总 =====
    let subtotal = finite_or_zero(
        material_cost
            + electricity_cost
            + depreciation_cost
            + nozzle_wear_cost
            + bed_wear_cost
            + labor_cost
            + consumables_cost
            + custom_expenses_cost,
    );
    let total_cost = finite_or_zero(subtotal * params.failure_rate);
    let final_price = finite_or_zero(total_cost * params.markup);
    let profit = finite_or_zero(final_price - total_cost);

    // ===== 平台价格 =====
    let (marketplace_price, marketplace_profit) = if params.include_marketplace_fee {
        let price =
            finite_or_zero(final_price * (1.0 + MARKETPLACE_FEE_RATE) + MARKETPLACE_FLAT_FEE);
        (price, finite_or_zero(price - total_cost))
    } else {
        (0.0, 0.0)
    };

    Breakdown {
        material_cost,
        electricity_cost,
        depreciation_cost,
        nozzle_wear_cost,
        bed_wear_cost,
        labor_cost,
        consumables_cost,
        custom_expenses_cost,
        subtotal,
        total_cost,
        final_price,
        profit,
        marketplace_price,
        marketplace_profit,
    }
}
