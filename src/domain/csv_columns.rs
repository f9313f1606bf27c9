// ==========================================
// 3D 打印成本计算器 - CSV 标准列定义
// ==========================================
// 职责: 导出/导入共用的唯一列名集合（固定顺序）
// 红线: 列名不做本地化，翻译属于展示层
// ==========================================

pub const ID: &str = "ID";
pub const DATE: &str = "Date";
pub const MODEL_NAME: &str = "Model Name";
pub const MODEL_LINK: &str = "Model Link";
pub const NOTE: &str = "Note";
pub const PINNED: &str = "Pinned";

// ===== 参数列 =====
pub const WEIGHT: &str = "Weight(g)";
pub const SPOOL_PRICE: &str = "Spool Price";
pub const SPOOL_WEIGHT: &str = "Spool Weight";
pub const PRINT_TIME: &str = "Print Time(h)";
pub const PREP_TIME: &str = "Prep Time(h)";
pub const POST_TIME: &str = "Post Time(h)";
pub const POWER: &str = "Power(kW)";
pub const TARIFF: &str = "Tariff";
pub const PRINTER_PRICE: &str = "Printer Price";
pub const LIFESPAN: &str = "Lifespan(h)";
pub const NOZZLE_PRICE: &str = "Nozzle Price";
pub const NOZZLE_LIFE: &str = "Nozzle Life(h)";
pub const BED_PRICE: &str = "Bed Price";
pub const BED_LIFE: &str = "Bed Life(h)";
pub const HOURLY_RATE: &str = "Hourly Rate";
pub const FAILURE_RATE: &str = "Failure Rate";
pub const MARKUP: &str = "Markup";
pub const CONSUMABLES: &str = "Consumables";
pub const INCLUDE_MARKETPLACE_FEE: &str = "Include Marketplace Fee";

// ===== 明细列 =====
pub const MATERIAL_COST: &str = "Material Cost";
pub const ELECTRICITY_COST: &str = "Electricity Cost";
pub const DEPRECIATION: &str = "Depreciation";
pub const NOZZLE_WEAR: &str = "Nozzle Wear";
pub const BED_WEAR: &str = "Bed Wear";
pub const LABOR_COST: &str = "Labor Cost";
pub const CONSUMABLES_COST: &str = "Consumables Cost";
pub const CUSTOM_EXPENSES: &str = "Custom Expenses";
pub const SUBTOTAL: &str = "Subtotal";
pub const TOTAL_COST: &str = "Total Cost";
pub const FINAL_PRICE: &str = "Final Price";
pub const PROFIT: &str = "Profit";
pub const MARKETPLACE_PRICE: &str = "Marketplace Price";
pub const MARKETPLACE_PROFIT: &str = "Marketplace Profit";

/// 导出列顺序
pub const HEADERS: [&str; 39] = [
    ID,
    DATE,
    MODEL_NAME,
    MODEL_LINK,
    NOTE,
    PINNED,
    WEIGHT,
    SPOOL_PRICE,
    SPOOL_WEIGHT,
    PRINT_TIME,
    PREP_TIME,
    POST_TIME,
    POWER,
    TARIFF,
    PRINTER_PRICE,
    LIFESPAN,
    NOZZLE_PRICE,
    NOZZLE_LIFE,
    BED_PRICE,
    BED_LIFE,
    HOURLY_RATE,
    FAILURE_RATE,
    MARKUP,
    CONSUMABLES,
    INCLUDE_MARKETPLACE_FEE,
    MATERIAL_COST,
    ELECTRICITY_COST,
    DEPRECIATION,
    NOZZLE_WEAR,
    BED_WEAR,
    LABOR_COST,
    CONSUMABLES_COST,
    CUSTOM_EXPENSES,
    SUBTOTAL,
    TOTAL_COST,
    FINAL_PRICE,
    PROFIT,
    MARKETPLACE_PRICE,
    MARKETPLACE_PROFIT,
];

/// 列名别名（旧版导出文件的平台费用列）
pub fn aliases(column: &str) -> &'static [&'static str] {
    match column {
        INCLUDE_MARKETPLACE_FEE => &[INCLUDE_MARKETPLACE_FEE, "Include OLX"],
        MARKETPLACE_PRICE => &[MARKETPLACE_PRICE, "OLX Price"],
        MARKETPLACE_PROFIT => &[MARKETPLACE_PROFIT, "OLX Profit"],
        _ => &[],
    }
}
