// ==========================================
// 3D 打印成本计算器 - 引擎层
// ==========================================
// 职责: 成本公式计算
// 红线: 引擎不依赖历史存储，历史记录只保存计算结果
// ==========================================

pub mod pricing;

// 重导出核心引擎
pub use pricing::{evaluate, safe_div, PricingEngine, MARKETPLACE_FEE_RATE, MARKETPLACE_FLAT_FEE};
