// ==========================================
// 3D 打印成本计算器 - 计算领域模型
// ==========================================
// 职责: 参数集 / 成本明细 / 历史记录 的数据结构
// 序列化: camelCase（与 JSON 导入导出格式一致）
// 红线: 历史记录保存的是“保存时刻”的成本明细，不随公式变化重算
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// CustomExpense - 自定义附加费用
// ==========================================
// 归属: 由所在 ParameterSet 独占，id 在同一参数集内唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomExpense {
    pub id: String,     // 费用ID（不透明字符串）
    pub name: String,   // 费用名称（包装、运费等）
    pub amount: f64,    // 金额
}

// ==========================================
// ParameterSet - 计算参数集
// ==========================================
// 约定: 所有数值字段 >= 0
// 约定: failure_rate / markup 为乘数语义（1.0 = 不加成）
// 注意: 分母字段（线轴重量、各类寿命）允许为 0，由引擎按 0 成本处理
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSet {
    // ===== 材料 =====
    pub weight: f64,       // 模型重量（含支撑, g）
    pub spool_price: f64,  // 整卷耗材价格
    pub spool_weight: f64, // 整卷耗材重量（g）

    // ===== 时间 =====
    pub print_time: f64, // 打印时长（h）
    pub prep_time: f64,  // 准备时长（h）
    pub post_time: f64,  // 后处理时长（h）

    // ===== 电费 =====
    pub power_consumption: f64, // 打印机功率（kW）
    pub electricity_tariff: f64, // 电价（每 kWh）

    // ===== 折旧 =====
    pub printer_price: f64, // 打印机价格
    pub lifespan: f64,      // 打印机预计寿命（h）

    // ===== 易损件 =====
    pub nozzle_price: f64,    // 喷嘴价格
    pub nozzle_lifespan: f64, // 喷嘴寿命（h）
    pub bed_price: f64,       // 热床/打印板价格
    pub bed_lifespan: f64,    // 热床寿命（h）

    // ===== 人工 =====
    pub hourly_rate: f64, // 人工时薪

    // ===== 经营 =====
    pub failure_rate: f64, // 失败余量乘数（1.1 = +10%）
    pub markup: f64,       // 加价乘数（1.5 = +50%）

    // ===== 附加 =====
    pub consumables: f64, // 固定耗材费用（树脂打印等）

    #[serde(default)]
    pub custom_expenses: Vec<CustomExpense>,

    // 平台手续费（2% + 固定 20）
    #[serde(default, alias = "includeOlxFee")]
    pub include_marketplace_fee: bool,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            weight: 0.0,
            spool_price: 0.0,
            spool_weight: 0.0,
            print_time: 0.0,
            prep_time: 0.0,
            post_time: 0.0,
            power_consumption: 0.0,
            electricity_tariff: 0.0,
            printer_price: 0.0,
            lifespan: 0.0,
            nozzle_price: 0.0,
            nozzle_lifespan: 0.0,
            bed_price: 0.0,
            bed_lifespan: 0.0,
            hourly_rate: 0.0,
            failure_rate: 1.0,
            markup: 1.0,
            consumables: 0.0,
            custom_expenses: Vec::new(),
            include_marketplace_fee: false,
        }
    }
}

impl ParameterSet {
    /// 是否与默认参数完全一致（用于判断空表单）
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// 自定义费用合计
    pub fn custom_expenses_total(&self) -> f64 {
        self.custom_expenses.iter().map(|e| e.amount).sum()
    }
}

// ==========================================
// Breakdown - 成本明细（引擎输出）
// ==========================================
// 不可变: 参数变化时整体重算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    // ===== 成本构成 =====
    pub material_cost: f64,
    pub electricity_cost: f64,
    pub depreciation_cost: f64,
    pub nozzle_wear_cost: f64,
    pub bed_wear_cost: f64,
    pub labor_cost: f64,
    pub consumables_cost: f64,
    pub custom_expenses_cost: f64,

    // ===== 汇总 =====
    pub subtotal: f64,    // 各项成本之和
    pub total_cost: f64,  // subtotal × failure_rate
    pub final_price: f64, // total_cost × markup
    pub profit: f64,      // final_price - total_cost

    // ===== 平台价格（未启用时为 0） =====
    #[serde(default, alias = "olxPrice")]
    pub marketplace_price: f64,
    #[serde(default, alias = "olxProfit")]
    pub marketplace_profit: f64,
}

// ==========================================
// HistoryEntry - 计算历史记录
// ==========================================
// JSON 字段: state = 参数集, result = 成本明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: i64, // 创建/最后修改时间（Unix 毫秒）

    #[serde(rename = "state")]
    pub parameters: ParameterSet,

    #[serde(rename = "result")]
    pub breakdown: Breakdown,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
}

impl HistoryEntry {
    pub fn is_pinned(&self) -> bool {
        self.pinned.unwrap_or(false)
    }
}

// ==========================================
// EntryContent - 一次保存携带的内容
// ==========================================
// 用途: add / update / upsert 的公共入参
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryContent {
    pub parameters: ParameterSet,
    pub breakdown: Breakdown,
    pub note: Option<String>,
    pub model_name: Option<String>,
    pub model_link: Option<String>,
}

impl Default for Breakdown {
    fn default() -> Self {
        Self {
            material_cost: 0.0,
            electricity_cost: 0.0,
            depreciation_cost: 0.0,
            nozzle_wear_cost: 0.0,
            bed_wear_cost: 0.0,
            labor_cost: 0.0,
            consumables_cost: 0.0,
            custom_expenses_cost: 0.0,
            subtotal: 0.0,
            total_cost: 0.0,
            final_price: 0.0,
            profit: 0.0,
            marketplace_price: 0.0,
            marketplace_profit: 0.0,
        }
    }
}

// ==========================================
// FormState - 当前表单（未保存草稿）
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState {
    pub parameters: ParameterSet,
    pub model_name: String,
    pub model_link: String,
    pub note: String,
}

impl FormState {
    /// 表单是否含有用户输入
    ///
    /// 参数全为默认值且名称/链接/备注均为空 → 视为空表单
    pub fn has_user_content(&self) -> bool {
        !self.parameters.is_default()
            || !self.model_name.is_empty()
            || !self.model_link.is_empty()
            || !self.note.is_empty()
    }

    /// 从历史记录载入表单
    pub fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            parameters: entry.parameters.clone(),
            model_name: entry.model_name.clone().unwrap_or_default(),
            model_link: entry.model_link.clone().unwrap_or_default(),
            note: entry.note.clone().unwrap_or_default(),
        }
    }
}

// ==========================================
// 展示排序
// ==========================================
// 规则: 置顶优先，同置顶状态下按时间戳降序（最新在前）
// 稳定排序: 时间戳相同的记录保持原相对顺序
pub fn sort_for_display(entries: &mut [HistoryEntry]) {
    entries.sort_by(|a, b| {
        b.is_pinned()
            .cmp(&a.is_pinned())
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}

/// 空字符串 → None
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
