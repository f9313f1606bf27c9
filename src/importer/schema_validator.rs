// ==========================================
// 3D 打印成本计算器 - JSON 结构校验器
// ==========================================
// 职责: 导入 JSON 的逐条结构校验（先校验，后反序列化）
// 红线: 任意一条不合格 → 整个导入失败，并指明第几条 / 哪个字段
// ==========================================

use crate::domain::calculation::HistoryEntry;
use crate::importer::error::{ImportError, ImportResult};
use serde_json::Value;

/// state 必填数值字段
pub const REQUIRED_STATE_FIELDS: [&str; 18] = [
    "weight",
    "spoolPrice",
    "spoolWeight",
    "printTime",
    "prepTime",
    "postTime",
    "powerConsumption",
    "electricityTariff",
    "printerPrice",
    "lifespan",
    "nozzlePrice",
    "nozzleLifespan",
    "bedPrice",
    "bedLifespan",
    "hourlyRate",
    "failureRate",
    "markup",
    "consumables",
];

/// result 必填数值字段
pub const REQUIRED_RESULT_FIELDS: [&str; 12] = [
    "materialCost",
    "electricityCost",
    "depreciationCost",
    "nozzleWearCost",
    "bedWearCost",
    "laborCost",
    "consumablesCost",
    "customExpensesCost",
    "subtotal",
    "totalCost",
    "finalPrice",
    "profit",
];

pub struct SchemaValidator;

impl SchemaValidator {
    /// 校验并转换整个文档
    pub fn validate_document(&self, doc: &Value) -> ImportResult<Vec<HistoryEntry>> {
        let items = doc.as_array().ok_or(ImportError::NotAnArray)?;

        items
            .iter()
            .enumerate()
            .map(|(idx, item)| self.validate_item(idx + 1, item))
            .collect()
    }

    /// 校验单条记录（item 从 1 开始）
    pub fn validate_item(&self, item: usize, value: &Value) -> ImportResult<HistoryEntry> {
        let obj = value.as_object().ok_or_else(|| ImportError::SchemaValidation {
            item,
            field: "$".to_string(),
            message: "记录必须是对象".to_string(),
        })?;

        match obj.get("id") {
            None | Some(Value::Null) => return Err(ImportError::missing_field(item, "id")),
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            Some(_) => return Err(invalid(item, "id", "必须是非空字符串")),
        }

        let timestamp = match obj.get("timestamp") {
            None | Some(Value::Null) => {
                return Err(ImportError::missing_field(item, "timestamp"))
            }
            Some(v) => {
                integral_millis(v).ok_or_else(|| invalid(item, "timestamp", "必须是整数毫秒"))?
            }
        };

        check_numeric_section(item, obj.get("state"), "state", &REQUIRED_STATE_FIELDS)?;
        check_numeric_section(item, obj.get("result"), "result", &REQUIRED_RESULT_FIELDS)?;

        // 浮点写法的毫秒（如 1.7e12）统一为整数
        let mut normalized = value.clone();
        normalized["timestamp"] = Value::from(timestamp);

        serde_json::from_value(normalized).map_err(|e| ImportError::SchemaValidation {
            item,
            field: "$".to_string(),
            message: e.to_string(),
        })
    }
}

/// 整数毫秒：接受整数，或无小数部分的有限浮点数
fn integral_millis(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn invalid(item: usize, field: &str, message: &str) -> ImportError {
    ImportError::SchemaValidation {
        item,
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn check_numeric_section(
    item: usize,
    section: Option<&Value>,
    name: &str,
    required: &[&str],
) -> ImportResult<()> {
    let obj = match section {
        None | Some(Value::Null) => return Err(ImportError::missing_field(item, name)),
        Some(Value::Object(obj)) => obj,
        Some(_) => return Err(invalid(item, name, "必须是对象")),
    };

    for field in required {
        let path = format!("{}.{}", name, field);
        match obj.get(*field) {
            None | Some(Value::Null) => return Err(ImportError::missing_field(item, path)),
            Some(v) if v.is_number() => {}
            Some(_) => return Err(invalid(item, &path, "必须是数值")),
        }
    }
    Ok(())
}
