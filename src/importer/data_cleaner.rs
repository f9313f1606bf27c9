// ==========================================
// 3D 打印成本计算器 - 数据清洗器
// ==========================================
// 职责: CSV 单元格 → 数值 / 布尔 / 时间戳 / 可选文本
// 红线: 清洗不报错，无效值一律回退到给定默认值
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub struct DataCleaner;

impl DataCleaner {
    /// 安全解析浮点数（缺失 / 无效 / 非有限 → default）
    pub fn parse_number(&self, value: Option<&str>, default: f64) -> f64 {
        value
            .map(str::trim)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
    }

    /// 解析布尔值（true / yes / 1，大小写不敏感）
    pub fn parse_bool(&self, value: Option<&str>) -> bool {
        match value {
            Some(v) => matches!(v.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
            None => false,
        }
    }

    /// 标准化 NULL 值（空字符串/空白 → None）
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            if v.trim().is_empty() {
                None
            } else {
                Some(v.to_string())
            }
        })
    }

    /// 解析时间戳（Unix 毫秒）
    ///
    /// 支持格式（朴素时间按 UTC 解释）:
    /// - 整数毫秒: 1700000000000
    /// - RFC 3339: 2025-01-20T08:30:00.000Z
    /// - YYYY-MM-DD HH:MM:SS / YYYY-MM-DDTHH:MM:SS
    /// - DD/MM/YYYY HH:MM（旧版导出格式）
    /// - YYYY-MM-DD
    pub fn parse_timestamp(&self, value: Option<&str>) -> Option<i64> {
        let v = value.map(str::trim).filter(|v| !v.is_empty())?;

        if let Ok(millis) = v.parse::<i64>() {
            return Some(millis);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
            return Some(dt.timestamp_millis());
        }

        const NAIVE_FORMATS: [&str; 4] = [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S",
            "%d/%m/%Y %H:%M",
            "%Y-%m-%d %H:%M",
        ];
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(v, fmt) {
                return Some(naive.and_utc().timestamp_millis());
            }
        }

        NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc().timestamp_millis())
    }
}
