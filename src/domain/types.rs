// ==========================================
// 3D 打印成本计算器 - 领域类型定义
// ==========================================
// 职责: 合并策略 / 文件格式 / 通知级别
// 序列化格式: lowercase（与前端传值一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ==========================================
// 合并策略 (Merge Strategy)
// ==========================================
// 红线: 封闭枚举，新增策略必须在所有 match 处显式处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    Replace, // 整体覆盖（含置顶记录）
    Skip,    // 跳过已存在ID
    Update,  // 覆盖已存在ID内容，保留原置顶状态
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::Replace => write!(f, "replace"),
            MergeStrategy::Skip => write!(f, "skip"),
            MergeStrategy::Update => write!(f, "update"),
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(MergeStrategy::Replace),
            "skip" => Ok(MergeStrategy::Skip),
            "update" => Ok(MergeStrategy::Update),
            other => Err(format!("未知合并策略: {}（仅支持 replace/skip/update）", other)),
        }
    }
}

// ==========================================
// 导入导出格式 (File Format)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// 文件扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// 按扩展名识别格式（大小写不敏感）
    ///
    /// # 返回
    /// - Ok(format): 识别成功
    /// - Err(ext): 不支持的扩展名（原样返回，便于报错）
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(ext),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("未知文件格式: {}（仅支持 json/csv）", other)),
        }
    }
}

// ==========================================
// 通知级别 (Severity)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Danger,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Danger => write!(f, "danger"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_strategy_parse() {
        assert_eq!("Skip".parse::<MergeStrategy>(), Ok(MergeStrategy::Skip));
        assert_eq!(" update ".parse::<MergeStrategy>(), Ok(MergeStrategy::Update));
        assert!("merge".parse::<MergeStrategy>().is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("history.JSON")),
            Ok(ExportFormat::Json)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("/tmp/a.csv")),
            Ok(ExportFormat::Csv)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("data.xlsx")),
            Err("xlsx".to_string())
        );
        assert_eq!(ExportFormat::from_path(Path::new("noext")), Err(String::new()));
    }
}
