// ==========================================
// 3D 打印成本计算器 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 任何导入错误都不修改现有历史
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件格式不支持: {0}（仅支持 .json/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    // ===== 格式解析错误 =====
    #[error("JSON 格式无效: {0}")]
    InvalidJson(String),

    #[error("JSON 格式无效: 期望计算记录数组")]
    NotAnArray,

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 结构校验错误 =====
    #[error("第 {item} 条记录校验失败 (字段 {field}): {message}")]
    SchemaValidation {
        item: usize, // 从 1 开始
        field: String,
        message: String,
    },

    // ===== 流程错误 =====
    #[error("已有导入正在进行")]
    ImportInProgress,

    #[error("没有待确认的导入")]
    NoPendingImport,

    // ===== 存储错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ImportError {
    /// 缺失必填字段
    pub fn missing_field(item: usize, field: impl Into<String>) -> Self {
        ImportError::SchemaValidation {
            item,
            field: field.into(),
            message: "缺少必填字段".to_string(),
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::InvalidJson(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
