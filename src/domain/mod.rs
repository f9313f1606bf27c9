// ==========================================
// 3D 打印成本计算器 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含持久化逻辑,不含计算公式
// ==========================================

pub mod calculation;
pub mod csv_columns;
pub mod types;

// 重导出核心类型
pub use calculation::{
    sort_for_display, Breakdown, CustomExpense, EntryContent, FormState, HistoryEntry,
    ParameterSet,
};
pub use types::{ExportFormat, MergeStrategy, Severity};
