// ==========================================
// 3D 打印成本计算器 - 核心库
// ==========================================
// 职责: 定价引擎 + 计算历史（存储 / 合并导入 / 导出）
// 技术栈: Rust + SQLite（本地键值存储）
// 外部协作者: 表单界面 / 通知展示 通过 app 层调用核心
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 键值存储 / 历史 / 草稿
pub mod repository;

// 引擎层 - 成本公式
pub mod engine;

// 导入层 - JSON / CSV 解析、校验与合并
pub mod importer;

// 导出层 - JSON / CSV 序列化
pub mod exporter;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 时钟（毫秒时间戳，可注入）
pub mod clock;

// 用户通知
pub mod notification;

// 日志系统
pub mod logging;

// 应用层 - 会话状态与自动保存
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ExportFormat, MergeStrategy, Severity};

// 领域实体
pub use domain::{Breakdown, CustomExpense, FormState, HistoryEntry, ParameterSet};

// 引擎
pub use engine::{evaluate, PricingEngine};

// 存储
pub use repository::{HistoryStore, KvStore, RepositoryError};

// 导入导出
pub use importer::{HistoryImporter, HistoryImporterImpl, ImportError};
pub use exporter::ExportError;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "3D 打印成本计算器";
