// ==========================================
// 3D 打印成本计算器 - 配置层
// ==========================================
// 职责: 应用配置管理（自动保存延迟、货币符号、导出目录）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, defaults, AppConfig, ConfigManager};
