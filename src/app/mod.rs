// ==========================================
// 3D 打印成本计算器 - 应用层
// ==========================================
// 职责: 表单会话、自动保存调度、应用状态装配
// ==========================================

pub mod auto_save;
pub mod debouncer;
pub mod save_manager;
pub mod state;

// 重导出
pub use auto_save::AutoSaveController;
pub use debouncer::Debouncer;
pub use save_manager::SaveManager;
pub use state::{get_default_db_path, AppState};
