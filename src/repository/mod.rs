// ==========================================
// 3D 打印成本计算器 - 数据仓储层
// ==========================================
// 红线: Repository 不含定价逻辑
// ==========================================
// 职责: 本地键值持久化、计算历史存储、草稿状态
// ==========================================

pub mod draft_repo;
pub mod error;
pub mod history_repo;
pub mod kv_store;

// 重导出核心仓储
pub use draft_repo::{DraftRepository, ModelInfo};
pub use error::{RepositoryError, RepositoryResult};
pub use history_repo::{generate_entry_id, HistoryStore, SharedHistoryStore, HISTORY_STORAGE_KEY};
pub use kv_store::{KvStore, MemoryKvStore, SqliteKvStore};
