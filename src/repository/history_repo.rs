// ==========================================
// 3D 打印成本计算器 - 计算历史存储
// ==========================================
// 职责: id → HistoryEntry 映射的唯一持有者
// 存储: kv_store 中单个 JSON 数组（整块覆盖写）
// 红线: 展示顺序是派生视图，每次变更后重新排序
// 红线: 持久化失败只记录日志，内存状态仍视为已完成
// ==========================================

mod core;


pub use self::core::{generate_entry_id, HistoryStore, SharedHistoryStore, HISTORY_STORAGE_KEY};
