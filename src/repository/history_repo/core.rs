use crate::clock::Clock;
use crate::domain::calculation::{sort_for_display, EntryContent, HistoryEntry};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::kv_store::KvStore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 历史记录存储键
pub const HISTORY_STORAGE_KEY: &str = "3d-calculator-history";

/// 进程内共享的历史存储
pub type SharedHistoryStore = Arc<Mutex<HistoryStore>>;

/// 生成历史记录ID
///
/// 格式: calc-{毫秒时间戳}-{随机后缀}
/// 碰撞概率可忽略，但不保证跨进程全局唯一
pub fn generate_entry_id(now_millis: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("calc-{}-{}", now_millis, &suffix[..9])
}

// ==========================================
// HistoryStore - 计算历史存储
// ==========================================
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    last_persist_error: Option<String>,
}

impl HistoryStore {
    /// 从键值存储加载历史
    ///
    /// 缺失或损坏的数据块 → 空存储（记录告警，不向调用方报错）
    /// 单条记录损坏时仅跳过该条
    pub fn load(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        let entries = match kv.get(HISTORY_STORAGE_KEY) {
            Ok(Some(blob)) => decode_entries(&blob),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "历史记录读取失败，使用空历史");
                Vec::new()
            }
        };

        let mut store = Self {
            entries: dedupe_by_id(entries),
            kv,
            clock,
            last_persist_error: None,
        };
        sort_for_display(&mut store.entries);
        info!(count = store.entries.len(), "历史记录加载完成");
        store
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 新增记录（未置顶），返回新ID
    pub fn add(&mut self, content: EntryContent) -> String {
        let now = self.clock.now_millis();
        let id = generate_entry_id(now);
        self.insert_new(id.clone(), now, content);
        self.commit();
        debug!(id = %id, "新增历史记录");
        id
    }

    /// 原地更新记录内容
    ///
    /// 刷新时间戳，保留 id 与置顶状态；记录不存在时返回 NotFound
    pub fn update(&mut self, id: &str, content: EntryContent) -> RepositoryResult<()> {
        let index = self
            .position(id)
            .ok_or_else(|| RepositoryError::history_not_found(id))?;

        self.replace_at(index, content);
        debug!(id = %id, "更新历史记录");
        Ok(())
    }

    /// 存在则更新，否则新增
    ///
    /// - Some(id) 且存在 → 更新并返回同一 id
    /// - Some(id) 但不存在 → 以该 id 新增
    /// - None → 生成新 id 新增
    pub fn upsert(&mut self, id: Option<&str>, content: EntryContent) -> String {
        match id {
            Some(existing) => match self.position(existing) {
                Some(index) => {
                    self.replace_at(index, content);
                    debug!(id = %existing, "upsert 更新历史记录");
                    existing.to_string()
                }
                None => {
                    let now = self.clock.now_millis();
                    self.insert_new(existing.to_string(), now, content);
                    self.commit();
                    debug!(id = %existing, "upsert 新增历史记录（指定ID）");
                    existing.to_string()
                }
            },
            None => self.add(content),
        }
    }

    /// 删除记录（不存在时无操作）
    ///
    /// # 返回
    /// - true: 已删除
    /// - false: 记录不存在
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.commit();
            debug!(id = %id, "删除历史记录");
        }
        removed
    }

    /// 清空历史（保留置顶记录），返回删除条数
    pub fn clear_all(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.is_pinned());
        let removed = before - self.entries.len();
        self.commit();
        info!(removed = removed, kept = self.entries.len(), "清空历史记录");
        removed
    }

    /// 切换置顶状态（不改变时间戳），返回新的置顶状态
    pub fn toggle_pin(&mut self, id: &str) -> RepositoryResult<bool> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| RepositoryError::history_not_found(id))?;

        let pinned = !entry.is_pinned();
        entry.pinned = Some(pinned);
        self.commit();
        debug!(id = %id, pinned = pinned, "切换置顶");
        Ok(pinned)
    }

    /// 整体替换（导入合并结果）
    pub fn replace_all(&mut self, entries: Vec<HistoryEntry>) {
        self.entries = dedupe_by_id(entries);
        self.commit();
        info!(count = self.entries.len(), "历史记录整体替换");
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按展示顺序列出（置顶优先，时间降序）
    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 最近一次持久化失败原因（成功写入后清空）
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn replace_at(&mut self, index: usize, content: EntryContent) {
        let now = self.clock.now_millis();
        let mut entry = self.entries.remove(index);
        apply_content(&mut entry, content, now);
        // 置于最前：时间戳相同时最近修改者排前
        self.entries.insert(0, entry);
        self.commit();
    }

    fn insert_new(&mut self, id: String, now: i64, content: EntryContent) {
        let entry = HistoryEntry {
            id,
            timestamp: now,
            parameters: content.parameters,
            breakdown: content.breakdown,
            note: content.note,
            model_name: content.model_name,
            model_link: content.model_link,
            pinned: None,
        };
        self.entries.insert(0, entry);
    }

    /// 重新排序并整块写回
    fn commit(&mut self) {
        sort_for_display(&mut self.entries);

        let result = serde_json::to_string(&self.entries)
            .map_err(RepositoryError::from)
            .and_then(|blob| self.kv.set(HISTORY_STORAGE_KEY, &blob));

        match result {
            Ok(()) => self.last_persist_error = None,
            Err(e) => {
                warn!(error = %e, "历史记录持久化失败（内存状态已更新）");
                self.last_persist_error = Some(e.to_string());
            }
        }
    }
}

fn apply_content(entry: &mut HistoryEntry, content: EntryContent, now: i64) {
    entry.parameters = content.parameters;
    entry.breakdown = content.breakdown;
    entry.note = content.note;
    entry.model_name = content.model_name;
    entry.model_link = content.model_link;
    entry.timestamp = now;
}

/// 逐条解码数据块
///
/// 顶层不是数组 → 空；单条不合法 → 跳过该条
fn decode_entries(blob: &str) -> Vec<HistoryEntry> {
    let items = match serde_json::from_str::<Vec<serde_json::Value>>(blob) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "历史记录数据损坏，使用空历史");
            return Vec::new();
        }
    };

    let total = items.len();
    let entries: Vec<HistoryEntry> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<HistoryEntry>(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(index = index, error = %e, "跳过损坏的历史记录");
                None
            }
        })
        .collect();

    if entries.len() != total {
        warn!(skipped = total - entries.len(), "部分历史记录无法解析");
    }
    entries
}

/// 按 id 去重（保留首次出现）
fn dedupe_by_id(entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect()
}
