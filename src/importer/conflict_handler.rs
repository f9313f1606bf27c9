// ==========================================
// 3D 打印成本计算器 - 冲突处理器实现
// ==========================================
// 职责: 导入批次与现有历史的 id 冲突检测 + 按策略合并
// 策略: replace（整体覆盖）/ skip（跳过已存在）/ update（覆盖内容，保留原置顶）
// ==========================================

use crate::domain::calculation::{sort_for_display, HistoryEntry};
use crate::domain::types::MergeStrategy;
use std::collections::{HashMap, HashSet};

/// 重复检测结果（仅用于预览，不阻断导入）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateSummary {
    pub duplicates: usize,  // 与现有历史 id 相同的导入记录数
    pub new_entries: usize, // 其余导入记录数
}

pub struct ConflictHandler;

impl ConflictHandler {
    /// 统计导入记录中与现有历史 id 重复的数量
    pub fn detect_duplicates(
        &self,
        existing: &[HistoryEntry],
        incoming: &[HistoryEntry],
    ) -> DuplicateSummary {
        let existing_ids: HashSet<&str> = existing.iter().map(|e| e.id.as_str()).collect();
        let duplicates = incoming
            .iter()
            .filter(|e| existing_ids.contains(e.id.as_str()))
            .count();

        DuplicateSummary {
            duplicates,
            new_entries: incoming.len() - duplicates,
        }
    }

    /// 检测同批次内重复 id
    ///
    /// # 返回
    /// - Vec<(序号, id)>: 重复记录列表（不包括第一次出现，序号从 1 开始）
    pub fn detect_batch_duplicates(&self, incoming: &[HistoryEntry]) -> Vec<(usize, String)> {
        let mut seen = HashSet::new();
        incoming
            .iter()
            .enumerate()
            .filter(|(_, e)| !seen.insert(e.id.as_str()))
            .map(|(idx, e)| (idx + 1, e.id.clone()))
            .collect()
    }

    /// 批内去重（保留首次出现）
    pub fn dedupe_batch(&self, incoming: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
        let mut seen = HashSet::new();
        incoming
            .into_iter()
            .filter(|e| seen.insert(e.id.clone()))
            .collect()
    }

    /// 按策略合并，结果已按展示顺序排序
    pub fn reconcile(
        &self,
        existing: &[HistoryEntry],
        incoming: Vec<HistoryEntry>,
        strategy: MergeStrategy,
    ) -> Vec<HistoryEntry> {
        let incoming = self.dedupe_batch(incoming);

        let mut merged = match strategy {
            MergeStrategy::Replace => incoming,
            MergeStrategy::Skip => {
                let existing_ids: HashSet<&str> =
                    existing.iter().map(|e| e.id.as_str()).collect();
                let mut merged = existing.to_vec();
                merged.extend(
                    incoming
                        .into_iter()
                        .filter(|e| !existing_ids.contains(e.id.as_str())),
                );
                merged
            }
            MergeStrategy::Update => {
                let mut by_id: HashMap<String, HistoryEntry> = incoming
                    .iter()
                    .map(|e| (e.id.clone(), e.clone()))
                    .collect();

                let mut merged: Vec<HistoryEntry> = existing
                    .iter()
                    .map(|current| match by_id.remove(&current.id) {
                        Some(mut replacement) => {
                            replacement.pinned = current.pinned;
                            replacement
                        }
                        None => current.clone(),
                    })
                    .collect();

                // 剩余的即为无冲突的新记录（保持导入顺序）
                merged.extend(incoming.into_iter().filter(|e| by_id.contains_key(&e.id)));
                merged
            }
        };

        sort_for_display(&mut merged);
        merged
    }
}
