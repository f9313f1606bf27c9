// ==========================================
// 3D 打印成本计算器 - 保存管理器
// ==========================================
// 职责: 当前表单会话（编辑ID / 自动保存ID / 上次保存时间 / 保存状态标记）
// 规则: 手动保存与自动保存走同一条 upsert 路径
// 规则: 自动保存抑制 = 首次渲染 / 保存进行中 / 手动保存后一次 / 空表单 / 无未保存变更
// 红线: 空表单手动保存 → Warning 通知，不修改任何状态
// ==========================================

use crate::clock::Clock;
use crate::domain::calculation::{non_empty, Breakdown, EntryContent, FormState};
use crate::engine::PricingEngine;
use crate::notification::{Notification, Notifier};
use crate::repository::draft_repo::{DraftRepository, ModelInfo};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::history_repo::{HistoryStore, SharedHistoryStore};
use std::sync::{Arc, MutexGuard};
use tracing::{debug, info, warn};

/// 保存来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveKind {
    Manual,
    Auto,
}

pub struct SaveManager {
    store: SharedHistoryStore,
    drafts: DraftRepository,
    engine: PricingEngine,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,

    // ===== 表单会话 =====
    form: FormState,
    editing_id: Option<String>,
    auto_save_id: Option<String>,
    last_save_time: Option<i64>,

    // ===== 保存状态标记 =====
    is_saving: bool,
    skip_next_auto_save: bool,
    initial_render: bool,
    has_unsaved_changes: bool,
}

impl SaveManager {
    /// 空会话
    pub fn new(
        store: SharedHistoryStore,
        drafts: DraftRepository,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            drafts,
            engine: PricingEngine::new(),
            notifier,
            clock,
            form: FormState::default(),
            editing_id: None,
            auto_save_id: None,
            last_save_time: None,
            is_saving: false,
            skip_next_auto_save: false,
            initial_render: true,
            has_unsaved_changes: false,
        }
    }

    /// 从草稿状态恢复会话（重启后继续编辑）
    pub fn restore(
        store: SharedHistoryStore,
        drafts: DraftRepository,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ModelInfo {
            model_name,
            model_link,
        } = drafts.load_model_info();
        let form = FormState {
            parameters: drafts.load_parameters(),
            model_name,
            model_link,
            note: drafts.load_note(),
        };
        let editing_id = drafts.load_editing_id();
        let auto_save_id = drafts.load_auto_save_id();
        let last_save_time = drafts.load_last_save_time();

        let mut manager = Self::new(store, drafts, notifier, clock);
        manager.form = form;
        manager.auto_save_id = auto_save_id;
        manager.last_save_time = last_save_time;

        // 编辑中的记录可能已被删除
        manager.editing_id = match editing_id {
            Some(id) if manager.entry_exists(&id) => Some(id),
            Some(id) => {
                warn!(id = %id, "草稿中的编辑记录已不存在，退出编辑模式");
                None
            }
            None => None,
        };

        info!(
            editing = manager.editing_id.is_some(),
            has_content = manager.form.has_user_content(),
            "表单草稿已恢复"
        );
        manager
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// 当前表单的实时计算结果
    pub fn breakdown(&self) -> Breakdown {
        self.engine.evaluate(&self.form.parameters)
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn auto_save_id(&self) -> Option<&str> {
        self.auto_save_id.as_deref()
    }

    pub fn last_save_time(&self) -> Option<i64> {
        self.last_save_time
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn is_editing(&self) -> bool {
        self.editing_id.is_some()
    }

    // ==========================================
    // 表单操作
    // ==========================================

    /// 表单内容变更
    ///
    /// 手动保存后的真实修改会解除一次性抑制，保证该修改仍被自动保存
    pub fn set_form(&mut self, form: FormState) {
        self.initial_render = false;
        if self.skip_next_auto_save && form != self.form {
            self.skip_next_auto_save = false;
        }
        self.has_unsaved_changes = form.has_user_content();
        self.form = form;
        self.persist_form();
    }

    /// 载入历史记录进入编辑模式
    pub fn load_entry(&mut self, id: &str) -> RepositoryResult<()> {
        let form = {
            let store = self.lock_store()?;
            let entry = store
                .get(id)
                .ok_or_else(|| RepositoryError::history_not_found(id))?;
            FormState::from_entry(entry)
        };

        self.form = form;
        self.editing_id = Some(id.to_string());
        self.auto_save_id = None;
        self.last_save_time = None;
        // 载入的内容与已保存内容一致
        self.has_unsaved_changes = false;
        self.skip_next_auto_save = false;

        self.persist_form();
        self.persist_ids();
        debug!(id = %id, "进入编辑模式");
        Ok(())
    }

    /// 清空表单并退出编辑模式
    pub fn clear_form(&mut self) {
        self.form = FormState::default();
        self.editing_id = None;
        self.has_unsaved_changes = false;
        self.clear_save_state();
        self.persist_form();
    }

    /// 清除自动保存ID与上次保存时间
    pub fn clear_save_state(&mut self) {
        self.auto_save_id = None;
        self.last_save_time = None;
        self.persist_ids();
    }

    /// 记录已被删除时解除关联
    pub fn forget_entry(&mut self, id: &str) {
        let mut changed = false;
        if self.editing_id.as_deref() == Some(id) {
            self.editing_id = None;
            changed = true;
        }
        if self.auto_save_id.as_deref() == Some(id) {
            self.auto_save_id = None;
            self.last_save_time = None;
            changed = true;
        }
        if changed {
            self.persist_ids();
        }
    }

    // ==========================================
    // 保存操作
    // ==========================================

    /// 手动保存，返回保存的记录ID
    pub fn save(&mut self) -> Option<String> {
        if !self.form.has_user_content() {
            self.notifier.notify(
                Notification::warning("无法保存空表单")
                    .with_description("请至少填写一个字段或模型信息"),
            );
            return None;
        }

        let was_editing = self.is_editing();
        let id = self.perform_save(SaveKind::Manual)?;

        // 手动保存后抑制一次自动保存
        self.skip_next_auto_save = true;

        let title = if was_editing {
            "计算记录已更新"
        } else {
            "计算记录已保存"
        };
        let fallback = if was_editing { "修改已保存" } else { "已加入历史" };
        let description = non_empty(&self.form.model_name).unwrap_or_else(|| fallback.to_string());
        self.notifier
            .notify(Notification::success(title).with_description(description));
        self.report_persist_error();

        Some(id)
    }

    /// 保存并新建：保存当前表单后重置为空白表单
    pub fn save_and_new(&mut self) -> Option<String> {
        let id = self.save()?;

        self.form = FormState::default();
        self.editing_id = None;
        self.auto_save_id = None;
        self.last_save_time = None;
        self.has_unsaved_changes = false;
        self.skip_next_auto_save = true;

        self.persist_form();
        self.persist_ids();
        debug!(id = %id, "保存并新建");
        Some(id)
    }

    /// 自动保存（防抖回调），返回保存的记录ID
    pub fn auto_save(&mut self) -> Option<String> {
        if self.initial_render {
            self.initial_render = false;
            debug!("首次渲染，跳过自动保存");
            return None;
        }

        if self.skip_next_auto_save {
            self.skip_next_auto_save = false;
            debug!("手动保存后跳过一次自动保存");
            return None;
        }

        if !self.has_unsaved_changes || !self.form.has_user_content() {
            return None;
        }

        let id = self.perform_save(SaveKind::Auto)?;
        debug!(id = %id, "自动保存完成");
        Some(id)
    }

    // ==========================================
    // 内部方法
    // ==========================================

    /// 统一保存路径: 目标ID = 编辑ID 或 自动保存ID
    fn perform_save(&mut self, kind: SaveKind) -> Option<String> {
        if self.is_saving {
            debug!(kind = ?kind, "保存进行中，忽略重复保存");
            return None;
        }
        self.is_saving = true;

        let content = self.entry_content();
        let target = self.editing_id.clone().or_else(|| self.auto_save_id.clone());

        let result = self
            .lock_store()
            .map(|mut store| store.upsert(target.as_deref(), content));

        self.is_saving = false;

        match result {
            Ok(id) => {
                if self.editing_id.is_none() {
                    self.auto_save_id = Some(id.clone());
                }
                self.last_save_time = Some(self.clock.now_millis());
                self.has_unsaved_changes = false;
                self.persist_ids();
                Some(id)
            }
            Err(e) => {
                warn!(kind = ?kind, error = %e, "保存失败");
                if kind == SaveKind::Manual {
                    self.notifier
                        .notify(Notification::danger("保存失败").with_description(e.to_string()));
                }
                None
            }
        }
    }

    fn entry_content(&self) -> EntryContent {
        EntryContent {
            parameters: self.form.parameters.clone(),
            breakdown: self.breakdown(),
            note: non_empty(&self.form.note),
            model_name: non_empty(&self.form.model_name),
            model_link: non_empty(&self.form.model_link),
        }
    }

    fn lock_store(&self) -> RepositoryResult<MutexGuard<'_, HistoryStore>> {
        self.store
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn entry_exists(&self, id: &str) -> bool {
        self.lock_store().map(|s| s.contains(id)).unwrap_or(false)
    }

    fn report_persist_error(&self) {
        let reason = self
            .lock_store()
            .ok()
            .and_then(|s| s.last_persist_error().map(str::to_string));
        if let Some(reason) = reason {
            self.notifier.notify(
                Notification::warning("已保存，但写入本地存储失败").with_description(reason),
            );
        }
    }

    fn persist_form(&self) {
        let info = ModelInfo {
            model_name: self.form.model_name.clone(),
            model_link: self.form.model_link.clone(),
        };
        let result = self
            .drafts
            .save_parameters(&self.form.parameters)
            .and_then(|_| self.drafts.save_model_info(&info))
            .and_then(|_| self.drafts.save_note(&self.form.note));
        if let Err(e) = result {
            warn!(error = %e, "表单草稿写入失败");
        }
    }

    fn persist_ids(&self) {
        let result = self
            .drafts
            .save_editing_id(self.editing_id.as_deref())
            .and_then(|_| self.drafts.save_auto_save_id(self.auto_save_id.as_deref()))
            .and_then(|_| self.drafts.save_last_save_time(self.last_save_time));
        if let Err(e) = result {
            warn!(error = %e, "保存状态写入失败");
        }
    }
}
