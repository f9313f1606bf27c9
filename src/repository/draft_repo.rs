// ==========================================
// 3D 打印成本计算器 - 草稿状态仓储
// ==========================================
// 职责: 未保存表单的分键持久化（刷新/重启后恢复）
// 键: 参数集 / 模型信息 / 备注 / 编辑ID / 自动保存ID / 上次保存时间
// 红线: 读取容错（缺失或损坏 → 默认值），不影响已提交历史
// ==========================================

use crate::domain::calculation::ParameterSet;
use crate::repository::error::RepositoryResult;
use crate::repository::kv_store::KvStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

pub mod keys {
    pub const CURRENT_STATE: &str = "current-calculator-state";
    pub const CURRENT_MODEL: &str = "current-model-info";
    pub const CURRENT_NOTE: &str = "current-note";
    pub const EDITING_ID: &str = "current-editing-id";
    pub const AUTO_SAVE_ID: &str = "current-auto-save-id";
    pub const LAST_SAVE_TIME: &str = "last-save-time";
}

/// 当前模型信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub model_link: String,
}

// ==========================================
// DraftRepository - 草稿状态仓储
// ==========================================
pub struct DraftRepository {
    kv: Arc<dyn KvStore>,
}

impl DraftRepository {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    // ===== 参数集 =====

    pub fn load_parameters(&self) -> ParameterSet {
        self.load_json(keys::CURRENT_STATE).unwrap_or_default()
    }

    pub fn save_parameters(&self, params: &ParameterSet) -> RepositoryResult<()> {
        self.save_json(keys::CURRENT_STATE, params)
    }

    // ===== 模型信息 =====

    pub fn load_model_info(&self) -> ModelInfo {
        self.load_json(keys::CURRENT_MODEL).unwrap_or_default()
    }

    pub fn save_model_info(&self, info: &ModelInfo) -> RepositoryResult<()> {
        self.save_json(keys::CURRENT_MODEL, info)
    }

    // ===== 备注 =====

    pub fn load_note(&self) -> String {
        self.load_raw(keys::CURRENT_NOTE).unwrap_or_default()
    }

    pub fn save_note(&self, note: &str) -> RepositoryResult<()> {
        self.save_optional(keys::CURRENT_NOTE, Some(note).filter(|n| !n.is_empty()))
    }

    // ===== 编辑 / 自动保存 ID =====

    pub fn load_editing_id(&self) -> Option<String> {
        self.load_raw(keys::EDITING_ID).filter(|v| !v.is_empty())
    }

    pub fn save_editing_id(&self, id: Option<&str>) -> RepositoryResult<()> {
        self.save_optional(keys::EDITING_ID, id)
    }

    pub fn load_auto_save_id(&self) -> Option<String> {
        self.load_raw(keys::AUTO_SAVE_ID).filter(|v| !v.is_empty())
    }

    pub fn save_auto_save_id(&self, id: Option<&str>) -> RepositoryResult<()> {
        self.save_optional(keys::AUTO_SAVE_ID, id)
    }

    // ===== 上次保存时间 =====

    pub fn load_last_save_time(&self) -> Option<i64> {
        self.load_raw(keys::LAST_SAVE_TIME)
            .and_then(|v| v.trim().parse::<i64>().ok())
    }

    pub fn save_last_save_time(&self, millis: Option<i64>) -> RepositoryResult<()> {
        let value = millis.map(|m| m.to_string());
        self.save_optional(keys::LAST_SAVE_TIME, value.as_deref())
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn load_raw(&self, key: &str) -> Option<String> {
        match self.kv.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = key, error = %e, "草稿状态读取失败");
                None
            }
        }
    }

    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.load_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = key, error = %e, "草稿状态数据损坏，使用默认值");
                None
            }
        }
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> RepositoryResult<()> {
        let raw = serde_json::to_string(value)?;
        self.kv.set(key, &raw)
    }

    /// None → 删除键
    fn save_optional(&self, key: &str, value: Option<&str>) -> RepositoryResult<()> {
        match value {
            Some(v) => self.kv.set(key, v),
            None => self.kv.remove(key),
        }
    }
}
