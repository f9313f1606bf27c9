// ==========================================
// 3D 打印成本计算器 - 用户通知
// ==========================================
// 职责: 操作结果提示（保存 / 导入 / 导出）
// 实现: TracingNotifier 写日志，RecordingNotifier 收集（测试用）
// ==========================================

use crate::domain::types::Severity;
use serde::Serialize;
use std::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub severity: Severity,
}

impl Notification {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            severity: Severity::Success,
        }
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            severity: Severity::Warning,
        }
    }

    pub fn danger(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            severity: Severity::Danger,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// 通知出口
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// 日志通知
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        let description = n.description.as_deref().unwrap_or("");
        match n.severity {
            Severity::Success => info!(title = %n.title, description, "通知"),
            Severity::Warning => warn!(title = %n.title, description, "通知"),
            Severity::Danger => error!(title = %n.title, description, "通知"),
        }
    }
}

/// 收集通知（测试用）
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.received
            .lock()
            .ok()
            .and_then(|list| list.last().cloned())
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.received
            .lock()
            .map(|list| list.iter().filter(|n| n.severity == severity).count())
            .unwrap_or(0)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut list) = self.received.lock() {
            list.push(notification);
        }
    }
}
