// ==========================================
// 3D 打印成本计算器 - 自动保存控制器
// ==========================================
// 职责: 表单变更 → 防抖调度 → SaveManager::auto_save
// 约定: 触发时读取 SaveManager 的最新表单，静默期内只触发一次
// ==========================================

use crate::app::debouncer::Debouncer;
use crate::app::save_manager::SaveManager;
use crate::domain::calculation::FormState;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

pub struct AutoSaveController {
    manager: Arc<Mutex<SaveManager>>,
    debouncer: Debouncer,
}

impl AutoSaveController {
    pub fn new(manager: Arc<Mutex<SaveManager>>, delay: Duration) -> Self {
        Self {
            manager,
            debouncer: Debouncer::new(delay),
        }
    }

    pub fn manager(&self) -> Arc<Mutex<SaveManager>> {
        self.manager.clone()
    }

    /// 首次渲染：同样经过防抖，触发时由 SaveManager 跳过
    pub fn on_initial_render(&self) {
        self.schedule();
    }

    /// 表单内容变更
    pub fn on_content_changed(&self, form: FormState) {
        match self.manager.lock() {
            Ok(mut manager) => manager.set_form(form),
            Err(e) => {
                warn!(error = %e, "保存管理器锁获取失败，忽略本次变更");
                return;
            }
        }
        self.schedule();
    }

    /// 取消尚未触发的自动保存（退出 / 载入其他记录前调用）
    pub fn cancel_pending(&self) -> bool {
        self.debouncer.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    fn schedule(&self) {
        let manager = self.manager.clone();
        self.debouncer.schedule(move || match manager.lock() {
            Ok(mut manager) => {
                manager.auto_save();
            }
            Err(e) => warn!(error = %e, "保存管理器锁获取失败，跳过自动保存"),
        });
    }
}
