// ==========================================
// 3D 打印成本计算器 - 防抖调度器
// ==========================================
// 职责: 单槽延迟任务（再次调度 = 取消旧任务 + 重新计时）
// 约定: 任务在触发时读取共享状态，而不是调度时捕获的快照
// 依赖: 需在 tokio 运行时内调用 schedule
// ==========================================

use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

pub struct Debouncer {
    delay: Duration,
    slot: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 调度任务；静默期内再次调度会取消上一个任务
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });

        if let Ok(mut slot) = self.slot.lock() {
            if let Some(previous) = slot.replace(handle) {
                if !previous.is_finished() {
                    trace!("取消尚未触发的防抖任务");
                }
                previous.abort();
            }
        }
    }

    /// 取消待触发任务，返回是否确有任务被取消
    pub fn cancel(&self) -> bool {
        match self.slot.lock() {
            Ok(mut slot) => match slot.take() {
                Some(handle) => {
                    let pending = !handle.is_finished();
                    handle.abort();
                    pending
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}
