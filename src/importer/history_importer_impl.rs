// ==========================================
// 3D 打印成本计算器 - 历史导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到历史存储
// 流程: 扩展名检查 → 读取 → 解析/校验 → 批内去重 → 重复预览 → （确认）合并 → 落库
// 红线: 同一时刻只允许一个导入；失败不修改现有历史
// ==========================================

use crate::clock::Clock;
use crate::domain::calculation::HistoryEntry;
use crate::domain::types::MergeStrategy;
use crate::importer::conflict_handler::ConflictHandler;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::history_importer_trait::{HistoryImporter, ImportPreview, ImportSummary};
use crate::notification::{Notification, Notifier};
use crate::repository::error::RepositoryError;
use crate::repository::history_repo::{HistoryStore, SharedHistoryStore};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// 待确认的导入
struct PendingImport {
    preview: ImportPreview,
    entries: Vec<HistoryEntry>,
}

/// 单飞标记（离开作用域自动释放）
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> ImportResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ImportError::ImportInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ==========================================
// HistoryImporterImpl - 历史导入器实现
// ==========================================
pub struct HistoryImporterImpl {
    store: SharedHistoryStore,
    file_parser: UniversalFileParser,
    conflict_handler: ConflictHandler,
    notifier: Arc<dyn Notifier>,

    in_flight: AtomicBool,
    pending: Mutex<Option<PendingImport>>,
}

impl HistoryImporterImpl {
    pub fn new(
        store: SharedHistoryStore,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            file_parser: UniversalFileParser::new(clock),
            conflict_handler: ConflictHandler,
            notifier,
            in_flight: AtomicBool::new(false),
            pending: Mutex::new(None),
        }
    }

    /// 是否有导入正在进行
    pub fn is_importing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    async fn prepare_inner(&self, file_path: &Path) -> ImportResult<ImportPreview> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        let start = Instant::now();

        // 扩展名检查先于读取
        let parser = self.file_parser.parser_for(file_path)?;
        let format = parser.format();

        let content = tokio::fs::read(file_path).await?;
        let parsed = parser.parse(&content)?;

        let batch_dups = self.conflict_handler.detect_batch_duplicates(&parsed);
        if !batch_dups.is_empty() {
            warn!(count = batch_dups.len(), "导入文件内存在重复ID，保留首次出现");
        }
        let entries = self.conflict_handler.dedupe_batch(parsed);

        let summary = {
            let store = self.lock_store()?;
            self.conflict_handler.detect_duplicates(store.list(), &entries)
        };

        let preview = ImportPreview {
            source: file_path.to_path_buf(),
            format,
            total: entries.len(),
            duplicates: summary.duplicates,
            new_entries: summary.new_entries,
        };

        let mut pending = self
            .pending
            .lock()
            .map_err(|e| ImportError::InternalError(e.to_string()))?;
        if pending.is_some() {
            debug!("覆盖尚未确认的导入");
        }
        *pending = Some(PendingImport {
            preview: preview.clone(),
            entries,
        });

        info!(
            file = %file_path.display(),
            format = %format,
            total = preview.total,
            duplicates = preview.duplicates,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "导入预览完成"
        );
        Ok(preview)
    }

    async fn commit_inner(&self, strategy: MergeStrategy) -> ImportResult<ImportSummary> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let pending = self
            .pending
            .lock()
            .map_err(|e| ImportError::InternalError(e.to_string()))?
            .take()
            .ok_or(ImportError::NoPendingImport)?;

        let mut store = self.lock_store()?;
        let incoming = pending.entries.len();
        // 预览之后历史可能已变化，按当前状态重新统计
        let duplicates = self
            .conflict_handler
            .detect_duplicates(store.list(), &pending.entries)
            .duplicates;

        let merged = self
            .conflict_handler
            .reconcile(store.list(), pending.entries, strategy);

        let skipped = match strategy {
            MergeStrategy::Skip => duplicates,
            MergeStrategy::Replace | MergeStrategy::Update => 0,
        };

        store.replace_all(merged);

        let summary = ImportSummary {
            strategy,
            imported: incoming - skipped,
            skipped,
            total_after: store.len(),
        };

        if let Some(reason) = store.last_persist_error() {
            self.notifier.notify(
                Notification::warning("导入完成，但本地保存失败").with_description(reason),
            );
        }

        info!(
            strategy = %strategy,
            imported = summary.imported,
            skipped = summary.skipped,
            total_after = summary.total_after,
            "导入合并完成"
        );
        Ok(summary)
    }

    fn lock_store(&self) -> ImportResult<MutexGuard<'_, HistoryStore>> {
        self.store
            .lock()
            .map_err(|e| ImportError::from(RepositoryError::LockError(e.to_string())))
    }

    fn notify_failure(&self, err: &ImportError) {
        let notification = match err {
            ImportError::ImportInProgress => Notification::warning("导入正在进行，请稍候"),
            _ => Notification::danger("导入失败").with_description(err.to_string()),
        };
        self.notifier.notify(notification);
    }
}

#[async_trait::async_trait]
impl HistoryImporter for HistoryImporterImpl {
    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    async fn prepare_import(&self, file_path: &Path) -> ImportResult<ImportPreview> {
        let result = self.prepare_inner(file_path).await;
        if let Err(e) = &result {
            warn!(error = %e, "导入预览失败");
            self.notify_failure(e);
        }
        result
    }

    #[instrument(skip(self))]
    async fn commit_import(&self, strategy: MergeStrategy) -> ImportResult<ImportSummary> {
        let result = self.commit_inner(strategy).await;
        match &result {
            Ok(summary) => {
                let description = match summary.skipped {
                    0 => format!("已导入 {} 条记录", summary.imported),
                    n => format!("已导入 {} 条记录，跳过 {} 条重复记录", summary.imported, n),
                };
                self.notifier
                    .notify(Notification::success("导入成功").with_description(description));
            }
            Err(e) => {
                warn!(error = %e, "导入提交失败");
                self.notify_failure(e);
            }
        }
        result
    }

    fn cancel_import(&self) -> bool {
        match self.pending.lock() {
            Ok(mut pending) => pending.take().is_some(),
            Err(_) => false,
        }
    }

    fn pending_preview(&self) -> Option<ImportPreview> {
        self.pending
            .lock()
            .ok()
            .and_then(|p| p.as_ref().map(|p| p.preview.clone()))
    }
}
