// ==========================================
// 3D 打印成本计算器 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态（进程启动时构造一次，按引用传递）
// 组成: SQLite 连接 → KvStore → 历史存储 / 草稿 / 配置 / 保存管理器 / 导入器
// ==========================================

use crate::app::auto_save::AutoSaveController;
use crate::app::save_manager::SaveManager;
use crate::clock::{Clock, SystemClock};
use crate::config::config_manager::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::domain::calculation::HistoryEntry;
use crate::domain::types::ExportFormat;
use crate::engine::PricingEngine;
use crate::exporter;
use crate::importer::HistoryImporterImpl;
use crate::notification::{Notification, Notifier, TracingNotifier};
use crate::repository::draft_repo::DraftRepository;
use crate::repository::history_repo::{HistoryStore, SharedHistoryStore};
use crate::repository::kv_store::{KvStore, SqliteKvStore};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// 应用状态
///
/// 包含所有共享资源，CLI 与测试共用同一套装配
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 本地键值存储（历史整块 + 草稿分键）
    pub kv: Arc<dyn KvStore>,

    /// 计算历史
    pub history: SharedHistoryStore,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 定价引擎
    pub engine: PricingEngine,

    /// 当前表单会话
    pub save_manager: Arc<Mutex<SaveManager>>,

    /// 历史导入器
    pub importer: Arc<HistoryImporterImpl>,

    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        Self::with_parts(
            db_path,
            conn,
            Arc::new(SystemClock),
            Arc::new(TracingNotifier),
        )
    }

    /// 由已有连接与外部协作者装配（测试注入固定时钟 / 记录型通知）
    pub fn with_parts(
        db_path: String,
        conn: Connection,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, String> {
        ensure_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let version = read_schema_version(&conn)
            .map_err(|e| format!("读取数据库版本失败: {}", e))?
            .unwrap_or(CURRENT_SCHEMA_VERSION);
        if version > CURRENT_SCHEMA_VERSION {
            return Err(format!(
                "数据库版本 {} 高于当前支持的版本 {}",
                version, CURRENT_SCHEMA_VERSION
            ));
        }
        tracing::debug!(schema_version = version, "数据库版本检查通过");
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let kv: Arc<dyn KvStore> = Arc::new(SqliteKvStore::new(conn.clone()));
        let history: SharedHistoryStore =
            Arc::new(Mutex::new(HistoryStore::load(kv.clone(), clock.clone())));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化会话与导入
        // ==========================================
        let save_manager = Arc::new(Mutex::new(SaveManager::restore(
            history.clone(),
            DraftRepository::new(kv.clone()),
            notifier.clone(),
            clock.clone(),
        )));

        let importer = Arc::new(HistoryImporterImpl::new(
            history.clone(),
            clock.clone(),
            notifier.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            kv,
            history,
            config_manager,
            engine: PricingEngine::new(),
            save_manager,
            importer,
            clock,
            notifier,
        })
    }

    /// 内存数据库（测试 / 无需持久化的命令）
    pub fn in_memory(clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Result<Self, String> {
        let conn = Connection::open_in_memory().map_err(|e| format!("无法打开数据库: {}", e))?;
        Self::with_parts(":memory:".to_string(), conn, clock, notifier)
    }

    /// 按配置的延迟创建自动保存控制器
    pub fn auto_save_controller(&self) -> AutoSaveController {
        let delay_ms = self.config_manager.get_auto_save_delay_ms().unwrap_or_else(|e| {
            tracing::warn!("读取自动保存延迟失败，使用默认值: {}", e);
            crate::config::defaults::AUTO_SAVE_DELAY_MS
        });
        AutoSaveController::new(self.save_manager.clone(), Duration::from_millis(delay_ms))
    }

    // ==========================================
    // 历史操作（带用户通知）
    // ==========================================

    /// 当前历史快照（展示顺序）
    pub fn history_snapshot(&self) -> Result<Vec<HistoryEntry>, String> {
        Ok(self.lock_history()?.list().to_vec())
    }

    /// 清空历史（保留置顶），返回删除条数
    pub fn clear_history(&self) -> Result<usize, String> {
        let (removed, kept) = {
            let mut history = self.lock_history()?;
            let removed = history.clear_all();
            (removed, history.len())
        };

        if let Ok(mut manager) = self.save_manager.lock() {
            manager.clear_save_state();
        }

        let description = match kept {
            0 => format!("已删除 {} 条记录", removed),
            n => format!("已删除 {} 条记录，保留 {} 条置顶记录", removed, n),
        };
        self.notifier
            .notify(Notification::success("历史已清空").with_description(description));
        Ok(removed)
    }

    /// 删除单条记录
    pub fn delete_entry(&self, id: &str) -> Result<bool, String> {
        let removed = self.lock_history()?.delete(id);
        if removed {
            if let Ok(mut manager) = self.save_manager.lock() {
                manager.forget_entry(id);
            }
        }
        Ok(removed)
    }

    /// 切换置顶，返回新状态
    pub fn toggle_pin(&self, id: &str) -> Result<bool, String> {
        self.lock_history()?
            .toggle_pin(id)
            .map_err(|e| e.to_string())
    }

    /// 导出历史到目录（缺省为配置的导出目录），返回文件路径
    pub fn export_history(&self, format: ExportFormat, dir: Option<&Path>) -> Result<PathBuf, String> {
        let dir = match dir {
            Some(d) => d.to_path_buf(),
            None => self
                .config_manager
                .get_export_dir()
                .map_err(|e| format!("读取导出目录失败: {}", e))?,
        };
        let entries = self.history_snapshot()?;

        match exporter::write_export(&dir, format, &entries) {
            Ok(path) => {
                self.notifier.notify(
                    Notification::success("导出成功")
                        .with_description(format!("{} 条记录 → {}", entries.len(), path.display())),
                );
                Ok(path)
            }
            Err(e) => {
                self.notifier
                    .notify(Notification::danger("导出失败").with_description(e.to_string()));
                Err(e.to_string())
            }
        }
    }

    fn lock_history(&self) -> Result<MutexGuard<'_, HistoryStore>, String> {
        self.history.lock().map_err(|e| format!("锁获取失败: {}", e))
    }
}

/// 获取默认数据库路径
///
/// 优先级: WORTHIT3D_DB_PATH 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("WORTHIT3D_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./worthit3d.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("worthit3d");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("worthit3d.db");
        }
    }

    path.to_string_lossy().to_string()
}
