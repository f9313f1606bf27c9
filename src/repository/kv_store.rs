// ==========================================
// 3D 打印成本计算器 - 本地键值存储
// ==========================================
// 职责: 持久化端口（load / save 整块字符串）
// 实现: SqliteKvStore（落盘） / MemoryKvStore（进程内，测试替身）
// 红线: 整块写入，读者只会看到写前或写后快照
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// KvStore Trait
// ==========================================
// 用途: 历史存储 / 草稿仓储的注入式持久化依赖
pub trait KvStore: Send + Sync {
    /// 读取键值（不存在返回 None）
    fn get(&self, key: &str) -> RepositoryResult<Option<String>>;

    /// 写入键值（覆盖）
    fn set(&self, key: &str, value: &str) -> RepositoryResult<()>;

    /// 删除键（不存在时无操作）
    fn remove(&self, key: &str) -> RepositoryResult<()>;
}

// ==========================================
// SqliteKvStore - SQLite 键值存储
// ==========================================
pub struct SqliteKvStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKvStore {
    /// 从已有连接创建（表需已由 db::ensure_schema 建好）
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// ==========================================
// MemoryKvStore - 内存键值存储
// ==========================================
#[derive(Default)]
pub struct MemoryKvStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_data(&self) -> RepositoryResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.data
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> RepositoryResult<Option<String>> {
        Ok(self.get_data()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> RepositoryResult<()> {
        self.get_data()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> RepositoryResult<()> {
        self.get_data()?.remove(key);
        Ok(())
    }
}
