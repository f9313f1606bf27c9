// ==========================================
// 3D 打印成本计算器 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 红线: 配置值格式错误 → 记录告警并使用默认值
// ==========================================

use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 配置作用域（当前只有 global）
pub const GLOBAL_SCOPE: &str = "global";

// ==========================================
// AppConfig - 配置快照（带默认值）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub auto_save_delay_ms: u64,
    pub currency_symbol: String,
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auto_save_delay_ms: defaults::AUTO_SAVE_DELAY_MS,
            currency_symbol: defaults::CURRENCY_SYMBOL.to_string(),
            export_dir: default_export_dir(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有 global 配置的快照（JSON 格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 自动保存 =====

    /// 自动保存防抖延迟（毫秒，默认 2000）
    pub fn get_auto_save_delay_ms(&self) -> Result<u64, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::AUTO_SAVE_DELAY_MS,
            &defaults::AUTO_SAVE_DELAY_MS.to_string(),
        )?;
        Ok(value.trim().parse::<u64>().unwrap_or_else(|_| {
            warn!(
                config_key = config_keys::AUTO_SAVE_DELAY_MS,
                raw_value = %value,
                "自动保存延迟配置格式错误，使用默认值"
            );
            defaults::AUTO_SAVE_DELAY_MS
        }))
    }

    // ===== 展示 =====

    /// 货币符号（默认 ₴）
    pub fn get_currency_symbol(&self) -> Result<String, Box<dyn Error>> {
        let value =
            self.get_config_or_default(config_keys::CURRENCY_SYMBOL, defaults::CURRENCY_SYMBOL)?;
        if value.trim().is_empty() {
            return Ok(defaults::CURRENCY_SYMBOL.to_string());
        }
        Ok(value)
    }

    // ===== 导出 =====

    /// 导出目录（默认当前目录）
    pub fn get_export_dir(&self) -> Result<PathBuf, Box<dyn Error>> {
        match self.get_global_config_value(config_keys::EXPORT_DIR)? {
            Some(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir.trim())),
            _ => Ok(default_export_dir()),
        }
    }

    /// 读取全部配置（带默认值）
    pub fn load_app_config(&self) -> Result<AppConfig, Box<dyn Error>> {
        Ok(AppConfig {
            auto_save_delay_ms: self.get_auto_save_delay_ms()?,
            currency_symbol: self.get_currency_symbol()?,
            export_dir: self.get_export_dir()?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const AUTO_SAVE_DELAY_MS: &str = "auto_save_delay_ms";
    pub const CURRENCY_SYMBOL: &str = "currency_symbol";
    pub const EXPORT_DIR: &str = "export_dir";
}

pub mod defaults {
    pub const AUTO_SAVE_DELAY_MS: u64 = 2_000;
    pub const CURRENCY_SYMBOL: &str = "₴";
}
