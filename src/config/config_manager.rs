// ==========================================
// BOM 生产引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config::{EngineConfig, MAX_STOCK_TOLERANCE};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 全局配置作用域
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式,按 key 排序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::Other(anyhow::Error::new(e)))
    }

    /// 加载引擎运行参数
    ///
    /// 缺省或格式错误的配置项回退到默认值（格式错误时告警）
    pub fn load_engine_config(&self) -> RepositoryResult<EngineConfig> {
        let defaults = EngineConfig::default();

        let warehouse_label = self
            .get_global_config_value(config_keys::WAREHOUSE_LABEL)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.warehouse_label);

        let line_label = self
            .get_global_config_value(config_keys::LINE_LABEL)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.line_label);

        let stock_tolerance = match self.get_global_config_value(config_keys::STOCK_TOLERANCE)? {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v > MAX_STOCK_TOLERANCE => {
                    tracing::warn!(
                        config_key = config_keys::STOCK_TOLERANCE,
                        raw_value = %raw,
                        max = MAX_STOCK_TOLERANCE,
                        "库存误差超过库存下限约束，按上限截断"
                    );
                    MAX_STOCK_TOLERANCE
                }
                Ok(v) if v.is_finite() && v >= 0.0 => v,
                _ => {
                    tracing::warn!(
                        config_key = config_keys::STOCK_TOLERANCE,
                        raw_value = %raw,
                        "库存误差配置格式错误，使用默认值"
                    );
                    defaults.stock_tolerance
                }
            },
            None => defaults.stock_tolerance,
        };

        Ok(EngineConfig {
            warehouse_label,
            line_label,
            stock_tolerance,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 流水标签
    pub const WAREHOUSE_LABEL: &str = "production.warehouse_label";
    pub const LINE_LABEL: &str = "production.line_label";

    // 库存误差
    pub const STOCK_TOLERANCE: &str = "engine.stock_tolerance";
}
