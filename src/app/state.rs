// ==========================================
// BOM 生产引擎 - 应用状态
// ==========================================
// 职责: 管理共享连接与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{CatalogApi, ProductionApi, StockApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};

/// 应用状态
///
/// 所有 API 共享同一个连接,生产与手工出入库经由该连接串行化
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub catalog_api: Arc<CatalogApi>,
    pub production_api: Arc<ProductionApi>,
    pub stock_api: Arc<StockApi>,
    pub config_manager: Arc<ConfigManager>,

    conn: Arc<Mutex<Connection>>,
}

impl AppState {
    /// 打开数据库、确保表结构存在、创建全部 API 实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库表结构初始化失败: {}", e))?;

        Ok(Self::from_connection(db_path, Arc::new(Mutex::new(conn))))
    }

    /// 基于已初始化的连接创建（测试使用）
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Self {
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));

        Self {
            db_path,
            catalog_api: Arc::new(CatalogApi::new(conn.clone())),
            production_api: Arc::new(ProductionApi::new(conn.clone(), config_manager.clone())),
            stock_api: Arc::new(StockApi::new(conn.clone(), config_manager.clone())),
            config_manager,
            conn,
        }
    }

    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 BOM_ENGINE_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("BOM_ENGINE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./bom_engine.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("bom-engine");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("bom_engine.db");
        }
    }

    path.to_string_lossy().to_string()
}
