// ==========================================
// BOM 生产引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 + busy_timeout）
// - 提供幂等建表,Catalog 与审计台账共用一个库
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建表语句（幂等）
///
/// 说明：
/// - preferred_recipe 为“产品 → 默认配方”的显式映射，自动展开只认这张表
/// - recipe_item.seq_no 保存明细录入顺序，解析按此顺序遍历
/// - stock_movement.signed_quantity 入库为正、出库为负；按 rowid 保持追加顺序
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS product (
    product_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    unit TEXT NOT NULL DEFAULT 'pcs',
    kind TEXT NOT NULL CHECK (kind IN ('RAW', 'INTERMEDIATE', 'FINISHED')),
    on_hand_quantity REAL NOT NULL DEFAULT 0 CHECK (on_hand_quantity >= -0.000001),
    reorder_threshold REAL NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS recipe (
    recipe_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    line_label TEXT,
    target_product_id TEXT REFERENCES product(product_id),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS recipe_item (
    recipe_id TEXT NOT NULL REFERENCES recipe(recipe_id) ON DELETE CASCADE,
    product_id TEXT NOT NULL REFERENCES product(product_id),
    quantity_per_unit REAL NOT NULL CHECK (quantity_per_unit > 0),
    note TEXT,
    seq_no INTEGER NOT NULL,
    UNIQUE (recipe_id, product_id)
);

CREATE TABLE IF NOT EXISTS preferred_recipe (
    product_id TEXT PRIMARY KEY REFERENCES product(product_id),
    recipe_id TEXT NOT NULL REFERENCES recipe(recipe_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS production_record (
    production_id TEXT PRIMARY KEY,
    recipe_id TEXT NOT NULL REFERENCES recipe(recipe_id),
    quantity REAL NOT NULL,
    actor TEXT NOT NULL,
    produced_at TEXT NOT NULL,
    note TEXT
);

CREATE TABLE IF NOT EXISTS production_consumption (
    consumption_id INTEGER PRIMARY KEY AUTOINCREMENT,
    production_id TEXT NOT NULL REFERENCES production_record(production_id),
    product_id TEXT NOT NULL REFERENCES product(product_id),
    quantity REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS stock_movement (
    movement_id TEXT PRIMARY KEY,
    product_id TEXT NOT NULL REFERENCES product(product_id),
    signed_quantity REAL NOT NULL,
    kind TEXT NOT NULL,
    source_label TEXT NOT NULL,
    destination_label TEXT NOT NULL,
    actor TEXT NOT NULL,
    moved_at TEXT NOT NULL,
    production_id TEXT REFERENCES production_record(production_id),
    note TEXT
);

CREATE INDEX IF NOT EXISTS idx_recipe_target ON recipe(target_product_id);
CREATE INDEX IF NOT EXISTS idx_consumption_production ON production_consumption(production_id);
CREATE INDEX IF NOT EXISTS idx_movement_product ON stock_movement(product_id);
CREATE INDEX IF NOT EXISTS idx_movement_production ON stock_movement(production_id);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化 schema（幂等）并写入 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
