// ==========================================
// BOM 生产引擎 - 审计台账查询仓储
// ==========================================
// 红线: 只读; 写入统一走 StockLedgerWriter
// ==========================================

use crate::domain::production::{ProductionConsumption, ProductionRecord, StockMovement};
use crate::domain::types::MovementKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::mapping::{
    map_consumption_row, map_movement_row, map_production_row, MOVEMENT_COLUMNS,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// AuditLedgerRepository - 审计台账仓储
// ==========================================
pub struct AuditLedgerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLedgerRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按ID查询生产记录
    pub fn find_production(&self, production_id: &str) -> RepositoryResult<Option<ProductionRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                r#"
                SELECT production_id, recipe_id, quantity, actor, produced_at, note
                FROM production_record WHERE production_id = ?1
                "#,
                params![production_id],
                map_production_row,
            )
            .optional()?;
        Ok(record)
    }

    /// 查询配方的生产记录（最新在前）
    pub fn list_productions_by_recipe(&self, recipe_id: &str) -> RepositoryResult<Vec<ProductionRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT production_id, recipe_id, quantity, actor, produced_at, note
            FROM production_record WHERE recipe_id = ?1
            ORDER BY produced_at DESC, rowid DESC
            "#,
        )?;
        let records = stmt
            .query_map(params![recipe_id], map_production_row)?
            .collect::<rusqlite::Result<Vec<ProductionRecord>>>()?;
        Ok(records)
    }

    /// 查询一次生产的扣料明细（按写入顺序）
    pub fn list_consumptions(&self, production_id: &str) -> RepositoryResult<Vec<ProductionConsumption>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT production_id, product_id, quantity
            FROM production_consumption WHERE production_id = ?1
            ORDER BY consumption_id
            "#,
        )?;
        let lines = stmt
            .query_map(params![production_id], map_consumption_row)?
            .collect::<rusqlite::Result<Vec<ProductionConsumption>>>()?;
        Ok(lines)
    }

    /// 查询一次生产产生的库存流水（按写入顺序）
    pub fn list_movements_by_production(&self, production_id: &str) -> RepositoryResult<Vec<StockMovement>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM stock_movement WHERE production_id = ?1 ORDER BY rowid",
            MOVEMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let movements = stmt
            .query_map(params![production_id], map_movement_row)?
            .collect::<rusqlite::Result<Vec<StockMovement>>>()?;
        Ok(movements)
    }

    /// 查询产品最近的库存流水（最新在前）
    pub fn list_movements_by_product(&self, product_id: &str, limit: usize) -> RepositoryResult<Vec<StockMovement>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM stock_movement WHERE product_id = ?1 ORDER BY rowid DESC LIMIT ?2",
            MOVEMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let movements = stmt
            .query_map(params![product_id, limit as i64], map_movement_row)?
            .collect::<rusqlite::Result<Vec<StockMovement>>>()?;
        Ok(movements)
    }

    /// 产品累计入库数量
    pub fn total_in(&self, product_id: &str) -> RepositoryResult<f64> {
        self.sum_by_direction(product_id, true)
    }

    /// 产品累计出库数量（正数）
    pub fn total_out(&self, product_id: &str) -> RepositoryResult<f64> {
        self.sum_by_direction(product_id, false)
    }

    fn sum_by_direction(&self, product_id: &str, inbound: bool) -> RepositoryResult<f64> {
        let kinds: Vec<&'static str> = [
            MovementKind::StockIn,
            MovementKind::StockOut,
            MovementKind::Transfer,
            MovementKind::Scrap,
            MovementKind::ProductionConsume,
            MovementKind::ProductionOutput,
        ]
        .iter()
        .filter(|k| k.is_inbound() == inbound)
        .map(|k| k.to_db_str())
        .collect();

        let placeholders = (0..kinds.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT COALESCE(SUM(ABS(signed_quantity)), 0) FROM stock_movement \
             WHERE product_id = ?1 AND kind IN ({})",
            placeholders
        );

        let mut values: Vec<&dyn rusqlite::ToSql> = vec![&product_id];
        for kind in &kinds {
            values.push(kind);
        }

        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(&sql, values.as_slice(), |row| row.get(0))?;
        Ok(total)
    }
}
