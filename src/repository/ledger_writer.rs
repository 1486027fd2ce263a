// ==========================================
// BOM 生产引擎 - 库存/审计台账写契约
// ==========================================
// 红线: 库存调整与其流水必须在同一事务内写入
// 红线: 台账只追加,不更新、不删除
// ==========================================

use crate::domain::production::{ProductionConsumption, ProductionRecord, StockMovement};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::mapping::format_ts;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

/// 库存与审计台账写契约
///
/// 调用方负责事务边界: 实现只在给定的连接/事务上执行写入,不自行提交。
pub trait StockLedgerWriter {
    /// 按“期望值比较”调整库存,返回调整后的数量
    ///
    /// # 错误
    /// - `OptimisticLockFailure`: 当前库存与 expected_on_hand 不一致
    /// - `NotFound`: 产品不存在
    fn adjust_stock(
        &mut self,
        product_id: &str,
        expected_on_hand: f64,
        signed_delta: f64,
        at: &NaiveDateTime,
    ) -> RepositoryResult<f64>;

    fn append_production(&mut self, record: &ProductionRecord) -> RepositoryResult<()>;

    fn append_consumption(&mut self, consumption: &ProductionConsumption) -> RepositoryResult<()>;

    fn append_movement(&mut self, movement: &StockMovement) -> RepositoryResult<()>;
}

// ==========================================
// SqliteLedgerWriter - 基于事务的写入实现
// ==========================================
pub struct SqliteLedgerWriter<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteLedgerWriter<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl StockLedgerWriter for SqliteLedgerWriter<'_> {
    fn adjust_stock(
        &mut self,
        product_id: &str,
        expected_on_hand: f64,
        signed_delta: f64,
        at: &NaiveDateTime,
    ) -> RepositoryResult<f64> {
        let new_on_hand = expected_on_hand + signed_delta;

        // 带期望值检查的更新
        let rows_affected = self.conn.execute(
            r#"
            UPDATE product
            SET on_hand_quantity = ?1, updated_at = ?2
            WHERE product_id = ?3 AND on_hand_quantity = ?4
            "#,
            params![new_on_hand, format_ts(at), product_id, expected_on_hand],
        )?;

        if rows_affected == 0 {
            // 判断是记录不存在还是库存已被修改
            let actual: Option<f64> = self
                .conn
                .query_row(
                    "SELECT on_hand_quantity FROM product WHERE product_id = ?1",
                    params![product_id],
                    |row| row.get(0),
                )
                .optional()?;

            return Err(match actual {
                Some(actual) => RepositoryError::OptimisticLockFailure {
                    product_id: product_id.to_string(),
                    expected: expected_on_hand,
                    actual,
                },
                None => RepositoryError::not_found("Product", product_id),
            });
        }

        Ok(new_on_hand)
    }

    fn append_production(&mut self, record: &ProductionRecord) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO production_record (
                production_id, recipe_id, quantity, actor, produced_at, note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.production_id,
                record.recipe_id,
                record.quantity,
                record.actor,
                format_ts(&record.produced_at),
                record.note,
            ],
        )?;
        Ok(())
    }

    fn append_consumption(&mut self, consumption: &ProductionConsumption) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO production_consumption (production_id, product_id, quantity)
            VALUES (?1, ?2, ?3)
            "#,
            params![
                consumption.production_id,
                consumption.product_id,
                consumption.quantity,
            ],
        )?;
        Ok(())
    }

    fn append_movement(&mut self, movement: &StockMovement) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO stock_movement (
                movement_id, product_id, signed_quantity, kind, source_label,
                destination_label, actor, moved_at, production_id, note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                movement.movement_id,
                movement.product_id,
                movement.signed_quantity,
                movement.kind.to_db_str(),
                movement.source_label,
                movement.destination_label,
                movement.actor,
                format_ts(&movement.moved_at),
                movement.production_id,
                movement.note,
            ],
        )?;
        Ok(())
    }
}
