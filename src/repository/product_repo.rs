// ==========================================
// BOM 生产引擎 - 产品数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 期初库存同样写一条入库流水
// ==========================================

use crate::domain::product::{NewProduct, Product};
use crate::domain::production::StockMovement;
use crate::domain::types::MovementKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::ledger_writer::{SqliteLedgerWriter, StockLedgerWriter};
use crate::repository::mapping::{format_ts, map_product_row, query_product, PRODUCT_COLUMNS};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 期初入库流水的来源标签
pub const OPENING_BALANCE_LABEL: &str = "OPENING_BALANCE";

// ==========================================
// ProductRepository - 产品仓储
// ==========================================
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建产品
    ///
    /// # 说明
    /// - on_hand_quantity > 0 时,在同一事务内写入一条期初入库流水
    ///
    /// # 错误
    /// - `ValidationError`: 数量为负或非有限值、ID 为空
    /// - `UniqueConstraintViolation`: product_id 已存在
    pub fn insert(&self, new_product: &NewProduct, actor: &str) -> RepositoryResult<Product> {
        if new_product.product_id.trim().is_empty() {
            return Err(RepositoryError::ValidationError("product_id 不能为空".to_string()));
        }
        for (field, value) in [
            ("on_hand_quantity", new_product.on_hand_quantity),
            ("reorder_threshold", new_product.reorder_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RepositoryError::FieldValueError {
                    field: field.to_string(),
                    message: format!("必须为非负有限数值, 实际 {}", value),
                });
            }
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now().naive_utc();

        tx.execute(
            r#"
            INSERT INTO product (
                product_id, name, unit, kind, on_hand_quantity, reorder_threshold, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)
            "#,
            params![
                new_product.product_id,
                new_product.name,
                new_product.unit,
                new_product.kind.to_db_str(),
                new_product.reorder_threshold,
                format_ts(&now),
            ],
        )?;

        if new_product.on_hand_quantity > 0.0 {
            let mut writer = SqliteLedgerWriter::new(&tx);
            writer.adjust_stock(&new_product.product_id, 0.0, new_product.on_hand_quantity, &now)?;
            writer.append_movement(&StockMovement {
                movement_id: Uuid::new_v4().to_string(),
                product_id: new_product.product_id.clone(),
                signed_quantity: new_product.on_hand_quantity,
                kind: MovementKind::StockIn,
                source_label: OPENING_BALANCE_LABEL.to_string(),
                destination_label: OPENING_BALANCE_LABEL.to_string(),
                actor: actor.to_string(),
                moved_at: now,
                production_id: None,
                note: None,
            })?;
        }

        let product = query_product(&tx, &new_product.product_id)?
            .ok_or_else(|| RepositoryError::not_found("Product", &new_product.product_id))?;
        tx.commit()?;

        Ok(product)
    }

    /// 按ID查询产品
    pub fn find_by_id(&self, product_id: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        query_product(&conn, product_id)
    }

    /// 查询全部产品（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM product ORDER BY name, product_id", PRODUCT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map([], map_product_row)?
            .collect::<rusqlite::Result<Vec<Product>>>()?;
        Ok(products)
    }

    /// 查询低于安全库存的产品（阈值 > 0 且 在库 < 阈值）
    pub fn list_below_threshold(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM product
            WHERE reorder_threshold > 0 AND on_hand_quantity < reorder_threshold
            ORDER BY on_hand_quantity - reorder_threshold, product_id
            "#,
            PRODUCT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map([], map_product_row)?
            .collect::<rusqlite::Result<Vec<Product>>>()?;
        Ok(products)
    }

    /// 更新安全库存阈值
    pub fn update_threshold(&self, product_id: &str, reorder_threshold: f64) -> RepositoryResult<()> {
        if !reorder_threshold.is_finite() || reorder_threshold < 0.0 {
            return Err(RepositoryError::FieldValueError {
                field: "reorder_threshold".to_string(),
                message: format!("必须为非负有限数值, 实际 {}", reorder_threshold),
            });
        }

        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE product SET reorder_threshold = ?1, updated_at = ?2 WHERE product_id = ?3",
            params![reorder_threshold, format_ts(&Utc::now().naive_utc()), product_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("Product", product_id));
        }
        Ok(())
    }
}
