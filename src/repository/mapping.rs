// ==========================================
// BOM 生产引擎 - 行映射工具
// ==========================================
// 职责: SQL 行 ↔ 领域对象 的统一映射,供各仓储复用
// ==========================================

use crate::domain::production::{ProductionConsumption, ProductionRecord, StockMovement};
use crate::domain::product::Product;
use crate::domain::recipe::{Recipe, RecipeItem};
use crate::domain::types::{MovementKind, ProductKind};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// 时间戳存储格式
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const PRODUCT_COLUMNS: &str =
    "product_id, name, unit, kind, on_hand_quantity, reorder_threshold, updated_at";

pub const MOVEMENT_COLUMNS: &str = "movement_id, product_id, signed_quantity, kind, source_label, \
     destination_label, actor, moved_at, production_id, note";

pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TS_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        Box::new(RepositoryError::FieldValueError {
            field: format!("column#{}", idx),
            message,
        }),
    )
}

/// 映射 product 行（列顺序同 PRODUCT_COLUMNS）
pub fn map_product_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    let kind_raw: String = row.get(3)?;
    let kind = ProductKind::from_db_str(&kind_raw)
        .ok_or_else(|| conversion_error(3, format!("未知产品类别: {}", kind_raw)))?;

    Ok(Product {
        product_id: row.get(0)?,
        name: row.get(1)?,
        unit: row.get(2)?,
        kind,
        on_hand_quantity: row.get(4)?,
        reorder_threshold: row.get(5)?,
        updated_at: parse_ts(row, 6)?,
    })
}

/// 映射 stock_movement 行（列顺序同 MOVEMENT_COLUMNS）
pub fn map_movement_row(row: &Row<'_>) -> rusqlite::Result<StockMovement> {
    let kind_raw: String = row.get(3)?;
    let kind = MovementKind::from_db_str(&kind_raw)
        .ok_or_else(|| conversion_error(3, format!("未知流水类型: {}", kind_raw)))?;

    Ok(StockMovement {
        movement_id: row.get(0)?,
        product_id: row.get(1)?,
        signed_quantity: row.get(2)?,
        kind,
        source_label: row.get(4)?,
        destination_label: row.get(5)?,
        actor: row.get(6)?,
        moved_at: parse_ts(row, 7)?,
        production_id: row.get(8)?,
        note: row.get(9)?,
    })
}

pub fn map_production_row(row: &Row<'_>) -> rusqlite::Result<ProductionRecord> {
    Ok(ProductionRecord {
        production_id: row.get(0)?,
        recipe_id: row.get(1)?,
        quantity: row.get(2)?,
        actor: row.get(3)?,
        produced_at: parse_ts(row, 4)?,
        note: row.get(5)?,
    })
}

pub fn map_consumption_row(row: &Row<'_>) -> rusqlite::Result<ProductionConsumption> {
    Ok(ProductionConsumption {
        production_id: row.get(0)?,
        product_id: row.get(1)?,
        quantity: row.get(2)?,
    })
}

/// 按ID读取产品
pub fn query_product(conn: &Connection, product_id: &str) -> RepositoryResult<Option<Product>> {
    let sql = format!("SELECT {} FROM product WHERE product_id = ?1", PRODUCT_COLUMNS);
    let product = conn
        .query_row(&sql, params![product_id], map_product_row)
        .optional()?;
    Ok(product)
}

/// 按ID读取配方（含明细,按 seq_no 排序）
pub fn query_recipe(conn: &Connection, recipe_id: &str) -> RepositoryResult<Option<Recipe>> {
    let header = conn
        .query_row(
            "SELECT recipe_id, name, line_label, target_product_id FROM recipe WHERE recipe_id = ?1",
            params![recipe_id],
            |row| {
                Ok(Recipe {
                    recipe_id: row.get(0)?,
                    name: row.get(1)?,
                    line_label: row.get(2)?,
                    target_product_id: row.get(3)?,
                    items: Vec::new(),
                })
            },
        )
        .optional()?;

    let mut recipe = match header {
        Some(r) => r,
        None => return Ok(None),
    };

    let mut stmt = conn.prepare(
        r#"
        SELECT recipe_id, product_id, quantity_per_unit, note
        FROM recipe_item
        WHERE recipe_id = ?1
        ORDER BY seq_no
        "#,
    )?;
    recipe.items = stmt
        .query_map(params![recipe_id], |row| {
            Ok(RecipeItem {
                recipe_id: row.get(0)?,
                product_id: row.get(1)?,
                quantity_per_unit: row.get(2)?,
                note: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<RecipeItem>>>()?;

    Ok(Some(recipe))
}
