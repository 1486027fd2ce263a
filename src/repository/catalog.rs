// ==========================================
// BOM 生产引擎 - Catalog 读契约
// ==========================================
// 职责: 为解析器/执行器提供产品与配方的只读视图
// 红线: 读契约不含业务逻辑; 默认配方只认 preferred_recipe 映射
// ==========================================

use crate::domain::product::Product;
use crate::domain::recipe::Recipe;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::mapping::{query_product, query_recipe};
use rusqlite::{params, Connection, OptionalExtension};

/// Catalog 读契约
///
/// 解析器与执行器只通过该 trait 读取图结构与库存,便于在单元测试中替换为内存实现。
pub trait CatalogReader {
    /// 读取配方（含明细）,不存在时返回 `RepositoryError::NotFound`
    fn get_recipe(&self, recipe_id: &str) -> RepositoryResult<Recipe>;

    /// 读取产品,不存在时返回 `RepositoryError::NotFound`
    fn get_product(&self, product_id: &str) -> RepositoryResult<Product>;

    /// 读取产品的默认配方（无则 None）
    fn preferred_recipe_for_target(&self, product_id: &str) -> RepositoryResult<Option<Recipe>>;
}

// ==========================================
// SqliteCatalog - 基于连接/事务的 Catalog 视图
// ==========================================
// 借用 &Connection: 传入 Transaction 时（Deref 到 Connection）
// 所有读取都落在同一事务快照内
pub struct SqliteCatalog<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCatalog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl CatalogReader for SqliteCatalog<'_> {
    fn get_recipe(&self, recipe_id: &str) -> RepositoryResult<Recipe> {
        query_recipe(self.conn, recipe_id)?
            .ok_or_else(|| RepositoryError::not_found("Recipe", recipe_id))
    }

    fn get_product(&self, product_id: &str) -> RepositoryResult<Product> {
        query_product(self.conn, product_id)?
            .ok_or_else(|| RepositoryError::not_found("Product", product_id))
    }

    fn preferred_recipe_for_target(&self, product_id: &str) -> RepositoryResult<Option<Recipe>> {
        let recipe_id: Option<String> = self
            .conn
            .query_row(
                "SELECT recipe_id FROM preferred_recipe WHERE product_id = ?1",
                params![product_id],
                |row| row.get(0),
            )
            .optional()?;

        let recipe = match recipe_id {
            Some(id) => query_recipe(self.conn, &id)?,
            None => None,
        };

        // 映射指向的配方必须确实产出该产品
        Ok(recipe.filter(|r| r.target_product_id.as_deref() == Some(product_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO product (product_id, name, kind, on_hand_quantity, updated_at) VALUES
                ('C', 'Crossbar', 'INTERMEDIATE', 0, '2024-01-01 00:00:00'),
                ('Y', 'Yoke', 'INTERMEDIATE', 0, '2024-01-01 00:00:00'),
                ('M', 'Steel', 'RAW', 10, '2024-01-01 00:00:00');
            INSERT INTO recipe (recipe_id, name, target_product_id, created_at)
                VALUES ('RC', 'Crossbar', 'C', '2024-01-01 00:00:00');
            INSERT INTO recipe_item (recipe_id, product_id, quantity_per_unit, seq_no)
                VALUES ('RC', 'M', 3.0, 0);
            INSERT INTO preferred_recipe (product_id, recipe_id) VALUES ('C', 'RC');
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_preferred_recipe_for_target() {
        let conn = setup();
        let catalog = SqliteCatalog::new(&conn);

        let recipe = catalog.preferred_recipe_for_target("C").unwrap().unwrap();
        assert_eq!(recipe.recipe_id, "RC");
        assert!(catalog.preferred_recipe_for_target("M").unwrap().is_none());
    }

    #[test]
    fn test_mapping_to_recipe_with_other_target_is_ignored() {
        let conn = setup();
        conn.execute("UPDATE recipe SET target_product_id = 'Y' WHERE recipe_id = 'RC'", [])
            .unwrap();
        let catalog = SqliteCatalog::new(&conn);

        assert!(catalog.preferred_recipe_for_target("C").unwrap().is_none());
    }
}
