// ==========================================
// BOM 生产引擎 - 配方数据仓储
// ==========================================
// 红线: quantity_per_unit > 0, (recipe_id, product_id) 唯一
// 红线: 产品的默认配方通过 preferred_recipe 显式维护,
//       不依赖存储迭代顺序
// ==========================================

use crate::domain::recipe::{NewRecipe, Recipe};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::mapping::{format_ts, query_product, query_recipe};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// ==========================================
// RecipeRepository - 配方仓储
// ==========================================
pub struct RecipeRepository {
    conn: Arc<Mutex<Connection>>,
}

fn validate_quantity(product_id: &str, quantity_per_unit: f64) -> RepositoryResult<()> {
    if !quantity_per_unit.is_finite() || quantity_per_unit <= 0.0 {
        return Err(RepositoryError::FieldValueError {
            field: "quantity_per_unit".to_string(),
            message: format!("组件 {} 的单位用量必须大于 0, 实际 {}", product_id, quantity_per_unit),
        });
    }
    Ok(())
}

/// 若目标产品尚无默认配方,则将该配方登记为默认配方
fn ensure_preferred(conn: &Connection, product_id: &str, recipe_id: &str) -> RepositoryResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO preferred_recipe (product_id, recipe_id) VALUES (?1, ?2)",
        params![product_id, recipe_id],
    )?;
    Ok(())
}

/// 产品没有默认配方时,按建档顺序改由下一个产出它的配方接任
fn repoint_preferred(conn: &Connection, product_id: &str) -> RepositoryResult<Option<String>> {
    let next: Option<String> = conn
        .query_row(
            r#"
            SELECT recipe_id FROM recipe WHERE target_product_id = ?1
            ORDER BY created_at, recipe_id LIMIT 1
            "#,
            params![product_id],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(recipe_id) = &next {
        ensure_preferred(conn, product_id, recipe_id)?;
    }
    Ok(next)
}

impl RecipeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建配方（含明细）
    ///
    /// # 说明
    /// - 明细顺序即解析顺序
    /// - 绑定了目标产品且该产品尚无默认配方时,自动登记为默认配方
    ///
    /// # 错误
    /// - `FieldValueError`: 单位用量 <= 0
    /// - `ValidationError`: 同一组件重复出现
    /// - `ForeignKeyViolation`: 组件或目标产品不存在
    pub fn insert(&self, new_recipe: &NewRecipe) -> RepositoryResult<Recipe> {
        if new_recipe.recipe_id.trim().is_empty() {
            return Err(RepositoryError::ValidationError("recipe_id 不能为空".to_string()));
        }

        let mut seen = HashSet::new();
        for (product_id, quantity_per_unit) in &new_recipe.items {
            validate_quantity(product_id, *quantity_per_unit)?;
            if !seen.insert(product_id.as_str()) {
                return Err(RepositoryError::ValidationError(format!(
                    "配方 {} 中组件 {} 重复",
                    new_recipe.recipe_id, product_id
                )));
            }
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO recipe (recipe_id, name, line_label, target_product_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                new_recipe.recipe_id,
                new_recipe.name,
                new_recipe.line_label,
                new_recipe.target_product_id,
                format_ts(&Utc::now().naive_utc()),
            ],
        )?;

        for (seq_no, (product_id, quantity_per_unit)) in new_recipe.items.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO recipe_item (recipe_id, product_id, quantity_per_unit, note, seq_no)
                VALUES (?1, ?2, ?3, NULL, ?4)
                "#,
                params![new_recipe.recipe_id, product_id, quantity_per_unit, seq_no as i64],
            )?;
        }

        if let Some(target) = &new_recipe.target_product_id {
            ensure_preferred(&tx, target, &new_recipe.recipe_id)?;
        }

        let recipe = query_recipe(&tx, &new_recipe.recipe_id)?
            .ok_or_else(|| RepositoryError::not_found("Recipe", &new_recipe.recipe_id))?;
        tx.commit()?;

        Ok(recipe)
    }

    /// 新增或更新配方明细
    ///
    /// 组件已存在时只更新用量与备注（保留原有顺序）,否则追加到末尾
    pub fn upsert_item(
        &self,
        recipe_id: &str,
        product_id: &str,
        quantity_per_unit: f64,
        note: Option<&str>,
    ) -> RepositoryResult<Recipe> {
        validate_quantity(product_id, quantity_per_unit)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        if query_recipe(&tx, recipe_id)?.is_none() {
            return Err(RepositoryError::not_found("Recipe", recipe_id));
        }

        let updated = tx.execute(
            r#"
            UPDATE recipe_item SET quantity_per_unit = ?1, note = ?2
            WHERE recipe_id = ?3 AND product_id = ?4
            "#,
            params![quantity_per_unit, note, recipe_id, product_id],
        )?;

        if updated == 0 {
            let next_seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(seq_no), -1) + 1 FROM recipe_item WHERE recipe_id = ?1",
                params![recipe_id],
                |row| row.get(0),
            )?;
            tx.execute(
                r#"
                INSERT INTO recipe_item (recipe_id, product_id, quantity_per_unit, note, seq_no)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![recipe_id, product_id, quantity_per_unit, note, next_seq],
            )?;
        }

        let recipe = query_recipe(&tx, recipe_id)?
            .ok_or_else(|| RepositoryError::not_found("Recipe", recipe_id))?;
        tx.commit()?;
        Ok(recipe)
    }

    /// 删除配方明细
    pub fn remove_item(&self, recipe_id: &str, product_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM recipe_item WHERE recipe_id = ?1 AND product_id = ?2",
            params![recipe_id, product_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found(
                "RecipeItem",
                &format!("{}/{}", recipe_id, product_id),
            ));
        }
        Ok(())
    }

    /// 绑定配方的目标产品
    ///
    /// # 说明
    /// - 目标产品尚无默认配方时,自动登记为默认配方
    /// - 改绑时原目标产品若以该配方为默认,则改由原目标的下一个配方接任（无则清空）
    pub fn bind_target(&self, recipe_id: &str, product_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        if query_product(&tx, product_id)?.is_none() {
            return Err(RepositoryError::not_found("Product", product_id));
        }

        let previous: Option<String> = tx
            .query_row(
                "SELECT target_product_id FROM recipe WHERE recipe_id = ?1",
                params![recipe_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::not_found("Recipe", recipe_id))?;

        tx.execute(
            "UPDATE recipe SET target_product_id = ?1 WHERE recipe_id = ?2",
            params![product_id, recipe_id],
        )?;

        if let Some(old_target) = previous.filter(|old| old != product_id) {
            let released = tx.execute(
                "DELETE FROM preferred_recipe WHERE product_id = ?1 AND recipe_id = ?2",
                params![old_target, recipe_id],
            )?;
            if released > 0 {
                let successor = repoint_preferred(&tx, &old_target)?;
                tracing::info!(
                    product_id = %old_target,
                    released_recipe_id = %recipe_id,
                    successor = ?successor,
                    "配方改绑,原目标产品默认配方变更"
                );
            }
        }

        ensure_preferred(&tx, product_id, recipe_id)?;
        tx.commit()?;
        Ok(())
    }

    /// 删除配方（明细与默认配方映射级联删除）
    ///
    /// # 说明
    /// - 目标产品以该配方为默认时,改由下一个产出它的配方接任
    ///
    /// # 错误
    /// - `NotFound`: 配方不存在
    /// - `ValidationError`: 已有生产记录引用该配方（台账只追加,不删除）
    pub fn delete(&self, recipe_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let target: Option<String> = tx
            .query_row(
                "SELECT target_product_id FROM recipe WHERE recipe_id = ?1",
                params![recipe_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::not_found("Recipe", recipe_id))?;

        let production_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM production_record WHERE recipe_id = ?1",
            params![recipe_id],
            |row| row.get(0),
        )?;
        if production_count > 0 {
            return Err(RepositoryError::ValidationError(format!(
                "配方 {} 已有 {} 条生产记录,不能删除",
                recipe_id, production_count
            )));
        }

        tx.execute("DELETE FROM recipe WHERE recipe_id = ?1", params![recipe_id])?;

        if let Some(target) = target {
            repoint_preferred(&tx, &target)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// 显式指定产品的默认配方
    ///
    /// # 错误
    /// - `ValidationError`: 该配方的目标产品不是 product_id
    pub fn set_preferred(&self, product_id: &str, recipe_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let target: Option<Option<String>> = conn
            .query_row(
                "SELECT target_product_id FROM recipe WHERE recipe_id = ?1",
                params![recipe_id],
                |row| row.get(0),
            )
            .optional()?;

        match target {
            None => return Err(RepositoryError::not_found("Recipe", recipe_id)),
            Some(target) if target.as_deref() != Some(product_id) => {
                return Err(RepositoryError::ValidationError(format!(
                    "配方 {} 的目标产品不是 {}",
                    recipe_id, product_id
                )));
            }
            Some(_) => {}
        }

        conn.execute(
            r#"
            INSERT INTO preferred_recipe (product_id, recipe_id) VALUES (?1, ?2)
            ON CONFLICT(product_id) DO UPDATE SET recipe_id = ?2
            "#,
            params![product_id, recipe_id],
        )?;
        Ok(())
    }

    /// 查询产品的默认配方ID
    pub fn preferred_recipe_id(&self, product_id: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT recipe_id FROM preferred_recipe WHERE product_id = ?1",
                params![product_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// 按ID查询配方
    pub fn find_by_id(&self, recipe_id: &str) -> RepositoryResult<Option<Recipe>> {
        let conn = self.get_conn()?;
        query_recipe(&conn, recipe_id)
    }

    /// 查询全部配方ID（按名称排序）
    pub fn list_ids(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT recipe_id FROM recipe ORDER BY name, recipe_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    /// 查询以某产品为目标的全部配方ID
    pub fn list_ids_by_target(&self, product_id: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT recipe_id FROM recipe WHERE target_product_id = ?1 ORDER BY created_at, recipe_id",
        )?;
        let ids = stmt
            .query_map(params![product_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::NewProduct;
    use crate::domain::types::ProductKind;
    use crate::repository::product_repo::ProductRepository;

    fn setup() -> (ProductRepository, RecipeRepository) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let products = ProductRepository::new(conn.clone());
        for (id, kind) in [
            ("F", ProductKind::Finished),
            ("C", ProductKind::Intermediate),
            ("M", ProductKind::Raw),
            ("N", ProductKind::Raw),
        ] {
            products.insert(&NewProduct::new(id, id, kind, 0.0), "admin").unwrap();
        }

        (products, RecipeRepository::new(conn))
    }

    #[test]
    fn test_insert_keeps_item_order_and_sets_preferred() {
        let (_, recipes) = setup();

        let recipe = recipes
            .insert(&NewRecipe::new("R", "Frame assembly").target("F").item("N", 1.0).item("M", 2.0))
            .unwrap();

        let order: Vec<&str> = recipe.items.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(order, vec!["N", "M"]);
        assert_eq!(recipes.preferred_recipe_id("F").unwrap(), Some("R".to_string()));
    }

    #[test]
    fn test_second_recipe_does_not_replace_preferred() {
        let (_, recipes) = setup();

        recipes.insert(&NewRecipe::new("RC2", "Alt").target("C").item("N", 1.0)).unwrap();
        recipes.insert(&NewRecipe::new("RC1", "Main").target("C").item("M", 3.0)).unwrap();

        assert_eq!(recipes.preferred_recipe_id("C").unwrap(), Some("RC2".to_string()));

        recipes.set_preferred("C", "RC1").unwrap();
        assert_eq!(recipes.preferred_recipe_id("C").unwrap(), Some("RC1".to_string()));
    }

    #[test]
    fn test_set_preferred_requires_matching_target() {
        let (_, recipes) = setup();
        recipes.insert(&NewRecipe::new("R", "Frame").target("F").item("M", 1.0)).unwrap();

        let result = recipes.set_preferred("C", "R");
        assert!(matches!(result, Err(RepositoryError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_non_positive_and_duplicate_items() {
        let (_, recipes) = setup();

        let zero = recipes.insert(&NewRecipe::new("R1", "Bad").item("M", 0.0));
        assert!(matches!(zero, Err(RepositoryError::FieldValueError { .. })));

        let dup = recipes.insert(&NewRecipe::new("R2", "Dup").item("M", 1.0).item("M", 2.0));
        assert!(matches!(dup, Err(RepositoryError::ValidationError(_))));
    }

    #[test]
    fn test_upsert_item_updates_existing_in_place() {
        let (_, recipes) = setup();
        recipes.insert(&NewRecipe::new("R", "Frame").item("M", 1.0).item("N", 1.0)).unwrap();

        let recipe = recipes.upsert_item("R", "M", 4.0, Some("thicker")).unwrap();
        assert_eq!(recipe.items.len(), 2);
        assert_eq!(recipe.items[0].product_id, "M");
        assert_eq!(recipe.items[0].quantity_per_unit, 4.0);
        assert_eq!(recipe.items[0].note.as_deref(), Some("thicker"));

        let recipe = recipes.upsert_item("R", "C", 2.0, None).unwrap();
        assert_eq!(recipe.items.last().unwrap().product_id, "C");
    }

    #[test]
    fn test_bind_target_registers_preferred() {
        let (_, recipes) = setup();
        recipes.insert(&NewRecipe::new("R", "Unbound").item("M", 1.0)).unwrap();
        assert_eq!(recipes.preferred_recipe_id("F").unwrap(), None);

        recipes.bind_target("R", "F").unwrap();
        assert_eq!(recipes.preferred_recipe_id("F").unwrap(), Some("R".to_string()));
        assert_eq!(recipes.list_ids_by_target("F").unwrap(), vec!["R".to_string()]);
    }

    #[test]
    fn test_rebind_releases_old_target_preference() {
        let (products, recipes) = setup();
        products
            .insert(&NewProduct::new("Y", "Y", ProductKind::Intermediate, 0.0), "admin")
            .unwrap();
        recipes.insert(&NewRecipe::new("RC", "Crossbar").target("C").item("M", 3.0)).unwrap();
        recipes.insert(&NewRecipe::new("R", "Frame").target("F").item("C", 2.0)).unwrap();

        recipes.bind_target("RC", "Y").unwrap();

        assert_eq!(recipes.preferred_recipe_id("C").unwrap(), None);
        assert_eq!(recipes.preferred_recipe_id("Y").unwrap(), Some("RC".to_string()));
    }

    #[test]
    fn test_rebind_hands_preference_to_next_recipe() {
        let (products, recipes) = setup();
        products
            .insert(&NewProduct::new("Y", "Y", ProductKind::Intermediate, 0.0), "admin")
            .unwrap();
        recipes.insert(&NewRecipe::new("RC1", "Main").target("C").item("M", 3.0)).unwrap();
        recipes.insert(&NewRecipe::new("RC2", "Alt").target("C").item("N", 1.0)).unwrap();
        assert_eq!(recipes.preferred_recipe_id("C").unwrap(), Some("RC1".to_string()));

        recipes.bind_target("RC1", "Y").unwrap();
        assert_eq!(recipes.preferred_recipe_id("C").unwrap(), Some("RC2".to_string()));

        // RC1 改回 C: Y 失去唯一配方,C 的默认配方保持 RC2
        recipes.bind_target("RC1", "C").unwrap();
        assert_eq!(recipes.preferred_recipe_id("Y").unwrap(), None);
        assert_eq!(recipes.preferred_recipe_id("C").unwrap(), Some("RC2".to_string()));

        // 非默认配方改绑不影响原目标的默认配方
        recipes.insert(&NewRecipe::new("RC3", "Spare").target("C").item("M", 1.0)).unwrap();
        recipes.bind_target("RC3", "Y").unwrap();
        assert_eq!(recipes.preferred_recipe_id("C").unwrap(), Some("RC2".to_string()));
        assert_eq!(recipes.preferred_recipe_id("Y").unwrap(), Some("RC3".to_string()));
    }

    #[test]
    fn test_delete_recipe_repoints_preferred() {
        let (_, recipes) = setup();
        recipes.insert(&NewRecipe::new("RC1", "Main").target("C").item("M", 3.0)).unwrap();
        recipes.insert(&NewRecipe::new("RC2", "Alt").target("C").item("N", 1.0)).unwrap();

        recipes.delete("RC1").unwrap();

        assert!(recipes.find_by_id("RC1").unwrap().is_none());
        assert_eq!(recipes.preferred_recipe_id("C").unwrap(), Some("RC2".to_string()));

        recipes.delete("RC2").unwrap();
        assert_eq!(recipes.preferred_recipe_id("C").unwrap(), None);

        assert!(matches!(
            recipes.delete("RC2"),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_recipe_with_productions_is_rejected() {
        let (_, recipes) = setup();
        recipes.insert(&NewRecipe::new("R", "Frame").target("F").item("M", 1.0)).unwrap();
        {
            let conn = recipes.get_conn().unwrap();
            conn.execute(
                r#"
                INSERT INTO production_record (production_id, recipe_id, quantity, actor, produced_at)
                VALUES ('P-1', 'R', 1.0, 'admin', '2024-01-01 00:00:00')
                "#,
                [],
            )
            .unwrap();
        }

        assert!(matches!(
            recipes.delete("R"),
            Err(RepositoryError::ValidationError(_))
        ));
        assert!(recipes.find_by_id("R").unwrap().is_some());
    }

    #[test]
    fn test_remove_item() {
        let (_, recipes) = setup();
        recipes.insert(&NewRecipe::new("R", "Frame").item("M", 1.0).item("N", 1.0)).unwrap();

        recipes.remove_item("R", "M").unwrap();
        let recipe = recipes.find_by_id("R").unwrap().unwrap();
        assert_eq!(recipe.items.len(), 1);

        assert!(matches!(
            recipes.remove_item("R", "M"),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
