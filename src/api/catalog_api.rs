// ==========================================
// BOM 生产引擎 - 物料/配方维护 API
// ==========================================
// 职责: 产品建档、配方维护、默认配方指定
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::validate_id;
use crate::domain::product::{NewProduct, Product};
use crate::domain::recipe::{NewRecipe, Recipe};
use crate::repository::product_repo::ProductRepository;
use crate::repository::recipe_repo::RecipeRepository;

pub struct CatalogApi {
    product_repo: ProductRepository,
    recipe_repo: RecipeRepository,
}

impl CatalogApi {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            product_repo: ProductRepository::new(conn.clone()),
            recipe_repo: RecipeRepository::new(conn),
        }
    }

    // ==========================================
    // 产品
    // ==========================================

    /// 新建产品（期初库存 > 0 时写一条期初入库流水）
    pub fn create_product(&self, new_product: &NewProduct, actor: &str) -> ApiResult<Product> {
        validate_id("actor", actor)?;
        let product = self.product_repo.insert(new_product, actor)?;
        info!(
            product_id = %product.product_id,
            on_hand = product.on_hand_quantity,
            "产品建档"
        );
        Ok(product)
    }

    pub fn get_product(&self, product_id: &str) -> ApiResult<Product> {
        validate_id("product_id", product_id)?;
        self.product_repo
            .find_by_id(product_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Product(id={})不存在", product_id)))
    }

    pub fn list_products(&self) -> ApiResult<Vec<Product>> {
        Ok(self.product_repo.list_all()?)
    }

    pub fn update_threshold(&self, product_id: &str, reorder_threshold: f64) -> ApiResult<()> {
        validate_id("product_id", product_id)?;
        Ok(self
            .product_repo
            .update_threshold(product_id, reorder_threshold)?)
    }

    // ==========================================
    // 配方
    // ==========================================

    pub fn create_recipe(&self, new_recipe: &NewRecipe) -> ApiResult<Recipe> {
        let recipe = self.recipe_repo.insert(new_recipe)?;
        info!(
            recipe_id = %recipe.recipe_id,
            item_count = recipe.items.len(),
            target = ?recipe.target_product_id,
            "配方建档"
        );
        Ok(recipe)
    }

    pub fn get_recipe(&self, recipe_id: &str) -> ApiResult<Recipe> {
        validate_id("recipe_id", recipe_id)?;
        self.recipe_repo
            .find_by_id(recipe_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Recipe(id={})不存在", recipe_id)))
    }

    /// 列出全部配方（按名称排序）
    pub fn list_recipes(&self) -> ApiResult<Vec<Recipe>> {
        let mut recipes = Vec::new();
        for recipe_id in self.recipe_repo.list_ids()? {
            if let Some(recipe) = self.recipe_repo.find_by_id(&recipe_id)? {
                recipes.push(recipe);
            }
        }
        Ok(recipes)
    }

    /// 新增或更新配方明细（重复添加同一组件即更新用量）
    pub fn upsert_item(
        &self,
        recipe_id: &str,
        product_id: &str,
        quantity_per_unit: f64,
        note: Option<&str>,
    ) -> ApiResult<Recipe> {
        validate_id("recipe_id", recipe_id)?;
        validate_id("product_id", product_id)?;
        Ok(self
            .recipe_repo
            .upsert_item(recipe_id, product_id, quantity_per_unit, note)?)
    }

    pub fn remove_item(&self, recipe_id: &str, product_id: &str) -> ApiResult<()> {
        Ok(self.recipe_repo.remove_item(recipe_id, product_id)?)
    }

    pub fn bind_target(&self, recipe_id: &str, product_id: &str) -> ApiResult<()> {
        validate_id("recipe_id", recipe_id)?;
        validate_id("product_id", product_id)?;
        Ok(self.recipe_repo.bind_target(recipe_id, product_id)?)
    }

    /// 删除配方（已有生产记录的配方不可删除）
    pub fn delete_recipe(&self, recipe_id: &str) -> ApiResult<()> {
        validate_id("recipe_id", recipe_id)?;
        self.recipe_repo.delete(recipe_id)?;
        info!(recipe_id = %recipe_id, "配方删除");
        Ok(())
    }

    /// 指定产品的默认配方（多个配方产出同一产品时使用）
    pub fn set_preferred(&self, product_id: &str, recipe_id: &str) -> ApiResult<()> {
        self.recipe_repo.set_preferred(product_id, recipe_id)?;
        info!(product_id = %product_id, recipe_id = %recipe_id, "默认配方变更");
        Ok(())
    }

    pub fn preferred_recipe_id(&self, product_id: &str) -> ApiResult<Option<String>> {
        Ok(self.recipe_repo.preferred_recipe_id(product_id)?)
    }
}
