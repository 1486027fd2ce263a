// ==========================================
// Catalog 构建器 - 用于集成测试
// ==========================================

#![allow(dead_code)]

use bom_engine::api::CatalogApi;
use bom_engine::domain::{NewProduct, NewRecipe, ProductKind};

// ==========================================
// CatalogBuilder - 产品/配方批量建档
// ==========================================

pub struct CatalogBuilder {
    products: Vec<NewProduct>,
    recipes: Vec<NewRecipe>,
    preferred: Vec<(String, String)>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
            recipes: Vec::new(),
            preferred: Vec::new(),
        }
    }

    pub fn raw(self, product_id: &str, on_hand: f64) -> Self {
        self.product(product_id, ProductKind::Raw, on_hand)
    }

    pub fn intermediate(self, product_id: &str, on_hand: f64) -> Self {
        self.product(product_id, ProductKind::Intermediate, on_hand)
    }

    pub fn finished(self, product_id: &str) -> Self {
        self.product(product_id, ProductKind::Finished, 0.0)
    }

    pub fn product(mut self, product_id: &str, kind: ProductKind, on_hand: f64) -> Self {
        self.products
            .push(NewProduct::new(product_id, product_id, kind, on_hand));
        self
    }

    /// 配方名与配方ID相同
    pub fn recipe(mut self, recipe_id: &str, target: &str, items: &[(&str, f64)]) -> Self {
        let mut recipe = NewRecipe::new(recipe_id, recipe_id).target(target);
        for (product_id, qty) in items {
            recipe = recipe.item(product_id, *qty);
        }
        self.recipes.push(recipe);
        self
    }

    pub fn preferred(mut self, product_id: &str, recipe_id: &str) -> Self {
        self.preferred
            .push((product_id.to_string(), recipe_id.to_string()));
        self
    }

    /// 写入数据库（产品 -> 配方 -> 默认配方）
    pub fn build(self, catalog: &CatalogApi) {
        for product in &self.products {
            catalog.create_product(product, "builder").unwrap();
        }
        for recipe in &self.recipes {
            catalog.create_recipe(recipe).unwrap();
        }
        for (product_id, recipe_id) in &self.preferred {
            catalog.set_preferred(product_id, recipe_id).unwrap();
        }
    }
}
