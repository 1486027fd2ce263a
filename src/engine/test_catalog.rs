// ==========================================
// 引擎单元测试用内存 Catalog / 台账
// ==========================================

use crate::domain::product::Product;
use crate::domain::production::{ProductionConsumption, ProductionRecord, StockMovement};
use crate::domain::recipe::{Recipe, RecipeItem};
use crate::domain::types::ProductKind;
use crate::repository::catalog::CatalogReader;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::ledger_writer::StockLedgerWriter;
use chrono::{NaiveDateTime, Utc};
use std::collections::HashMap;

#[derive(Default)]
pub struct InMemoryCatalog {
    pub products: HashMap<String, Product>,
    pub recipes: HashMap<String, Recipe>,
    pub preferred: HashMap<String, String>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, product_id: &str, on_hand: f64) -> Self {
        self.products.insert(
            product_id.to_string(),
            Product {
                product_id: product_id.to_string(),
                name: format!("{}-name", product_id),
                unit: "pcs".to_string(),
                kind: ProductKind::Raw,
                on_hand_quantity: on_hand,
                reorder_threshold: 0.0,
                updated_at: Utc::now().naive_utc(),
            },
        );
        self
    }

    /// 新增配方; 目标产品首次绑定时自动成为默认配方
    pub fn with_recipe(mut self, recipe_id: &str, target: Option<&str>, items: &[(&str, f64)]) -> Self {
        let recipe = Recipe {
            recipe_id: recipe_id.to_string(),
            name: format!("{}-recipe", recipe_id),
            line_label: None,
            target_product_id: target.map(|t| t.to_string()),
            items: items
                .iter()
                .map(|(product_id, qty)| RecipeItem {
                    recipe_id: recipe_id.to_string(),
                    product_id: product_id.to_string(),
                    quantity_per_unit: *qty,
                    note: None,
                })
                .collect(),
        };
        if let Some(target) = target {
            self.preferred
                .entry(target.to_string())
                .or_insert_with(|| recipe_id.to_string());
        }
        self.recipes.insert(recipe_id.to_string(), recipe);
        self
    }

    pub fn with_preferred(mut self, product_id: &str, recipe_id: &str) -> Self {
        self.preferred
            .insert(product_id.to_string(), recipe_id.to_string());
        self
    }

    /// 以当前库存快照构造写入端
    pub fn writer(&self) -> RecordingWriter {
        RecordingWriter {
            stock: self
                .products
                .iter()
                .map(|(id, p)| (id.clone(), p.on_hand_quantity))
                .collect(),
            ..Default::default()
        }
    }
}

impl CatalogReader for InMemoryCatalog {
    fn get_recipe(&self, recipe_id: &str) -> RepositoryResult<Recipe> {
        self.recipes
            .get(recipe_id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("Recipe", recipe_id))
    }

    fn get_product(&self, product_id: &str) -> RepositoryResult<Product> {
        self.products
            .get(product_id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("Product", product_id))
    }

    fn preferred_recipe_for_target(&self, product_id: &str) -> RepositoryResult<Option<Recipe>> {
        Ok(self
            .preferred
            .get(product_id)
            .and_then(|recipe_id| self.recipes.get(recipe_id))
            .cloned())
    }
}

#[derive(Default)]
pub struct RecordingWriter {
    pub stock: HashMap<String, f64>,
    pub productions: Vec<ProductionRecord>,
    pub consumptions: Vec<ProductionConsumption>,
    pub movements: Vec<StockMovement>,
}

impl StockLedgerWriter for RecordingWriter {
    fn adjust_stock(
        &mut self,
        product_id: &str,
        expected_on_hand: f64,
        signed_delta: f64,
        _at: &NaiveDateTime,
    ) -> RepositoryResult<f64> {
        let current = self
            .stock
            .get_mut(product_id)
            .ok_or_else(|| RepositoryError::not_found("Product", product_id))?;
        if *current != expected_on_hand {
            return Err(RepositoryError::OptimisticLockFailure {
                product_id: product_id.to_string(),
                expected: expected_on_hand,
                actual: *current,
            });
        }
        *current = expected_on_hand + signed_delta;
        Ok(*current)
    }

    fn append_production(&mut self, record: &ProductionRecord) -> RepositoryResult<()> {
        self.productions.push(record.clone());
        Ok(())
    }

    fn append_consumption(&mut self, consumption: &ProductionConsumption) -> RepositoryResult<()> {
        self.consumptions.push(consumption.clone());
        Ok(())
    }

    fn append_movement(&mut self, movement: &StockMovement) -> RepositoryResult<()> {
        self.movements.push(movement.clone());
        Ok(())
    }
}
