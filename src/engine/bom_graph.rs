// ==========================================
// BOM 生产引擎 - 物料清单图视图
// ==========================================
// 职责: 把 Catalog 读契约投影为"配方 -> 组件边"
// 红线: Engine 不拼 SQL, 只经由 CatalogReader 读取
// ==========================================

use crate::domain::product::Product;
use crate::domain::recipe::Recipe;
use crate::engine::error::EngineResult;
use crate::repository::catalog::CatalogReader;

// ==========================================
// BomEdge - 配方的一条组件边
// ==========================================
#[derive(Debug, Clone)]
pub struct BomEdge {
    /// 组件产品（含当前在库数量）
    pub component: Product,
    /// 每单位目标产品的组件用量
    pub quantity_per_unit: f64,
    /// 组件的默认配方（无则为叶子物料）
    pub sub_recipe: Option<Recipe>,
}

impl BomEdge {
    /// 生产 quantity 个目标产品时该组件的需求量
    pub fn demand(&self, quantity: f64) -> f64 {
        self.quantity_per_unit * quantity
    }

    pub fn is_leaf(&self) -> bool {
        self.sub_recipe.is_none()
    }
}

// ==========================================
// BomGraph - 基于 CatalogReader 的只读图
// ==========================================
pub struct BomGraph<'c, C: CatalogReader + ?Sized> {
    catalog: &'c C,
}

impl<'c, C: CatalogReader + ?Sized> BomGraph<'c, C> {
    pub fn new(catalog: &'c C) -> Self {
        Self { catalog }
    }

    /// 读取配方（不存在时返回 NotFound）
    pub fn recipe(&self, recipe_id: &str) -> EngineResult<Recipe> {
        Ok(self.catalog.get_recipe(recipe_id)?)
    }

    /// 读取产品（不存在时返回 NotFound）
    pub fn product(&self, product_id: &str) -> EngineResult<Product> {
        Ok(self.catalog.get_product(product_id)?)
    }

    /// 展开配方的直接组件边,顺序与配方明细一致
    pub fn edges(&self, recipe: &Recipe) -> EngineResult<Vec<BomEdge>> {
        let mut edges = Vec::with_capacity(recipe.items.len());
        for item in &recipe.items {
            let component = self.catalog.get_product(&item.product_id)?;
            let sub_recipe = self.catalog.preferred_recipe_for_target(&item.product_id)?;
            edges.push(BomEdge {
                component,
                quantity_per_unit: item.quantity_per_unit,
                sub_recipe,
            });
        }
        Ok(edges)
    }
}
