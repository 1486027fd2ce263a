// ==========================================
// BOM 生产引擎 - 可产性检查
// ==========================================
// 职责: 基于需求解析结果给出可产/缺料结论
// 红线: 只读; 结论与解析器共用同一套递归规则
// ==========================================

use crate::domain::requirement::{
    DirectItemStatus, DirectStockCheck, Feasibility, Requirement,
};
use crate::engine::bom_graph::BomGraph;
use crate::engine::error::{validate_quantity, EngineResult};
use crate::engine::resolver::RequirementResolver;
use crate::repository::catalog::CatalogReader;
use tracing::debug;

// ==========================================
// FeasibilityChecker - 可产性检查器
// ==========================================
pub struct FeasibilityChecker {
    resolver: RequirementResolver,
}

impl FeasibilityChecker {
    pub fn new() -> Self {
        Self {
            resolver: RequirementResolver::new(),
        }
    }

    /// 判断能否生产 quantity 个配方产出
    ///
    /// 不可产时附带深度优先顺序下的第一个缺料项
    pub fn can_produce<C: CatalogReader + ?Sized>(
        &self,
        graph: &BomGraph<'_, C>,
        recipe_id: &str,
        quantity: f64,
    ) -> EngineResult<Feasibility> {
        let resolution = self.resolver.resolve(graph, recipe_id, quantity)?;

        let feasibility = match resolution.shortages.into_iter().next() {
            Some(first_shortage) => Feasibility::Infeasible { first_shortage },
            None => Feasibility::Feasible,
        };
        debug!(
            recipe_id = %recipe_id,
            quantity = quantity,
            feasible = feasibility.is_feasible(),
            "可产性检查完成"
        );
        Ok(feasibility)
    }

    /// 返回全部缺料项（可产时为空）
    pub fn missing_materials<C: CatalogReader + ?Sized>(
        &self,
        graph: &BomGraph<'_, C>,
        recipe_id: &str,
        quantity: f64,
    ) -> EngineResult<Vec<Requirement>> {
        Ok(self.resolver.resolve(graph, recipe_id, quantity)?.shortages)
    }

    /// 单层库存检查: 只看配方直接明细,不展开子配方
    pub fn check_direct<C: CatalogReader + ?Sized>(
        &self,
        graph: &BomGraph<'_, C>,
        recipe_id: &str,
        quantity: f64,
    ) -> EngineResult<DirectStockCheck> {
        validate_quantity(quantity)?;
        let recipe = graph.recipe(recipe_id)?;

        let mut items = Vec::with_capacity(recipe.items.len());
        for edge in graph.edges(&recipe)? {
            let required = edge.demand(quantity);
            let available = edge.component.on_hand_quantity;
            items.push(DirectItemStatus {
                product_id: edge.component.product_id.clone(),
                product_name: edge.component.name.clone(),
                required,
                available,
                sufficient: available >= required,
                shortage: (required - available).max(0.0),
            });
        }

        Ok(DirectStockCheck {
            recipe_id: recipe.recipe_id,
            quantity,
            can_produce: items.iter().all(|i| i.sufficient),
            items,
        })
    }
}

impl Default for FeasibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}
