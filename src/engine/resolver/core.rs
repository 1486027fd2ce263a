// ==========================================
// BOM 生产引擎 - 多级需求解析器
// ==========================================
// 红线: 只读,不写入任何库存或台账
// 红线: 组件在库优先; 仅缺口部分向下展开默认配方
// ==========================================

use crate::domain::recipe::Recipe;
use crate::domain::requirement::Resolution;
use crate::engine::bom_graph::BomGraph;
use crate::engine::error::{validate_quantity, EngineResult};
use crate::repository::catalog::CatalogReader;
use tracing::{debug, warn};

use super::context::ResolveContext;

// ==========================================
// RequirementResolver - 需求解析器
// ==========================================
// 无状态引擎,所有数据经由 BomGraph 读取
pub struct RequirementResolver {}

impl RequirementResolver {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算生产 quantity 个配方产出所需的叶子物料合计
    ///
    /// # 规则
    /// 1. 叶子组件（无默认配方）: 需求量 = 单位用量 × 数量,累加
    /// 2. 中间组件在库 >= 需求: 直接使用库存,不展开
    /// 3. 中间组件在库 < 需求: 缺口部分按默认配方向下展开
    /// 4. 默认配方已在当前路径上: 记录循环诊断,组件全部需求按叶子计入
    ///
    /// # 错误
    /// - `InvalidQuantity`: quantity <= 0 或非有限值
    /// - `NotFound`: 配方或任一组件产品不存在
    pub fn resolve<C: CatalogReader + ?Sized>(
        &self,
        graph: &BomGraph<'_, C>,
        recipe_id: &str,
        quantity: f64,
    ) -> EngineResult<Resolution> {
        validate_quantity(quantity)?;
        let root = graph.recipe(recipe_id)?;

        let mut ctx = ResolveContext::new();
        self.walk(graph, &mut ctx, &root, quantity)?;
        let resolution = ctx.finish();

        debug!(
            recipe_id = %recipe_id,
            quantity = quantity,
            leaf_count = resolution.leaf_requirements.len(),
            shortage_count = resolution.shortages.len(),
            cycle_count = resolution.cycles.len(),
            "需求解析完成"
        );

        Ok(resolution)
    }

    fn walk<C: CatalogReader + ?Sized>(
        &self,
        graph: &BomGraph<'_, C>,
        ctx: &mut ResolveContext,
        recipe: &Recipe,
        quantity: f64,
    ) -> EngineResult<()> {
        ctx.enter(recipe);
        debug!(
            recipe_id = %recipe.recipe_id,
            quantity = quantity,
            depth = ctx.depth(),
            "展开配方"
        );

        for edge in graph.edges(recipe)? {
            let demand = edge.demand(quantity);

            let sub_recipe = match &edge.sub_recipe {
                Some(sub) => sub,
                None => {
                    ctx.accumulate(&edge.component, demand);
                    continue;
                }
            };

            let on_hand = edge.component.on_hand_quantity.max(0.0);
            if on_hand >= demand {
                continue;
            }
            let shortfall = demand - on_hand;

            if ctx.is_on_stack(&sub_recipe.recipe_id) {
                warn!(
                    recipe_id = %sub_recipe.recipe_id,
                    component = %edge.component.product_id,
                    unresolved = shortfall,
                    "检测到配方循环引用,组件按叶子物料计入"
                );
                ctx.record_cycle(sub_recipe, &edge.component, shortfall);
                ctx.accumulate(&edge.component, demand);
                continue;
            }

            self.walk(graph, ctx, sub_recipe, shortfall)?;
        }

        ctx.leave(recipe);
        Ok(())
    }
}

impl Default for RequirementResolver {
    fn default() -> Self {
        Self::new()
    }
}
