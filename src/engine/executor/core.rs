// ==========================================
// BOM 生产引擎 - 生产执行器
// ==========================================
// 红线: 执行器不提交事务; 事务边界由调用方（API 层）持有
// 红线: 仅顶层产出入库,递归制造的中间件当场消耗
// ==========================================

use crate::config::EngineConfig;
use crate::domain::production::{ProductionConsumption, ProductionRecord, StockMovement};
use crate::domain::recipe::Recipe;
use crate::engine::bom_graph::BomGraph;
use crate::engine::error::{validate_quantity, EngineError, EngineResult};
use crate::engine::resolver::RequirementResolver;
use crate::repository::catalog::CatalogReader;
use crate::repository::ledger_writer::StockLedgerWriter;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::unit_of_work::{ProductionPhase, ProductionUnitOfWork};

// ==========================================
// ProductionRequest - 生产请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRequest {
    pub recipe_id: String,
    pub quantity: f64,
    pub actor: String,
    pub note: Option<String>,
}

impl ProductionRequest {
    pub fn new(recipe_id: &str, quantity: f64, actor: &str) -> Self {
        Self {
            recipe_id: recipe_id.to_string(),
            quantity,
            actor: actor.to_string(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

// ==========================================
// ProductionOutcome - 已过账的生产结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionOutcome {
    pub record: ProductionRecord,
    pub consumptions: Vec<ProductionConsumption>,
    pub movements: Vec<StockMovement>,
}

// 执行期递归上下文: 工作单元 + 当前路径
struct ExecutionContext {
    uow: ProductionUnitOfWork,
    on_stack: HashSet<String>,
    path: Vec<String>,
}

// ==========================================
// ProductionExecutor - 生产执行器
// ==========================================
pub struct ProductionExecutor {
    config: EngineConfig,
    resolver: RequirementResolver,
}

impl ProductionExecutor {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            resolver: RequirementResolver::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 执行一次生产并写入台账
    ///
    /// # 参数
    /// - `graph`: 与 writer 处于同一事务快照的只读图
    /// - `writer`: 台账写入端（不提交）
    ///
    /// # 错误
    /// - `InvalidQuantity` / `NotFound` / `InvalidRecipe`
    /// - `CycleDetected`: 缺口需要经由循环配方制造
    /// - `InsufficientStock`: 复核或扣料过程中库存不足
    /// - `ConcurrentModification`: 提交时库存与读取值不一致
    ///
    /// 返回错误时 writer 可能已有部分写入,调用方必须回滚
    pub fn produce<C, W>(
        &self,
        graph: &BomGraph<'_, C>,
        writer: &mut W,
        request: &ProductionRequest,
    ) -> EngineResult<ProductionOutcome>
    where
        C: CatalogReader + ?Sized,
        W: StockLedgerWriter + ?Sized,
    {
        let uow = self.stage(graph, request)?;
        let outcome = uow.commit(writer)?;

        info!(
            production_id = %outcome.record.production_id,
            recipe_id = %outcome.record.recipe_id,
            quantity = outcome.record.quantity,
            actor = %outcome.record.actor,
            consumption_count = outcome.consumptions.len(),
            movement_count = outcome.movements.len(),
            "生产过账完成"
        );
        Ok(outcome)
    }

    /// 复核可产性并在内存中暂存全部扣料与入库,不做任何写入
    pub fn stage<C: CatalogReader + ?Sized>(
        &self,
        graph: &BomGraph<'_, C>,
        request: &ProductionRequest,
    ) -> EngineResult<ProductionUnitOfWork> {
        // ----- Checking -----
        validate_quantity(request.quantity)?;
        let root = graph.recipe(&request.recipe_id)?;
        let target_id = root.target_product_id.clone().ok_or_else(|| {
            EngineError::InvalidRecipe(format!("配方 {} 未绑定产出产品", root.recipe_id))
        })?;
        let target = graph.product(&target_id)?;

        let resolution = self
            .resolver
            .resolve(graph, &root.recipe_id, request.quantity)?;
        if let Some(cycle) = resolution.cycles.first() {
            warn!(
                recipe_id = %root.recipe_id,
                cycle_path = %cycle.path.join(" -> "),
                "生产被拒绝: 配方循环引用"
            );
            return Err(EngineError::CycleDetected {
                recipe_id: cycle.recipe_id.clone(),
                path: cycle.path.clone(),
            });
        }
        if !resolution.shortages.is_empty() {
            debug!(
                recipe_id = %root.recipe_id,
                shortage_count = resolution.shortages.len(),
                "生产被拒绝: 库存不足"
            );
            return Err(EngineError::InsufficientStock(resolution.shortages));
        }

        let record = ProductionRecord {
            production_id: Uuid::new_v4().to_string(),
            recipe_id: root.recipe_id.clone(),
            quantity: request.quantity,
            actor: request.actor.clone(),
            produced_at: Utc::now().naive_utc(),
            note: request.note.clone(),
        };

        // ----- Consuming -----
        let mut ctx = ExecutionContext {
            uow: ProductionUnitOfWork::new(record, self.config.stock_tolerance),
            on_stack: HashSet::new(),
            path: Vec::new(),
        };
        ctx.uow.advance(ProductionPhase::Consuming);
        self.consume(graph, &mut ctx, &root, request.quantity)?;

        // ----- Crediting -----
        ctx.uow.advance(ProductionPhase::Crediting);
        let line_label = root.consumption_label(&self.config.line_label);
        ctx.uow.credit(
            &target,
            request.quantity,
            &line_label,
            &self.config.warehouse_label,
        );

        Ok(ctx.uow)
    }

    fn consume<C: CatalogReader + ?Sized>(
        &self,
        graph: &BomGraph<'_, C>,
        ctx: &mut ExecutionContext,
        recipe: &Recipe,
        quantity: f64,
    ) -> EngineResult<()> {
        ctx.on_stack.insert(recipe.recipe_id.clone());
        ctx.path.push(recipe.recipe_id.clone());

        let destination = recipe.consumption_label(&self.config.line_label);
        let source = self.config.warehouse_label.as_str();

        for edge in graph.edges(recipe)? {
            let demand = edge.demand(quantity);

            let sub_recipe = match &edge.sub_recipe {
                Some(sub) => sub,
                None => {
                    ctx.uow.consume(&edge.component, demand, source, &destination)?;
                    continue;
                }
            };

            let on_hand = ctx.uow.on_hand(&edge.component).max(0.0);
            if on_hand >= demand {
                ctx.uow.consume(&edge.component, demand, source, &destination)?;
                continue;
            }
            if on_hand > 0.0 {
                ctx.uow.consume(&edge.component, on_hand, source, &destination)?;
            }

            if ctx.on_stack.contains(&sub_recipe.recipe_id) {
                let mut path = ctx.path.clone();
                path.push(sub_recipe.recipe_id.clone());
                return Err(EngineError::CycleDetected {
                    recipe_id: sub_recipe.recipe_id.clone(),
                    path,
                });
            }

            let shortfall = demand - on_hand;
            debug!(
                component = %edge.component.product_id,
                sub_recipe_id = %sub_recipe.recipe_id,
                shortfall = shortfall,
                "在库不足,按默认配方制造缺口"
            );
            self.consume(graph, ctx, sub_recipe, shortfall)?;
        }

        ctx.on_stack.remove(&recipe.recipe_id);
        ctx.path.pop();
        Ok(())
    }
}
