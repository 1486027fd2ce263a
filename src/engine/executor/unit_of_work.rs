// ==========================================
// 生产工作单元
// ==========================================
// 扣料/入库先在内存中暂存,提交时按暂存顺序
// 逐条调整库存并写入对应流水
// ==========================================

use crate::config::MAX_STOCK_TOLERANCE;
use crate::domain::product::Product;
use crate::domain::production::{ProductionConsumption, ProductionRecord, StockMovement};
use crate::domain::requirement::Requirement;
use crate::domain::types::MovementKind;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::ledger_writer::StockLedgerWriter;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::core::ProductionOutcome;

/// 执行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductionPhase {
    Checking,
    Consuming,
    Crediting,
    Committed,
}

// ==========================================
// ProductionUnitOfWork - 暂存的一次生产
// ==========================================
pub struct ProductionUnitOfWork {
    record: ProductionRecord,
    tolerance: f64,
    phase: ProductionPhase,
    consumptions: Vec<ProductionConsumption>,
    movements: Vec<StockMovement>,
    // 首次读取时的库存（提交时的期望值）
    observed: HashMap<String, f64>,
    // 暂存后的库存
    staged: HashMap<String, f64>,
}

impl ProductionUnitOfWork {
    /// tolerance 超出库存下限约束时按上限截断
    pub fn new(record: ProductionRecord, tolerance: f64) -> Self {
        Self {
            record,
            tolerance: if tolerance.is_finite() {
                tolerance.clamp(0.0, MAX_STOCK_TOLERANCE)
            } else {
                0.0
            },
            phase: ProductionPhase::Checking,
            consumptions: Vec::new(),
            movements: Vec::new(),
            observed: HashMap::new(),
            staged: HashMap::new(),
        }
    }

    pub fn record(&self) -> &ProductionRecord {
        &self.record
    }

    pub fn phase(&self) -> ProductionPhase {
        self.phase
    }

    pub fn consumptions(&self) -> &[ProductionConsumption] {
        &self.consumptions
    }

    pub fn movements(&self) -> &[StockMovement] {
        &self.movements
    }

    pub(super) fn advance(&mut self, next: ProductionPhase) {
        debug!(
            production_id = %self.record.production_id,
            from = ?self.phase,
            to = ?next,
            "生产阶段切换"
        );
        self.phase = next;
    }

    /// 当前暂存视图下的在库数量
    pub fn on_hand(&self, product: &Product) -> f64 {
        self.staged
            .get(&product.product_id)
            .copied()
            .unwrap_or(product.on_hand_quantity)
    }

    /// 暂存一次扣料（扣料明细 + 出库流水各一条）
    ///
    /// # 错误
    /// - `InsufficientStock`: 扣料后库存低于 -tolerance
    pub fn consume(
        &mut self,
        product: &Product,
        quantity: f64,
        source_label: &str,
        destination_label: &str,
    ) -> EngineResult<()> {
        let on_hand = self.on_hand(product);
        let remaining = on_hand - quantity;
        if remaining < -self.tolerance {
            return Err(EngineError::InsufficientStock(vec![Requirement::new(
                &product.product_id,
                &product.name,
                quantity,
                on_hand.max(0.0),
            )]));
        }

        self.stage_stock(product, remaining);
        self.consumptions.push(ProductionConsumption {
            production_id: self.record.production_id.clone(),
            product_id: product.product_id.clone(),
            quantity,
        });
        self.push_movement(
            product,
            -quantity,
            MovementKind::ProductionConsume,
            source_label,
            destination_label,
        );
        Ok(())
    }

    /// 暂存一次成品入库
    pub fn credit(
        &mut self,
        product: &Product,
        quantity: f64,
        source_label: &str,
        destination_label: &str,
    ) {
        let updated = self.on_hand(product) + quantity;
        self.stage_stock(product, updated);
        self.push_movement(
            product,
            quantity,
            MovementKind::ProductionOutput,
            source_label,
            destination_label,
        );
    }

    fn stage_stock(&mut self, product: &Product, on_hand: f64) {
        self.observed
            .entry(product.product_id.clone())
            .or_insert(product.on_hand_quantity);
        self.staged.insert(product.product_id.clone(), on_hand);
    }

    fn push_movement(
        &mut self,
        product: &Product,
        signed_quantity: f64,
        kind: MovementKind,
        source_label: &str,
        destination_label: &str,
    ) {
        self.movements.push(StockMovement {
            movement_id: Uuid::new_v4().to_string(),
            product_id: product.product_id.clone(),
            signed_quantity,
            kind,
            source_label: source_label.to_string(),
            destination_label: destination_label.to_string(),
            actor: self.record.actor.clone(),
            moved_at: self.record.produced_at,
            production_id: Some(self.record.production_id.clone()),
            note: self.record.note.clone(),
        });
    }

    /// 写入台账
    ///
    /// 顺序: 生产记录 -> 扣料明细 -> (库存调整 + 流水) × N
    /// 库存调整按首次读取值做期望值比较,不一致即 ConcurrentModification
    pub fn commit<W: StockLedgerWriter + ?Sized>(
        mut self,
        writer: &mut W,
    ) -> EngineResult<ProductionOutcome> {
        writer.append_production(&self.record)?;
        for consumption in &self.consumptions {
            writer.append_consumption(consumption)?;
        }

        let mut expected = self.observed.clone();
        for movement in &self.movements {
            let current = expected
                .get(&movement.product_id)
                .copied()
                .ok_or_else(|| {
                    EngineError::ConcurrentModification(format!(
                        "产品 {} 未在工作单元中登记",
                        movement.product_id
                    ))
                })?;
            let updated = writer.adjust_stock(
                &movement.product_id,
                current,
                movement.signed_quantity,
                &movement.moved_at,
            )?;
            expected.insert(movement.product_id.clone(), updated);
            writer.append_movement(movement)?;
        }

        self.advance(ProductionPhase::Committed);
        Ok(ProductionOutcome {
            record: self.record,
            consumptions: self.consumptions,
            movements: self.movements,
        })
    }
}
