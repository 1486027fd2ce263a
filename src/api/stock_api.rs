// ==========================================
// BOM 生产引擎 - 库存 API
// ==========================================
// 职责: 手工出入库、库存状态查询、流水查询
// 红线: 每一次库存变化写且只写一条流水
// 红线: 手工出库不得超过在库数量
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{validate_id, validate_outbound_kind, validate_quantity};
use crate::config::ConfigManager;
use crate::domain::product::Product;
use crate::domain::production::StockMovement;
use crate::domain::requirement::Requirement;
use crate::domain::types::{MovementKind, StockStatus};
use crate::repository::ledger_repo::AuditLedgerRepository;
use crate::repository::ledger_writer::{SqliteLedgerWriter, StockLedgerWriter};
use crate::repository::mapping::query_product;
use crate::repository::product_repo::ProductRepository;

// ==========================================
// ProductStockSummary - 产品库存概览
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductStockSummary {
    pub product: Product,
    pub status: StockStatus,
    pub total_in: f64,
    pub total_out: f64,
}

// 一次手工库存变更
struct ManualMovement<'a> {
    product_id: &'a str,
    signed_quantity: f64,
    kind: MovementKind,
    source_label: &'a str,
    destination_label: &'a str,
    actor: &'a str,
    note: Option<&'a str>,
}

// ==========================================
// StockApi - 库存 API
// ==========================================
pub struct StockApi {
    conn: Arc<Mutex<Connection>>,
    config_manager: Arc<ConfigManager>,
    product_repo: ProductRepository,
    ledger_repo: AuditLedgerRepository,
}

impl StockApi {
    pub fn new(conn: Arc<Mutex<Connection>>, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            product_repo: ProductRepository::new(conn.clone()),
            ledger_repo: AuditLedgerRepository::new(conn.clone()),
            conn,
            config_manager,
        }
    }

    fn get_conn(&self) -> ApiResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ApiError::ConcurrentModification(format!("数据库锁获取失败: {}", e)))
    }

    // ==========================================
    // 手工出入库
    // ==========================================

    /// 手工入库（来源 -> 仓库）
    pub fn stock_in(
        &self,
        product_id: &str,
        quantity: f64,
        source_label: &str,
        actor: &str,
        note: Option<&str>,
    ) -> ApiResult<StockMovement> {
        validate_quantity(quantity)?;
        validate_id("source_label", source_label)?;
        let warehouse = self.config_manager.load_engine_config()?.warehouse_label;

        self.apply_manual(ManualMovement {
            product_id,
            signed_quantity: quantity,
            kind: MovementKind::StockIn,
            source_label,
            destination_label: &warehouse,
            actor,
            note,
        })
    }

    /// 手工出库（仓库 -> 目的地）
    ///
    /// kind 仅允许 StockOut / Transfer / Scrap
    pub fn stock_out(
        &self,
        product_id: &str,
        quantity: f64,
        destination_label: &str,
        kind: MovementKind,
        actor: &str,
        note: Option<&str>,
    ) -> ApiResult<StockMovement> {
        validate_quantity(quantity)?;
        validate_id("destination_label", destination_label)?;
        validate_outbound_kind(kind)?;
        let warehouse = self.config_manager.load_engine_config()?.warehouse_label;

        self.apply_manual(ManualMovement {
            product_id,
            signed_quantity: -quantity,
            kind,
            source_label: &warehouse,
            destination_label,
            actor,
            note,
        })
    }

    fn apply_manual(&self, change: ManualMovement<'_>) -> ApiResult<StockMovement> {
        validate_id("product_id", change.product_id)?;
        validate_id("actor", change.actor)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let product = query_product(&tx, change.product_id)?.ok_or_else(|| {
            ApiError::NotFound(format!("Product(id={})不存在", change.product_id))
        })?;
        if product.on_hand_quantity + change.signed_quantity < 0.0 {
            return Err(ApiError::InsufficientStock(vec![Requirement::new(
                &product.product_id,
                &product.name,
                change.signed_quantity.abs(),
                product.on_hand_quantity.max(0.0),
            )]));
        }

        let now = Utc::now().naive_utc();
        let movement = StockMovement {
            movement_id: Uuid::new_v4().to_string(),
            product_id: product.product_id.clone(),
            signed_quantity: change.signed_quantity,
            kind: change.kind,
            source_label: change.source_label.to_string(),
            destination_label: change.destination_label.to_string(),
            actor: change.actor.to_string(),
            moved_at: now,
            production_id: None,
            note: change.note.map(|n| n.to_string()),
        };

        {
            let mut writer = SqliteLedgerWriter::new(&tx);
            writer.adjust_stock(
                &product.product_id,
                product.on_hand_quantity,
                change.signed_quantity,
                &now,
            )?;
            writer.append_movement(&movement)?;
        }
        tx.commit()?;

        info!(
            product_id = %movement.product_id,
            kind = movement.kind.to_db_str(),
            signed_quantity = movement.signed_quantity,
            actor = %movement.actor,
            "手工库存变更完成"
        );
        Ok(movement)
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 产品库存概览（状态 + 累计出入库）
    pub fn product_summary(&self, product_id: &str) -> ApiResult<ProductStockSummary> {
        validate_id("product_id", product_id)?;

        let product = self
            .product_repo
            .find_by_id(product_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Product(id={})不存在", product_id)))?;
        let total_in = self.ledger_repo.total_in(product_id)?;
        let total_out = self.ledger_repo.total_out(product_id)?;

        Ok(ProductStockSummary {
            status: product.stock_status(),
            product,
            total_in,
            total_out,
        })
    }

    /// 低于安全库存的产品
    pub fn list_below_threshold(&self) -> ApiResult<Vec<Product>> {
        Ok(self.product_repo.list_below_threshold()?)
    }

    /// 产品最近的库存流水（最新在前）
    pub fn list_movements(&self, product_id: &str, limit: usize) -> ApiResult<Vec<StockMovement>> {
        validate_id("product_id", product_id)?;
        Ok(self.ledger_repo.list_movements_by_product(product_id, limit)?)
    }
}
