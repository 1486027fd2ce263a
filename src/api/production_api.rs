// ==========================================
// BOM 生产引擎 - 生产 API
// ==========================================
// 职责: 需求解析、可产性检查、生产过账、生产记录查询
// 红线: produce 全有或全无; 持有连接锁 + IMMEDIATE 事务串行化写入
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{validate_id, validate_quantity};
use crate::config::ConfigManager;
use crate::domain::production::{ProductionConsumption, ProductionRecord, StockMovement};
use crate::domain::requirement::{DirectStockCheck, Feasibility, Requirement, Resolution};
use crate::engine::{
    BomGraph, FeasibilityChecker, ProductionExecutor, ProductionOutcome, ProductionRequest,
    RequirementResolver,
};
use crate::repository::catalog::SqliteCatalog;
use crate::repository::ledger_repo::AuditLedgerRepository;
use crate::repository::ledger_writer::SqliteLedgerWriter;

// ==========================================
// ProductionDetail - 生产记录详情
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionDetail {
    pub record: ProductionRecord,
    pub consumptions: Vec<ProductionConsumption>,
    pub movements: Vec<StockMovement>,
}

// ==========================================
// ProductionApi - 生产 API
// ==========================================
pub struct ProductionApi {
    conn: Arc<Mutex<Connection>>,
    config_manager: Arc<ConfigManager>,
    ledger_repo: AuditLedgerRepository,
}

impl ProductionApi {
    /// 创建新的 ProductionApi 实例
    ///
    /// # 参数
    /// - conn: 共享数据库连接（所有写入经由该连接串行化）
    /// - config_manager: 配置管理器
    pub fn new(conn: Arc<Mutex<Connection>>, config_manager: Arc<ConfigManager>) -> Self {
        Self {
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
    // 只读接口（同一读事务快照内完成）
    // ==========================================

    /// 计算生产所需的叶子物料合计与缺料
    pub fn resolve(&self, recipe_id: &str, quantity: f64) -> ApiResult<Resolution> {
        validate_id("recipe_id", recipe_id)?;
        validate_quantity(quantity)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let catalog = SqliteCatalog::new(&tx);
        let graph = BomGraph::new(&catalog);

        Ok(RequirementResolver::new().resolve(&graph, recipe_id, quantity)?)
    }

    /// 可产性检查
    pub fn can_produce(&self, recipe_id: &str, quantity: f64) -> ApiResult<Feasibility> {
        validate_id("recipe_id", recipe_id)?;
        validate_quantity(quantity)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let catalog = SqliteCatalog::new(&tx);
        let graph = BomGraph::new(&catalog);

        Ok(FeasibilityChecker::new().can_produce(&graph, recipe_id, quantity)?)
    }

    /// 全部缺料项（可产时为空）
    pub fn missing_materials(&self, recipe_id: &str, quantity: f64) -> ApiResult<Vec<Requirement>> {
        validate_id("recipe_id", recipe_id)?;
        validate_quantity(quantity)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let catalog = SqliteCatalog::new(&tx);
        let graph = BomGraph::new(&catalog);

        Ok(FeasibilityChecker::new().missing_materials(&graph, recipe_id, quantity)?)
    }

    /// 单层库存检查（不展开子配方）
    pub fn check_stock(&self, recipe_id: &str, quantity: f64) -> ApiResult<DirectStockCheck> {
        validate_id("recipe_id", recipe_id)?;
        validate_quantity(quantity)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let catalog = SqliteCatalog::new(&tx);
        let graph = BomGraph::new(&catalog);

        Ok(FeasibilityChecker::new().check_direct(&graph, recipe_id, quantity)?)
    }

    // ==========================================
    // 生产过账
    // ==========================================

    /// 生产 quantity 个配方产出
    ///
    /// # 流程
    /// 1. 读取引擎配置（在获取连接锁之前）
    /// 2. 持有连接锁,开启 IMMEDIATE 事务
    /// 3. 事务内复核可产性 -> 扣料 -> 成品入库
    /// 4. 成功提交; 任何错误回滚,库存与台账保持不变
    ///
    /// # 错误
    /// - `ConcurrentModification`: 写锁获取失败或库存在复核后被修改,可整体重试
    pub fn produce(
        &self,
        recipe_id: &str,
        quantity: f64,
        actor: &str,
        note: Option<&str>,
    ) -> ApiResult<ProductionOutcome> {
        validate_id("recipe_id", recipe_id)?;
        validate_id("actor", actor)?;
        validate_quantity(quantity)?;

        let engine_config = self.config_manager.load_engine_config()?;
        let executor = ProductionExecutor::new(engine_config);
        let mut request = ProductionRequest::new(recipe_id, quantity, actor);
        if let Some(note) = note {
            request = request.with_note(note);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let result = {
            let catalog = SqliteCatalog::new(&tx);
            let graph = BomGraph::new(&catalog);
            let mut writer = SqliteLedgerWriter::new(&tx);
            executor.produce(&graph, &mut writer, &request)
        };

        match result {
            Ok(outcome) => {
                tx.commit()?;
                Ok(outcome)
            }
            Err(err) => {
                warn!(
                    recipe_id = %recipe_id,
                    quantity = quantity,
                    actor = %actor,
                    error = %err,
                    "生产失败,事务回滚"
                );
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "事务回滚失败");
                }
                Err(err.into())
            }
        }
    }

    // ==========================================
    // 记录查询
    // ==========================================

    /// 查询一次生产的完整记录（表头 + 扣料明细 + 流水）
    pub fn get_production(&self, production_id: &str) -> ApiResult<ProductionDetail> {
        validate_id("production_id", production_id)?;

        let record = self
            .ledger_repo
            .find_production(production_id)?
            .ok_or_else(|| ApiError::NotFound(format!("ProductionRecord(id={})不存在", production_id)))?;
        let consumptions = self.ledger_repo.list_consumptions(production_id)?;
        let movements = self.ledger_repo.list_movements_by_production(production_id)?;

        info!(
            production_id = %production_id,
            consumption_count = consumptions.len(),
            "查询生产记录"
        );

        Ok(ProductionDetail {
            record,
            consumptions,
            movements,
        })
    }

    /// 查询配方的生产历史（最新在前）
    pub fn list_productions(&self, recipe_id: &str) -> ApiResult<Vec<ProductionRecord>> {
        validate_id("recipe_id", recipe_id)?;
        Ok(self.ledger_repo.list_productions_by_recipe(recipe_id)?)
    }
}
