// ==========================================
// BOM 生产引擎 - 引擎层
// ==========================================
// 职责: 多级需求解析、可产性检查、生产执行
// 红线: Engine 不拼 SQL, 只经由 CatalogReader / StockLedgerWriter 访问数据
// 红线: 错误以类型化结果返回,日志不能代替错误
// ==========================================

pub mod bom_graph;
pub mod error;
pub mod executor;
pub mod feasibility;
pub mod resolver;

#[cfg(test)]
mod test_catalog;

// 重导出核心引擎
pub use bom_graph::{BomEdge, BomGraph};
pub use error::{EngineError, EngineResult};
pub use executor::{
    ProductionExecutor, ProductionOutcome, ProductionPhase, ProductionRequest,
    ProductionUnitOfWork,
};
pub use feasibility::FeasibilityChecker;
pub use resolver::RequirementResolver;
