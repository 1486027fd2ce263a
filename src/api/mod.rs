// ==========================================
// BOM 生产引擎 - API 层
// ==========================================
// 职责: 面向调用方的业务接口（CLI / 上层服务）
// ==========================================

pub mod catalog_api;
pub mod error;
pub mod production_api;
pub mod stock_api;
pub mod validator;

// 重导出核心类型
pub use catalog_api::CatalogApi;
pub use error::{ApiError, ApiResult};
pub use production_api::{ProductionApi, ProductionDetail};
pub use stock_api::{ProductStockSummary, StockApi};
