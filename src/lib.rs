// ==========================================
// BOM 生产引擎 - 核心库
// ==========================================
// 职责: 多级物料清单需求解析、可产性检查、原子化生产扣料
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 解析与执行
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 连接与 API 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{MovementKind, ProductKind, StockStatus};

// 领域实体
pub use domain::{
    CycleDiagnostic, DirectStockCheck, Feasibility, NewProduct, NewRecipe, Product,
    ProductionConsumption, ProductionRecord, Recipe, RecipeItem, Requirement, Resolution,
    StockMovement,
};

// 引擎
pub use engine::{
    BomGraph, EngineError, FeasibilityChecker, ProductionExecutor, ProductionOutcome,
    ProductionRequest, RequirementResolver,
};

// API
pub use api::{ApiError, ApiResult, CatalogApi, ProductionApi, StockApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "BOM 生产引擎";
