// ==========================================
// BOM 生产引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod product;
pub mod production;
pub mod recipe;
pub mod requirement;
pub mod types;

// 重导出核心类型
pub use product::{NewProduct, Product};
pub use production::{ProductionConsumption, ProductionRecord, StockMovement};
pub use recipe::{NewRecipe, Recipe, RecipeItem};
pub use requirement::{
    CycleDiagnostic, DirectItemStatus, DirectStockCheck, Feasibility, Requirement, Resolution,
};
pub use types::{MovementKind, ProductKind, StockStatus};
