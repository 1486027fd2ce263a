// ==========================================
// BOM 生产引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: Catalog 读写契约 + 产品/配方维护 + 审计台账查询
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod catalog;
pub mod error;
pub mod ledger_repo;
pub mod ledger_writer;
pub mod mapping;
pub mod product_repo;
pub mod recipe_repo;

// 重导出核心仓储
pub use catalog::{CatalogReader, SqliteCatalog};
pub use error::{RepositoryError, RepositoryResult};
pub use ledger_repo::AuditLedgerRepository;
pub use ledger_writer::{SqliteLedgerWriter, StockLedgerWriter};
pub use product_repo::ProductRepository;
pub use recipe_repo::RecipeRepository;
