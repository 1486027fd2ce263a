// ==========================================
// BOM 生产引擎 - 引擎层错误类型
// ==========================================
// 红线: 错误只以类型化结果返回,不吞错、不替换默认值
// ==========================================

use crate::domain::requirement::Requirement;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 配方或产品不存在
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    /// 数量 <= 0 或非有限值,任何遍历开始前即拒绝
    #[error("无效数量: {0}")]
    InvalidQuantity(f64),

    /// 配方经由默认子配方直接或间接需求自身
    #[error("配方循环引用: recipe_id={recipe_id}, path={}", .path.join(" -> "))]
    CycleDetected { recipe_id: String, path: Vec<String> },

    /// 可产性检查失败（无任何写入）
    #[error("库存不足: {} 项缺料", .0.len())]
    InsufficientStock(Vec<Requirement>),

    /// 写锁获取失败或库存在检查后被修改,调用方可整体重试
    #[error("并发修改冲突: {0}")]
    ConcurrentModification(String),

    /// 配方本身不可生产（如未绑定目标产品）
    #[error("配方不可生产: {0}")]
    InvalidRecipe(String),

    /// Catalog / 台账访问失败
    #[error("数据访问失败: {0}")]
    Catalog(RepositoryError),
}

impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            RepositoryError::OptimisticLockFailure { .. }
            | RepositoryError::LockError(_)
            | RepositoryError::DatabaseBusy(_) => EngineError::ConcurrentModification(err.to_string()),
            other => EngineError::Catalog(other),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

/// 校验请求数量（> 0 且为有限值）
pub fn validate_quantity(quantity: f64) -> EngineResult<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(EngineError::InvalidQuantity(quantity));
    }
    Ok(())
}
