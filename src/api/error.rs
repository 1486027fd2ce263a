// ==========================================
// BOM 生产引擎 - API层错误类型
// ==========================================
// 职责: 定义调用方可见的错误类型
// 转换: RepositoryError / EngineError -> ApiError
// ==========================================

use crate::domain::requirement::Requirement;
use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 生产业务错误
    // ==========================================
    #[error("无效数量: {0}")]
    InvalidQuantity(f64),

    #[error("配方循环引用: recipe_id={recipe_id}, path={}", .path.join(" -> "))]
    CycleDetected { recipe_id: String, path: Vec<String> },

    #[error("库存不足: {}", format_shortages(.0))]
    InsufficientStock(Vec<Requirement>),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    /// 可整体重试
    #[error("并发修改冲突: {0}")]
    ConcurrentModification(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 调用方可否原样重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::ConcurrentModification(_))
    }
}

fn format_shortages(shortages: &[Requirement]) -> String {
    shortages
        .iter()
        .map(|r| {
            format!(
                "{}(需要{}, 在库{}, 缺{})",
                r.product_id, r.required_quantity, r.available_quantity, r.shortage_quantity
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                product_id,
                expected,
                actual,
            } => ApiError::ConcurrentModification(format!(
                "产品{}库存已被修改（期望{}，实际{}）",
                product_id, expected, actual
            )),
            RepositoryError::DatabaseBusy(msg) => {
                ApiError::ConcurrentModification(format!("写锁获取失败: {}", msg))
            }
            RepositoryError::LockError(msg) => {
                ApiError::ConcurrentModification(format!("数据库锁获取失败: {}", msg))
            }

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        RepositoryError::from(err).into()
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::InvalidQuantity(q) => ApiError::InvalidQuantity(q),
            EngineError::CycleDetected { recipe_id, path } => {
                ApiError::CycleDetected { recipe_id, path }
            }
            EngineError::InsufficientStock(shortages) => ApiError::InsufficientStock(shortages),
            EngineError::ConcurrentModification(msg) => ApiError::ConcurrentModification(msg),
            EngineError::InvalidRecipe(msg) => ApiError::BusinessRuleViolation(msg),
            EngineError::Catalog(err) => err.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
