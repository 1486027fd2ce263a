// ==========================================
// BOM 生产引擎 - 请求参数校验
// ==========================================
// 职责: 在打开事务之前拒绝明显非法的请求
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::MovementKind;

/// 校验ID类参数非空
pub fn validate_id(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}

/// 校验数量（> 0 且为有限值）
pub fn validate_quantity(quantity: f64) -> ApiResult<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(ApiError::InvalidQuantity(quantity));
    }
    Ok(())
}

/// 校验手工出库类型
pub fn validate_outbound_kind(kind: MovementKind) -> ApiResult<()> {
    match kind {
        MovementKind::StockOut | MovementKind::Transfer | MovementKind::Scrap => Ok(()),
        other => Err(ApiError::InvalidInput(format!(
            "{} 不是手工出库类型",
            other.to_db_str()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("recipe_id", "R1").is_ok());
        assert!(matches!(
            validate_id("recipe_id", "  "),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(0.5).is_ok());
        for q in [0.0, -2.0, f64::NAN, f64::NEG_INFINITY] {
            assert!(matches!(validate_quantity(q), Err(ApiError::InvalidQuantity(_))));
        }
    }

    #[test]
    fn test_validate_outbound_kind() {
        assert!(validate_outbound_kind(MovementKind::Scrap).is_ok());
        assert!(validate_outbound_kind(MovementKind::ProductionConsume).is_err());
        assert!(validate_outbound_kind(MovementKind::StockIn).is_err());
    }
}
