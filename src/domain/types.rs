// ==========================================
// BOM 生产引擎 - 领域类型定义
// ==========================================
// 职责: 产品类别 / 库存状态 / 库存流水类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 产品类别 (Product Kind)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    Raw,          // 原材料
    Intermediate, // 半成品
    Finished,     // 成品
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl ProductKind {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProductKind::Raw => "RAW",
            ProductKind::Intermediate => "INTERMEDIATE",
            ProductKind::Finished => "FINISHED",
        }
    }

    /// 从数据库字符串解析（未知值返回 None，不做默认替换）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "RAW" => Some(ProductKind::Raw),
            "INTERMEDIATE" => Some(ProductKind::Intermediate),
            "FINISHED" => Some(ProductKind::Finished),
            _ => None,
        }
    }
}

// ==========================================
// 库存状态 (Stock Status)
// ==========================================
// 规则:
// - on_hand <= 0                         → Empty
// - threshold > 0 且 on_hand < threshold → Critical
// - 其他                                  → Normal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Empty,    // 无库存
    Critical, // 低于安全库存
    Normal,   // 正常
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockStatus::Empty => write!(f, "EMPTY"),
            StockStatus::Critical => write!(f, "CRITICAL"),
            StockStatus::Normal => write!(f, "NORMAL"),
        }
    }
}

// ==========================================
// 库存流水类型 (Movement Kind)
// ==========================================
// 入库类: StockIn / ProductionOutput
// 出库类: StockOut / ProductionConsume / Transfer / Scrap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    StockIn,           // 手工入库
    StockOut,          // 手工出库
    Transfer,          // 发往产线
    Scrap,             // 报废
    ProductionConsume, // 生产扣料
    ProductionOutput,  // 生产入库
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl MovementKind {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MovementKind::StockIn => "STOCK_IN",
            MovementKind::StockOut => "STOCK_OUT",
            MovementKind::Transfer => "TRANSFER",
            MovementKind::Scrap => "SCRAP",
            MovementKind::ProductionConsume => "PRODUCTION_CONSUME",
            MovementKind::ProductionOutput => "PRODUCTION_OUTPUT",
        }
    }

    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "STOCK_IN" => Some(MovementKind::StockIn),
            "STOCK_OUT" => Some(MovementKind::StockOut),
            "TRANSFER" => Some(MovementKind::Transfer),
            "SCRAP" => Some(MovementKind::Scrap),
            "PRODUCTION_CONSUME" => Some(MovementKind::ProductionConsume),
            "PRODUCTION_OUTPUT" => Some(MovementKind::ProductionOutput),
            _ => None,
        }
    }

    /// 是否为入库方向
    pub fn is_inbound(&self) -> bool {
        matches!(self, MovementKind::StockIn | MovementKind::ProductionOutput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_kind_direction() {
        assert!(MovementKind::ProductionOutput.is_inbound());
        assert!(MovementKind::StockIn.is_inbound());
        assert!(!MovementKind::ProductionConsume.is_inbound());
        assert!(!MovementKind::Scrap.is_inbound());
    }

    #[test]
    fn test_kind_parsing_rejects_unknown() {
        assert_eq!(ProductKind::from_db_str("intermediate"), Some(ProductKind::Intermediate));
        assert_eq!(ProductKind::from_db_str("hammadde"), None);
        assert_eq!(MovementKind::from_db_str("PRODUCTION_CONSUME"), Some(MovementKind::ProductionConsume));
        assert_eq!(MovementKind::from_db_str(""), None);
    }
}
