// ==========================================
// BOM 生产引擎 - 产品领域模型
// ==========================================
// 职责: 产品主数据 + 单一汇总库存数量
// 红线: on_hand_quantity 只能通过库存流水修改
// ==========================================

use crate::domain::types::{ProductKind, StockStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Product - 产品
// ==========================================
// 对齐: product 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,        // 产品ID
    pub name: String,              // 显示名称
    pub unit: String,              // 计量单位 (kg / m / pcs)
    pub kind: ProductKind,         // 产品类别
    pub on_hand_quantity: f64,     // 在库数量 (非负)
    pub reorder_threshold: f64,    // 安全库存阈值
    pub updated_at: NaiveDateTime, // 最近更新时间
}

impl Product {
    /// 计算库存状态
    pub fn stock_status(&self) -> StockStatus {
        if self.on_hand_quantity <= 0.0 {
            StockStatus::Empty
        } else if self.reorder_threshold > 0.0 && self.on_hand_quantity < self.reorder_threshold {
            StockStatus::Critical
        } else {
            StockStatus::Normal
        }
    }
}

// ==========================================
// NewProduct - 产品创建参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub product_id: String,
    pub name: String,
    pub unit: String,
    pub kind: ProductKind,
    pub on_hand_quantity: f64,
    pub reorder_threshold: f64,
}

impl NewProduct {
    /// 以默认单位/零阈值创建
    pub fn new(product_id: &str, name: &str, kind: ProductKind, on_hand_quantity: f64) -> Self {
        Self {
            product_id: product_id.to_string(),
            name: name.to_string(),
            unit: "pcs".to_string(),
            kind,
            on_hand_quantity,
            reorder_threshold: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(on_hand: f64, threshold: f64) -> Product {
        Product {
            product_id: "P1".to_string(),
            name: "Steel sheet".to_string(),
            unit: "kg".to_string(),
            kind: ProductKind::Raw,
            on_hand_quantity: on_hand,
            reorder_threshold: threshold,
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_stock_status() {
        assert_eq!(product(0.0, 10.0).stock_status(), StockStatus::Empty);
        assert_eq!(product(5.0, 10.0).stock_status(), StockStatus::Critical);
        assert_eq!(product(10.0, 10.0).stock_status(), StockStatus::Normal);
        // 阈值为 0 时不判定为 Critical
        assert_eq!(product(1.0, 0.0).stock_status(), StockStatus::Normal);
    }
}
