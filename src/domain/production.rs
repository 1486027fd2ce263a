// ==========================================
// BOM 生产引擎 - 生产与库存流水领域模型
// ==========================================
// 红线: 审计记录只追加,创建后不可修改
// 红线: 每一次 on_hand 变化必须且只能对应一条 StockMovement
// ==========================================

use crate::domain::types::MovementKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionRecord - 生产记录 (表头)
// ==========================================
// 每次顶层 produce 调用生成一条,递归层不生成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub production_id: String,
    pub recipe_id: String,
    pub quantity: f64,
    pub actor: String,
    pub produced_at: NaiveDateTime,
    pub note: Option<String>,
}

// ==========================================
// ProductionConsumption - 生产扣料明细
// ==========================================
// 同一组件可能出现多行（部分用库存 + 递归制造剩余部分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionConsumption {
    pub production_id: String,
    pub product_id: String,
    pub quantity: f64,
}

// ==========================================
// StockMovement - 库存流水
// ==========================================
// signed_quantity: 入库为正,出库为负
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub movement_id: String,
    pub product_id: String,
    pub signed_quantity: f64,
    pub kind: MovementKind,
    pub source_label: String,
    pub destination_label: String,
    pub actor: String,
    pub moved_at: NaiveDateTime,
    pub production_id: Option<String>, // 关联生产记录 (手工出入库为 None)
    pub note: Option<String>,
}

impl StockMovement {
    /// 流水绝对数量
    pub fn magnitude(&self) -> f64 {
        self.signed_quantity.abs()
    }
}
