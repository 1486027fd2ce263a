// ==========================================
// BOM 生产引擎 - 需求计算结果模型
// ==========================================
// 说明: 以下对象仅在一次解析调用内存在,不持久化
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Requirement - 叶子物料需求
// ==========================================
// shortage_quantity = max(0, required - available)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub product_id: String,
    pub product_name: String,
    pub required_quantity: f64,
    pub available_quantity: f64,
    pub shortage_quantity: f64,
}

impl Requirement {
    pub fn new(product_id: &str, product_name: &str, required: f64, available: f64) -> Self {
        Self {
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            required_quantity: required,
            available_quantity: available,
            shortage_quantity: (required - available).max(0.0),
        }
    }

    pub fn is_short(&self) -> bool {
        self.required_quantity > self.available_quantity
    }
}

// ==========================================
// CycleDiagnostic - 循环引用诊断
// ==========================================
// path: 从根配方到重复配方的配方ID链 (首尾为同一配方)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleDiagnostic {
    pub recipe_id: String,
    pub component_product_id: String,
    pub path: Vec<String>,
    pub unresolved_quantity: f64,
}

// ==========================================
// Resolution - 需求解析结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// 缺料列表 (按深度优先首次出现顺序)
    pub shortages: Vec<Requirement>,
    /// 全部叶子需求 (含库存充足项,顺序同上)
    pub leaf_requirements: Vec<Requirement>,
    /// 循环引用诊断
    pub cycles: Vec<CycleDiagnostic>,
}

impl Resolution {
    pub fn is_feasible(&self) -> bool {
        self.shortages.is_empty() && self.cycles.is_empty()
    }

    pub fn first_shortage(&self) -> Option<&Requirement> {
        self.shortages.first()
    }
}

// ==========================================
// Feasibility - 可产性结论
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feasibility {
    Feasible,
    Infeasible { first_shortage: Requirement },
}

impl Feasibility {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Feasibility::Feasible)
    }
}

// ==========================================
// DirectStockCheck - 单层库存快速检查
// ==========================================
// 只看配方直接明细,不展开子配方 (用于前端快速提示)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectStockCheck {
    pub recipe_id: String,
    pub quantity: f64,
    pub can_produce: bool,
    pub items: Vec<DirectItemStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectItemStatus {
    pub product_id: String,
    pub product_name: String,
    pub required: f64,
    pub available: f64,
    pub sufficient: bool,
    pub shortage: f64,
}
