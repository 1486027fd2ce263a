// ==========================================
// BOM 生产引擎 - 配方 (BOM) 领域模型
// ==========================================
// 红线: quantity_per_unit > 0
// 红线: (recipe_id, product_id) 唯一
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Recipe - 配方
// ==========================================
// target_product_id 可为空: 配方可以先建立、后绑定产出产品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub recipe_id: String,                 // 配方ID
    pub name: String,                      // 配方名称
    pub line_label: Option<String>,        // 所属产线
    pub target_product_id: Option<String>, // 产出产品
    pub items: Vec<RecipeItem>,            // 配方明细 (按 seq_no 排序)
}

impl Recipe {
    /// 按组件查找配方明细
    pub fn item_for(&self, product_id: &str) -> Option<&RecipeItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// 扣料流水的目的地标签: "产线 - 配方名"
    pub fn consumption_label(&self, default_line: &str) -> String {
        format!(
            "{} - {}",
            self.line_label.as_deref().unwrap_or(default_line),
            self.name
        )
    }
}

// ==========================================
// RecipeItem - 配方明细
// ==========================================
// quantity_per_unit: 生产 1 个单位目标产品所需的组件数量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeItem {
    pub recipe_id: String,
    pub product_id: String,
    pub quantity_per_unit: f64,
    pub note: Option<String>,
}

// ==========================================
// NewRecipe - 配方创建参数
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRecipe {
    pub recipe_id: String,
    pub name: String,
    pub line_label: Option<String>,
    pub target_product_id: Option<String>,
    pub items: Vec<(String, f64)>, // (组件产品ID, 单位用量)
}

impl NewRecipe {
    pub fn new(recipe_id: &str, name: &str) -> Self {
        Self {
            recipe_id: recipe_id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn target(mut self, product_id: &str) -> Self {
        self.target_product_id = Some(product_id.to_string());
        self
    }

    pub fn line(mut self, line_label: &str) -> Self {
        self.line_label = Some(line_label.to_string());
        self
    }

    pub fn item(mut self, product_id: &str, quantity_per_unit: f64) -> Self {
        self.items.push((product_id.to_string(), quantity_per_unit));
        self
    }
}
