// ==========================================
// 需求解析上下文
// ==========================================
// on_stack: 当前递归路径上的配方（进入时加入,退出时移除）
// leaves: 叶子需求按首次出现顺序累加
// ==========================================

use crate::domain::product::Product;
use crate::domain::recipe::Recipe;
use crate::domain::requirement::{CycleDiagnostic, Requirement, Resolution};
use std::collections::{HashMap, HashSet};

struct LeafTotal {
    product_id: String,
    product_name: String,
    required: f64,
    available: f64,
}

#[derive(Default)]
pub(super) struct ResolveContext {
    on_stack: HashSet<String>,
    path: Vec<String>,
    leaves: Vec<LeafTotal>,
    index: HashMap<String, usize>,
    cycles: Vec<CycleDiagnostic>,
}

impl ResolveContext {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn enter(&mut self, recipe: &Recipe) {
        self.on_stack.insert(recipe.recipe_id.clone());
        self.path.push(recipe.recipe_id.clone());
    }

    pub(super) fn leave(&mut self, recipe: &Recipe) {
        self.on_stack.remove(&recipe.recipe_id);
        self.path.pop();
    }

    pub(super) fn is_on_stack(&self, recipe_id: &str) -> bool {
        self.on_stack.contains(recipe_id)
    }

    pub(super) fn depth(&self) -> usize {
        self.path.len()
    }

    /// 累加叶子需求; 可用量取首次出现时的在库数量
    pub(super) fn accumulate(&mut self, product: &Product, required: f64) {
        match self.index.get(&product.product_id) {
            Some(&idx) => self.leaves[idx].required += required,
            None => {
                self.index
                    .insert(product.product_id.clone(), self.leaves.len());
                self.leaves.push(LeafTotal {
                    product_id: product.product_id.clone(),
                    product_name: product.name.clone(),
                    required,
                    available: product.on_hand_quantity.max(0.0),
                });
            }
        }
    }

    /// 记录循环引用: path 以重复出现的配方结尾
    pub(super) fn record_cycle(&mut self, sub_recipe: &Recipe, component: &Product, unresolved: f64) {
        let mut path = self.path.clone();
        path.push(sub_recipe.recipe_id.clone());
        self.cycles.push(CycleDiagnostic {
            recipe_id: sub_recipe.recipe_id.clone(),
            component_product_id: component.product_id.clone(),
            path,
            unresolved_quantity: unresolved,
        });
    }

    pub(super) fn finish(self) -> Resolution {
        let leaf_requirements: Vec<Requirement> = self
            .leaves
            .iter()
            .map(|leaf| {
                Requirement::new(
                    &leaf.product_id,
                    &leaf.product_name,
                    leaf.required,
                    leaf.available,
                )
            })
            .collect();
        let shortages = leaf_requirements
            .iter()
            .filter(|r| r.is_short())
            .cloned()
            .collect();

        Resolution {
            shortages,
            leaf_requirements,
            cycles: self.cycles,
        }
    }
}
