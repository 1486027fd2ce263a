use serde::{Deserialize, Serialize};

/// 负库存误差上限,与 product.on_hand_quantity 的 CHECK 下限一致
pub const MAX_STOCK_TOLERANCE: f64 = 1e-6;

/// 引擎运行参数
///
/// 由 [`ConfigManager::load_engine_config`](super::ConfigManager::load_engine_config)
/// 从 config_kv 读取,缺省项使用 `Default`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 仓库标签: 扣料流水的来源 / 成品入库流水的目的地
    pub warehouse_label: String,

    /// 配方未指定产线时使用的产线标签
    pub line_label: String,

    /// 扣料后允许的负库存浮点误差（超出即视为库存不足）
    pub stock_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            warehouse_label: "WAREHOUSE".to_string(),
            line_label: "PRODUCTION".to_string(),
            stock_tolerance: 1e-9,
        }
    }
}
