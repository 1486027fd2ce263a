// ==========================================
// BOM 生产引擎 - 生产执行器
// ==========================================
// 红线: 全有或全无; 任一步失败不得留下部分写入
// 红线: 扣料前在同一事务快照内复核可产性
// 红线: 每一次库存变化对应且只对应一条流水
// ==========================================
// 状态: Checking -> Consuming -> Crediting -> Committed
// 失败: 任意状态 -> 错误返回（调用方回滚事务）
// ==========================================

mod core;
mod unit_of_work;


pub use core::{ProductionExecutor, ProductionOutcome, ProductionRequest};
pub use unit_of_work::{ProductionPhase, ProductionUnitOfWork};
