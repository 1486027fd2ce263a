// ==========================================
// BOM 生产引擎 - 多级需求解析器
// ==========================================
// 红线: 只读,不写入任何库存或台账
// 红线: 组件在库优先; 仅缺口部分向下展开默认配方
// 红线: 循环引用不得无限递归,以诊断形式返回
// ==========================================
// 输入: 配方ID + 生产数量
// 输出: 叶子需求合计 + 缺料列表 + 循环诊断
// ==========================================

mod context;
mod core;

#[cfg(test)]
mod tests;

pub use core::RequirementResolver;
