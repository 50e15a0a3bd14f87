//! # Runtime 模块
//!
//! 规则执行：条件求值与应答流程。
//!
//! ## 模块结构
//!
//! - [`evaluator`]：在上下文上求值 AST，选出回复
//! - [`engine`]：路由、缓存与兜底回复

pub mod engine;
pub mod evaluator;

pub use engine::{Response, RuleEngine};
pub use evaluator::{Outcome, evaluate, evaluate_condition};
