//! # Reply Rules
//!
//! 导购对话的规则脚本引擎：用一个小型 DSL 描述"在某个场景、某个意图下，
//! 根据上下文条件选择哪条回复"。
//!
//! ## 架构概述
//!
//! `reply-rules` 是纯逻辑核心，不负责意图分类、商品查询或回复文本的
//! 占位符替换。调用方准备好上下文，引擎返回选中的回复模板：
//!
//! ```text
//! 脚本原文 ──► tokenize ──► Parser ──► Script (AST)
//!                                         │
//! IntentRecord ──► Context ──────────► evaluate ──► Outcome
//! ```
//!
//! ## 脚本示例
//!
//! ```text
//! # 手机推荐
//! SCENE 手机
//! ON_INTENT 商品推荐
//! IF 预算 <= 5000 AND 品牌 == "小米" REPLY "为您推荐 {品牌} 的高性价比机型"
//! ELSE IF 品牌 REPLY "为您推荐 {品牌} 的热门机型"
//! ELSE REPLY "请问您的预算是多少？"
//! ```
//!
//! ## 使用示例
//!
//! ```ignore
//! use reply_rules::{Context, Parser, evaluate};
//!
//! let script = Parser::default().parse(text).into_result()?;
//! let ctx = Context::new().with("预算", 4500.0).with("品牌", "小米");
//! let outcome = evaluate(&script, &ctx)?;
//! println!("{}", outcome.reply_or("抱歉，没有找到合适的结果"));
//! ```
//!
//! ## 模块结构
//!
//! - [`script`]：记号、扫描器、AST 与解析器
//! - [`context`]：上下文值模型与分类记录接入
//! - [`runtime`]：求值器与规则引擎
//! - [`registry`]：脚本来源与解析缓存
//! - [`config`]：意图白名单、兜底回复与路由配置
//! - [`diagnostic`]：静态检查
//! - [`error`]：错误类型定义

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod error;
pub mod registry;
pub mod runtime;
pub mod script;

// 重导出核心类型
pub use config::{
    DEFAULT_FALLBACK_REPLY, DEFAULT_INTENTS, IntentWhitelist, RulesConfig, ScriptRoutes,
};
pub use context::{Context, EvalContext, IntentRecord, Parameters, Value, normalize_parameter};
pub use diagnostic::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_script, check_source,
    referenced_identifiers,
};
pub use error::{ConfigError, ErrorKind, EvalError, LexError, ParseError, RuleError, RuleResult};
pub use registry::{MemorySource, ScriptCache, ScriptSource};
pub use runtime::{Outcome, Response, RuleEngine, evaluate, evaluate_condition};
pub use script::{
    Branch, CompareOp, Condition, DecisionChain, Intent, Lexed, Literal, LogicOp, ParseReport,
    Parser, Scene, Script, Span, Token, TokenCategory, TokenKind, parse_script, tokenize,
};
