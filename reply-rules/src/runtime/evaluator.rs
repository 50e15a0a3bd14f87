//! # Evaluator 模块
//!
//! 在上下文上遍历 [`Script`]，选出一条回复。
//!
//! ## 选择顺序
//!
//! 1. 必选分支条件为真 → 返回其回复
//! 2. 按源码顺序检查备选分支，第一个为真的胜出
//! 3. 存在默认分支 → 返回默认回复
//! 4. 否则返回“无回复”（[`Outcome::reply`] 为 `None`）
//!
//! ## 求值规则
//!
//! - `AND`/`OR` 总是对两侧都求值，不短路
//! - 键不存在或值为 `Absent` 时比较结果为 `false`
//! - 类型不一致时：`!=` 为 `true`，其余运算符为 `false`
//! - 存在性检查：值不是 `Absent` 且不是空字符串；数字 0 也算存在
//!
//! 求值器不修改、不保留上下文。

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{EvalContext, Value};
use crate::error::EvalError;
use crate::script::{Branch, CompareOp, Condition, Literal, LogicOp, Script};

/// 求值结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub scene: String,
    pub intent: String,
    /// 命中分支的回复原文；没有分支命中时为 `None`
    pub reply: Option<String>,
}

impl Outcome {
    /// 是否没有任何分支命中
    pub fn is_no_reply(&self) -> bool {
        self.reply.is_none()
    }

    /// 命中的回复，否则使用调用方提供的兜底文本
    pub fn reply_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.reply.as_deref().unwrap_or(fallback)
    }
}

/// 对脚本求值
pub fn evaluate(script: &Script, ctx: &impl EvalContext) -> Result<Outcome, EvalError> {
    let reply = select_reply(script, ctx)?;
    debug!(
        scene = %script.scene.name,
        intent = %script.intent.name,
        matched = reply.is_some(),
        "脚本求值完成"
    );
    Ok(Outcome {
        scene: script.scene.name.clone(),
        intent: script.intent.name.clone(),
        reply: reply.map(str::to_string),
    })
}

fn select_reply<'s>(
    script: &'s Script,
    ctx: &impl EvalContext,
) -> Result<Option<&'s str>, EvalError> {
    let chain = &script.chain;
    let guarded = std::iter::once(&chain.primary).chain(chain.alternatives.iter());

    for (index, branch) in guarded.enumerate() {
        if branch_holds(branch, index, ctx)? {
            return Ok(Some(branch.reply.as_str()));
        }
    }

    Ok(chain.fallback.as_ref().map(|b| b.reply.as_str()))
}

fn branch_holds(branch: &Branch, index: usize, ctx: &impl EvalContext) -> Result<bool, EvalError> {
    let condition = branch
        .condition
        .as_ref()
        .ok_or(EvalError::MissingCondition { index })?;
    Ok(evaluate_condition(condition, ctx))
}

/// 对条件表达式求值
pub fn evaluate_condition(condition: &Condition, ctx: &impl EvalContext) -> bool {
    match condition {
        Condition::Logic { left, op, right } => {
            // 两侧都要求值
            let left = evaluate_condition(left, ctx);
            let right = evaluate_condition(right, ctx);
            match op {
                LogicOp::And => left & right,
                LogicOp::Or => left | right,
            }
        }
        Condition::Compare { ident, op, value } => match ctx.lookup(ident) {
            Some(actual) => compare(ident, actual, *op, value),
            None => false,
        },
        Condition::Exists { ident } => ctx.lookup(ident).is_some_and(Value::is_present),
    }
}

/// 比较上下文值与字面量
fn compare(ident: &str, actual: &Value, op: CompareOp, expected: &Literal) -> bool {
    let ordering = match (actual, expected) {
        (Value::Number(a), Literal::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Literal::String(b)) => Some(a.as_str().cmp(b.as_str())),
        // 值为 Absent 与键不存在等价
        (Value::Absent, _) => return false,
        _ => {
            debug!(
                ident,
                actual = actual.type_name(),
                expected = %expected,
                "比较两侧类型不一致"
            );
            return op == CompareOp::Ne;
        }
    };

    match ordering {
        Some(ord) => apply(op, ord),
        // NaN 与任何数都不相等
        None => op == CompareOp::Ne,
    }
}

fn apply(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::Le => ord != Ordering::Greater,
        CompareOp::Ge => ord != Ordering::Less,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
    }
}
