//! # AST 模块
//!
//! 定义规则脚本的抽象语法树（Abstract Syntax Tree）。
//!
//! ## 设计说明
//!
//! AST 是解析器的输出，只承载数据，不做任何计算。
//! 所有语义都在 [`crate::runtime::evaluator`] 中实现。
//!
//! ```text
//! Script
//! ├── Scene(name)
//! ├── Intent(name)
//! └── DecisionChain
//!     ├── primary:      Branch { Some(condition), reply }
//!     ├── alternatives: [Branch { Some(condition), reply }, ...]
//!     └── fallback:     Option<Branch { None, reply }>
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// 场景声明（`SCENE 手机`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
}

/// 意图声明（`ON_INTENT 商品推荐`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
}

/// 一个完整的规则脚本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub scene: Scene,
    pub intent: Intent,
    pub chain: DecisionChain,
}

impl Script {
    pub fn new(scene: impl Into<String>, intent: impl Into<String>, chain: DecisionChain) -> Self {
        Self {
            scene: Scene { name: scene.into() },
            intent: Intent {
                name: intent.into(),
            },
            chain,
        }
    }
}

/// 决策链
///
/// 一个必选分支，零或多个备选分支，以及可选的默认分支。
/// 默认分支由独立字段承载，因此必然唯一且位于最后。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionChain {
    /// `IF ... REPLY ...`
    pub primary: Branch,
    /// `ELSE IF ... REPLY ...`，按源码顺序
    pub alternatives: Vec<Branch>,
    /// `ELSE REPLY ...`
    pub fallback: Option<Branch>,
}

impl DecisionChain {
    pub fn new(primary: Branch) -> Self {
        Self {
            primary,
            alternatives: Vec::new(),
            fallback: None,
        }
    }

    pub fn with_alternative(mut self, branch: Branch) -> Self {
        self.alternatives.push(branch);
        self
    }

    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(Branch::fallback(reply));
        self
    }

    /// 按声明顺序遍历所有分支
    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        std::iter::once(&self.primary)
            .chain(self.alternatives.iter())
            .chain(self.fallback.iter())
    }
}

/// 分支
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// 条件，默认分支为 `None`
    pub condition: Option<Condition>,
    /// 回复原文（可能包含由外部替换的占位符）
    pub reply: String,
}

impl Branch {
    /// 创建带条件的分支
    pub fn guarded(condition: Condition, reply: impl Into<String>) -> Self {
        Self {
            condition: Some(condition),
            reply: reply.into(),
        }
    }

    /// 创建默认分支
    pub fn fallback(reply: impl Into<String>) -> Self {
        Self {
            condition: None,
            reply: reply.into(),
        }
    }
}

/// 逻辑运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicOp {
    And,
    Or,
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Le,
    Ge,
    Lt,
    Gt,
    Eq,
    Ne,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Eq => "==",
            Self::Ne => "!=",
        };
        f.write_str(s)
    }
}

/// 字面量
///
/// 类型在解析时确定，求值时不做转换。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(f64),
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// 条件表达式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// 逻辑组合（`AND` / `OR`）
    Logic {
        left: Box<Condition>,
        op: LogicOp,
        right: Box<Condition>,
    },

    /// 比较（`预算 <= 5000`）
    Compare {
        ident: String,
        op: CompareOp,
        value: Literal,
    },

    /// 存在性检查（单独的标识符，如 `品牌`）
    Exists { ident: String },
}

impl Condition {
    /// 创建逻辑与
    pub fn and(left: Condition, right: Condition) -> Self {
        Self::Logic {
            left: Box::new(left),
            op: LogicOp::And,
            right: Box::new(right),
        }
    }

    /// 创建逻辑或
    pub fn or(left: Condition, right: Condition) -> Self {
        Self::Logic {
            left: Box::new(left),
            op: LogicOp::Or,
            right: Box::new(right),
        }
    }

    /// 创建与数字字面量的比较
    pub fn compare_number(ident: impl Into<String>, op: CompareOp, value: f64) -> Self {
        Self::Compare {
            ident: ident.into(),
            op,
            value: Literal::Number(value),
        }
    }

    /// 创建与字符串字面量的比较
    pub fn compare_string(
        ident: impl Into<String>,
        op: CompareOp,
        value: impl Into<String>,
    ) -> Self {
        Self::Compare {
            ident: ident.into(),
            op,
            value: Literal::String(value.into()),
        }
    }

    /// 创建存在性检查
    pub fn exists(ident: impl Into<String>) -> Self {
        Self::Exists {
            ident: ident.into(),
        }
    }

    /// 条件中引用的所有标识符（按出现顺序，可能重复）
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Logic { left, right, .. } => {
                left.collect_identifiers(out);
                right.collect_identifiers(out);
            }
            Self::Compare { ident, .. } | Self::Exists { ident } => out.push(ident),
        }
    }
}

impl fmt::Display for Condition {
    /// 以完全加括号的形式输出，便于观察结合性
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logic { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Self::Compare { ident, op, value } => write!(f, "{} {} {}", ident, op, value),
            Self::Exists { ident } => write!(f, "{}", ident),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_branches_in_declared_order() {
        let chain = DecisionChain::new(Branch::guarded(Condition::exists("a"), "1"))
            .with_alternative(Branch::guarded(Condition::exists("b"), "2"))
            .with_alternative(Branch::guarded(Condition::exists("c"), "3"))
            .with_fallback("4");

        let replies: Vec<&str> = chain.branches().map(|b| b.reply.as_str()).collect();
        assert_eq!(replies, vec!["1", "2", "3", "4"]);
        assert!(chain.fallback.as_ref().unwrap().condition.is_none());
    }

    #[test]
    fn test_condition_display_is_fully_parenthesized() {
        let cond = Condition::or(
            Condition::and(
                Condition::compare_number("预算", CompareOp::Le, 5000.0),
                Condition::compare_string("品牌", CompareOp::Eq, "小米"),
            ),
            Condition::exists("型号"),
        );
        assert_eq!(
            cond.to_string(),
            "((预算 <= 5000 AND 品牌 == \"小米\") OR 型号)"
        );
    }

    #[test]
    fn test_condition_identifiers() {
        let cond = Condition::and(
            Condition::exists("品牌"),
            Condition::or(
                Condition::compare_number("预算", CompareOp::Gt, 1.0),
                Condition::exists("品牌"),
            ),
        );
        assert_eq!(cond.identifiers(), vec!["品牌", "预算", "品牌"]);
    }

    #[test]
    fn test_script_serializes_to_json() {
        let script = Script::new(
            "手机",
            "商品推荐",
            DecisionChain::new(Branch::guarded(Condition::exists("品牌"), "A")),
        );
        let json = serde_json::to_value(&script).unwrap();
        assert_eq!(json["scene"]["name"], "手机");
        assert_eq!(json["chain"]["primary"]["reply"], "A");

        let back: Script = serde_json::from_value(json).unwrap();
        assert_eq!(back, script);
    }
}
