//! # Token 模块
//!
//! 扫描器输出的记号定义。

use std::fmt;

/// 源码位置（行列均从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// 记号种类
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // 头部关键字
    Scene,
    OnIntent,

    // 分支关键字
    If,
    Else,
    Reply,

    // 逻辑关键字
    And,
    Or,

    // 比较运算符
    Le,
    Ge,
    Lt,
    Gt,
    Eq,
    Ne,

    LParen,
    RParen,

    /// 标识符（允许中文等非拉丁字符）
    Ident(String),
    /// 数字字面量
    Number(f64),
    /// 字符串字面量（已去掉两侧引号，转义序列保持原样）
    Str(String),
}

/// 记号的大类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    Keyword,
    Operator,
    Literal,
    Identifier,
    Punctuation,
}

impl TokenKind {
    /// 关键字查表，关键字大小写敏感
    pub fn keyword(word: &str) -> Option<Self> {
        let kind = match word {
            "SCENE" => Self::Scene,
            "ON_INTENT" => Self::OnIntent,
            "IF" => Self::If,
            "ELSE" => Self::Else,
            "REPLY" => Self::Reply,
            "AND" => Self::And,
            "OR" => Self::Or,
            _ => return None,
        };
        Some(kind)
    }

    pub fn category(&self) -> TokenCategory {
        match self {
            Self::Scene | Self::OnIntent | Self::If | Self::Else | Self::Reply => {
                TokenCategory::Keyword
            }
            Self::And | Self::Or => TokenCategory::Keyword,
            Self::Le | Self::Ge | Self::Lt | Self::Gt | Self::Eq | Self::Ne => {
                TokenCategory::Operator
            }
            Self::LParen | Self::RParen => TokenCategory::Punctuation,
            Self::Ident(_) => TokenCategory::Identifier,
            Self::Number(_) | Self::Str(_) => TokenCategory::Literal,
        }
    }

    /// 是否为比较运算符
    pub fn is_compare_op(&self) -> bool {
        self.category() == TokenCategory::Operator
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scene => write!(f, "SCENE"),
            Self::OnIntent => write!(f, "ON_INTENT"),
            Self::If => write!(f, "IF"),
            Self::Else => write!(f, "ELSE"),
            Self::Reply => write!(f, "REPLY"),
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
            Self::Le => write!(f, "<="),
            Self::Ge => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Gt => write!(f, ">"),
            Self::Eq => write!(f, "=="),
            Self::Ne => write!(f, "!="),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::Ident(name) => write!(f, "{}", name),
            Self::Number(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// 记号
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn category(&self) -> TokenCategory {
        self.kind.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup_is_case_sensitive() {
        assert_eq!(TokenKind::keyword("IF"), Some(TokenKind::If));
        assert_eq!(TokenKind::keyword("ON_INTENT"), Some(TokenKind::OnIntent));
        assert_eq!(TokenKind::keyword("if"), None);
        assert_eq!(TokenKind::keyword("Scene"), None);
    }

    #[test]
    fn test_token_category() {
        assert_eq!(TokenKind::Reply.category(), TokenCategory::Keyword);
        assert_eq!(TokenKind::Or.category(), TokenCategory::Keyword);
        assert_eq!(TokenKind::Ne.category(), TokenCategory::Operator);
        assert_eq!(TokenKind::LParen.category(), TokenCategory::Punctuation);
        assert_eq!(
            TokenKind::Ident("预算".to_string()).category(),
            TokenCategory::Identifier
        );
        assert_eq!(TokenKind::Number(1.0).category(), TokenCategory::Literal);
        assert!(TokenKind::Le.is_compare_op());
        assert!(!TokenKind::And.is_compare_op());
    }

    #[test]
    fn test_display_uses_source_spelling() {
        assert_eq!(TokenKind::OnIntent.to_string(), "ON_INTENT");
        assert_eq!(TokenKind::Ge.to_string(), ">=");
        assert_eq!(TokenKind::Str("小米".to_string()).to_string(), "\"小米\"");
        assert_eq!(TokenKind::Number(5000.0).to_string(), "5000");
    }
}
