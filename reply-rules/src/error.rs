//! # Error 模块
//!
//! 定义 reply-rules 中使用的错误类型。
//!
//! 错误按阶段划分：
//!
//! - [`LexError`]：词法错误，非致命，扫描器跳过后继续
//! - [`ParseError`]：语法错误与语义错误（意图不在白名单内）
//! - [`EvalError`]：求值错误，仅在手工构造了非法 AST 时出现
//! - [`ConfigError`]：配置加载错误
//! - [`RuleError`]：统一错误类型

use thiserror::Error;

/// 词法错误
///
/// 扫描器遇到这些错误时只记录诊断，不会中止整个输入的扫描。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    /// 无法识别的字符
    #[error("第 {line} 行第 {column} 列：非法字符 '{ch}'")]
    UnexpectedChar {
        line: usize,
        column: usize,
        ch: char,
    },

    /// 字符串字面量缺少结束引号
    #[error("第 {line} 行第 {column} 列：字符串字面量未闭合")]
    UnterminatedString { line: usize, column: usize },

    /// 数字字面量无法转换，已按 0 处理
    #[error("第 {line} 行第 {column} 列：无法解析数字 '{text}'，按 0 处理")]
    MalformedNumber {
        line: usize,
        column: usize,
        text: String,
    },
}

impl LexError {
    /// 错误所在行号（从 1 开始）
    pub fn line(&self) -> usize {
        match self {
            Self::UnexpectedChar { line, .. }
            | Self::UnterminatedString { line, .. }
            | Self::MalformedNumber { line, .. } => *line,
        }
    }

    /// 错误所在列号（从 1 开始）
    pub fn column(&self) -> usize {
        match self {
            Self::UnexpectedChar { column, .. }
            | Self::UnterminatedString { column, .. }
            | Self::MalformedNumber { column, .. } => *column,
        }
    }
}

/// 解析错误的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 违反文法
    Syntax,
    /// 文法正确但语义不合法（如意图不在白名单中）
    Semantic,
}

/// 解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 遇到了不符合文法的记号
    #[error("第 {line} 行第 {column} 列：语法错误 - {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// 输入提前结束
    #[error("脚本意外结束，期望 {expected}")]
    UnexpectedEnd { expected: String },

    /// 意图不在白名单内
    #[error("第 {line} 行第 {column} 列：不支持的意图 '{intent}'，支持的意图有: {supported}")]
    UnsupportedIntent {
        line: usize,
        column: usize,
        intent: String,
        supported: String,
    },
}

impl ParseError {
    /// 错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } | Self::UnexpectedEnd { .. } => ErrorKind::Syntax,
            Self::UnsupportedIntent { .. } => ErrorKind::Semantic,
        }
    }

    /// 错误所在行号，输入提前结束时为 `None`
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. } | Self::UnsupportedIntent { line, .. } => Some(*line),
            Self::UnexpectedEnd { .. } => None,
        }
    }

    /// 错误所在列号
    pub fn column(&self) -> Option<usize> {
        match self {
            Self::Syntax { column, .. } | Self::UnsupportedIntent { column, .. } => Some(*column),
            Self::UnexpectedEnd { .. } => None,
        }
    }
}

/// 求值错误
///
/// 解析器产出的 AST 不会触发此错误。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// 必选分支或备选分支缺少条件
    #[error("第 {index} 个分支缺少条件，只有默认分支可以没有条件")]
    MissingCondition { index: usize },
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("无法读取配置文件 '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 配置内容不是合法 JSON
    #[error("配置格式错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 意图白名单为空
    #[error("意图白名单不能为空")]
    EmptyWhitelist,
}

/// reply-rules 统一错误类型
#[derive(Error, Debug)]
pub enum RuleError {
    /// 求值错误
    #[error("求值错误: {0}")]
    Eval(#[from] EvalError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 意图和类别都没有对应的脚本
    #[error("意图 '{intent}'（类别 '{category}'）没有可用的脚本")]
    NoRoute { intent: String, category: String },

    /// 脚本来源中找不到指定脚本
    #[error("脚本 '{name}' 不存在")]
    ScriptNotFound { name: String },

    /// 脚本存在结构性缺陷，无法生成 AST
    #[error("脚本 '{name}' 不可用: {source}")]
    Unusable {
        name: String,
        #[source]
        source: ParseError,
    },
}

/// Result 类型别名
pub type RuleResult<T> = Result<T, RuleError>;
