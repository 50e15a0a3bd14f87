//! # 诊断模块
//!
//! 提供脚本静态检查和诊断 API，不依赖 IO。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（脚本不可用）、Warn（建议修复）、Info（信息提示）
//! - 复用 lexer/parser 的错误，不重复解析逻辑

use std::collections::BTreeSet;

use crate::error::ParseError;
use crate::script::{Parser, Script};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（脚本不可用）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 脚本名 / 文件路径
    pub script_id: String,
    /// 行号（如果可定位，从 1 开始）
    pub line: Option<usize>,
    /// 列号（如果可定位，从 1 开始）
    pub column: Option<usize>,
    /// 诊断消息
    pub message: String,
    /// 诊断详情
    pub detail: Option<String>,
}

impl Diagnostic {
    fn with_level(
        level: DiagnosticLevel,
        script_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            script_id: script_id.into(),
            line: None,
            column: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 创建错误诊断
    pub fn error(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, script_id, message)
    }

    /// 创建警告诊断
    pub fn warn(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warn, script_id, message)
    }

    /// 创建信息诊断
    pub fn info(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, script_id, message)
    }

    /// 设置位置
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.script_id)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
            if let Some(column) = self.column {
                write!(f, ":{}", column)?;
            }
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    pub fn info_count(&self) -> usize {
        self.count(DiagnosticLevel::Info)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按最低级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }
}

//=============================================================================
// 脚本检查 API
//=============================================================================

/// 解析并检查一份脚本原文
///
/// - 词法错误 → Warn（扫描器已跳过，不影响 AST）
/// - 被跳过的多余记号 → Warn（不影响 AST）
/// - 语法错误 → Error
/// - 语义错误 → Error，详情中列出支持的意图
/// - 脚本可用时追加 [`analyze_script`] 的结果
pub fn check_source(script_id: &str, text: &str, parser: &Parser) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let report = parser.parse(text);

    for err in &report.lex_errors {
        result.push(Diagnostic::warn(script_id, err.to_string()).at(err.line(), err.column()));
    }

    for err in &report.recovered {
        result.push(recovered_diagnostic(script_id, err));
    }

    for err in &report.errors {
        result.push(parse_error_diagnostic(script_id, err));
    }

    if let Some(script) = &report.script {
        result.merge(analyze_script(script_id, script));
    }

    result
}

fn recovered_diagnostic(script_id: &str, err: &ParseError) -> Diagnostic {
    let message = match err {
        ParseError::Syntax { message, .. } => message.clone(),
        other => other.to_string(),
    };
    let diag = Diagnostic::warn(script_id, format!("已跳过多余的记号：{}", message));
    match (err.line(), err.column()) {
        (Some(line), Some(column)) => diag.at(line, column),
        _ => diag,
    }
}

fn parse_error_diagnostic(script_id: &str, err: &ParseError) -> Diagnostic {
    match err {
        ParseError::Syntax {
            line,
            column,
            message,
        } => Diagnostic::error(script_id, format!("语法错误：{}", message)).at(*line, *column),
        ParseError::UnexpectedEnd { .. } => Diagnostic::error(script_id, err.to_string()),
        ParseError::UnsupportedIntent {
            line,
            column,
            intent,
            supported,
        } => Diagnostic::error(script_id, format!("不支持的意图 '{}'", intent))
            .at(*line, *column)
            .with_detail(format!("支持的意图有: {}", supported)),
    }
}

/// 分析已解析的脚本
///
/// 执行以下检查：
/// - 条件与之前某个分支完全相同的分支永远不会被选中（Warn）
/// - 决策链没有默认分支，可能没有回复（Info）
pub fn analyze_script(script_id: &str, script: &Script) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();

    let guarded: Vec<_> = script
        .chain
        .branches()
        .filter_map(|branch| branch.condition.as_ref())
        .collect();

    for (index, condition) in guarded.iter().enumerate().skip(1) {
        if let Some(first) = guarded[..index].iter().position(|c| c == condition) {
            result.push(
                Diagnostic::warn(
                    script_id,
                    format!("第 {} 个分支永远不会被选中", index + 1),
                )
                .with_detail(format!(
                    "条件 {} 与第 {} 个分支相同",
                    condition,
                    first + 1
                )),
            );
        }
    }

    if script.chain.fallback.is_none() {
        result.push(Diagnostic::info(
            script_id,
            "决策链没有默认分支，条件都不成立时不会产生回复",
        ));
    }

    result
}

/// 脚本读取的所有上下文键（去重并排序）
pub fn referenced_identifiers(script: &Script) -> BTreeSet<String> {
    script
        .chain
        .branches()
        .filter_map(|branch| branch.condition.as_ref())
        .flat_map(|condition| condition.identifiers())
        .map(str::to_string)
        .collect()
}
