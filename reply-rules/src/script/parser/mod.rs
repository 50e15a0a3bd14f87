//! # Parser 模块
//!
//! 手写递归下降解析器，把记号流转换为 [`Script`]。
//!
//! ## 文法
//!
//! ```text
//! script        := scene_decl intent_decl chain
//! scene_decl    := SCENE identifier
//! intent_decl   := ON_INTENT identifier            # 必须在意图白名单中
//! chain         := if_branch elseif_branch* else_branch?
//! if_branch     := IF expr REPLY string
//! elseif_branch := ELSE IF expr REPLY string
//! else_branch   := ELSE REPLY string
//! ```
//!
//! 条件表达式的文法见 `expr_parser`。
//!
//! ## 容错
//!
//! - 多出的单个记号（括号除外）：跳过后继续解析，记入 `recovered`，不影响 AST
//! - 分支内的其它错误：记录诊断后跳到下一个 `ELSE` 重新同步
//! - `errors` 非空时结果中没有 AST
//!
//! ## 无状态
//!
//! [`Parser`] 只持有意图白名单，每次调用都在新的 `ScriptParser` 上完成，
//! 可以反复或并发调用。

mod expr_parser;


use std::mem::discriminant;

use tracing::debug;

use crate::config::IntentWhitelist;
use crate::error::{ErrorKind, LexError, ParseError};
use crate::script::ast::{Branch, DecisionChain, Script};
use crate::script::lexer::tokenize;
use crate::script::token::{Span, Token, TokenKind};

/// 一次解析的完整结果
#[derive(Debug, Clone, PartialEq)]
pub struct ParseReport {
    /// 解析得到的脚本，存在结构性缺陷时为 `None`
    pub script: Option<Script>,
    /// 词法诊断（非致命）
    pub lex_errors: Vec<LexError>,
    /// 语法与语义错误
    pub errors: Vec<ParseError>,
    /// 已跳过的多余记号，解析结果仍然可用
    pub recovered: Vec<ParseError>,
}

impl ParseReport {
    /// 是否得到了可用的 AST
    pub fn is_usable(&self) -> bool {
        self.script.is_some()
    }

    /// 是否存在语义错误（意图不在白名单中）
    pub fn has_semantic_errors(&self) -> bool {
        self.errors.iter().any(|e| e.kind() == ErrorKind::Semantic)
    }

    /// 取出脚本，失败时返回第一个错误
    pub fn into_result(self) -> Result<Script, ParseError> {
        match self.script {
            Some(script) => Ok(script),
            None => Err(self
                .errors
                .into_iter()
                .next()
                .unwrap_or_else(|| ParseError::UnexpectedEnd {
                    expected: "SCENE".to_string(),
                })),
        }
    }
}

/// 脚本解析器
#[derive(Debug, Clone, Default)]
pub struct Parser {
    intents: IntentWhitelist,
}

impl Parser {
    /// 创建使用指定意图白名单的解析器
    pub fn new(intents: IntentWhitelist) -> Self {
        Self { intents }
    }

    /// 意图白名单
    pub fn intents(&self) -> &IntentWhitelist {
        &self.intents
    }

    /// 解析脚本文本
    pub fn parse(&self, source: &str) -> ParseReport {
        let lexed = tokenize(source);
        let mut parser = ScriptParser::new(&lexed.tokens, &self.intents);
        let script = parser.parse_script();

        debug!(
            tokens = lexed.tokens.len(),
            lex_errors = lexed.errors.len(),
            errors = parser.errors.len(),
            recovered = parser.recovered.len(),
            usable = script.is_some(),
            "脚本解析完成"
        );

        ParseReport {
            script,
            lex_errors: lexed.errors,
            errors: parser.errors,
            recovered: parser.recovered,
        }
    }
}

/// 解析脚本文本，只关心成功与否
pub fn parse_script(source: &str, intents: &IntentWhitelist) -> Result<Script, ParseError> {
    Parser::new(intents.clone()).parse(source).into_result()
}

/// 单次解析的游标与错误收集
pub(crate) struct ScriptParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    intents: &'t IntentWhitelist,
    errors: Vec<ParseError>,
    recovered: Vec<ParseError>,
}

impl<'t> ScriptParser<'t> {
    fn new(tokens: &'t [Token], intents: &'t IntentWhitelist) -> Self {
        Self {
            tokens,
            pos: 0,
            intents,
            errors: Vec::new(),
            recovered: Vec::new(),
        }
    }

    //=========================================================================
    // 游标操作
    //=========================================================================

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_nth(&self, n: usize) -> Option<&'t Token> {
        self.tokens.get(self.pos + n)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// 当前记号是否为指定种类（忽略负载）
    fn check(&self, kind: &TokenKind) -> bool {
        self.peek()
            .is_some_and(|t| discriminant(&t.kind) == discriminant(kind))
    }

    fn check_nth(&self, n: usize, kind: &TokenKind) -> bool {
        self.peek_nth(n)
            .is_some_and(|t| discriminant(&t.kind) == discriminant(kind))
    }

    /// 针对当前位置构造“期望 X”错误
    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::Syntax {
                line: token.span.line,
                column: token.span.column,
                message: format!("期望 {}，实际 '{}'", expected, token.kind),
            },
            None => ParseError::UnexpectedEnd {
                expected: expected.to_string(),
            },
        }
    }

    /// 读取一个满足 `extract` 的记号
    ///
    /// 当前记号不满足而下一个满足时，视为多出一个记号：
    /// 记录到 `recovered`、跳过它，然后继续。括号不会被跳过。
    fn expect_with<T>(
        &mut self,
        expected: &str,
        extract: impl Fn(&TokenKind) -> Option<T>,
    ) -> Result<(T, Span), ParseError> {
        if let Some(token) = self.peek()
            && let Some(value) = extract(&token.kind)
        {
            self.pos += 1;
            return Ok((value, token.span));
        }

        let err = self.unexpected(expected);
        if let Some(stray) = self.peek()
            && !matches!(stray.kind, TokenKind::LParen | TokenKind::RParen)
            && let Some(next) = self.peek_nth(1)
            && let Some(value) = extract(&next.kind)
        {
            self.recovered.push(err);
            self.pos += 2;
            return Ok((value, next.span));
        }

        Err(err)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Span, ParseError> {
        let target = discriminant(&kind);
        self.expect_with(expected, |k| (discriminant(k) == target).then_some(()))
            .map(|(_, span)| span)
    }

    fn expect_ident(&mut self, expected: &str) -> Result<(String, Span), ParseError> {
        self.expect_with(expected, |k| match k {
            TokenKind::Ident(name) => Some(name.clone()),
            _ => None,
        })
    }

    fn expect_string(&mut self, expected: &str) -> Result<String, ParseError> {
        self.expect_with(expected, |k| match k {
            TokenKind::Str(s) => Some(s.clone()),
            _ => None,
        })
        .map(|(s, _)| s)
    }

    /// 跳过记号直到遇到 `stops` 中的任意一种或输入结束
    fn synchronize(&mut self, stops: &[TokenKind]) {
        while !self.at_end() && !stops.iter().any(|k| self.check(k)) {
            self.pos += 1;
        }
    }

    //=========================================================================
    // 文法
    //=========================================================================

    fn parse_script(&mut self) -> Option<Script> {
        let scene = self
            .parse_scene()
            .map_err(|e| {
                self.errors.push(e);
                self.synchronize(&[TokenKind::OnIntent, TokenKind::If]);
            })
            .ok();

        let intent = self
            .parse_intent()
            .map_err(|e| {
                self.errors.push(e);
                self.synchronize(&[TokenKind::If]);
            })
            .ok();

        let chain = self.parse_chain();

        if let Some(token) = self.peek() {
            let message = if matches!(token.kind, TokenKind::Else) {
                "默认分支 ELSE REPLY 必须位于决策链末尾".to_string()
            } else {
                format!("决策链之后存在多余的记号 '{}'", token.kind)
            };
            self.errors.push(ParseError::Syntax {
                line: token.span.line,
                column: token.span.column,
                message,
            });
        }

        match (scene, intent, chain) {
            (Some(scene), Some(intent), Some(chain)) if self.errors.is_empty() => {
                Some(Script::new(scene, intent, chain))
            }
            _ => None,
        }
    }

    fn parse_scene(&mut self) -> Result<String, ParseError> {
        self.expect(TokenKind::Scene, "SCENE")?;
        let (name, _) = self.expect_ident("场景名")?;
        Ok(name)
    }

    fn parse_intent(&mut self) -> Result<String, ParseError> {
        self.expect(TokenKind::OnIntent, "ON_INTENT")?;
        let (name, span) = self.expect_ident("意图名")?;
        if !self.intents.contains(&name) {
            return Err(ParseError::UnsupportedIntent {
                line: span.line,
                column: span.column,
                intent: name,
                supported: self.intents.describe(),
            });
        }
        Ok(name)
    }

    /// 解析决策链，出错的分支会被记录并跳过
    fn parse_chain(&mut self) -> Option<DecisionChain> {
        let primary = self
            .parse_guarded_branch()
            .map_err(|e| self.recover(e))
            .ok();

        let mut alternatives = Vec::new();
        let mut fallback = None;
        let mut broken = primary.is_none();

        while self.check(&TokenKind::Else) {
            if self.check_nth(1, &TokenKind::If) {
                self.pos += 1;
                match self.parse_guarded_branch() {
                    Ok(branch) => alternatives.push(branch),
                    Err(e) => {
                        broken = true;
                        self.recover(e);
                    }
                }
            } else {
                match self.parse_fallback_branch() {
                    Ok(branch) => {
                        fallback = Some(branch);
                        break;
                    }
                    Err(e) => {
                        broken = true;
                        self.recover(e);
                    }
                }
            }
        }

        match primary {
            Some(primary) if !broken => Some(DecisionChain {
                primary,
                alternatives,
                fallback,
            }),
            _ => None,
        }
    }

    /// `IF expr REPLY string`
    fn parse_guarded_branch(&mut self) -> Result<Branch, ParseError> {
        self.expect(TokenKind::If, "IF")?;
        let condition = self.parse_condition()?;
        self.expect(TokenKind::Reply, "REPLY")?;
        let reply = self.expect_string("回复字符串")?;
        Ok(Branch::guarded(condition, reply))
    }

    /// `ELSE REPLY string`
    fn parse_fallback_branch(&mut self) -> Result<Branch, ParseError> {
        self.expect(TokenKind::Else, "ELSE")?;
        self.expect(TokenKind::Reply, "REPLY")?;
        let reply = self.expect_string("回复字符串")?;
        Ok(Branch::fallback(reply))
    }

    fn recover(&mut self, err: ParseError) {
        self.errors.push(err);
        self.synchronize(&[TokenKind::Else]);
    }
}
