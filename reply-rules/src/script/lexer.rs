//! # 扫描器
//!
//! 把脚本原文转换为有序的记号流。
//!
//! ## 词法规则
//!
//! - 关键字：`SCENE` `ON_INTENT` `IF` `ELSE` `REPLY` `AND` `OR`（大小写敏感）
//! - 比较运算符：`<=` `>=` `<` `>` `==` `!=`
//! - 标识符：字母（含中文等非拉丁文字）或 `_` 开头，后接字母、数字或 `_`
//! - 数字：`\d+\.?\d*`，转换为 `f64`
//! - 字符串：双引号包围，`\` 转义下一个字符，转义序列不解码
//! - 注释：`#` 到行尾
//!
//! 非法字符只记录诊断并跳过一个字符，扫描器不会因此中止。

use tracing::warn;

use crate::error::LexError;
use crate::script::token::{Span, Token, TokenKind};

/// 扫描结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lexed {
    /// 记号流
    pub tokens: Vec<Token>,
    /// 扫描过程中的诊断
    pub errors: Vec<LexError>,
}

/// 扫描脚本文本
pub fn tokenize(source: &str) -> Lexed {
    let mut scanner = Scanner::new(source);
    scanner.run();
    Lexed {
        tokens: scanner.tokens,
        errors: scanner.errors,
    }
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn push(&mut self, kind: TokenKind, span: Span) {
        self.tokens.push(Token::new(kind, span));
    }

    fn error(&mut self, err: LexError) {
        warn!(line = err.line(), column = err.column(), "{}", err);
        self.errors.push(err);
    }

    fn run(&mut self) {
        while let Some(c) = self.peek_char() {
            let span = self.span();
            match c {
                c if c.is_whitespace() => {
                    self.consume_char();
                }
                '#' => self.skip_comment(),
                '(' => {
                    self.consume_char();
                    self.push(TokenKind::LParen, span);
                }
                ')' => {
                    self.consume_char();
                    self.push(TokenKind::RParen, span);
                }
                '<' | '>' | '=' | '!' => self.scan_operator(c, span),
                '"' => self.scan_string(span),
                c if c.is_ascii_digit() => self.scan_number(span),
                c if c.is_alphabetic() || c == '_' => self.scan_word(span),
                other => {
                    self.consume_char();
                    self.error(LexError::UnexpectedChar {
                        line: span.line,
                        column: span.column,
                        ch: other,
                    });
                }
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.consume_char();
        }
    }

    fn scan_operator(&mut self, first: char, span: Span) {
        let followed_by_eq = self.peek_second() == Some('=');
        let kind = match (first, followed_by_eq) {
            ('<', true) => Some(TokenKind::Le),
            ('>', true) => Some(TokenKind::Ge),
            ('=', true) => Some(TokenKind::Eq),
            ('!', true) => Some(TokenKind::Ne),
            ('<', false) => Some(TokenKind::Lt),
            ('>', false) => Some(TokenKind::Gt),
            // 单独的 `=` 或 `!` 不是合法记号
            _ => None,
        };

        self.consume_char();
        match kind {
            Some(kind) => {
                if followed_by_eq {
                    self.consume_char();
                }
                self.push(kind, span);
            }
            None => self.error(LexError::UnexpectedChar {
                line: span.line,
                column: span.column,
                ch: first,
            }),
        }
    }

    fn scan_string(&mut self, span: Span) {
        // 先向前查找结束引号，找不到时只跳过开头的引号
        let body_start = self.pos + 1;
        let mut escaped = false;
        let mut end = None;
        for (offset, c) in self.input[body_start..].char_indices() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                end = Some(body_start + offset);
                break;
            }
        }

        let Some(end) = end else {
            self.consume_char();
            self.error(LexError::UnterminatedString {
                line: span.line,
                column: span.column,
            });
            return;
        };

        let content = self.input[body_start..end].to_string();
        while self.pos <= end {
            self.consume_char();
        }
        self.push(TokenKind::Str(content), span);
    }

    fn scan_number(&mut self, span: Span) {
        let start = self.pos;
        self.consume_digits();
        if self.peek_char() == Some('.') {
            self.consume_char();
            self.consume_digits();
        }

        let text = &self.input[start..self.pos];
        let value = match text.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                let text = text.to_string();
                self.error(LexError::MalformedNumber {
                    line: span.line,
                    column: span.column,
                    text,
                });
                0.0
            }
        };
        self.push(TokenKind::Number(value), span);
    }

    fn consume_digits(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_ascii_digit() {
                break;
            }
            self.consume_char();
        }
    }

    fn scan_word(&mut self, span: Span) {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            self.consume_char();
        }

        let word = &self.input[start..self.pos];
        let kind = TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string()));
        self.push(kind, span);
    }
}
