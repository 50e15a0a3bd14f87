//! # 条件表达式解析器
//!
//! 递归下降解析条件表达式。
//!
//! ```text
//! expr        := or_expr
//! or_expr     := and_expr (OR and_expr)*
//! and_expr    := primary (AND primary)*
//! primary     := LPAREN expr RPAREN | atom
//! atom        := identifier compare_op value | identifier
//! value       := number | string
//! ```
//!
//! 优先级从低到高：`OR`、`AND`、比较运算符。`AND`/`OR` 左结合；
//! 比较运算符不可结合，`a < 1 < 2` 是语法错误。

use crate::error::ParseError;
use crate::script::ast::{CompareOp, Condition, Literal};
use crate::script::token::TokenKind;

use super::ScriptParser;

impl ScriptParser<'_> {
    /// 解析一个完整的条件表达式
    pub(super) fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Condition, ParseError> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Condition::or(left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Condition, ParseError> {
        let mut left = self.parse_primary()?;
        while self.check(&TokenKind::And) {
            self.pos += 1;
            let right = self.parse_primary()?;
            left = Condition::and(left, right);
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Condition, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("条件表达式"));
        };

        match &token.kind {
            TokenKind::LParen => {
                self.pos += 1;
                let inner = self.parse_or()?;
                if !self.check(&TokenKind::RParen) {
                    return Err(self.unexpected("右括号 ')'"));
                }
                self.pos += 1;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.pos += 1;
                match self.parse_compare_op() {
                    Some(op) => {
                        let value = self.parse_value()?;
                        self.reject_chained_comparison()?;
                        Ok(Condition::Compare {
                            ident: name.clone(),
                            op,
                            value,
                        })
                    }
                    None => Ok(Condition::exists(name.clone())),
                }
            }
            _ => Err(self.unexpected("标识符或 '('")),
        }
    }

    fn parse_compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek()?.kind {
            TokenKind::Le => CompareOp::Le,
            TokenKind::Ge => CompareOp::Ge,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::Eq => CompareOp::Eq,
            TokenKind::Ne => CompareOp::Ne,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn parse_value(&mut self) -> Result<Literal, ParseError> {
        let value = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Number(n)) => Literal::Number(*n),
            Some(TokenKind::Str(s)) => Literal::String(s.clone()),
            _ => return Err(self.unexpected("数字或字符串")),
        };
        self.pos += 1;
        Ok(value)
    }

    fn reject_chained_comparison(&self) -> Result<(), ParseError> {
        match self.peek() {
            Some(token) if token.kind.is_compare_op() => Err(ParseError::Syntax {
                line: token.span.line,
                column: token.span.column,
                message: format!(
                    "比较运算符 '{}' 不能连续使用，请用 AND/OR 或括号连接",
                    token.kind
                ),
            }),
            _ => Ok(()),
        }
    }
}
