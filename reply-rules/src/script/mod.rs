//! # Script 模块
//!
//! 规则脚本的编译前端：扫描、解析与 AST 定义。
//!
//! ## 模块结构
//!
//! - [`token`]：记号定义
//! - [`lexer`]：扫描器
//! - [`ast`]：抽象语法树定义
//! - [`parser`]：递归下降解析器

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use lexer::{Lexed, tokenize};
pub use parser::{ParseReport, Parser, parse_script};
pub use token::{Span, Token, TokenCategory, TokenKind};
