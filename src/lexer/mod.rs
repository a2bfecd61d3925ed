//! 字句解析モジュール
//!
//! パターンテキストと `match`/`case` を含むソーステキストを
//! トークン列に変換する責任を持ちます。

mod lexer;
mod token;

pub use lexer::{format_tokens, tokenize, Lexer, TokenWithPosition};
pub use token::Token;
