//! パーサーモジュール
//!
//! このモジュールは2段階で動作します。まず `Parser` がトークン列を
//! 汎用の式ツリー（AST）に解析し、次に `pattern_parser` がその式ツリーを
//! 閉じたパターンIRに書き換えます。パターンの表層文法はホスト式文法の
//! 厳密な部分集合なので、ガード式の解析にも同じ `Parser` を使います。

mod expr_parser;
mod parser_impl;
pub mod pattern_parser;

pub use parser_impl::Parser;

use crate::error::SyntaxError;
pub type ParseResult<T> = Result<T, SyntaxError>;
