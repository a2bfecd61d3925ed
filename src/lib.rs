//! Kata 構造的パターンマッチングエンジン
//!
//! このライブラリは、ソーステキストに埋め込まれた `match` / `case` 構文の
//! 走査、パターンテキストのパターンIRへの解析、パターンIRから実行可能な
//! 判定手続きへのコンパイル、そして値を型ごとのフィールド列に分解する
//! 構造抽出プロトコルを提供します。

pub mod ast;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod runtime;
pub mod scanner;

// Re-export commonly used types
pub use ast::{DeconName, Expr, Literal, Pattern, RepCount, Span};
pub use compiler::{render_diagnostic, CompiledStatement, Engine};
pub use error::{ErrorCollector, KataError, KataResult};
pub use lexer::{Lexer, Token, TokenWithPosition};
pub use matcher::{MatchResult, Matcher};
pub use parser::{ParseResult, Parser};
pub use runtime::{
    Bindings, BuiltinKind, Env, MatchBlock, ObjectValue, TypeDescriptor, Unapplied, Value,
};
pub use scanner::{CaseRecord, MatchRecord, Statement, TextScanner};
