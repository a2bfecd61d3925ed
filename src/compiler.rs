//! コンパイルドライバ
//!
//! パターンテキストからコンパイル済みマッチャーまでのパイプライン全体を
//! 束ねます。同一の（パターン, ガード）テキストの再コンパイルを避ける
//! キャッシュは、グローバルではなくこのドライバが明示的に所有します。

use std::collections::HashMap;
use std::rc::Rc;

use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::Buffer;
use log::{debug, trace};

use crate::ast::Span;
use crate::error::{DiagnosticError, ErrorCollector, KataError, KataResult};
use crate::lexer::tokenize;
use crate::matcher::Matcher;
use crate::parser::{pattern_parser, Parser};
use crate::scanner::{scan, Statement};

/// コンパイル済みのスキャン結果
#[derive(Clone)]
pub enum CompiledStatement {
    /// `match 対象式:` — 後続の case が対象式を継承する
    Match { span: Span, subject: String },
    /// `case ...:` — 対象式（match 内なら None）とコンパイル済みマッチャー
    Case {
        span: Span,
        subject: Option<String>,
        matcher: Rc<Matcher>,
    },
}

/// パターンコンパイラのドライバ
///
/// キャッシュはテストごとに独立させられるよう、明示的に注入可能な
/// オブジェクトとしてここに置いています。
#[derive(Default)]
pub struct Engine {
    cache: HashMap<(String, Option<String>), Rc<Matcher>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// パターンテキスト（と任意のガードテキスト）をコンパイル
    ///
    /// 同一テキストの再コンパイルはキャッシュ済みのマッチャーを返します。
    pub fn compile_pattern(
        &mut self,
        pattern: &str,
        guard: Option<&str>,
    ) -> KataResult<Rc<Matcher>> {
        let key = (pattern.to_string(), guard.map(str::to_string));
        if let Some(matcher) = self.cache.get(&key) {
            trace!("キャッシュ命中: {:?}", pattern);
            return Ok(Rc::clone(matcher));
        }

        debug!("パターンをコンパイル: {:?}", pattern);
        let expr = Parser::new(tokenize(pattern)?).parse_expression()?;
        let ir = pattern_parser::parse_pattern(&expr)?;
        let guard_expr = match guard {
            Some(text) => Some(Parser::new(tokenize(text)?).parse_expression()?),
            None => None,
        };

        let matcher = Rc::new(Matcher::compile(&ir, guard_expr, expr.span)?);
        self.cache.insert(key, Rc::clone(&matcher));
        Ok(matcher)
    }

    /// ソーステキストをスキャンし、各 case のパターンをコンパイル
    pub fn compile_source(&mut self, source: &str) -> KataResult<Vec<CompiledStatement>> {
        let statements = scan(source)?;
        debug!("{} 個の文を検出", statements.len());

        let mut compiled = Vec::with_capacity(statements.len());
        for statement in statements {
            match statement {
                Statement::Match(record) => compiled.push(CompiledStatement::Match {
                    span: record.span,
                    subject: record.subject,
                }),
                Statement::Case(record) => {
                    let matcher =
                        self.compile_pattern(&record.pattern, record.guard.as_deref())?;
                    compiled.push(CompiledStatement::Case {
                        span: record.span,
                        subject: record.subject,
                        matcher,
                    });
                }
            }
        }
        Ok(compiled)
    }

    /// ソース全体をコンパイルし、パターンごとのエラーを集める
    ///
    /// `compile_source` と異なり、最初の不正なパターンで止まりません。
    /// スキャン自体の失敗のみ致命的で、コンパイルに失敗した case は
    /// 結果から除かれ、そのエラーがコレクターに蓄積されます。
    pub fn compile_source_collecting(
        &mut self,
        source: &str,
        file_id: usize,
        errors: &mut ErrorCollector,
    ) -> KataResult<Vec<CompiledStatement>> {
        let statements = scan(source)?;

        let mut compiled = Vec::with_capacity(statements.len());
        for statement in statements {
            match statement {
                Statement::Match(record) => compiled.push(CompiledStatement::Match {
                    span: record.span,
                    subject: record.subject,
                }),
                Statement::Case(record) => {
                    match self.compile_pattern(&record.pattern, record.guard.as_deref()) {
                        Ok(matcher) => compiled.push(CompiledStatement::Case {
                            span: record.span,
                            subject: record.subject,
                            matcher,
                        }),
                        Err(error) => errors.add_error(error, file_id),
                    }
                }
            }
        }
        Ok(compiled)
    }

    /// キャッシュ済みのエントリ数
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

/// エラーをソース位置付きの診断テキストに整形
pub fn render_diagnostic(name: &str, source: &str, error: &KataError) -> String {
    let mut files = SimpleFiles::new();
    let file_id = files.add(name, source);
    let diagnostic = DiagnosticError::new(error.clone(), file_id).to_diagnostic();

    let mut buffer = Buffer::no_color();
    let config = term::Config::default();
    if term::emit(&mut buffer, &config, &files, &diagnostic).is_err() {
        return error.to_string();
    }
    String::from_utf8_lossy(buffer.as_slice()).into_owned()
}
