//! マッチャーモジュール
//!
//! パターンIR（と任意のガード式）から実行可能な判定手続きを
//! 構築します。コンパイル結果の `Matcher` は不変で、複数の
//! マッチで共有できます。

mod compiler;
pub mod guard;
mod string;

pub use string::{class_regex, KataRegex, StringMatcher};

use crate::ast::{Expr, Pattern, Span};
use crate::error::{KataResult, SyntaxError};
use crate::runtime::{Bindings, Env, Value};

use compiler::Node;

/// マッチの結果
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// マッチ失敗
    NoMatch,
    /// マッチ成功と、そのとき確定した束縛
    Matched(Bindings),
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched(_))
    }

    pub fn bindings(&self) -> Option<&Bindings> {
        match self {
            MatchResult::Matched(bindings) => Some(bindings),
            MatchResult::NoMatch => None,
        }
    }
}

/// コンパイル済みの判定手続き
///
/// 対象値と環境の純粋関数であり、共有可能（`Rc<Matcher>`）です。
#[derive(Debug)]
pub struct Matcher {
    node: Node,
    guard: Option<Expr>,
    /// マッチ成功時に束縛される名前
    targets: Vec<String>,
    /// 実行時に環境から解決される自由名
    sources: Vec<String>,
}

impl Matcher {
    /// パターンIR（と任意のガード）をコンパイル
    ///
    /// パターンIRはソース位置を持たないため、エラー報告用に
    /// パターン全体のスパンを受け取ります。
    pub fn compile(
        pattern: &Pattern,
        guard: Option<Expr>,
        span: Span,
    ) -> Result<Matcher, SyntaxError> {
        let node = compiler::compile(pattern, span)?;

        let mut targets = Vec::new();
        compiler::collect_targets(pattern, &mut targets);

        let mut sources = Vec::new();
        compiler::collect_sources(pattern, &mut sources);
        if let Some(guard) = &guard {
            let mut names = Vec::new();
            guard::free_names(guard, &mut names);
            // ガードの自由名のうち、パターンが束縛しないものだけが外部参照
            for name in names {
                if !targets.contains(&name) && !sources.contains(&name) {
                    sources.push(name);
                }
            }
        }

        Ok(Matcher {
            node,
            guard,
            targets,
            sources,
        })
    }

    /// マッチ成功時に束縛される名前の一覧
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// 実行時に環境から解決される自由名の一覧
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// 対象値とのマッチを試みる
    ///
    /// 構造マッチが成功した場合のみガードを評価し、ガードが偽なら
    /// マッチ失敗として扱います。ガードの評価エラーはそのまま
    /// 伝播します。
    pub fn matches(&self, value: &Value, env: &Env) -> KataResult<MatchResult> {
        let mut bindings = Bindings::new();
        if !self.node.test(value, env, &mut bindings)? {
            return Ok(MatchResult::NoMatch);
        }
        if let Some(guard) = &self.guard {
            if !guard::eval_bool(guard, &bindings, env)? {
                return Ok(MatchResult::NoMatch);
            }
        }
        Ok(MatchResult::Matched(bindings))
    }

    /// マッチするかどうかだけを判定
    pub fn is_match(&self, value: &Value, env: &Env) -> KataResult<bool> {
        Ok(self.matches(value, env)?.is_match())
    }
}
