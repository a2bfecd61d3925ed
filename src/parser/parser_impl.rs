//! メインパーサー構造とユーティリティ

use crate::ast::{Expr, ExprKind, Span};
use crate::error::SyntaxError;
use crate::lexer::{Token, TokenWithPosition};

use super::ParseResult;

/// 式パーサー
pub struct Parser {
    pub(super) tokens: Vec<TokenWithPosition>,
    pub(super) current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<TokenWithPosition>) -> Self {
        // 改行トークンは式の中では意味を持たないのでフィルタリング
        let tokens: Vec<_> = tokens
            .into_iter()
            .filter(|t| !matches!(t.token, Token::Newline))
            .collect();
        Self { tokens, current: 0 }
    }

    /// 単一の式全体を解析
    ///
    /// パターンテキストとガードテキストのエントリポイント。
    /// 括弧なしのトップレベルタプル（`a, b`）も受け付けます。
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let first = self.parse_expr()?;

        let expr = if self.check(&Token::Comma) {
            let mut elts = vec![first];
            while self.match_token(&Token::Comma) {
                if self.is_at_end() {
                    break;
                }
                elts.push(self.parse_expr()?);
            }
            Expr::new(ExprKind::Tuple(elts), self.span_from(start))
        } else {
            first
        };

        if !self.is_at_end() {
            return Err(self.unexpected("式の終端"));
        }
        Ok(expr)
    }

    // ==================== ユーティリティメソッド ====================

    /// 現在のトークンを取得
    pub(super) fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.current).map(|t| &t.token)
    }

    /// 特定のオフセット先のトークンを取得
    pub(super) fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset).map(|t| &t.token)
    }

    /// 現在のスパンを取得
    pub(super) fn current_span(&self) -> Span {
        match self.tokens.get(self.current) {
            Some(t) => Span::new(t.span.start, t.span.end),
            None => self
                .tokens
                .last()
                .map(|t| Span::new(t.span.end, t.span.end))
                .unwrap_or_else(Span::dummy),
        }
    }

    /// 開始位置から直前トークンの終了位置までのスパンを作成
    pub(super) fn span_from(&self, start: usize) -> Span {
        let end = if self.current > 0 {
            self.tokens
                .get(self.current - 1)
                .map(|t| t.span.end)
                .unwrap_or(start)
        } else {
            self.current_span().end
        };
        Span::new(start, end)
    }

    /// 入力の終端に達したかどうか
    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    /// 次のトークンへ進む
    pub(super) fn advance(&mut self) -> Option<&TokenWithPosition> {
        let token = self.tokens.get(self.current);
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    /// 現在のトークンが指定のものかどうか
    pub(super) fn check(&self, token: &Token) -> bool {
        self.current_token() == Some(token)
    }

    /// 現在のトークンが指定のものなら消費する
    pub(super) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// 指定のトークンを要求する
    pub(super) fn expect(&mut self, token: Token) -> ParseResult<()> {
        if self.match_token(&token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", token)))
        }
    }

    /// 識別子を要求する
    pub(super) fn expect_identifier(&mut self) -> ParseResult<String> {
        match self.current_token() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("識別子")),
        }
    }

    /// 予期しないトークンのエラーを作成
    pub(super) fn unexpected(&self, expected: &str) -> SyntaxError {
        match self.current_token() {
            Some(found) => SyntaxError::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
                span: self.current_span(),
            },
            None => SyntaxError::UnexpectedEof {
                expected: expected.to_string(),
                span: self.current_span(),
            },
        }
    }
}
