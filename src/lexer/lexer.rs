//! レキサーのメイン実装

use logos::{Logos, Span};

use super::token::Token;
use crate::error::{KataResult, LexerError};

/// 位置情報付きトークン
#[derive(Debug, Clone)]
pub struct TokenWithPosition {
    pub token: Token,
    pub span: Span,
}

/// パターンテキスト・ソーステキストのレキサー
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, Token>,
}

impl<'a> Lexer<'a> {
    /// 新しいレキサーを作成
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: Token::lexer(input),
        }
    }

    /// 次のトークンを取得
    pub fn next_token(&mut self) -> Option<KataResult<TokenWithPosition>> {
        let result = self.inner.next()?;
        let span = self.inner.span();
        match result {
            Ok(token) => Some(Ok(TokenWithPosition { token, span })),
            Err(_) => Some(Err(unrecognized(self.inner.slice(), span))),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = KataResult<TokenWithPosition>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// ソースコード全体をトークン化
///
/// 認識できない文字があればエラーを返します。スキャナーとパーサーは
/// 正確なテキスト範囲を必要とするため、エラートークンの黙殺はしません。
pub fn tokenize(input: &str) -> KataResult<Vec<TokenWithPosition>> {
    Lexer::new(input).collect()
}

fn unrecognized(slice: &str, span: Span) -> crate::error::KataError {
    let span = crate::ast::Span::new(span.start, span.end);
    if slice.starts_with('"') || slice.starts_with('\'') {
        LexerError::UnterminatedString { span }.into()
    } else {
        LexerError::UnrecognizedToken {
            token: slice.to_string(),
            span,
        }
        .into()
    }
}

/// デバッグ用：トークンストリームを文字列として出力
pub fn format_tokens(tokens: &[TokenWithPosition]) -> String {
    tokens
        .iter()
        .map(|t| format!("{:?} @ {:?}", t.token, t.span))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_basic_tokenization() {
        let tokens = kinds("case x as [1, _]:");
        assert_eq!(
            tokens,
            vec![
                Token::Case,
                Token::Identifier("x".to_string()),
                Token::As,
                Token::LeftBracket,
                Token::Integer(1),
                Token::Comma,
                Token::Identifier("_".to_string()),
                Token::RightBracket,
                Token::Colon,
            ]
        );
    }

    #[test]
    fn test_string_literals() {
        let tokens = kinds(r#"'a' + "b\n""#);
        assert_eq!(
            tokens,
            vec![
                Token::Str("a".to_string()),
                Token::Plus,
                Token::Str("b\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_ellipsis_and_operators() {
        let tokens = kinds("1 | ... | 5 ^ 2 ** 3");
        assert_eq!(
            tokens,
            vec![
                Token::Integer(1),
                Token::Pipe,
                Token::Ellipsis,
                Token::Pipe,
                Token::Integer(5),
                Token::Caret,
                Token::Integer(2),
                Token::DoubleStar,
                Token::Integer(3),
            ]
        );
    }

    #[test]
    fn test_comment_skipped() {
        let tokens = kinds("x # コメント\ny");
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("x".to_string()),
                Token::Newline,
                Token::Identifier("y".to_string()),
            ]
        );
    }

    #[test]
    fn test_unrecognized_token() {
        assert!(tokenize("a ? b").is_err());
    }
}
