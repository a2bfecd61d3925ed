//! 統一的なエラーハンドリングモジュール
//!
//! このモジュールは、Kataエンジン全体で使用される統一的なエラー型と
//! エラー報告システムを提供します。

use crate::ast::Span;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

/// Kataエンジンの統一エラー型
#[derive(Error, Debug, Clone)]
pub enum KataError {
    /// レキサーエラー
    #[error("字句解析エラー")]
    Lexer(#[from] LexerError),

    /// パターン構文エラー
    #[error("パターン構文エラー")]
    Syntax(#[from] SyntaxError),

    /// ソーススキャンエラー
    #[error("スキャンエラー")]
    Scan(#[from] ScanError),

    /// マッチ実行時エラー
    #[error("マッチ実行エラー")]
    Match(#[from] MatchError),

    /// ファイルI/Oエラー
    #[error("ファイル操作エラー: {0}")]
    Io(String),

    /// その他のエラー
    #[error("{0}")]
    Other(String),
}

/// レキサーエラーの詳細
#[derive(Error, Debug, Clone)]
pub enum LexerError {
    #[error("認識できないトークン: '{token}'")]
    UnrecognizedToken { token: String, span: Span },

    #[error("未終了の文字列リテラル")]
    UnterminatedString { span: Span },

    #[error("不正な数値リテラル: {message}")]
    InvalidNumber { message: String, span: Span },
}

/// パターン構文エラーの詳細
///
/// パターンのコンパイル時に検出される全てのエラー。常にソース位置を持ち、
/// そのパターンひとつのコンパイルに対して致命的です。
#[derive(Error, Debug, Clone)]
pub enum SyntaxError {
    #[error("予期しないトークン: {expected}を期待しましたが、{found}が見つかりました")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("予期しない入力の終了: {expected}を期待していました")]
    UnexpectedEof { expected: String, span: Span },

    #[error("'{construct}' はパターンマッチングで使用できません")]
    Unsupported { construct: String, span: Span },

    #[error("不正な構文: {message}")]
    InvalidSyntax { message: String, span: Span },

    #[error("名前 '{name}' は既にこのパターンで束縛されています")]
    DuplicateBinding { name: String, span: Span },

    #[error("選択肢の中では名前束縛は使用できません")]
    BindingInAlternatives { span: Span },

    #[error("選択肢の中ではワイルドカードは使用できません")]
    WildcardInAlternatives { span: Span },

    #[error("デコンストラクタで位置引数とキーワード引数を混在させることはできません")]
    MixedArguments { span: Span },

    #[error("不正な範囲指定: {message}")]
    InvalidRange { message: String, span: Span },

    #[error("不正な繰り返し回数")]
    InvalidRepetition { span: Span },

    #[error("不正な正規表現: {message}")]
    InvalidRegex { message: String, span: Span },
}

impl SyntaxError {
    /// エラーの発生位置
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::UnexpectedToken { span, .. }
            | SyntaxError::UnexpectedEof { span, .. }
            | SyntaxError::Unsupported { span, .. }
            | SyntaxError::InvalidSyntax { span, .. }
            | SyntaxError::DuplicateBinding { span, .. }
            | SyntaxError::BindingInAlternatives { span }
            | SyntaxError::WildcardInAlternatives { span }
            | SyntaxError::MixedArguments { span }
            | SyntaxError::InvalidRange { span, .. }
            | SyntaxError::InvalidRepetition { span }
            | SyntaxError::InvalidRegex { span, .. } => *span,
        }
    }
}

/// ソーススキャンエラーの詳細
///
/// `match`/`case` 構文の走査中に検出されるエラー。ソース単位全体の
/// スキャンに対して致命的です。
#[derive(Error, Debug, Clone)]
pub enum ScanError {
    #[error("'{construct}' のスキャン中に予期せず入力が終了しました")]
    UnexpectedEof { construct: String, span: Span },

    #[error("'match' をネストすることはできません")]
    NestedMatch { span: Span },

    #[error("'match' の外側の 'case' には値が必要です")]
    CaseWithoutSubject { span: Span },

    #[error("'match' の内側の 'case' に値を指定することはできません")]
    CaseWithSubject { span: Span },
}

impl ScanError {
    /// エラーの発生位置
    pub fn span(&self) -> Span {
        match self {
            ScanError::UnexpectedEof { span, .. }
            | ScanError::NestedMatch { span }
            | ScanError::CaseWithoutSubject { span }
            | ScanError::CaseWithSubject { span } => *span,
        }
    }
}

/// マッチ実行時エラーの詳細
///
/// 構造マッチ自体の失敗は `MatchResult::NoMatch` で表現されるため、
/// ここに含まれるのは実行を中断すべき条件のみです。
#[derive(Error, Debug, Clone)]
pub enum MatchError {
    #[error("どのパターンにもマッチしませんでした: {value}")]
    NoApplicablePattern { value: String },

    #[error("未定義の名前: {name}")]
    UnknownName { name: String },

    #[error("'{name}' の分解は{expected}個の値を必要としますが、{found}個しか得られませんでした")]
    UnpackArity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("繰り返し回数 '{name}' は非負の整数である必要があります")]
    InvalidCount { name: String },

    #[error("ガード式の評価エラー: {message}")]
    InvalidGuard { message: String },
}

/// エラー情報とソースコードの位置情報を含むエラー
#[derive(Debug, Clone)]
pub struct DiagnosticError {
    pub error: KataError,
    pub file_id: usize,
}

impl DiagnosticError {
    pub fn new(error: KataError, file_id: usize) -> Self {
        Self { error, file_id }
    }

    /// codespan-reportingのDiagnosticに変換
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let (message, labels) = match &self.error {
            KataError::Lexer(e) => {
                let span = match e {
                    LexerError::UnrecognizedToken { span, .. }
                    | LexerError::UnterminatedString { span }
                    | LexerError::InvalidNumber { span, .. } => *span,
                };
                (e.to_string(), vec![self.label(span)])
            }
            KataError::Syntax(e) => (e.to_string(), vec![self.label(e.span())]),
            KataError::Scan(e) => (e.to_string(), vec![self.label(e.span())]),
            KataError::Match(e) => (e.to_string(), vec![]),
            KataError::Io(message) => (format!("ファイル操作エラー: {}", message), vec![]),
            KataError::Other(message) => (message.clone(), vec![]),
        };

        Diagnostic::error().with_message(message).with_labels(labels)
    }

    fn label(&self, span: Span) -> Label<usize> {
        Label::primary(self.file_id, span.start..span.end)
    }
}

/// 複数のエラーを蓄積するためのコレクター
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<DiagnosticError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// エラーを追加
    pub fn add_error(&mut self, error: KataError, file_id: usize) {
        self.errors.push(DiagnosticError::new(error, file_id));
    }

    /// エラーがあるかどうか
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// エラーの数
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// すべてのエラーを取得
    pub fn errors(&self) -> &[DiagnosticError] {
        &self.errors
    }

    /// 最初のエラーを取得
    pub fn first_error(&self) -> Option<&DiagnosticError> {
        self.errors.first()
    }
}

/// Result型のエイリアス
pub type KataResult<T> = Result<T, KataError>;

/// エラー変換用のヘルパートレイト
pub trait IntoKataError {
    fn into_kata_error(self) -> KataError;
}

impl IntoKataError for std::io::Error {
    fn into_kata_error(self) -> KataError {
        KataError::Io(self.to_string())
    }
}

impl IntoKataError for anyhow::Error {
    fn into_kata_error(self) -> KataError {
        KataError::Other(self.to_string())
    }
}

impl From<std::io::Error> for KataError {
    fn from(e: std::io::Error) -> Self {
        KataError::Io(e.to_string())
    }
}
