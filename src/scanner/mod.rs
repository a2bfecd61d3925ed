//! ソーススキャナモジュール
//!
//! 通常のプログラムテキストから `match` / `case` 文を探し出し、
//! それぞれの対象式・パターンテキスト・ガード式と、置換対象の
//! 正確なソース区間を切り出します。
//!
//! 文の先頭にあるキーワードだけを見ます。`as` / `if` / 終端のコロンは
//! 括弧の深さ0でのみ区切りとして認識されるため、辞書リテラル内の
//! コロンなどを文の終端と誤認することはありません。

use log::debug;

use crate::ast::Span;
use crate::error::{KataResult, ScanError};
use crate::lexer::{tokenize, Token, TokenWithPosition};

/// スキャン結果の文
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Match(MatchRecord),
    Case(CaseRecord),
}

impl Statement {
    /// 置換対象のソース区間
    pub fn span(&self) -> Span {
        match self {
            Statement::Match(record) => record.span,
            Statement::Case(record) => record.span,
        }
    }
}

/// `match 対象式:` のレコード
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub span: Span,
    pub subject: String,
}

/// `case [対象式 as] パターン [if ガード]:` のレコード
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    pub span: Span,
    pub subject: Option<String>,
    pub pattern: String,
    pub guard: Option<String>,
}

/// ソーステキストをスキャンして文のリストを返す
pub fn scan(source: &str) -> KataResult<Vec<Statement>> {
    TextScanner::new(source)?.find_statements()
}

/// ソーステキストのスキャナ
pub struct TextScanner<'a> {
    source: &'a str,
    tokens: Vec<TokenWithPosition>,
    line_starts: Vec<usize>,
    depths: Vec<i64>,
}

/// トークン列上のカーソル。括弧の深さを追跡する
struct Cursor<'t> {
    tokens: &'t [TokenWithPosition],
    pos: usize,
    depth: i64,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [TokenWithPosition]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&'t TokenWithPosition> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'t TokenWithPosition> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        if token.token.is_open_bracket() {
            self.depth += 1;
        } else if token.token.is_close_bracket() {
            self.depth -= 1;
        }
        Some(token)
    }

    /// 括弧の中身を読み飛ばし、深さ0に戻るまで進める
    fn skip_brackets(&mut self) -> bool {
        while self.depth > 0 {
            if self.advance().is_none() {
                return false;
            }
        }
        true
    }
}

impl<'a> TextScanner<'a> {
    pub fn new(source: &'a str) -> KataResult<Self> {
        let tokens = tokenize(source)?;
        let mut line_starts = vec![0];
        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Ok(Self {
            source,
            tokens,
            line_starts,
            depths: line_depths(source),
        })
    }

    /// すべての `match` / `case` 文を見つける
    ///
    /// `match` はネストできません。`case` は `match` の本体の直下に
    /// ある場合に限り対象式を持たず、それ以外では必ず対象式を
    /// 持ちます。インデントが `match` の深さ以下に戻った時点で
    /// `match` のスコープは終わります。
    pub fn find_statements(&self) -> KataResult<Vec<Statement>> {
        let mut statements = Vec::new();
        let mut cursor = Cursor::new(&self.tokens);
        // 有効な match 文のインデント深さ。-1 なら match の外
        let mut match_indent: i64 = -1;
        let mut at_line_start = true;

        while let Some(token) = cursor.peek() {
            if matches!(token.token, Token::Newline) {
                cursor.advance();
                at_line_start = true;
                continue;
            }
            if !at_line_start {
                cursor.advance();
                continue;
            }
            at_line_start = false;

            let depth = self.depth_at(token.span.start);
            if match_indent >= 0 && depth <= match_indent {
                match_indent = -1;
            }

            match token.token {
                Token::Match => {
                    if match_indent >= 0 {
                        return Err(ScanError::NestedMatch {
                            span: Span::new(token.span.start, token.span.end),
                        }
                        .into());
                    }
                    let record = self.parse_match(&mut cursor)?;
                    debug!("match 文を検出: {:?}", record.subject);
                    match_indent = depth;
                    statements.push(Statement::Match(record));
                }
                Token::Case => {
                    let record = self.parse_case(&mut cursor)?;
                    let inside = match_indent >= 0 && depth == match_indent + 1;
                    if !inside && record.subject.is_none() {
                        return Err(ScanError::CaseWithoutSubject { span: record.span }.into());
                    }
                    if inside && record.subject.is_some() {
                        return Err(ScanError::CaseWithSubject { span: record.span }.into());
                    }
                    debug!("case 文を検出: {:?}", record.pattern);
                    statements.push(Statement::Case(record));
                }
                _ => {
                    cursor.advance();
                }
            }
        }

        Ok(statements)
    }

    /// `match 対象式:` を解析
    fn parse_match(&self, cursor: &mut Cursor) -> Result<MatchRecord, ScanError> {
        let Some(keyword) = cursor.advance() else {
            return Err(self.unexpected_eof("match"));
        };
        let subject_start = keyword.span.end;

        loop {
            if !cursor.skip_brackets() {
                return Err(self.unexpected_eof("match"));
            }
            let Some(token) = cursor.advance() else {
                return Err(self.unexpected_eof("match"));
            };
            if matches!(token.token, Token::Colon) {
                return Ok(MatchRecord {
                    span: Span::new(keyword.span.start, token.span.end),
                    subject: self.text(subject_start, token.span.start),
                });
            }
        }
    }

    /// `case [対象式 as] パターン [if ガード]:` を解析
    ///
    /// 終端のコロンは行の最後のトークンである必要があります。
    /// 括弧内のコロンや改行は文を終えません。
    fn parse_case(&self, cursor: &mut Cursor) -> Result<CaseRecord, ScanError> {
        let Some(keyword) = cursor.advance() else {
            return Err(self.unexpected_eof("case"));
        };
        let mut start = keyword.span.end;
        let mut subject: Option<String> = None;
        let mut pattern: Option<String> = None;

        loop {
            if !cursor.skip_brackets() {
                return Err(self.unexpected_eof("case"));
            }
            let Some(token) = cursor.advance() else {
                return Err(self.unexpected_eof("case"));
            };
            match token.token {
                Token::As if subject.is_none() => {
                    subject = Some(self.text(start, token.span.start));
                    start = token.span.end;
                }
                Token::If if pattern.is_none() => {
                    pattern = Some(self.text(start, token.span.start));
                    start = token.span.end;
                }
                Token::Colon => {
                    // 行末のコロンだけが文の終端
                    let at_line_end = matches!(
                        cursor.peek().map(|t| &t.token),
                        None | Some(Token::Newline)
                    );
                    if !at_line_end {
                        continue;
                    }
                    let text = self.text(start, token.span.start);
                    let (pattern, guard) = match pattern {
                        Some(pattern) => (pattern, Some(text)),
                        None => (text, None),
                    };
                    return Ok(CaseRecord {
                        span: Span::new(keyword.span.start, token.span.end),
                        subject,
                        pattern,
                        guard,
                    });
                }
                _ => {}
            }
        }
    }

    /// オフセットを含む行のインデント深さ
    fn depth_at(&self, offset: usize) -> i64 {
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        self.depths.get(line).copied().unwrap_or(0)
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.source[start..end].trim().to_string()
    }

    fn unexpected_eof(&self, construct: &str) -> ScanError {
        let end = self.source.len();
        ScanError::UnexpectedEof {
            construct: construct.to_string(),
            span: Span::new(end, end),
        }
    }
}

/// 各行のインデント深さを幅スタックで事前計算する
///
/// 空行とコメントだけの行は直前の深さを引き継ぎます。
fn line_depths(source: &str) -> Vec<i64> {
    let mut depths = Vec::new();
    let mut stack: Vec<usize> = vec![0];
    let mut current = 0i64;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            depths.push(current);
            continue;
        }
        let width = indent_width(line);
        let top = stack.last().copied().unwrap_or(0);
        if width > top {
            stack.push(width);
        } else {
            while stack.len() > 1 && stack.last().copied().unwrap_or(0) > width {
                stack.pop();
            }
        }
        current = (stack.len() - 1) as i64;
        depths.push(current);
    }
    depths
}

/// 行頭の空白の表示幅。タブは8桁の境界に揃える
fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / 8 + 1) * 8,
            _ => break,
        }
    }
    width
}
