//! 文字列分解マッチング
//!
//! `a + x @ _ + b` 形式のパターンを、固定グループとワイルドカードの
//! 交互列としてマッチします。各グループは貪欲に消費し、グループの
//! 位置が曖昧な場合は常に最左の候補を採用します。

use regex::Regex;

use crate::ast::{ClassKind, Pattern, RepCount, Span};
use crate::error::{KataResult, MatchError, SyntaxError};
use crate::runtime::{Bindings, Env, Value};

/// パターン用にアンカー済みの正規表現ペア
#[derive(Debug, Clone)]
pub struct KataRegex {
    full: Regex,
    prefix: Regex,
}

impl KataRegex {
    pub fn new(pattern: &str, span: Span) -> Result<Self, SyntaxError> {
        let invalid = |e: regex::Error| SyntaxError::InvalidRegex {
            message: e.to_string(),
            span,
        };
        let full = Regex::new(&format!(r"\A(?:{})\z", pattern)).map_err(invalid)?;
        let prefix = Regex::new(&format!(r"\A(?:{})", pattern)).map_err(invalid)?;
        Ok(Self { full, prefix })
    }

    /// 文字列全体がパターンに一致するか
    pub fn is_full_match(&self, s: &str) -> bool {
        self.full.is_match(s)
    }

    /// 先頭からの一致長（貪欲）
    pub fn prefix_len(&self, s: &str) -> Option<usize> {
        self.prefix.find(s).map(|m| m.end())
    }
}

/// 文字クラスの文字列文脈での正規表現
pub fn class_regex(kind: ClassKind) -> &'static str {
    match kind {
        ClassKind::Bool => r"(?i:true|false)",
        ClassKind::Int => r"[+-]?[0-9]+",
        // float() は小数点のない数字列も受け付ける
        ClassKind::Float => r"[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?",
        ClassKind::Alnum => r"[\p{L}\p{N}]+",
        ClassKind::Alpha => r"\p{L}+",
        ClassKind::Ascii => r"[\x00-\x7F]+",
        ClassKind::Decimal => r"[0-9]+",
        ClassKind::Digit => r"\p{Nd}+",
        ClassKind::Identifier => r"[\p{L}_][\p{L}\p{N}_]*",
        ClassKind::Lower => r"\p{Ll}+",
        ClassKind::Numeric => r"\p{N}+",
        ClassKind::Printable => r"[^\p{C}]+",
        ClassKind::Space => r"\s+",
        ClassKind::Title => r"\p{Lu}\p{Ll}*(?:\s+\p{Lu}\p{Ll}*)*",
        ClassKind::Upper => r"\p{Lu}+",
    }
}

/// 固定グループを構成するコンパイル済み要素
#[derive(Debug, Clone)]
enum StrElem {
    /// リテラル文字列との前方一致
    Lit(String),
    /// 正規表現の前方一致（貪欲）
    Regex(KataRegex),
    /// 一致した部分文字列を名前に束縛
    Bind { name: String, inner: Box<StrElem> },
    /// 左から順に試す選択肢
    Alts(Vec<StrElem>),
    /// 同一要素の連続した繰り返し
    Rep { value: Box<StrElem>, count: RepCount },
}

/// コンパイル済みの文字列分解マッチャー
#[derive(Debug, Clone)]
pub struct StringMatcher {
    groups: Vec<Vec<StrElem>>,
    fixed_start: bool,
    targets: Vec<Option<String>>,
}

impl StringMatcher {
    pub fn compile(
        groups: &[Vec<Pattern>],
        fixed_start: bool,
        targets: &[Option<String>],
        span: Span,
    ) -> Result<Self, SyntaxError> {
        let groups = groups
            .iter()
            .map(|group| group.iter().map(|p| compile_elem(p, span)).collect())
            .collect::<Result<Vec<Vec<_>>, _>>()?;
        Ok(Self {
            groups,
            fixed_start,
            targets: targets.to_vec(),
        })
    }

    /// 対象文字列とのマッチを試みる
    ///
    /// 各グループを左から順に配置していきます。グループの直前の
    /// ワイルドカードは、そのグループを見つけるまでに読み飛ばした
    /// 区間を束縛します。
    pub fn matches(&self, s: &str, env: &Env, bindings: &mut Bindings) -> KataResult<bool> {
        let mut pos = 0usize;
        let count = self.groups.len();

        for (i, group) in self.groups.iter().enumerate() {
            let last = i + 1 == count;
            let name = self.targets.get(i).and_then(|n| n.as_deref());

            if group.is_empty() {
                // 末尾のワイルドカード。残りをすべて束縛する
                if let Some(name) = name {
                    bindings.insert(name.to_string(), Value::Str(s[pos..].to_string()));
                }
                pos = s.len();
                continue;
            }

            if self.fixed_start && i == 0 {
                let Some(end) = match_group(group, s, 0, env, bindings)? else {
                    return Ok(false);
                };
                if last && end != s.len() {
                    return Ok(false);
                }
                pos = end;
                continue;
            }

            // グループの最左の出現位置を探す
            let Some((found, end)) = find_group(group, s, pos, last, env, bindings)? else {
                return Ok(false);
            };
            if let Some(name) = name {
                bindings.insert(name.to_string(), Value::Str(s[pos..found].to_string()));
            }
            pos = end;
        }

        Ok(true)
    }
}

fn compile_elem(pattern: &Pattern, span: Span) -> Result<StrElem, SyntaxError> {
    match pattern {
        Pattern::Constant { value } => match value {
            crate::ast::Literal::Str(s) => Ok(StrElem::Lit(s.clone())),
            _ => Err(invalid_elem(span)),
        },
        Pattern::RegularExpression { pattern } => {
            Ok(StrElem::Regex(KataRegex::new(pattern, span)?))
        }
        Pattern::RegularExprType { kind } => {
            Ok(StrElem::Regex(KataRegex::new(class_regex(*kind), span)?))
        }
        Pattern::Binding { target, value } => Ok(StrElem::Bind {
            name: target.clone(),
            inner: Box::new(compile_elem(value, span)?),
        }),
        Pattern::Alternatives { elts } => {
            let elts = elts
                .iter()
                .map(|p| compile_elem(p, span))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(StrElem::Alts(elts))
        }
        Pattern::Repetition { value, count } => Ok(StrElem::Rep {
            value: Box::new(compile_elem(value, span)?),
            count: count.clone(),
        }),
        _ => Err(invalid_elem(span)),
    }
}

fn invalid_elem(span: Span) -> SyntaxError {
    SyntaxError::InvalidSyntax {
        message: "文字列シーケンス内の不正な要素".to_string(),
        span,
    }
}

/// グループ全体を `start` から消費し、終了位置を返す
fn match_group(
    group: &[StrElem],
    s: &str,
    start: usize,
    env: &Env,
    bindings: &mut Bindings,
) -> KataResult<Option<usize>> {
    let mut pos = start;
    for elem in group {
        match match_elem(elem, s, pos, env, bindings)? {
            Some(end) => pos = end,
            None => return Ok(None),
        }
    }
    Ok(Some(pos))
}

/// グループの最左の出現を `from` 以降の文字境界から探す
///
/// `anchored_end` の場合、グループは文字列の終端まで一致する必要が
/// あります（パターンがワイルドカードで終わらない場合の末尾グループ）。
fn find_group(
    group: &[StrElem],
    s: &str,
    from: usize,
    anchored_end: bool,
    env: &Env,
    bindings: &mut Bindings,
) -> KataResult<Option<(usize, usize)>> {
    for start in char_positions(s, from) {
        if let Some(end) = match_group(group, s, start, env, bindings)? {
            if anchored_end && end != s.len() {
                continue;
            }
            return Ok(Some((start, end)));
        }
    }
    Ok(None)
}

/// `from` 以降の文字境界オフセット（終端を含む）
fn char_positions(s: &str, from: usize) -> impl Iterator<Item = usize> + '_ {
    s[from..]
        .char_indices()
        .map(move |(i, _)| from + i)
        .chain(std::iter::once(s.len()))
}

fn match_elem(
    elem: &StrElem,
    s: &str,
    start: usize,
    env: &Env,
    bindings: &mut Bindings,
) -> KataResult<Option<usize>> {
    match elem {
        StrElem::Lit(lit) => {
            if s[start..].starts_with(lit.as_str()) {
                Ok(Some(start + lit.len()))
            } else {
                Ok(None)
            }
        }
        StrElem::Regex(re) => Ok(re.prefix_len(&s[start..]).map(|len| start + len)),
        StrElem::Bind { name, inner } => {
            match match_elem(inner, s, start, env, bindings)? {
                Some(end) => {
                    bindings.insert(name.clone(), Value::Str(s[start..end].to_string()));
                    Ok(Some(end))
                }
                None => Ok(None),
            }
        }
        StrElem::Alts(elts) => {
            for alt in elts {
                if let Some(end) = match_elem(alt, s, start, env, bindings)? {
                    return Ok(Some(end));
                }
            }
            Ok(None)
        }
        StrElem::Rep { value, count } => {
            for n in resolve_counts(count, env)? {
                let mut pos = start;
                let mut ok = true;
                for _ in 0..n {
                    match match_elem(value, s, pos, env, bindings)? {
                        Some(end) => pos = end,
                        None => {
                            ok = false;
                            break;
                        }
                    }
                }
                if ok {
                    return Ok(Some(pos));
                }
            }
            Ok(None)
        }
    }
}

/// 繰り返し回数を実行時に解決
pub fn resolve_counts(count: &RepCount, env: &Env) -> Result<Vec<usize>, MatchError> {
    match count {
        RepCount::Fixed(n) => Ok(vec![*n]),
        RepCount::Choice(counts) => Ok(counts.clone()),
        RepCount::Name(name) => match env.get_var(name) {
            Some(Value::Int(i)) if *i >= 0 => Ok(vec![*i as usize]),
            Some(_) => Err(MatchError::InvalidCount { name: name.clone() }),
            None => Err(MatchError::UnknownName { name: name.clone() }),
        },
    }
}
