//! パターンの解析
//!
//! 汎用の式ツリーをパターンIRに書き換えます。それぞれの規則は
//! ボトムアップに適用される局所的な書き換えで、サポート外の構文は
//! すべて `SyntaxError` になります。

use crate::ast::{
    BinOp, ClassKind, DeconName, Expr, ExprKind, Literal, MapKey, Pattern, RepCount, Span, UnaryOp,
};
use crate::error::SyntaxError;

use super::ParseResult;

/// 式ツリーをパターンIRへ変換
///
/// 変換後、パターン全体で束縛名が重複していないことを検証します。
pub fn parse_pattern(expr: &Expr) -> ParseResult<Pattern> {
    let pattern = parse(expr)?;
    let mut seen: Vec<&str> = Vec::new();
    check_bindings(&pattern, &mut seen, expr.span)?;
    Ok(pattern)
}

fn record<'a>(seen: &mut Vec<&'a str>, name: &'a str, span: Span) -> ParseResult<()> {
    if seen.contains(&name) {
        return Err(SyntaxError::DuplicateBinding {
            name: name.to_string(),
            span,
        });
    }
    seen.push(name);
    Ok(())
}

fn check_bindings<'a>(
    pattern: &'a Pattern,
    seen: &mut Vec<&'a str>,
    span: Span,
) -> ParseResult<()> {
    match pattern {
        Pattern::Binding { target, value } => {
            record(seen, target, span)?;
            check_bindings(value, seen, span)?;
        }
        Pattern::Deconstructor { args, .. } => {
            for arg in args {
                check_bindings(arg, seen, span)?;
            }
        }
        Pattern::AttributeDeconstructor { args, .. } => {
            for (_, arg) in args {
                check_bindings(arg, seen, span)?;
            }
        }
        Pattern::Sequence {
            left,
            right,
            gaps,
            gap_names,
            ..
        } => {
            for pat in left.iter().chain(right).chain(gaps.iter().flatten()) {
                check_bindings(pat, seen, span)?;
            }
            for name in gap_names.iter().flatten() {
                record(seen, name, span)?;
            }
        }
        Pattern::Repetition { value, .. } => check_bindings(value, seen, span)?,
        Pattern::StringDeconstructor {
            groups, targets, ..
        } => {
            for pat in groups.iter().flatten() {
                check_bindings(pat, seen, span)?;
            }
            for name in targets.iter().flatten() {
                record(seen, name, span)?;
            }
        }
        Pattern::Mapping { entries } => {
            for (_, pat) in entries {
                check_bindings(pat, seen, span)?;
            }
        }
        // 選択肢の中に束縛は存在しない
        Pattern::Alternatives { .. }
        | Pattern::Wildcard { .. }
        | Pattern::Constant { .. }
        | Pattern::RegularExpression { .. }
        | Pattern::RegularExprType { .. } => {}
    }
    Ok(())
}

fn parse(expr: &Expr) -> ParseResult<Pattern> {
    match &expr.kind {
        ExprKind::Name(name) => Ok(name_pattern(name, false)),
        ExprKind::Int(i) => Ok(constant(Literal::Int(*i))),
        ExprKind::Float(x) => Ok(constant(Literal::Float(*x))),
        ExprKind::Str(s) => Ok(constant(Literal::Str(s.clone()))),
        ExprKind::Bool(b) => Ok(constant(Literal::Bool(*b))),
        ExprKind::NoneLit => Ok(constant(Literal::None)),
        ExprKind::Ellipsis => Ok(Pattern::Wildcard { is_seq: true }),

        ExprKind::Starred(inner) => match &inner.kind {
            ExprKind::Name(name) => Ok(name_pattern(name, true)),
            _ => Err(SyntaxError::InvalidSyntax {
                message: "'*' は名前にのみ適用できます".to_string(),
                span: expr.span,
            }),
        },

        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match &operand.kind {
            ExprKind::Int(i) => Ok(constant(Literal::Int(-i))),
            ExprKind::Float(x) => Ok(constant(Literal::Float(-x))),
            _ => Err(unsupported("単項 '-'", expr.span)),
        },

        ExprKind::Binary { op, left, right } => match op {
            BinOp::Add => {
                let mut elts = Vec::new();
                flatten(expr, BinOp::Add, &mut elts);
                handle_str_seq(&elts, expr.span)
            }
            BinOp::BitOr => {
                let mut elts = Vec::new();
                flatten(expr, BinOp::BitOr, &mut elts);
                handle_or(elts, expr.span)
            }
            BinOp::BitXor | BinOp::Pow => {
                let value = Box::new(parse(left)?);
                let count = handle_rep_count(right)?;
                Ok(Pattern::Repetition { value, count })
            }
            BinOp::MatMult => {
                // `a @ b` の b が素の名前なら `a @ b()` と解釈する
                let value = match &right.kind {
                    ExprKind::Name(name) => Pattern::Deconstructor {
                        name: DeconName::Ident(name.clone()),
                        args: Vec::new(),
                    },
                    _ => parse(right)?,
                };
                make_binding(left, value)
            }
            BinOp::Sub => Err(unsupported("演算子 '-'", expr.span)),
        },

        ExprKind::Call {
            func,
            args,
            keywords,
        } => handle_call(func, args, keywords, expr.span),

        ExprKind::Attribute { .. } => {
            let name = expr
                .dotted_name()
                .ok_or_else(|| unsupported("属性参照", expr.span))?;
            Ok(Pattern::Deconstructor {
                name: DeconName::Ident(name),
                args: Vec::new(),
            })
        }

        ExprKind::Tuple(elts) | ExprKind::List(elts) => handle_seq(elts, expr.span),
        ExprKind::Set(elts) => handle_set(elts, expr.span),
        ExprKind::Dict { keys, values } => handle_dict(keys, values, expr.span),

        ExprKind::Unary { .. } => Err(unsupported("単項演算子", expr.span)),
        ExprKind::Compare { .. } => Err(unsupported("比較式", expr.span)),
        ExprKind::BoolOp { .. } => Err(unsupported("ブール式", expr.span)),
    }
}

fn constant(value: Literal) -> Pattern {
    Pattern::Constant { value }
}

fn unsupported(construct: &str, span: Span) -> SyntaxError {
    SyntaxError::Unsupported {
        construct: construct.to_string(),
        span,
    }
}

/// 素の名前：`_` はワイルドカード、それ以外は束縛
fn name_pattern(name: &str, is_seq: bool) -> Pattern {
    let wildcard = Pattern::Wildcard { is_seq };
    if name == "_" {
        wildcard
    } else {
        Pattern::Binding {
            target: name.to_string(),
            value: Box::new(wildcard),
        }
    }
}

/// 同じ二項演算子の連鎖をリストに平坦化
fn flatten<'a>(expr: &'a Expr, op: BinOp, out: &mut Vec<&'a Expr>) {
    if let ExprKind::Binary {
        op: found,
        left,
        right,
    } = &expr.kind
    {
        if *found == op {
            flatten(left, op, out);
            flatten(right, op, out);
            return;
        }
    }
    out.push(expr);
}

/// 束縛パターンを構築する
fn make_binding(target: &Expr, value: Pattern) -> ParseResult<Pattern> {
    match &target.kind {
        ExprKind::Name(name) if name == "_" => Ok(value),
        ExprKind::Name(name) => {
            if matches!(value, Pattern::Binding { .. }) {
                return Err(SyntaxError::InvalidSyntax {
                    message: "値を複数の名前に束縛することはできません".to_string(),
                    span: target.span,
                });
            }
            Ok(Pattern::Binding {
                target: name.clone(),
                value: Box::new(value),
            })
        }
        _ => Err(SyntaxError::InvalidSyntax {
            message: "束縛の対象は有効な名前である必要があります".to_string(),
            span: target.span,
        }),
    }
}

/// 範囲の端点：整数または長さ1の文字列
enum RangeBound {
    Int(i64),
    Char(char),
}

fn range_bound(expr: &Expr) -> Option<RangeBound> {
    match &expr.kind {
        ExprKind::Int(i) => Some(RangeBound::Int(*i)),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match &operand.kind {
            ExprKind::Int(i) => Some(RangeBound::Int(-i)),
            _ => None,
        },
        ExprKind::Str(s) => {
            let mut chars = s.chars();
            let c = chars.next()?;
            if chars.next().is_none() {
                Some(RangeBound::Char(c))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// `start | ... | end` をリテラルの列挙に展開
fn expand_range(start: &Expr, end: &Expr, span: Span) -> ParseResult<Vec<Literal>> {
    let (a, b) = match (range_bound(start), range_bound(end)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(SyntaxError::InvalidRange {
                message: "'...' は int または長さ1の str にのみ適用できます".to_string(),
                span,
            })
        }
    };

    match (a, b) {
        (RangeBound::Int(a), RangeBound::Int(b)) => {
            if a > b {
                return Err(SyntaxError::InvalidRange {
                    message: "降順の範囲は指定できません".to_string(),
                    span,
                });
            }
            Ok((a..=b).map(Literal::Int).collect())
        }
        (RangeBound::Char(a), RangeBound::Char(b)) => {
            if a > b {
                return Err(SyntaxError::InvalidRange {
                    message: "降順の範囲は指定できません".to_string(),
                    span,
                });
            }
            Ok((a as u32..=b as u32)
                .filter_map(char::from_u32)
                .map(|c| Literal::Str(c.to_string()))
                .collect())
        }
        _ => Err(SyntaxError::InvalidRange {
            message: "範囲の両端は同じ型である必要があります".to_string(),
            span,
        }),
    }
}

/// 選択肢 `a | b | c` の処理
fn handle_or(elts: Vec<&Expr>, span: Span) -> ParseResult<Pattern> {
    // `x @ 2 | 3` は `x @ (2 | 3)` と解釈する
    if let ExprKind::Binary {
        op: BinOp::MatMult,
        left,
        right,
    } = &elts[0].kind
    {
        let mut rest: Vec<&Expr> = Vec::with_capacity(elts.len());
        rest.push(right);
        rest.extend_from_slice(&elts[1..]);
        let inner = handle_or(rest, span)?;
        return make_binding(left, inner);
    }

    enum Elt<'a> {
        Expr(&'a Expr),
        Lit(Literal),
    }

    // `int | ... | int` と `char | ... | char` の範囲展開
    let mut out: Vec<Elt> = Vec::new();
    let mut skip_next = false;
    for (i, elt) in elts.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if matches!(elt.kind, ExprKind::Ellipsis) {
            if i == 0 || i + 1 == elts.len() {
                return Err(SyntaxError::InvalidRange {
                    message: "'...' は選択肢の先頭・末尾には置けません".to_string(),
                    span: elt.span,
                });
            }
            // 直前に積んだ端点を範囲全体で置き換える
            out.pop();
            let items = expand_range(elts[i - 1], elts[i + 1], elt.span)?;
            out.extend(items.into_iter().map(Elt::Lit));
            skip_next = true;
        } else {
            out.push(Elt::Expr(elt));
        }
    }

    // `A | B | C` は `A() | B() | C()` と解釈する
    let all_names = out.iter().all(|e| match e {
        Elt::Expr(e) => matches!(&e.kind, ExprKind::Name(n) if n != "_"),
        Elt::Lit(_) => false,
    });

    let mut patterns = Vec::with_capacity(out.len());
    for elt in &out {
        let pat = match elt {
            Elt::Expr(e) if all_names => match &e.kind {
                ExprKind::Name(name) => Pattern::Deconstructor {
                    name: DeconName::Ident(name.clone()),
                    args: Vec::new(),
                },
                _ => unreachable!(),
            },
            Elt::Expr(e) => parse(e)?,
            Elt::Lit(lit) => constant(lit.clone()),
        };
        patterns.push(pat);
    }

    // 選択肢の中ではワイルドカードも束縛も許されない
    for pat in &patterns {
        if binds_names(pat) {
            return Err(SyntaxError::BindingInAlternatives { span });
        }
        if pat.is_wildcard() {
            return Err(SyntaxError::WildcardInAlternatives { span });
        }
    }

    if patterns.len() == 1 {
        return Ok(patterns.into_iter().next().unwrap_or(Pattern::Wildcard {
            is_seq: false,
        }));
    }
    Ok(Pattern::Alternatives { elts: patterns })
}

/// パターンのどこかで名前を束縛するかどうか
fn binds_names(pattern: &Pattern) -> bool {
    match pattern {
        Pattern::Binding { .. } => true,
        Pattern::Deconstructor { args, .. } => args.iter().any(binds_names),
        Pattern::AttributeDeconstructor { args, .. } => {
            args.iter().any(|(_, p)| binds_names(p))
        }
        Pattern::Alternatives { elts } => elts.iter().any(binds_names),
        Pattern::Sequence {
            left,
            right,
            gaps,
            gap_names,
            ..
        } => {
            gap_names.iter().any(Option::is_some)
                || left
                    .iter()
                    .chain(right)
                    .chain(gaps.iter().flatten())
                    .any(binds_names)
        }
        Pattern::Repetition { value, .. } => binds_names(value),
        Pattern::StringDeconstructor {
            groups, targets, ..
        } => {
            targets.iter().any(Option::is_some) || groups.iter().flatten().any(binds_names)
        }
        Pattern::Mapping { entries } => entries.iter().any(|(_, p)| binds_names(p)),
        Pattern::Wildcard { .. }
        | Pattern::Constant { .. }
        | Pattern::RegularExpression { .. }
        | Pattern::RegularExprType { .. } => false,
    }
}

/// 繰り返し回数の処理
fn handle_rep_count(expr: &Expr) -> ParseResult<RepCount> {
    match &expr.kind {
        ExprKind::Name(name) => Ok(RepCount::Name(name.clone())),
        ExprKind::Int(i) if *i >= 0 => Ok(RepCount::Fixed(*i as usize)),
        ExprKind::Binary {
            op: BinOp::BitOr, ..
        } => {
            let mut elts = Vec::new();
            flatten(expr, BinOp::BitOr, &mut elts);
            let mut counts = Vec::with_capacity(elts.len());
            for elt in elts {
                match &elt.kind {
                    ExprKind::Int(i) if *i >= 0 => counts.push(*i as usize),
                    _ => return Err(SyntaxError::InvalidRepetition { span: expr.span }),
                }
            }
            Ok(RepCount::Choice(counts))
        }
        _ => Err(SyntaxError::InvalidRepetition { span: expr.span }),
    }
}

/// デコンストラクタ呼び出しの処理
fn handle_call(
    func: &Expr,
    args: &[Expr],
    keywords: &[(String, Expr)],
    span: Span,
) -> ParseResult<Pattern> {
    let name = func.decon_name().ok_or_else(|| SyntaxError::InvalidSyntax {
        message: "デコンストラクタには有効な名前が必要です".to_string(),
        span: func.span,
    })?;

    if keywords.is_empty() {
        let args = args.iter().map(parse).collect::<ParseResult<Vec<_>>>()?;
        return Ok(Pattern::Deconstructor { name, args });
    }

    if !args.is_empty() {
        return Err(SyntaxError::MixedArguments { span });
    }

    let mut parsed: Vec<(String, Pattern)> = Vec::with_capacity(keywords.len());
    for (key, value) in keywords {
        if parsed.iter().any(|(k, _)| k == key) {
            return Err(SyntaxError::InvalidSyntax {
                message: format!("属性 '{}' が重複しています", key),
                span,
            });
        }
        parsed.push((key.clone(), parse(value)?));
    }
    Ok(Pattern::AttributeDeconstructor { name, args: parsed })
}

/// シーケンスリテラルの処理：シーケンスワイルドカードで分割する
fn handle_seq(elts: &[Expr], span: Span) -> ParseResult<Pattern> {
    let patterns = elts.iter().map(parse).collect::<ParseResult<Vec<_>>>()?;
    if patterns.is_empty() {
        return Ok(Pattern::Sequence {
            left: Vec::new(),
            right: Vec::new(),
            gaps: Vec::new(),
            gap_names: Vec::new(),
            min_length: 0,
            exact_length: Some(0),
        });
    }

    let total = patterns.len();
    let mut sub_seqs: Vec<Vec<Pattern>> = vec![Vec::new()];
    let mut names: Vec<Option<String>> = Vec::new();
    for pat in patterns {
        if pat.is_seq_wildcard() {
            names.push(pat.binding_target().map(str::to_string));
            sub_seqs.push(Vec::new());
        } else if let Some(last) = sub_seqs.last_mut() {
            last.push(pat);
        }
    }

    while names.last().map(Option::is_none).unwrap_or(false) {
        names.pop();
    }

    let left = sub_seqs.remove(0);
    if sub_seqs.is_empty() {
        // 分割なし：厳密な長さのマッチ
        let len = left.len();
        debug_assert_eq!(len, total);
        return Ok(Pattern::Sequence {
            left,
            right: Vec::new(),
            gaps: Vec::new(),
            gap_names: Vec::new(),
            min_length: len,
            exact_length: Some(len),
        });
    }

    let invalid = || SyntaxError::InvalidSyntax {
        message: "シーケンス内の不正なワイルドカード".to_string(),
        span,
    };

    if left.last().map(Pattern::is_plain_wildcard).unwrap_or(false) {
        return Err(invalid());
    }

    let right = sub_seqs.pop().unwrap_or_default();
    if right.first().map(Pattern::is_plain_wildcard).unwrap_or(false) {
        return Err(invalid());
    }

    // 隣接するワイルドカードや位置を特定できないギャップを拒否する
    for gap in &sub_seqs {
        if gap.is_empty() {
            return Err(invalid());
        }
        if gap.first().map(Pattern::is_plain_wildcard).unwrap_or(false)
            || gap.last().map(Pattern::is_plain_wildcard).unwrap_or(false)
        {
            return Err(invalid());
        }
        if gap.iter().all(Pattern::is_wildcard) {
            return Err(invalid());
        }
    }

    let min_length =
        left.len() + right.len() + sub_seqs.iter().map(Vec::len).sum::<usize>();
    Ok(Pattern::Sequence {
        left,
        right,
        gaps: sub_seqs,
        gap_names: names,
        min_length,
        exact_length: None,
    })
}

/// 文字列連結 `a + b + …` の処理：ワイルドカードでグループに分割する
fn handle_str_seq(elts: &[&Expr], span: Span) -> ParseResult<Pattern> {
    let mut patterns = Vec::with_capacity(elts.len());
    for elt in elts {
        let pat = parse(elt)?;
        if !pat.is_string_element() {
            return Err(SyntaxError::InvalidSyntax {
                message: "文字列シーケンス内の不正な要素".to_string(),
                span: elt.span,
            });
        }
        patterns.push(pat);
    }

    let mut groups: Vec<Vec<Pattern>> = vec![Vec::new()];
    let mut names: Vec<Option<String>> = vec![None];
    for pat in patterns {
        if pat.is_wildcard() {
            names.push(pat.binding_target().map(str::to_string));
            groups.push(Vec::new());
        } else if let Some(last) = groups.last_mut() {
            last.push(pat);
        }
    }

    while names.last().map(Option::is_none).unwrap_or(false) {
        names.pop();
    }

    // 内側の空グループは位置を特定できない
    let last = groups.len() - 1;
    for (i, group) in groups.iter().enumerate() {
        if group.is_empty() && 0 < i && i < last {
            return Err(SyntaxError::InvalidSyntax {
                message: "シーケンス内の不正なワイルドカード".to_string(),
                span,
            });
        }
    }

    let fixed_start = !groups[0].is_empty();
    if !fixed_start {
        groups.remove(0);
        if !names.is_empty() {
            names.remove(0);
        }
        if groups.is_empty() {
            return Err(SyntaxError::InvalidSyntax {
                message: "不正な文字列シーケンス".to_string(),
                span,
            });
        }
    }

    Ok(Pattern::StringDeconstructor {
        groups,
        fixed_start,
        targets: names,
    })
}

/// セットリテラルの処理：正規表現と文字クラス
fn handle_set(elts: &[Expr], span: Span) -> ParseResult<Pattern> {
    if elts.len() == 1 {
        match &elts[0].kind {
            ExprKind::Str(s) => {
                return Ok(Pattern::RegularExpression { pattern: s.clone() });
            }
            ExprKind::Name(name) => {
                if let Some(kind) = ClassKind::from_name(name) {
                    return Ok(Pattern::RegularExprType { kind });
                }
                // 定義済み正規表現への別名
                match name.as_str() {
                    "name" => {
                        return Ok(Pattern::RegularExpression {
                            pattern: r"[A-Za-z_]\w+".to_string(),
                        })
                    }
                    "whitespace" => {
                        return Ok(Pattern::RegularExpression {
                            pattern: r"\s+".to_string(),
                        })
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
    Err(unsupported("セットリテラル", span))
}

/// 辞書リテラルの処理
fn handle_dict(keys: &[Expr], values: &[Expr], span: Span) -> ParseResult<Pattern> {
    if keys.is_empty() {
        return Err(SyntaxError::InvalidSyntax {
            message: "空の辞書はここでは意味を持ちません".to_string(),
            span,
        });
    }

    let mut entries = Vec::with_capacity(keys.len());
    for (key, value) in keys.iter().zip(values) {
        let map_key = dict_key(key)?;
        entries.push((map_key, parse(value)?));
    }
    Ok(Pattern::Mapping { entries })
}

fn dict_key(expr: &Expr) -> ParseResult<MapKey> {
    let err = || SyntaxError::InvalidSyntax {
        message: "辞書のキーは 'str' か 'int' のみサポートされます".to_string(),
        span: expr.span,
    };
    match &expr.kind {
        ExprKind::Str(s) => Ok(MapKey::Str(s.clone())),
        ExprKind::Int(i) => Ok(MapKey::Int(*i)),
        ExprKind::Bool(b) => Ok(MapKey::Bool(*b)),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match &operand.kind {
            ExprKind::Int(i) => Ok(MapKey::Int(-i)),
            _ => Err(err()),
        },
        ExprKind::Tuple(elts) => {
            let mut items = Vec::with_capacity(elts.len());
            for elt in elts {
                match dict_key(elt)? {
                    MapKey::Int(i) => items.push(i),
                    _ => return Err(err()),
                }
            }
            Ok(MapKey::Tuple(items))
        }
        _ => Err(err()),
    }
}
