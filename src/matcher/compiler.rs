//! パターンIRから判定手続きへのコンパイル
//!
//! パターンIRをコンパイル済みノードの木に変換します。正規表現の
//! コンパイルを含め、検出できるエラーはすべてこの段階で報告され、
//! 初回マッチまで遅延されることはありません。
//!
//! 選択肢には2段階の最適化があります。全分岐が定数なら集合への
//! 所属テストひとつに潰し、全分岐がデコンストラクタなら各分岐を
//! 試す前に「いずれかの型のインスタンスか」を先に確認します。
//! さらに全分岐が引数なしの単純デコンストラクタなら、その事前
//! 確認がテストのすべてです。

use crate::ast::{ClassKind, Literal, MapKey, Pattern, RepCount, Span};
use crate::error::{KataResult, MatchError, SyntaxError};
use crate::runtime::{Bindings, Env, Value};

use super::string::{class_regex, resolve_counts, KataRegex, StringMatcher};

/// コンパイル済みの判定ノード
#[derive(Debug, Clone)]
pub(super) enum Node {
    /// 常に成功
    Any,
    /// 内側が成功したら値全体を名前に束縛
    Bind { name: String, inner: Box<Node> },
    /// 定数との等値比較
    Const(Literal),
    /// 定数集合への所属（定数のみの選択肢）
    InSet(Vec<Literal>),
    /// 型メンバーシップと位置ごとの抽出フィールドマッチ
    Decon { names: Vec<String>, args: Vec<Node> },
    /// 型メンバーシップと属性ごとのマッチ
    AttrDecon {
        names: Vec<String>,
        args: Vec<(String, Node)>,
    },
    /// 選択肢。`pre_check` は型の事前確認、`check_only` なら
    /// 事前確認がテストのすべて
    Alts {
        pre_check: Option<Vec<String>>,
        check_only: bool,
        branches: Vec<Node>,
    },
    /// シーケンスマッチ（ギャップ探索を含む）
    Seq {
        left: Vec<Node>,
        right: Vec<Node>,
        gaps: Vec<Vec<Node>>,
        gap_names: Vec<Option<String>>,
        min_length: usize,
        exact_length: Option<usize>,
    },
    /// シーケンス全体の繰り返しマッチ
    Rep { value: Box<Node>, count: RepCount },
    /// 文字列分解マッチ
    Str(StringMatcher),
    /// 正規表現の全体一致
    Regex(KataRegex),
    /// 文字クラス・プリミティブ型の判定
    Class { kind: ClassKind, re: KataRegex },
    /// キーごとのマッピングマッチ
    Map(Vec<(MapKey, Node)>),
}

/// パターンIRをコンパイル
///
/// パターンIRはソース位置を持たないため、パターン全体のスパンを
/// エラー報告用に受け取ります。
pub(super) fn compile(pattern: &Pattern, span: Span) -> Result<Node, SyntaxError> {
    match pattern {
        Pattern::Wildcard { .. } => Ok(Node::Any),
        Pattern::Binding { target, value } => Ok(Node::Bind {
            name: target.clone(),
            inner: Box::new(compile(value, span)?),
        }),
        Pattern::Constant { value } => Ok(Node::Const(value.clone())),
        Pattern::Deconstructor { name, args } => Ok(Node::Decon {
            names: name.names().iter().map(|s| s.to_string()).collect(),
            args: args
                .iter()
                .map(|p| compile(p, span))
                .collect::<Result<_, _>>()?,
        }),
        Pattern::AttributeDeconstructor { name, args } => Ok(Node::AttrDecon {
            names: name.names().iter().map(|s| s.to_string()).collect(),
            args: args
                .iter()
                .map(|(k, p)| Ok((k.clone(), compile(p, span)?)))
                .collect::<Result<_, SyntaxError>>()?,
        }),
        Pattern::Alternatives { elts } => compile_alternatives(elts, span),
        Pattern::Sequence {
            left,
            right,
            gaps,
            gap_names,
            min_length,
            exact_length,
        } => {
            let compile_all = |pats: &[Pattern]| -> Result<Vec<Node>, SyntaxError> {
                pats.iter().map(|p| compile(p, span)).collect()
            };
            Ok(Node::Seq {
                left: compile_all(left)?,
                right: compile_all(right)?,
                gaps: gaps
                    .iter()
                    .map(|g| compile_all(g))
                    .collect::<Result<_, _>>()?,
                gap_names: gap_names.clone(),
                min_length: *min_length,
                exact_length: *exact_length,
            })
        }
        Pattern::Repetition { value, count } => Ok(Node::Rep {
            value: Box::new(compile(value, span)?),
            count: count.clone(),
        }),
        Pattern::StringDeconstructor {
            groups,
            fixed_start,
            targets,
        } => Ok(Node::Str(StringMatcher::compile(
            groups,
            *fixed_start,
            targets,
            span,
        )?)),
        Pattern::RegularExpression { pattern } => Ok(Node::Regex(KataRegex::new(pattern, span)?)),
        Pattern::RegularExprType { kind } => Ok(Node::Class {
            kind: *kind,
            re: KataRegex::new(class_regex(*kind), span)?,
        }),
        Pattern::Mapping { entries } => Ok(Node::Map(
            entries
                .iter()
                .map(|(k, p)| Ok((k.clone(), compile(p, span)?)))
                .collect::<Result<_, SyntaxError>>()?,
        )),
    }
}

fn compile_alternatives(elts: &[Pattern], span: Span) -> Result<Node, SyntaxError> {
    // 定数のみなら集合への所属テスト
    let constants: Vec<_> = elts
        .iter()
        .filter_map(|p| match p {
            Pattern::Constant { value } => Some(value.clone()),
            _ => None,
        })
        .collect();
    if constants.len() == elts.len() {
        return Ok(Node::InSet(constants));
    }

    // 全分岐がデコンストラクタなら型の事前確認を置く
    let mut names: Vec<String> = Vec::new();
    let mut all_decon = true;
    let mut all_simple = true;
    for elt in elts {
        match elt {
            Pattern::Deconstructor { name, args } => {
                names.extend(name.names().iter().map(|s| s.to_string()));
                if !args.is_empty() {
                    all_simple = false;
                }
            }
            Pattern::AttributeDeconstructor { name, .. } => {
                names.extend(name.names().iter().map(|s| s.to_string()));
                all_simple = false;
            }
            _ => {
                all_decon = false;
                break;
            }
        }
    }
    let usable = all_decon && !names.iter().any(|n| n == "_");

    let branches = elts
        .iter()
        .map(|p| compile(p, span))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Node::Alts {
        pre_check: if usable { Some(names) } else { None },
        check_only: usable && all_simple,
        branches,
    })
}

/// シーケンスマッチの対象ビュー
///
/// シーケンスパターンは list と str の両方に適用できます。str の
/// 要素は1文字の str で、部分列の束縛も str として行われます。
enum SeqSubject {
    Vals(Vec<Value>),
    Chars(Vec<Value>),
}

impl SeqSubject {
    fn of(value: &Value) -> Option<SeqSubject> {
        match value {
            Value::Seq(items) => Some(SeqSubject::Vals(items.clone())),
            Value::Str(s) => Some(SeqSubject::Chars(Value::str_elements(s))),
            _ => None,
        }
    }

    fn elems(&self) -> &[Value] {
        match self {
            SeqSubject::Vals(items) | SeqSubject::Chars(items) => items,
        }
    }

    fn len(&self) -> usize {
        self.elems().len()
    }

    /// 部分列を対象の種別に応じた値として切り出す
    fn slice(&self, start: usize, end: usize) -> Value {
        match self {
            SeqSubject::Vals(items) => Value::Seq(items[start..end].to_vec()),
            SeqSubject::Chars(items) => Value::Str(
                items[start..end]
                    .iter()
                    .filter_map(|v| match v {
                        Value::Str(s) => Some(s.as_str()),
                        _ => None,
                    })
                    .collect(),
            ),
        }
    }
}

impl Node {
    /// 値に対する判定を実行
    pub(super) fn test(
        &self,
        value: &Value,
        env: &Env,
        bindings: &mut Bindings,
    ) -> KataResult<bool> {
        match self {
            Node::Any => Ok(true),

            Node::Bind { name, inner } => {
                if inner.test(value, env, bindings)? {
                    bindings.insert(name.clone(), value.clone());
                    Ok(true)
                } else {
                    Ok(false)
                }
            }

            Node::Const(lit) => Ok(value == &literal_value(lit)),

            Node::InSet(lits) => Ok(lits.iter().any(|lit| value == &literal_value(lit))),

            Node::Decon { names, args } => self.test_decon(names, args, value, env, bindings),

            Node::AttrDecon { names, args } => {
                if !names.iter().any(|n| env.is_instance(value, n)) {
                    return Ok(false);
                }
                for (attr, node) in args {
                    let Some(field) = value.get_field(attr) else {
                        return Ok(false);
                    };
                    let field = field.clone();
                    if !node.test(&field, env, bindings)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }

            Node::Alts {
                pre_check,
                check_only,
                branches,
            } => {
                if let Some(names) = pre_check {
                    if !names.iter().any(|n| env.is_instance(value, n)) {
                        return Ok(false);
                    }
                    if *check_only {
                        return Ok(true);
                    }
                }
                for branch in branches {
                    if branch.test(value, env, bindings)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }

            Node::Seq {
                left,
                right,
                gaps,
                gap_names,
                min_length,
                exact_length,
            } => {
                let Some(subject) = SeqSubject::of(value) else {
                    return Ok(false);
                };
                test_sequence(
                    &subject,
                    left,
                    right,
                    gaps,
                    gap_names,
                    *min_length,
                    *exact_length,
                    env,
                    bindings,
                )
            }

            Node::Rep { value: elem, count } => {
                let Some(subject) = SeqSubject::of(value) else {
                    return Ok(false);
                };
                for n in resolve_counts(count, env)? {
                    if subject.len() != n {
                        continue;
                    }
                    let mut ok = true;
                    for item in subject.elems() {
                        if !elem.test(item, env, bindings)? {
                            ok = false;
                            break;
                        }
                    }
                    if ok {
                        return Ok(true);
                    }
                }
                Ok(false)
            }

            Node::Str(matcher) => match value {
                Value::Str(s) => matcher.matches(s, env, bindings),
                _ => Ok(false),
            },

            Node::Regex(re) => match value {
                Value::Str(s) => Ok(re.is_full_match(s)),
                _ => Ok(false),
            },

            Node::Class { kind, re } => Ok(test_class(*kind, re, value)),

            Node::Map(entries) => {
                for (key, node) in entries {
                    let Some(item) = value.get_key(key) else {
                        return Ok(false);
                    };
                    let item = item.clone();
                    if !node.test(&item, env, bindings)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    fn test_decon(
        &self,
        names: &[String],
        args: &[Node],
        value: &Value,
        env: &Env,
        bindings: &mut Bindings,
    ) -> KataResult<bool> {
        // 最初に分解に成功した型を採用する
        let mut extracted = None;
        for name in names {
            if let Some(fields) = env.extract(value, name) {
                extracted = Some((name, fields));
                break;
            }
        }
        let Some((name, fields)) = extracted else {
            return Ok(false);
        };

        if fields.len() < args.len() {
            return Err(MatchError::UnpackArity {
                name: name.clone(),
                expected: args.len(),
                found: fields.len(),
            }
            .into());
        }
        for (node, field) in args.iter().zip(&fields) {
            if !node.test(field, env, bindings)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[allow(clippy::too_many_arguments)]
fn test_sequence(
    subject: &SeqSubject,
    left: &[Node],
    right: &[Node],
    gaps: &[Vec<Node>],
    gap_names: &[Option<String>],
    min_length: usize,
    exact_length: Option<usize>,
    env: &Env,
    bindings: &mut Bindings,
) -> KataResult<bool> {
    let len = subject.len();
    let elems = subject.elems();

    if let Some(exact) = exact_length {
        if len != exact {
            return Ok(false);
        }
    } else if len < min_length {
        return Ok(false);
    }

    // 固定の前置部と後置部
    for (node, item) in left.iter().zip(elems) {
        if !node.test(item, env, bindings)? {
            return Ok(false);
        }
    }
    if exact_length.is_some() {
        return Ok(true);
    }
    let max_i = len - right.len();
    for (node, item) in right.iter().zip(&elems[max_i..]) {
        if !node.test(item, env, bindings)? {
            return Ok(false);
        }
    }

    // 各ギャップを最左の位置で探す
    let mut i = left.len();
    for (j, gap) in gaps.iter().enumerate() {
        let gap_len = gap.len();
        let mut found = None;
        let mut start = i;
        while start + gap_len <= max_i {
            let mut ok = true;
            for (node, item) in gap.iter().zip(&elems[start..]) {
                if !node.test(item, env, bindings)? {
                    ok = false;
                    break;
                }
            }
            if ok {
                found = Some(start);
                break;
            }
            start += 1;
        }
        let Some(found) = found else {
            return Ok(false);
        };
        // ギャップの手前で読み飛ばした区間を束縛する
        if let Some(Some(name)) = gap_names.get(j) {
            bindings.insert(name.clone(), subject.slice(i, found));
        }
        i = found + gap_len;
    }

    // 最後のギャップから後置部までの区間
    if let Some(Some(name)) = gap_names.get(gaps.len()) {
        bindings.insert(name.clone(), subject.slice(i, max_i));
    }
    Ok(true)
}

fn test_class(kind: ClassKind, re: &KataRegex, value: &Value) -> bool {
    match (kind, value) {
        // int/float は数値どうしの変換が常に成立する。bool も数値
        (
            ClassKind::Int | ClassKind::Float,
            Value::Bool(_) | Value::Int(_) | Value::Float(_),
        ) => true,
        (ClassKind::Bool, Value::Bool(_) | Value::Int(_)) => true,
        (ClassKind::Bool, Value::Str(s)) => {
            let s = s.to_lowercase();
            s == "false" || s == "true"
        }
        // str はクラスの正規表現で全体一致を判定する
        (_, Value::Str(s)) => !s.is_empty() && re.is_full_match(s),
        _ => false,
    }
}

/// リテラルを値に変換
pub(super) fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::None => Value::None,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Float(x) => Value::Float(*x),
        Literal::Str(s) => Value::Str(s.clone()),
    }
}

/// 未登場の名前だけを順序を保って追加
fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|n| n == name) {
        out.push(name.to_string());
    }
}

/// パターンが束縛する名前を収集
pub(super) fn collect_targets(pattern: &Pattern, out: &mut Vec<String>) {
    match pattern {
        Pattern::Binding { target, value } => {
            push_unique(out, target);
            collect_targets(value, out);
        }
        Pattern::Deconstructor { args, .. } => {
            for arg in args {
                collect_targets(arg, out);
            }
        }
        Pattern::AttributeDeconstructor { args, .. } => {
            for (_, arg) in args {
                collect_targets(arg, out);
            }
        }
        Pattern::Alternatives { elts } => {
            for elt in elts {
                collect_targets(elt, out);
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
                collect_targets(pat, out);
            }
            for name in gap_names.iter().flatten() {
                push_unique(out, name);
            }
        }
        Pattern::Repetition { value, .. } => collect_targets(value, out),
        Pattern::StringDeconstructor {
            groups, targets, ..
        } => {
            for pat in groups.iter().flatten() {
                collect_targets(pat, out);
            }
            for name in targets.iter().flatten() {
                push_unique(out, name);
            }
        }
        Pattern::Mapping { entries } => {
            for (_, pat) in entries {
                collect_targets(pat, out);
            }
        }
        Pattern::Wildcard { .. }
        | Pattern::Constant { .. }
        | Pattern::RegularExpression { .. }
        | Pattern::RegularExprType { .. } => {}
    }
}

/// パターンが参照する自由名（型名・繰り返し回数の名前）を収集
pub(super) fn collect_sources(pattern: &Pattern, out: &mut Vec<String>) {
    match pattern {
        Pattern::Deconstructor { name, args } => {
            for n in name.names() {
                push_unique(out, n);
            }
            for arg in args {
                collect_sources(arg, out);
            }
        }
        Pattern::AttributeDeconstructor { name, args } => {
            for n in name.names() {
                push_unique(out, n);
            }
            for (_, arg) in args {
                collect_sources(arg, out);
            }
        }
        Pattern::Repetition { value, count } => {
            if let RepCount::Name(name) = count {
                push_unique(out, name);
            }
            collect_sources(value, out);
        }
        Pattern::Binding { value, .. } => collect_sources(value, out),
        Pattern::Alternatives { elts } => {
            for elt in elts {
                collect_sources(elt, out);
            }
        }
        Pattern::Sequence {
            left, right, gaps, ..
        } => {
            for pat in left.iter().chain(right).chain(gaps.iter().flatten()) {
                collect_sources(pat, out);
            }
        }
        Pattern::StringDeconstructor { groups, .. } => {
            for pat in groups.iter().flatten() {
                collect_sources(pat, out);
            }
        }
        Pattern::Mapping { entries } => {
            for (_, pat) in entries {
                collect_sources(pat, out);
            }
        }
        Pattern::Wildcard { .. }
        | Pattern::Constant { .. }
        | Pattern::RegularExpression { .. }
        | Pattern::RegularExprType { .. } => {}
    }
}
