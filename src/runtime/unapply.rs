//! 構造抽出プロトコル
//!
//! デコンストラクタパターンのために、値を型記述子に従って
//! フィールドの列に分解します。解決は5つの規則を順に試し、
//! 最初に成功したものが採用されます:
//!
//! 1. 記述子のカスタムフック（`NotApplicable` で以降の規則に委譲できる）
//! 2. 組み込みのスカラー型なら値そのものを単一要素のリストとして返す
//! 3. 記述子の明示的なフィールド名リスト（欠けていれば抽出失敗）
//! 4. 記述子のアノテーションキー（同上）
//! 5. コンストラクタの引数名（欠けたフィールドは `None` で補う）
//!
//! 先頭が `_` のフィールド名はどの規則でも読み飛ばされます。
//! 値が型のインスタンスでなければ、全体として `None`（抽出不能）を
//! 返します。マッチの失敗であって、エラーではありません。

use std::rc::Rc;

use super::value::Value;

/// カスタムフックの結果
pub enum Unapplied {
    /// 分解に成功し、フィールドの列が得られた
    Values(Vec<Value>),
    /// この値は分解できない（マッチ失敗）
    NoMatch,
    /// フックは判断せず、既定の規則に委譲する
    NotApplicable,
}

/// カスタム分解フック
pub type UnapplyHook = Rc<dyn Fn(&Value) -> Unapplied>;

/// 組み込み型の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Bool,
    Int,
    Float,
    Str,
    Seq,
    Map,
}

impl BuiltinKind {
    /// 値がこの組み込み型のインスタンスかどうか
    pub fn is_instance(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (BuiltinKind::Bool, Value::Bool(_))
                | (BuiltinKind::Int, Value::Int(_))
                | (BuiltinKind::Float, Value::Float(_))
                | (BuiltinKind::Str, Value::Str(_))
                | (BuiltinKind::Seq, Value::Seq(_))
                | (BuiltinKind::Map, Value::Map(_))
        )
    }

    /// 規則2の対象となるスカラー型かどうか
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            BuiltinKind::Bool | BuiltinKind::Int | BuiltinKind::Float | BuiltinKind::Str
        )
    }
}

/// マッチ可能な型の記述子
#[derive(Clone)]
pub struct TypeDescriptor {
    pub name: String,
    /// 基底型の名前（インスタンス判定で推移的に辿る）
    pub bases: Vec<String>,
    pub builtin: Option<BuiltinKind>,
    pub hook: Option<UnapplyHook>,
    /// 規則3: 明示的な順序付きフィールド名
    pub fields: Vec<String>,
    /// 規則4: アノテーションキー
    pub annotations: Vec<String>,
    /// 規則5: コンストラクタの引数名
    pub ctor_params: Vec<String>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            builtin: None,
            hook: None,
            fields: Vec::new(),
            annotations: Vec::new(),
            ctor_params: Vec::new(),
        }
    }

    /// 組み込み型の記述子を構築
    pub fn builtin(name: impl Into<String>, kind: BuiltinKind) -> Self {
        let mut desc = Self::new(name);
        desc.builtin = Some(kind);
        desc
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.bases.push(base.into());
        self
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_annotations(mut self, keys: &[&str]) -> Self {
        self.annotations = keys.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_ctor_params(mut self, params: &[&str]) -> Self {
        self.ctor_params = params.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_hook(mut self, hook: impl Fn(&Value) -> Unapplied + 'static) -> Self {
        self.hook = Some(Rc::new(hook));
        self
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("bases", &self.bases)
            .field("builtin", &self.builtin)
            .field("hook", &self.hook.as_ref().map(|_| "<fn>"))
            .field("fields", &self.fields)
            .field("annotations", &self.annotations)
            .field("ctor_params", &self.ctor_params)
            .finish()
    }
}

/// 予約マーカー付きの名前を除いたイテレータ
fn visible<'a>(names: &'a [String]) -> impl Iterator<Item = &'a String> {
    names.iter().filter(|n| !n.starts_with('_'))
}

/// 値を型記述子に従ってフィールド列に分解
///
/// `is_instance` は記述子の名前解決（基底型の推移閉包）を環境に
/// 委ねるためのコールバックです。
pub fn extract(
    value: &Value,
    desc: &TypeDescriptor,
    is_instance: impl Fn(&Value, &str) -> bool,
) -> Option<Vec<Value>> {
    // 規則1: カスタムフックが最優先
    if let Some(hook) = &desc.hook {
        match hook(value) {
            Unapplied::Values(values) => return Some(values),
            Unapplied::NoMatch => return None,
            Unapplied::NotApplicable => {}
        }
    }

    if !is_instance(value, &desc.name) {
        return None;
    }

    // 規則2: 組み込みスカラーは値そのもの
    if let Some(kind) = desc.builtin {
        if kind.is_scalar() {
            return Some(vec![value.clone()]);
        }
    }

    // 規則3: 明示的なフィールドリスト。欠けていれば抽出失敗
    if !desc.fields.is_empty() {
        return visible(&desc.fields)
            .map(|name| value.get_field(name).cloned())
            .collect();
    }

    // 規則4: アノテーションキー。同じ欠落規則
    if !desc.annotations.is_empty() {
        return visible(&desc.annotations)
            .map(|name| value.get_field(name).cloned())
            .collect();
    }

    // 規則5: コンストラクタ引数。欠けたフィールドは None で補う
    Some(
        visible(&desc.ctor_params)
            .map(|name| value.get_field(name).cloned().unwrap_or(Value::None))
            .collect(),
    )
}
