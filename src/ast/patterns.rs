//! パターンIRの定義
//!
//! パターンパーサーの出力となる閉じたノード集合。一度構築されたら不変で、
//! 同じパターンの繰り返しマッチで共有できます。

use serde::{Deserialize, Serialize};

/// パターン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    /// 任意の値、または（is_seqの場合）0個以上の連続した要素にマッチ
    Wildcard { is_seq: bool },

    /// マッチ成功時に値を名前に束縛する
    Binding { target: String, value: Box<Pattern> },

    /// 等値比較によるマッチ
    Constant { value: Literal },

    /// 型メンバーシップと抽出フィールドの位置マッチ
    Deconstructor { name: DeconName, args: Vec<Pattern> },

    /// 型メンバーシップと属性ごとのマッチ
    AttributeDeconstructor {
        name: DeconName,
        args: Vec<(String, Pattern)>,
    },

    /// 左から順に試される選択肢
    Alternatives { elts: Vec<Pattern> },

    /// 順序付きシーケンスに対する構造マッチ
    Sequence {
        left: Vec<Pattern>,
        right: Vec<Pattern>,
        gaps: Vec<Vec<Pattern>>,
        gap_names: Vec<Option<String>>,
        min_length: usize,
        exact_length: Option<usize>,
    },

    /// 同一パターンの連続した繰り返し
    Repetition { value: Box<Pattern>, count: RepCount },

    /// 文字列のグループ分解
    StringDeconstructor {
        groups: Vec<Vec<Pattern>>,
        fixed_start: bool,
        targets: Vec<Option<String>>,
    },

    /// 正規表現による全体マッチ
    RegularExpression { pattern: String },

    /// 文字クラス・プリミティブ型によるマッチ
    RegularExprType { kind: ClassKind },

    /// キーごとのサブパターンを持つマッピングマッチ
    Mapping { entries: Vec<(MapKey, Pattern)> },
}

impl Pattern {
    /// ワイルドカードかどうか（束縛を透過して判定）
    pub fn is_wildcard(&self) -> bool {
        match self {
            Pattern::Wildcard { .. } => true,
            Pattern::Binding { value, .. } => value.is_wildcard(),
            _ => false,
        }
    }

    /// シーケンスワイルドカードかどうか（束縛を透過して判定）
    pub fn is_seq_wildcard(&self) -> bool {
        match self {
            Pattern::Wildcard { is_seq } => *is_seq,
            Pattern::Binding { value, .. } => value.is_seq_wildcard(),
            _ => false,
        }
    }

    /// 束縛を介さない素のワイルドカードかどうか
    pub fn is_plain_wildcard(&self) -> bool {
        matches!(self, Pattern::Wildcard { .. })
    }

    /// 文字列分解の要素として有効かどうか
    pub fn is_string_element(&self) -> bool {
        match self {
            Pattern::RegularExpression { .. } | Pattern::RegularExprType { .. } => true,
            Pattern::Constant { value } => matches!(value, Literal::Str(_)),
            Pattern::Binding { value, .. } => value.is_string_element(),
            Pattern::Wildcard { .. } => true,
            Pattern::Alternatives { elts } => elts.iter().all(|e| e.is_string_element()),
            Pattern::Repetition { value, .. } => value.is_string_element(),
            _ => false,
        }
    }

    /// 束縛の対象名（束縛パターンの場合のみ）
    pub fn binding_target(&self) -> Option<&str> {
        match self {
            Pattern::Binding { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// 定数リテラル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::None => write!(f, "None"),
            Literal::Bool(true) => write!(f, "True"),
            Literal::Bool(false) => write!(f, "False"),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// デコンストラクタの型名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeconName {
    /// 単一の（ドット区切りの）名前
    Ident(String),
    /// 名前の組。いずれかの型のインスタンスであればマッチ
    Group(Vec<String>),
}

impl DeconName {
    /// 参照する型名の一覧
    pub fn names(&self) -> Vec<&str> {
        match self {
            DeconName::Ident(name) => vec![name.as_str()],
            DeconName::Group(names) => names.iter().map(|n| n.as_str()).collect(),
        }
    }
}

impl std::fmt::Display for DeconName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeconName::Ident(name) => write!(f, "{}", name),
            DeconName::Group(names) => write!(f, "({})", names.join(", ")),
        }
    }
}

/// 繰り返し回数の指定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepCount {
    /// 固定回数
    Fixed(usize),
    /// マッチ時に環境から解決される名前
    Name(String),
    /// 許される回数の選択肢（指定順に試す）
    Choice(Vec<usize>),
}

/// マッピングパターンのキー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapKey {
    Str(String),
    Int(i64),
    Bool(bool),
    Tuple(Vec<i64>),
}

/// 文字クラス・プリミティブ型の種別
///
/// セットリテラル構文 `{int}` などで指定できる固定の15種。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Bool,
    Float,
    Int,
    Alnum,
    Alpha,
    Ascii,
    Decimal,
    Digit,
    Identifier,
    Lower,
    Numeric,
    Printable,
    Space,
    Title,
    Upper,
}

impl ClassKind {
    /// キーワード名から種別を解決
    pub fn from_name(name: &str) -> Option<ClassKind> {
        Some(match name {
            "bool" => ClassKind::Bool,
            "float" => ClassKind::Float,
            "int" => ClassKind::Int,
            "alnum" => ClassKind::Alnum,
            "alpha" => ClassKind::Alpha,
            "ascii" => ClassKind::Ascii,
            "decimal" => ClassKind::Decimal,
            "digit" => ClassKind::Digit,
            "identifier" => ClassKind::Identifier,
            "lower" => ClassKind::Lower,
            "numeric" => ClassKind::Numeric,
            "printable" => ClassKind::Printable,
            "space" => ClassKind::Space,
            "title" => ClassKind::Title,
            "upper" => ClassKind::Upper,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClassKind::Bool => "bool",
            ClassKind::Float => "float",
            ClassKind::Int => "int",
            ClassKind::Alnum => "alnum",
            ClassKind::Alpha => "alpha",
            ClassKind::Ascii => "ascii",
            ClassKind::Decimal => "decimal",
            ClassKind::Digit => "digit",
            ClassKind::Identifier => "identifier",
            ClassKind::Lower => "lower",
            ClassKind::Numeric => "numeric",
            ClassKind::Printable => "printable",
            ClassKind::Space => "space",
            ClassKind::Title => "title",
            ClassKind::Upper => "upper",
        }
    }
}
