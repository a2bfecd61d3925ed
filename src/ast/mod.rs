//! Abstract Syntax Tree (AST) definitions for pattern expressions.
//!
//! Pattern text (and guard text) is first parsed into this generic host
//! expression tree; the pattern parser then rewrites it into the closed
//! pattern IR defined in [`patterns`].

pub mod patterns;

pub use patterns::{ClassKind, DeconName, Literal, MapKey, Pattern, RepCount};

use serde::{Deserialize, Serialize};

/// Span information for source location tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// An expression node together with its source span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Resolve a (possibly dotted) name such as `ast.BinOp`.
    pub fn dotted_name(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Name(name) => Some(name.clone()),
            ExprKind::Attribute { value, attr } => {
                let base = value.dotted_name()?;
                Some(format!("{}.{}", base, attr))
            }
            _ => None,
        }
    }

    /// Resolve a deconstructor name: a dotted name, or a tuple of names
    /// (meaning "instance of any of these"). A `_` inside the tuple makes
    /// the whole name match any type.
    pub fn decon_name(&self) -> Option<DeconName> {
        if let ExprKind::Tuple(elts) = &self.kind {
            let names: Option<Vec<String>> = elts.iter().map(|e| e.dotted_name()).collect();
            let names = names?;
            if names.iter().any(|n| n == "_") {
                return Some(DeconName::Ident("_".to_string()));
            }
            return Some(DeconName::Group(names));
        }
        self.dotted_name().map(DeconName::Ident)
    }
}

/// Expression variants of the host expression grammar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    NoneLit,
    Ellipsis,
    /// `*expr` inside a sequence literal
    Starred(Box<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    BoolOp {
        op: BoolOpKind,
        values: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<(String, Expr)>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Set(Vec<Expr>),
    Dict {
        keys: Vec<Expr>,
        values: Vec<Expr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    /// `+` (string decomposition in patterns)
    Add,
    /// `-` (guards only)
    Sub,
    /// `|` (alternation in patterns)
    BitOr,
    /// `^` (sequence repetition in patterns)
    BitXor,
    /// `**` (sequence repetition in patterns)
    Pow,
    /// `@` (name binding in patterns)
    MatMult,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Pow => "**",
            BinOp::MatMult => "@",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Comparison operators (used in guard expressions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

/// Boolean operators (used in guard expressions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOpKind {
    And,
    Or,
}
