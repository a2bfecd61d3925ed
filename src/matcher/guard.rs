//! ガード式の評価
//!
//! 構造マッチの成功後に実行される小さな評価器。リテラル、名前
//! （束縛を先に、次に環境変数を参照）、比較、`and`/`or`/`not`、
//! 単項マイナスをサポートします。評価エラーはマッチ失敗ではなく
//! そのまま伝播します。

use crate::ast::{BoolOpKind, CmpOp, Expr, ExprKind, UnaryOp};
use crate::error::MatchError;
use crate::runtime::{Bindings, Env, Value};

/// ガード式を評価して値を返す
pub fn eval(expr: &Expr, bindings: &Bindings, env: &Env) -> Result<Value, MatchError> {
    match &expr.kind {
        ExprKind::Int(i) => Ok(Value::Int(*i)),
        ExprKind::Float(x) => Ok(Value::Float(*x)),
        ExprKind::Str(s) => Ok(Value::Str(s.clone())),
        ExprKind::Bool(b) => Ok(Value::Bool(*b)),
        ExprKind::NoneLit => Ok(Value::None),

        ExprKind::Name(name) => bindings
            .get(name)
            .or_else(|| env.get_var(name))
            .cloned()
            .ok_or_else(|| MatchError::UnknownName { name: name.clone() }),

        ExprKind::Unary { op, operand } => {
            let value = eval(operand, bindings, env)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                UnaryOp::Neg => match value {
                    Value::Int(i) => Ok(Value::Int(-i)),
                    Value::Float(x) => Ok(Value::Float(-x)),
                    other => Err(MatchError::InvalidGuard {
                        message: format!("'{}' は符号反転できません", other.type_name()),
                    }),
                },
            }
        }

        ExprKind::Compare { op, left, right } => {
            let left = eval(left, bindings, env)?;
            let right = eval(right, bindings, env)?;
            compare(*op, &left, &right).map(Value::Bool)
        }

        ExprKind::BoolOp { op, values } => {
            // ホスト言語と同様、最後に評価した値をそのまま返す
            let mut result = Value::Bool(matches!(op, BoolOpKind::And));
            for value in values {
                result = eval(value, bindings, env)?;
                let stop = match op {
                    BoolOpKind::And => !result.is_truthy(),
                    BoolOpKind::Or => result.is_truthy(),
                };
                if stop {
                    break;
                }
            }
            Ok(result)
        }

        _ => Err(MatchError::InvalidGuard {
            message: "ガード式でサポートされない構文です".to_string(),
        }),
    }
}

/// ガード式を真偽値として評価
pub fn eval_bool(expr: &Expr, bindings: &Bindings, env: &Env) -> Result<bool, MatchError> {
    Ok(eval(expr, bindings, env)?.is_truthy())
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, MatchError> {
    match op {
        CmpOp::Eq => return Ok(left == right),
        CmpOp::NotEq => return Ok(left != right),
        _ => {}
    }

    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let a = match left {
                Value::Int(i) => *i as f64,
                Value::Float(x) => *x,
                _ => unreachable!(),
            };
            let b = match right {
                Value::Int(i) => *i as f64,
                Value::Float(x) => *x,
                _ => unreachable!(),
            };
            a.partial_cmp(&b)
        }
        _ => {
            return Err(MatchError::InvalidGuard {
                message: format!(
                    "'{}' と '{}' は順序比較できません",
                    left.type_name(),
                    right.type_name()
                ),
            })
        }
    };

    let Some(ordering) = ordering else {
        return Ok(false);
    };
    Ok(match op {
        CmpOp::Lt => ordering.is_lt(),
        CmpOp::LtE => ordering.is_le(),
        CmpOp::Gt => ordering.is_gt(),
        CmpOp::GtE => ordering.is_ge(),
        CmpOp::Eq | CmpOp::NotEq => unreachable!(),
    })
}

/// 式の中に現れる自由な名前を収集
pub fn free_names(expr: &Expr, out: &mut Vec<String>) {
    match &expr.kind {
        ExprKind::Name(name) => {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        ExprKind::Unary { operand, .. } => free_names(operand, out),
        ExprKind::Compare { left, right, .. } => {
            free_names(left, out);
            free_names(right, out);
        }
        ExprKind::BoolOp { values, .. } => {
            for value in values {
                free_names(value, out);
            }
        }
        ExprKind::Binary { left, right, .. } => {
            free_names(left, out);
            free_names(right, out);
        }
        ExprKind::Call { func, args, keywords } => {
            free_names(func, out);
            for arg in args {
                free_names(arg, out);
            }
            for (_, value) in keywords {
                free_names(value, out);
            }
        }
        ExprKind::Attribute { value, .. } => free_names(value, out),
        ExprKind::Starred(inner) => free_names(inner, out),
        ExprKind::Tuple(elts) | ExprKind::List(elts) | ExprKind::Set(elts) => {
            for elt in elts {
                free_names(elt, out);
            }
        }
        ExprKind::Dict { keys, values } => {
            for expr in keys.iter().chain(values) {
                free_names(expr, out);
            }
        }
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::NoneLit
        | ExprKind::Ellipsis => {}
    }
}
