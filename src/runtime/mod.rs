//! 実行時環境モジュール
//!
//! 値モデル、型記述子の環境、構造抽出プロトコル、そして
//! ホストから見える match ブロックの実行時表現を提供します。

mod unapply;
mod value;

pub use unapply::{extract, BuiltinKind, TypeDescriptor, Unapplied, UnapplyHook};
pub use value::{ObjectValue, Value};

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{KataResult, MatchError};
use crate::matcher::{MatchResult, Matcher};

/// マッチ成功時の束縛（挿入順を保持）
pub type Bindings = IndexMap<String, Value>;

/// 型記述子と変数を保持する環境
pub struct Env {
    types: HashMap<String, Rc<TypeDescriptor>>,
    vars: HashMap<String, Value>,
}

impl Env {
    /// 組み込み型が登録済みの環境を構築
    pub fn new() -> Self {
        let mut env = Self {
            types: HashMap::new(),
            vars: HashMap::new(),
        };
        env.register(TypeDescriptor::builtin("bool", BuiltinKind::Bool));
        env.register(TypeDescriptor::builtin("int", BuiltinKind::Int));
        env.register(TypeDescriptor::builtin("float", BuiltinKind::Float));
        env.register(TypeDescriptor::builtin("str", BuiltinKind::Str));
        env.register(TypeDescriptor::builtin("list", BuiltinKind::Seq));
        env.register(TypeDescriptor::builtin("tuple", BuiltinKind::Seq));
        env.register(TypeDescriptor::builtin("dict", BuiltinKind::Map));
        env
    }

    /// 型記述子を登録
    pub fn register(&mut self, desc: TypeDescriptor) {
        self.types.insert(desc.name.clone(), Rc::new(desc));
    }

    /// 名前から型記述子を解決
    pub fn lookup_type(&self, name: &str) -> Option<&Rc<TypeDescriptor>> {
        self.types.get(name)
    }

    /// 変数を設定
    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// 変数を参照
    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// 値が指定の型のインスタンスかどうか
    ///
    /// 組み込み型は値の種別で判定し、ユーザー定義型はオブジェクトの
    /// 型名から基底型を推移的に辿って判定します。
    pub fn is_instance(&self, value: &Value, name: &str) -> bool {
        // 名前組に含まれる '_' は任意の型を表す
        if name == "_" {
            return true;
        }
        if let Some(desc) = self.types.get(name) {
            if let Some(kind) = desc.builtin {
                return kind.is_instance(value);
            }
        }

        let Value::Object(obj) = value else {
            return false;
        };
        let mut pending = vec![obj.type_name.as_str()];
        let mut seen: Vec<&str> = Vec::new();
        while let Some(current) = pending.pop() {
            if current == name {
                return true;
            }
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            if let Some(desc) = self.types.get(current) {
                pending.extend(desc.bases.iter().map(|b| b.as_str()));
            }
        }
        false
    }

    /// 値を型記述子に従って分解
    ///
    /// 名前が未登録ならインスタンス判定のみの既定記述子として扱います。
    pub fn extract(&self, value: &Value, name: &str) -> Option<Vec<Value>> {
        match self.types.get(name) {
            Some(desc) => {
                let desc = Rc::clone(desc);
                unapply::extract(value, &desc, |v, n| self.is_instance(v, n))
            }
            None => self.is_instance(value, name).then(Vec::new),
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

/// ホストから見える match ブロック
///
/// 対象値と処理済みフラグを保持し、`case` は未処理の間だけ
/// マッチャーを実行します。どのパターンにもマッチしないまま
/// `finish` に到達するとエラーです。
pub struct MatchBlock {
    subject: Value,
    handled: bool,
}

impl MatchBlock {
    pub fn new(subject: Value) -> Self {
        Self {
            subject,
            handled: false,
        }
    }

    pub fn subject(&self) -> &Value {
        &self.subject
    }

    /// このブロックが既にいずれかの case で処理されたかどうか
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// ひとつの case を実行する
    ///
    /// マッチすれば束縛を返し、以降の case は実行されなくなります。
    pub fn case(&mut self, matcher: &Matcher, env: &Env) -> KataResult<Option<Bindings>> {
        if self.handled {
            return Ok(None);
        }
        match matcher.matches(&self.subject, env)? {
            MatchResult::Matched(bindings) => {
                self.handled = true;
                Ok(Some(bindings))
            }
            MatchResult::NoMatch => Ok(None),
        }
    }

    /// ブロックの終端。未処理ならエラー
    pub fn finish(self) -> KataResult<()> {
        if self.handled {
            Ok(())
        } else {
            Err(MatchError::NoApplicablePattern {
                value: self.subject.to_string(),
            }
            .into())
        }
    }
}
