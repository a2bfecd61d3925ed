//! 構造抽出プロトコルテスト
//!
//! 型記述子に従った値の分解規則（フック・組み込みスカラー・
//! フィールド・アノテーション・コンストラクタ引数）と
//! インスタンス判定のテストスイート。

#[cfg(test)]
mod tests {
    use kata::runtime::{Env, ObjectValue, TypeDescriptor, Unapplied, Value};

    /// フィールド付きオブジェクトを構築するヘルパー関数
    fn point(x: i64, y: i64) -> Value {
        Value::Object(
            ObjectValue::new("Point")
                .with_field("x", Value::Int(x))
                .with_field("y", Value::Int(y)),
        )
    }

    #[test]
    fn test_builtin_scalar_extracts_value_itself() {
        // 組み込みスカラーは値そのものを単一要素のリストとして返す
        let env = Env::new();
        assert_eq!(
            env.extract(&Value::Int(5), "int"),
            Some(vec![Value::Int(5)])
        );
        assert_eq!(
            env.extract(&Value::Str("a".to_string()), "str"),
            Some(vec![Value::Str("a".to_string())])
        );

        // 型が合わなければ抽出不能
        assert_eq!(env.extract(&Value::Int(5), "str"), None);
    }

    #[test]
    fn test_explicit_fields_are_strict() {
        let mut env = Env::new();
        env.register(TypeDescriptor::new("Point").with_fields(&["x", "y"]));

        assert_eq!(
            env.extract(&point(3, 4), "Point"),
            Some(vec![Value::Int(3), Value::Int(4)])
        );

        // フィールドが欠けていれば抽出全体が失敗する
        let partial = Value::Object(ObjectValue::new("Point").with_field("x", Value::Int(3)));
        assert_eq!(env.extract(&partial, "Point"), None);
    }

    #[test]
    fn test_annotations_are_strict() {
        let mut env = Env::new();
        env.register(TypeDescriptor::new("Point").with_annotations(&["x", "y"]));

        assert_eq!(
            env.extract(&point(3, 4), "Point"),
            Some(vec![Value::Int(3), Value::Int(4)])
        );

        let partial = Value::Object(ObjectValue::new("Point").with_field("y", Value::Int(4)));
        assert_eq!(env.extract(&partial, "Point"), None);
    }

    #[test]
    fn test_ctor_params_fill_missing_with_none() {
        // コンストラクタ引数規則は欠けたフィールドを None で補う
        let mut env = Env::new();
        env.register(TypeDescriptor::new("Point").with_ctor_params(&["x", "y", "z"]));

        assert_eq!(
            env.extract(&point(3, 4), "Point"),
            Some(vec![Value::Int(3), Value::Int(4), Value::None])
        );
    }

    #[test]
    fn test_underscore_prefixed_names_are_skipped() {
        let mut env = Env::new();
        env.register(TypeDescriptor::new("Node").with_fields(&["value", "_parent", "next"]));

        let node = Value::Object(
            ObjectValue::new("Node")
                .with_field("value", Value::Int(1))
                .with_field("next", Value::None),
        );
        // '_parent' は存在しなくても無視される
        assert_eq!(
            env.extract(&node, "Node"),
            Some(vec![Value::Int(1), Value::None])
        );
    }

    #[test]
    fn test_descriptor_without_rules_yields_no_fields() {
        // 規則のない記述子はインスタンス判定のみで空の列を返す
        let mut env = Env::new();
        env.register(TypeDescriptor::new("Marker"));

        let value = Value::Object(ObjectValue::new("Marker"));
        assert_eq!(env.extract(&value, "Marker"), Some(vec![]));
    }

    #[test]
    fn test_hook_values_take_precedence() {
        // フックの結果は他のすべての規則より優先される
        let mut env = Env::new();
        env.register(
            TypeDescriptor::new("Point")
                .with_fields(&["x", "y"])
                .with_hook(|_| Unapplied::Values(vec![Value::Int(0)])),
        );

        assert_eq!(env.extract(&point(3, 4), "Point"), Some(vec![Value::Int(0)]));
    }

    #[test]
    fn test_hook_no_match_stops_extraction() {
        // フックが NoMatch を返せばインスタンスでも抽出しない
        let mut env = Env::new();
        env.register(
            TypeDescriptor::new("Point")
                .with_fields(&["x", "y"])
                .with_hook(|_| Unapplied::NoMatch),
        );

        assert_eq!(env.extract(&point(3, 4), "Point"), None);
    }

    #[test]
    fn test_hook_not_applicable_falls_through() {
        // NotApplicable なら既定の規則に委譲される
        let mut env = Env::new();
        env.register(
            TypeDescriptor::new("Point")
                .with_fields(&["x", "y"])
                .with_hook(|_| Unapplied::NotApplicable),
        );

        assert_eq!(
            env.extract(&point(3, 4), "Point"),
            Some(vec![Value::Int(3), Value::Int(4)])
        );
    }

    #[test]
    fn test_hook_runs_before_instance_check() {
        // フックはインスタンス判定より先に呼ばれるため、
        // 型のインスタンスでない値も分解できる
        let mut env = Env::new();
        env.register(TypeDescriptor::new("EMail").with_hook(|value| match value {
            Value::Str(s) => match s.split_once('@') {
                Some((user, domain)) => Unapplied::Values(vec![
                    Value::Str(user.to_string()),
                    Value::Str(domain.to_string()),
                ]),
                None => Unapplied::NoMatch,
            },
            _ => Unapplied::NoMatch,
        }));

        let value = Value::Str("monty@python.org".to_string());
        assert_eq!(
            env.extract(&value, "EMail"),
            Some(vec![
                Value::Str("monty".to_string()),
                Value::Str("python.org".to_string()),
            ])
        );
        assert_eq!(env.extract(&Value::Str("nobody".to_string()), "EMail"), None);
    }

    #[test]
    fn test_non_instance_is_not_extractable() {
        let mut env = Env::new();
        env.register(TypeDescriptor::new("Point").with_fields(&["x", "y"]));

        let other = Value::Object(ObjectValue::new("Circle").with_field("r", Value::Int(1)));
        assert_eq!(env.extract(&other, "Point"), None);
        assert_eq!(env.extract(&Value::Int(1), "Point"), None);
    }

    #[test]
    fn test_unknown_type_is_not_extractable() {
        let env = Env::new();
        assert_eq!(env.extract(&point(1, 2), "Nothing"), None);
    }

    #[test]
    fn test_unregistered_name_acts_as_default_descriptor() {
        // 未登録の名前はインスタンス判定のみの既定記述子として振る舞う
        let env = Env::new();
        assert_eq!(env.extract(&point(1, 2), "Point"), Some(vec![]));
        assert_eq!(env.extract(&Value::Int(1), "Point"), None);
    }

    #[test]
    fn test_underscore_is_instance_of_any_type() {
        let env = Env::new();
        assert!(env.is_instance(&Value::Int(1), "_"));
        assert!(env.is_instance(&point(1, 2), "_"));
        assert_eq!(env.extract(&Value::Int(1), "_"), Some(vec![]));
    }

    #[test]
    fn test_is_instance_with_builtin_types() {
        let env = Env::new();
        assert!(env.is_instance(&Value::Int(1), "int"));
        assert!(env.is_instance(&Value::Str("a".to_string()), "str"));
        assert!(env.is_instance(&Value::Seq(vec![]), "list"));
        assert!(env.is_instance(&Value::Map(vec![]), "dict"));
        assert!(!env.is_instance(&Value::Int(1), "str"));
    }

    #[test]
    fn test_is_instance_follows_base_chain() {
        // 基底型は推移的に辿られる
        let mut env = Env::new();
        env.register(TypeDescriptor::new("Expr"));
        env.register(TypeDescriptor::new("BinOp").with_base("Expr"));
        env.register(TypeDescriptor::new("Add").with_base("BinOp"));

        let value = Value::Object(ObjectValue::new("Add"));
        assert!(env.is_instance(&value, "Add"));
        assert!(env.is_instance(&value, "BinOp"));
        assert!(env.is_instance(&value, "Expr"));
        assert!(!env.is_instance(&value, "Num"));
    }

    #[test]
    fn test_is_instance_with_multiple_bases() {
        let mut env = Env::new();
        env.register(TypeDescriptor::new("Walker"));
        env.register(TypeDescriptor::new("Swimmer"));
        env.register(
            TypeDescriptor::new("Duck")
                .with_base("Walker")
                .with_base("Swimmer"),
        );

        let value = Value::Object(ObjectValue::new("Duck"));
        assert!(env.is_instance(&value, "Walker"));
        assert!(env.is_instance(&value, "Swimmer"));
    }
}
