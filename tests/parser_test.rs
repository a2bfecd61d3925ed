//! パターンパーサーテスト
//!
//! パターンテキストからパターンIRへの変換のテストスイート。
//! 各書き換え規則と構文エラーの検出を網羅する。

#[cfg(test)]
mod tests {
    use kata::ast::{ClassKind, DeconName, Literal, MapKey, Pattern, RepCount};
    use kata::error::{KataError, SyntaxError};
    use kata::lexer::tokenize;
    use kata::parser::{pattern_parser, Parser};

    /// パターンテキストをパターンIRに変換するヘルパー関数
    fn parse(text: &str) -> Result<Pattern, KataError> {
        let expr = Parser::new(tokenize(text)?).parse_expression()?;
        Ok(pattern_parser::parse_pattern(&expr)?)
    }

    /// 変換に成功することを確認するヘルパー関数
    fn parse_ok(text: &str) -> Pattern {
        parse(text).expect("パターンの解析に成功するはず")
    }

    /// 構文エラーになることを確認するヘルパー関数
    fn parse_err(text: &str) -> SyntaxError {
        match parse(text) {
            Err(KataError::Syntax(e)) => e,
            other => panic!("構文エラーになるはず: {:?}", other),
        }
    }

    fn constant(value: Literal) -> Pattern {
        Pattern::Constant { value }
    }

    fn binding(name: &str, value: Pattern) -> Pattern {
        Pattern::Binding {
            target: name.to_string(),
            value: Box::new(value),
        }
    }

    fn wildcard() -> Pattern {
        Pattern::Wildcard { is_seq: false }
    }

    #[test]
    fn test_name_becomes_binding() {
        // 素の名前は任意の値を束縛するパターンになる
        assert_eq!(parse_ok("x"), binding("x", wildcard()));
    }

    #[test]
    fn test_underscore_is_wildcard() {
        assert_eq!(parse_ok("_"), wildcard());
    }

    #[test]
    fn test_ellipsis_is_seq_wildcard() {
        assert_eq!(parse_ok("..."), Pattern::Wildcard { is_seq: true });
    }

    #[test]
    fn test_constants() {
        assert_eq!(parse_ok("42"), constant(Literal::Int(42)));
        assert_eq!(parse_ok("-3"), constant(Literal::Int(-3)));
        assert_eq!(parse_ok("2.5"), constant(Literal::Float(2.5)));
        assert_eq!(parse_ok("'ab'"), constant(Literal::Str("ab".to_string())));
        assert_eq!(parse_ok("True"), constant(Literal::Bool(true)));
        assert_eq!(parse_ok("None"), constant(Literal::None));
    }

    #[test]
    fn test_alternatives() {
        assert_eq!(
            parse_ok("1 | 2"),
            Pattern::Alternatives {
                elts: vec![constant(Literal::Int(1)), constant(Literal::Int(2))],
            }
        );
    }

    #[test]
    fn test_int_range_expansion() {
        // `2 | ... | 5` は {2,3,4,5} に展開される
        assert_eq!(
            parse_ok("2 | ... | 5"),
            Pattern::Alternatives {
                elts: (2..=5).map(|i| constant(Literal::Int(i))).collect(),
            }
        );
    }

    #[test]
    fn test_char_range_expansion() {
        assert_eq!(
            parse_ok("'a' | ... | 'c'"),
            Pattern::Alternatives {
                elts: vec![
                    constant(Literal::Str("a".to_string())),
                    constant(Literal::Str("b".to_string())),
                    constant(Literal::Str("c".to_string())),
                ],
            }
        );
    }

    #[test]
    fn test_equal_range_bounds_collapse() {
        // 両端が等しい範囲は単一の定数に潰れる
        assert_eq!(parse_ok("2 | ... | 2"), constant(Literal::Int(2)));
    }

    #[test]
    fn test_descending_range_is_error() {
        assert!(matches!(
            parse_err("5 | ... | 2"),
            SyntaxError::InvalidRange { .. }
        ));
    }

    #[test]
    fn test_mixed_range_bounds_is_error() {
        assert!(matches!(
            parse_err("1 | ... | 'z'"),
            SyntaxError::InvalidRange { .. }
        ));
    }

    #[test]
    fn test_binding_in_alternatives_is_error() {
        assert!(matches!(
            parse_err("x | 1"),
            SyntaxError::BindingInAlternatives { .. }
        ));
    }

    #[test]
    fn test_nested_binding_in_alternatives_is_error() {
        // 分岐の内側に埋め込まれた束縛も拒否される
        assert!(matches!(
            parse_err("Foo(x) | 1"),
            SyntaxError::BindingInAlternatives { .. }
        ));
    }

    #[test]
    fn test_wildcard_in_alternatives_is_error() {
        assert!(matches!(
            parse_err("_ | 1"),
            SyntaxError::WildcardInAlternatives { .. }
        ));
    }

    #[test]
    fn test_all_names_alternatives_become_deconstructors() {
        // `A | B` は `A() | B()` と解釈される
        assert_eq!(
            parse_ok("A | B"),
            Pattern::Alternatives {
                elts: vec![
                    Pattern::Deconstructor {
                        name: DeconName::Ident("A".to_string()),
                        args: vec![],
                    },
                    Pattern::Deconstructor {
                        name: DeconName::Ident("B".to_string()),
                        args: vec![],
                    },
                ],
            }
        );
    }

    #[test]
    fn test_bind_over_alternatives() {
        // `x @ 2 | 3` は `x @ (2 | 3)` と解釈される
        assert_eq!(
            parse_ok("x @ 2 | 3"),
            binding(
                "x",
                Pattern::Alternatives {
                    elts: vec![constant(Literal::Int(2)), constant(Literal::Int(3))],
                }
            )
        );
    }

    #[test]
    fn test_bind_bare_name_is_deconstructor() {
        // `a @ b` は `a @ b()` と解釈される
        assert_eq!(
            parse_ok("x @ Foo"),
            binding(
                "x",
                Pattern::Deconstructor {
                    name: DeconName::Ident("Foo".to_string()),
                    args: vec![],
                }
            )
        );
    }

    #[test]
    fn test_exact_length_sequence() {
        let pattern = parse_ok("[1, 2]");
        match pattern {
            Pattern::Sequence {
                left,
                right,
                gaps,
                min_length,
                exact_length,
                ..
            } => {
                assert_eq!(left.len(), 2);
                assert!(right.is_empty());
                assert!(gaps.is_empty());
                assert_eq!(min_length, 2);
                assert_eq!(exact_length, Some(2));
            }
            other => panic!("シーケンスになるはず: {:?}", other),
        }
    }

    #[test]
    fn test_empty_sequence() {
        match parse_ok("[]") {
            Pattern::Sequence { exact_length, .. } => assert_eq!(exact_length, Some(0)),
            other => panic!("シーケンスになるはず: {:?}", other),
        }
    }

    #[test]
    fn test_sequence_with_gap() {
        // 中央のシーケンスワイルドカードで分割される
        match parse_ok("[1, ..., 2, ..., 3]") {
            Pattern::Sequence {
                left,
                right,
                gaps,
                exact_length,
                ..
            } => {
                assert_eq!(left, vec![constant(Literal::Int(1))]);
                assert_eq!(right, vec![constant(Literal::Int(3))]);
                assert_eq!(gaps, vec![vec![constant(Literal::Int(2))]]);
                assert_eq!(exact_length, None);
            }
            other => panic!("シーケンスになるはず: {:?}", other),
        }
    }

    #[test]
    fn test_named_sequence_wildcard() {
        match parse_ok("[first, *rest]") {
            Pattern::Sequence {
                left, gap_names, ..
            } => {
                assert_eq!(left, vec![binding("first", wildcard())]);
                assert_eq!(gap_names, vec![Some("rest".to_string())]);
            }
            other => panic!("シーケンスになるはず: {:?}", other),
        }
    }

    #[test]
    fn test_plain_wildcard_at_gap_boundary_is_error() {
        // ギャップに隣接する素のワイルドカードは位置を特定できない
        assert!(matches!(
            parse_err("[_, ...]"),
            SyntaxError::InvalidSyntax { .. }
        ));
        assert!(matches!(
            parse_err("[1, ..., _]"),
            SyntaxError::InvalidSyntax { .. }
        ));
    }

    #[test]
    fn test_string_sequence() {
        match parse_ok("user + '@' + _") {
            Pattern::StringDeconstructor {
                groups,
                fixed_start,
                targets,
            } => {
                assert!(!fixed_start);
                assert_eq!(
                    groups,
                    vec![
                        vec![constant(Literal::Str("@".to_string()))],
                        vec![],
                    ]
                );
                assert_eq!(targets, vec![Some("user".to_string())]);
            }
            other => panic!("文字列分解になるはず: {:?}", other),
        }
    }

    #[test]
    fn test_string_sequence_fixed_start() {
        match parse_ok("'a' + x") {
            Pattern::StringDeconstructor {
                groups,
                fixed_start,
                targets,
            } => {
                assert!(fixed_start);
                assert_eq!(groups.len(), 2);
                assert!(groups[1].is_empty());
                assert_eq!(targets, vec![None, Some("x".to_string())]);
            }
            other => panic!("文字列分解になるはず: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_string_element() {
        // 文字列分解に数値は混ぜられない
        assert!(matches!(
            parse_err("1 + x"),
            SyntaxError::InvalidSyntax { .. }
        ));
    }

    #[test]
    fn test_repetition_counts() {
        match parse_ok("0 ^ 3") {
            Pattern::Repetition { count, .. } => assert_eq!(count, RepCount::Fixed(3)),
            other => panic!("繰り返しになるはず: {:?}", other),
        }
        match parse_ok("0 ^ n") {
            Pattern::Repetition { count, .. } => {
                assert_eq!(count, RepCount::Name("n".to_string()))
            }
            other => panic!("繰り返しになるはず: {:?}", other),
        }
        match parse_ok("0 ^ (2 | 3)") {
            Pattern::Repetition { count, .. } => assert_eq!(count, RepCount::Choice(vec![2, 3])),
            other => panic!("繰り返しになるはず: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_repetition_count() {
        assert!(matches!(
            parse_err("0 ^ 'a'"),
            SyntaxError::InvalidRepetition { .. }
        ));
    }

    #[test]
    fn test_positional_deconstructor() {
        assert_eq!(
            parse_ok("Point(x, y)"),
            Pattern::Deconstructor {
                name: DeconName::Ident("Point".to_string()),
                args: vec![binding("x", wildcard()), binding("y", wildcard())],
            }
        );
    }

    #[test]
    fn test_attribute_deconstructor() {
        assert_eq!(
            parse_ok("Point(x=1, y=2)"),
            Pattern::AttributeDeconstructor {
                name: DeconName::Ident("Point".to_string()),
                args: vec![
                    ("x".to_string(), constant(Literal::Int(1))),
                    ("y".to_string(), constant(Literal::Int(2))),
                ],
            }
        );
    }

    #[test]
    fn test_mixed_arguments_is_error() {
        assert!(matches!(
            parse_err("Point(1, y=2)"),
            SyntaxError::MixedArguments { .. }
        ));
    }

    #[test]
    fn test_duplicate_attribute_is_error() {
        assert!(matches!(
            parse_err("Point(x=1, x=2)"),
            SyntaxError::InvalidSyntax { .. }
        ));
    }

    #[test]
    fn test_dotted_name_deconstructor() {
        // ドット区切りの名前は引数なしデコンストラクタになる
        assert_eq!(
            parse_ok("ast.Num"),
            Pattern::Deconstructor {
                name: DeconName::Ident("ast.Num".to_string()),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_name_group_deconstructor() {
        // 名前の組はいずれかの型とのマッチになる
        assert_eq!(
            parse_ok("(int, str)(x)"),
            Pattern::Deconstructor {
                name: DeconName::Group(vec!["int".to_string(), "str".to_string()]),
                args: vec![binding("x", wildcard())],
            }
        );
    }

    #[test]
    fn test_mapping_pattern() {
        assert_eq!(
            parse_ok("{'a': x, 1: _}"),
            Pattern::Mapping {
                entries: vec![
                    (MapKey::Str("a".to_string()), binding("x", wildcard())),
                    (MapKey::Int(1), wildcard()),
                ],
            }
        );
    }

    #[test]
    fn test_invalid_mapping_key() {
        assert!(matches!(
            parse_err("{x: 1}"),
            SyntaxError::InvalidSyntax { .. }
        ));
    }

    #[test]
    fn test_regex_pattern() {
        assert_eq!(
            parse_ok("{'[0-9]+'}"),
            Pattern::RegularExpression {
                pattern: "[0-9]+".to_string(),
            }
        );
    }

    #[test]
    fn test_class_pattern() {
        assert_eq!(
            parse_ok("{int}"),
            Pattern::RegularExprType {
                kind: ClassKind::Int,
            }
        );
        // `name` は定義済み正規表現への別名
        assert_eq!(
            parse_ok("{name}"),
            Pattern::RegularExpression {
                pattern: r"[A-Za-z_]\w+".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_set_element_is_error() {
        assert!(matches!(
            parse_err("{foo}"),
            SyntaxError::Unsupported { .. }
        ));
    }

    #[test]
    fn test_duplicate_binding_is_error() {
        // 同じ名前を同一パターンで二度束縛することはできない
        assert!(matches!(
            parse_err("(x, x)"),
            SyntaxError::DuplicateBinding { .. }
        ));
        assert!(matches!(
            parse_err("[x, *x]"),
            SyntaxError::DuplicateBinding { .. }
        ));
    }

    #[test]
    fn test_pattern_ir_serialization() {
        // パターンIRはダンプ用にシリアライズ可能
        let pattern = parse_ok("Point(x, 1 | 2)");
        let json = serde_json::to_string(&pattern).expect("シリアライズに成功するはず");
        let back: Pattern = serde_json::from_str(&json).expect("デシリアライズに成功するはず");
        assert_eq!(back, pattern);
    }

    #[test]
    fn test_unsupported_constructs() {
        assert!(matches!(
            parse_err("1 - 2"),
            SyntaxError::Unsupported { .. }
        ));
        assert!(matches!(
            parse_err("a < b"),
            SyntaxError::Unsupported { .. }
        ));
    }
}
