//! スキャナテスト
//!
//! ソーステキストからの `match` / `case` 文の検出と、
//! ネスト・対象式の検証規則のテストスイート。

#[cfg(test)]
mod tests {
    use kata::error::{KataError, ScanError};
    use kata::scanner::{scan, Statement};

    /// スキャンに成功することを確認するヘルパー関数
    fn scan_ok(source: &str) -> Vec<Statement> {
        scan(source).expect("スキャンに成功するはず")
    }

    /// スキャンエラーになることを確認するヘルパー関数
    fn scan_err(source: &str) -> ScanError {
        match scan(source) {
            Err(KataError::Scan(e)) => e,
            other => panic!("スキャンエラーになるはず: {:?}", other),
        }
    }

    #[test]
    fn test_match_with_cases() {
        let source = "\
match node:
    case Num(x):
        f(x)
    case Add():
        g()
";
        let statements = scan_ok(source);
        assert_eq!(statements.len(), 3);

        match &statements[0] {
            Statement::Match(record) => assert_eq!(record.subject, "node"),
            other => panic!("match 文になるはず: {:?}", other),
        }
        match &statements[1] {
            Statement::Case(record) => {
                // match の内側なので対象式は継承される
                assert_eq!(record.subject, None);
                assert_eq!(record.pattern, "Num(x)");
                assert_eq!(record.guard, None);
            }
            other => panic!("case 文になるはず: {:?}", other),
        }
        match &statements[2] {
            Statement::Case(record) => assert_eq!(record.pattern, "Add()"),
            other => panic!("case 文になるはず: {:?}", other),
        }
    }

    #[test]
    fn test_standalone_case_with_subject() {
        let source = "\
case value as Point(x, y) if x > 0:
    f(x, y)
";
        let statements = scan_ok(source);
        assert_eq!(statements.len(), 1);

        match &statements[0] {
            Statement::Case(record) => {
                assert_eq!(record.subject.as_deref(), Some("value"));
                assert_eq!(record.pattern, "Point(x, y)");
                assert_eq!(record.guard.as_deref(), Some("x > 0"));
            }
            other => panic!("case 文になるはず: {:?}", other),
        }
    }

    #[test]
    fn test_case_span_covers_statement() {
        let source = "case v as p:\n    pass\n";
        let statements = scan_ok(source);
        match &statements[0] {
            Statement::Case(record) => {
                assert_eq!(record.span.start, 0);
                // 終端のコロンまでが置換対象
                assert_eq!(record.span.end, source.find('\n').unwrap());
            }
            other => panic!("case 文になるはず: {:?}", other),
        }
    }

    #[test]
    fn test_colon_inside_dict_is_not_terminator() {
        // ガード中の辞書リテラルのコロンを文の終端と誤認しない
        let source = "\
case v as x if d == {1: 2}:
    pass
";
        let statements = scan_ok(source);
        match &statements[0] {
            Statement::Case(record) => {
                assert_eq!(record.pattern, "x");
                assert_eq!(record.guard.as_deref(), Some("d == {1: 2}"));
            }
            other => panic!("case 文になるはず: {:?}", other),
        }
    }

    #[test]
    fn test_keywords_inside_brackets_are_ignored() {
        // 括弧内の `as` / `if` は区切りにならない
        let source = "\
case v as [a, (b if c)]:
    pass
";
        // `if` を含む括弧は読み飛ばされ、パターン全体が切り出される
        let statements = scan_ok(source);
        match &statements[0] {
            Statement::Case(record) => {
                assert_eq!(record.subject.as_deref(), Some("v"));
                assert_eq!(record.pattern, "[a, (b if c)]");
                assert_eq!(record.guard, None);
            }
            other => panic!("case 文になるはず: {:?}", other),
        }
    }

    #[test]
    fn test_nested_match_is_error() {
        let source = "\
match a:
    match b:
        pass
";
        assert!(matches!(scan_err(source), ScanError::NestedMatch { .. }));
    }

    #[test]
    fn test_case_without_subject_outside_match_is_error() {
        let source = "case 42:\n    pass\n";
        assert!(matches!(
            scan_err(source),
            ScanError::CaseWithoutSubject { .. }
        ));
    }

    #[test]
    fn test_case_with_subject_inside_match_is_error() {
        // match の内側の case は対象式を継承するため、明示できない
        let source = "\
match data:
    case 1 as x:
        pass
    case 2 as y:
        pass
";
        assert!(matches!(scan_err(source), ScanError::CaseWithSubject { .. }));
    }

    #[test]
    fn test_match_scope_ends_with_indentation() {
        // インデントが match の深さ以下に戻ればスコープは終わる
        let source = "\
match a:
    case 1:
        pass
done()
case 2 as y:
    pass
";
        let statements = scan_ok(source);
        assert_eq!(statements.len(), 3);
        match &statements[2] {
            Statement::Case(record) => {
                // `as` の手前が対象式、後ろがパターン
                assert_eq!(record.subject.as_deref(), Some("2"));
                assert_eq!(record.pattern, "y");
            }
            other => panic!("case 文になるはず: {:?}", other),
        }
    }

    #[test]
    fn test_sequential_matches_are_allowed() {
        // ネストではなく並んだ match は許される
        let source = "\
match a:
    case 1:
        pass
match b:
    case 2:
        pass
";
        let statements = scan_ok(source);
        assert_eq!(statements.len(), 4);
    }

    #[test]
    fn test_unterminated_case_is_error() {
        let source = "case v as p\n";
        assert!(matches!(
            scan_err(source),
            ScanError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn test_keywords_not_at_line_start_are_ignored() {
        // 行頭以外の match / case は文として扱わない
        let source = "x = case_or(match_value)\n";
        let statements = scan_ok(source);
        assert!(statements.is_empty());
    }

    #[test]
    fn test_multiline_bracketed_pattern() {
        // 括弧内の改行は文を終えない
        let source = "\
case v as [1,
           2]:
    pass
";
        let statements = scan_ok(source);
        match &statements[0] {
            Statement::Case(record) => {
                assert_eq!(record.pattern, "[1,\n           2]");
            }
            other => panic!("case 文になるはず: {:?}", other),
        }
    }
}
