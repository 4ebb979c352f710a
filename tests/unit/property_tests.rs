//! Property tests over generated scripts

use proptest::prelude::*;
use rust_tsqlparser::ast::{BinaryOp, ExprKind, Literal, SelectItem, StatementKind};
use rust_tsqlparser::parser::{tokenize, LexerSettings};
use rust_tsqlparser::{parse, parse_with_options, DiagnosticKind, ParseOptions};

use crate::span_walk::span_violations;

fn first_select_expr(sql: &str) -> Option<ExprKind> {
    let output = parse(sql);
    let statement = output.statements().next()?;
    let StatementKind::Select(query) = &statement.kind else {
        return None;
    };
    match query.first_select()?.items.first()? {
        SelectItem::Expr { expr, .. } => Some(expr.unnested().kind.clone()),
        _ => None,
    }
}

/// Fragments that lex cleanly on their own.
fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("SELECT".to_string()),
        Just("FROM".to_string()),
        Just(",".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just("+=".to_string()),
        Just("!<".to_string()),
        Just("\nGO\n".to_string()),
        Just("\nGO 3\n".to_string()),
        Just("-- note\n".to_string()),
        "[a-zA-Z_][a-zA-Z0-9_]{0,8}",
        "@[a-z]{1,6}",
        "[0-9]{1,5}(\\.[0-9]{1,3})?",
        "'[a-z ]{0,6}'",
        "[a-z \\]]{1,6}".prop_map(|inner| format!("[{}]", inner.replace(']', "]]"))),
        (1usize..6).prop_map(|d| format!("{}x{}", "/* ".repeat(d), " */".repeat(d))),
    ]
}

/// Well-formed scalar expressions nested through operators, calls, CASE and subqueries.
fn expr() -> impl Strategy<Value = String> {
    let leaf = prop_oneof!["[0-9]{1,4}", "c[0-9]", "@v", "'[a-z]{0,4}'"];
    leaf.prop_recursive(6, 64, 4, |inner| {
        prop_oneof![
            (inner.clone(), prop_oneof![Just("+"), Just("-"), Just("*"), Just("/")], inner.clone())
                .prop_map(|(left, op, right)| format!("{left} {op} {right}")),
            inner.clone().prop_map(|e| format!("({e})")),
            inner.clone().prop_map(|e| format!("ABS({e})")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("COALESCE({a}, {b})")),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, t, e)| format!("CASE WHEN {c} > 0 THEN {t} ELSE {e} END")),
            inner.prop_map(|e| format!("(SELECT {e})")),
        ]
    })
}

fn script() -> impl Strategy<Value = String> {
    prop::collection::vec((fragment(), "[ \t\r\n]{1,3}"), 0..40).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(fragment, space)| format!("{fragment}{space}"))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_relexing_reconstruction_is_identical(src in script()) {
        let settings = LexerSettings::default();
        let rebuilt: String = tokenize(&src, settings)
            .iter()
            .map(|t| format!("{}{}", t.leading_trivia, t.text))
            .collect();
        prop_assert_eq!(&rebuilt, &src);

        let relexed: Vec<_> = tokenize(&rebuilt, settings).into_iter().map(|t| (t.kind, t.text)).collect();
        let original: Vec<_> = tokenize(&src, settings).into_iter().map(|t| (t.kind, t.text)).collect();
        prop_assert_eq!(relexed, original);
    }

    #[test]
    fn prop_parsing_never_panics_and_reports_in_order(src in script()) {
        let output = parse(&src);
        for pair in output.diagnostics.windows(2) {
            prop_assert!(pair[0].span.start <= pair[1].span.start, "{:?}", output.diagnostics);
        }
        for batch in &output.batches {
            for pair in batch.statements.windows(2) {
                prop_assert!(pair[0].span.end <= pair[1].span.start);
            }
        }
        let walk = span_violations(&output.batches);
        prop_assert!(walk.violations.is_empty(), "{:#?}", walk.violations);
    }

    #[test]
    fn prop_nested_expression_spans_nest(e in expr()) {
        let sql = format!("SELECT {e} AS v FROM t WHERE {e} = {e} ORDER BY {e};");
        let output = parse(&sql);
        prop_assert!(output.diagnostics.is_empty(), "{}: {:?}", sql, output.diagnostics);
        let walk = span_violations(&output.batches);
        prop_assert!(walk.violations.is_empty(), "{}: {:#?}", sql, walk.violations);
        prop_assert!(walk.checked >= 4);
    }

    #[test]
    fn prop_nested_comment_is_skipped_whole(depth in 1u32..30) {
        let comment = format!("{}inner{}", "/* outer ".repeat(depth as usize), " */".repeat(depth as usize));
        let sql = format!("SELECT {comment} 13;");
        let output = parse(&sql);
        prop_assert!(output.diagnostics.is_empty());
        prop_assert_eq!(
            first_select_expr(&sql),
            Some(ExprKind::Literal(Literal::Integer("13".to_string())))
        );

        let limited = ParseOptions::default().with_max_nested_comment_depth(Some(depth));
        prop_assert!(parse_with_options(&sql, &limited).diagnostics.is_empty());

        let too_shallow = ParseOptions::default().with_max_nested_comment_depth(Some(depth - 1));
        let output = parse_with_options(&sql, &too_shallow);
        prop_assert_eq!(output.diagnostics.len(), 1);
        prop_assert_eq!(output.diagnostics[0].kind, DiagnosticKind::Lexical);
    }

    #[test]
    fn prop_bracket_escapes_decode(name in "[a-zA-Z0-9 _\\]\\[\u{e9}\u{1F600}]{1,20}") {
        let sql = format!("CREATE TABLE [{}] (Id INT)", name.replace(']', "]]"));
        let output = parse(&sql);
        prop_assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let statement = output.statements().next().unwrap();
        let StatementKind::CreateTable(table) = &statement.kind else {
            panic!("expected CREATE TABLE");
        };
        prop_assert_eq!(&table.name.name().value, &name);
    }

    #[test]
    fn prop_parenthesis_depth(depth in 1usize..256) {
        let sql = format!("SELECT {}1 + 2{}", "(".repeat(depth), ")".repeat(depth));
        let output = parse(&sql);
        prop_assert!(output.diagnostics.is_empty());
        let is_add = matches!(
            first_select_expr(&sql),
            Some(ExprKind::Binary { op: BinaryOp::Add, .. })
        );
        prop_assert!(is_add);
    }

    #[test]
    fn prop_unbalanced_parentheses_report_one_error(depth in 1usize..64) {
        let sql = format!("SELECT {}1;\nSELECT 2;", "(".repeat(depth));
        let output = parse(&sql);
        prop_assert_eq!(output.diagnostics.len(), 1);
        prop_assert_eq!(output.statements().count(), 1);
    }
}
