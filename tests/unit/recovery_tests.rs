//! Error recovery and cancellation

use pretty_assertions::assert_eq;
use rust_tsqlparser::ast::StatementKind;
use rust_tsqlparser::{
    parse, parse_with_options, CancellationFlag, DiagnosticKind, ParseOptions, Severity,
};

#[test]
fn test_one_bad_statement_between_two_good_ones() {
    let output = parse("SELECT a FROM t;\nSELECT FROM WHERE;\nUPDATE t SET a = 1;");
    let errors: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1, "{:?}", output.diagnostics);
    assert_eq!(errors[0].span.line, 2);

    let statements: Vec<_> = output.statements().collect();
    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[0].kind, StatementKind::Select(_)));
    assert!(matches!(statements[1].kind, StatementKind::Update(_)));
    assert!(statements[0].span.end <= errors[0].span.start);
    assert!(errors[0].span.start <= statements[1].span.start);
}

#[test]
fn test_each_bad_statement_reports_once() {
    let output = parse("SELECT (1;\nSELECT 2;\nINSERT INTO;\nSELECT 3;\nDELETE WHERE;\n");
    assert_eq!(output.diagnostics.len(), 3, "{:?}", output.diagnostics);
    assert!(output
        .diagnostics
        .iter()
        .all(|d| d.kind == DiagnosticKind::Syntax));
    let lines: Vec<_> = output.diagnostics.iter().map(|d| d.span.line).collect();
    assert_eq!(lines, vec![1, 3, 5]);
    assert_eq!(output.statements().count(), 2);
}

#[test]
fn test_recovery_inside_block_keeps_the_block() {
    let output = parse("BEGIN\n  SELECT 1;\n  SELECT FROM;\n  SELECT 2;\nEND\nSELECT 3");
    assert_eq!(output.diagnostics.len(), 1, "{:?}", output.diagnostics);
    let statements: Vec<_> = output.statements().collect();
    assert_eq!(statements.len(), 2);
    let StatementKind::Block(inner) = &statements[0].kind else {
        panic!("expected block, got {:?}", statements[0].kind);
    };
    assert_eq!(inner.len(), 2);
}

#[test]
fn test_diagnostics_are_in_source_order() {
    let output = parse("SELECT 'open\nGO\nSELECT FROM\nGO\nSELECT ?");
    let starts: Vec<_> = output.diagnostics.iter().map(|d| d.span.start).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);
}

#[test]
fn test_error_messages_name_the_offending_token() {
    let output = parse("SELECT * FROM t WHERE a = = 1");
    assert_eq!(output.diagnostics.len(), 1);
    assert!(
        output.diagnostics[0].message.contains("'='"),
        "{}",
        output.diagnostics[0].message
    );
}

#[test]
fn test_cancellation_before_parsing() {
    let flag = CancellationFlag::new();
    flag.cancel();
    let options = ParseOptions::default().with_cancellation(flag);
    let output = parse_with_options("SELECT 1;\nGO\nSELECT 2;", &options);
    assert_eq!(output.statements().count(), 0);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].kind, DiagnosticKind::Cancelled);
    assert!(output.has_errors());
}

#[test]
fn test_unset_cancellation_flag_changes_nothing() {
    let options = ParseOptions::default().with_cancellation(CancellationFlag::new());
    let output = parse_with_options("SELECT 1;\nGO\nSELECT 2;", &options);
    assert!(output.diagnostics.is_empty());
    assert_eq!(output.statements().count(), 2);
}
