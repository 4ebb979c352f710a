//! Batch splitting at GO separators

use pretty_assertions::assert_eq;
use rust_tsqlparser::ast::{Batch, StatementKind};
use rust_tsqlparser::{
    parse, parse_with_options, Diagnostic, DiagnosticKind, ParseOptions, RepeatCountPolicy,
};

#[test]
fn test_go_variants_split_four_batches() {
    let output = parse("SELECT 1;\nGO\nSELECT 2;\nGO\ngo\nGo\ngO");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(output.batches.len(), 4);
    assert_eq!(output.batches[0].statements.len(), 1);
    assert_eq!(output.batches[1].statements.len(), 1);
    assert!(output.batches[2].is_empty());
    assert!(output.batches[3].is_empty());
    assert!(output.batches.iter().all(|b| b.separator.is_some()));
    let indexes: Vec<_> = output.batches.iter().map(|b| b.index).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3]);
}

#[test]
fn test_trailing_segment_without_separator() {
    let output = parse("SELECT 1\nGO\nSELECT 2");
    assert_eq!(output.batches.len(), 2);
    assert!(output.batches[0].separator.is_some());
    assert!(output.batches[1].separator.is_none());
}

#[test]
fn test_trailing_comment_after_last_go_is_not_a_batch() {
    let output = parse("SELECT 1\nGO\n-- end of script\n/* done */\n");
    assert_eq!(output.batches.len(), 1);
}

#[test]
fn test_go_repeat_count_is_recorded() {
    let output = parse("INSERT INTO t DEFAULT VALUES\nGO 10\n");
    assert!(output.diagnostics.is_empty());
    let separator = output.batches[0].separator.expect("separator");
    assert_eq!(separator.repeat_count, Some(10));
    assert_eq!(separator.span.line, 2);
}

#[test]
fn test_go_repeat_count_rejected_by_policy() {
    let options = ParseOptions {
        repeat_count: RepeatCountPolicy::Reject,
        ..ParseOptions::default()
    };
    let output = parse_with_options("SELECT 1\nGO 2\nSELECT 2\nGO\n", &options);
    assert_eq!(output.batches.len(), 2);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].kind, DiagnosticKind::Syntax);
    assert_eq!(output.diagnostics[0].span.line, 2);
}

#[test]
fn test_go_repeat_count_out_of_range() {
    let output = parse("SELECT 1\nGO 0\nSELECT 2\nGO 99999999999\nSELECT 3");
    assert_eq!(output.batches.len(), 3);
    let lexical: Vec<_> = output
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::Lexical)
        .map(|d| d.span.line)
        .collect();
    assert_eq!(lexical, vec![2, 4]);
    assert_eq!(output.diagnostics.len(), 2);
    assert!(output.batches[..2]
        .iter()
        .all(|b| b.separator.is_some_and(|s| s.repeat_count.is_none())));
}

#[test]
fn test_separators_on_one_line_are_not_recognized() {
    // GO only separates batches when it starts a line
    let output = parse("SELECT 1; GO SELECT 2; GO go Go gO");
    assert_eq!(output.batches.len(), 1);
    assert!(output.batches[0].separator.is_none());
    let errors: Vec<_> = output
        .diagnostics
        .iter()
        .map(|d| (d.kind, d.span.column))
        .collect();
    assert_eq!(
        errors,
        vec![(DiagnosticKind::Syntax, 11), (DiagnosticKind::Syntax, 24)]
    );
    let selects = output
        .statements()
        .filter(|s| matches!(s.kind, StatementKind::Select(_)))
        .count();
    assert_eq!(selects, 2);
}

#[test]
fn test_go_followed_by_text_is_not_a_separator() {
    let output = parse("SELECT 1\nGO\u{a0}x\nSELECT 2");
    assert_eq!(output.batches.len(), 1);

    let output = parse("SELECT 1\nGO\u{a0}\nSELECT 2");
    assert_eq!(output.batches.len(), 2);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
}

#[test]
fn test_go_inside_line_is_not_a_separator() {
    let output = parse("SELECT 1 AS GO");
    assert_eq!(output.batches.len(), 1);
    assert_eq!(output.statements().count(), 1);
}

#[test]
fn test_go_inside_string_or_comment_is_not_a_separator() {
    let output = parse("PRINT '\nGO\n'\n/*\nGO\n*/\nSELECT 1");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    assert_eq!(output.batches.len(), 1);
    assert_eq!(output.statements().count(), 2);
}

#[test]
fn test_errors_do_not_cross_batches() {
    let output = parse("SELECT FROM;\nGO\nSELECT 2");
    assert_eq!(output.batches.len(), 2);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].span.line, 1);
    assert!(matches!(
        output.batches[1].statements[0].kind,
        StatementKind::Select(_)
    ));
}

#[test]
fn test_batch_spans_follow_source_order() {
    let output = parse("SELECT 1\nGO\nSELECT 2\nGO\nSELECT 3");
    for pair in output.batches.windows(2) {
        assert!(pair[0].span.end <= pair[1].span.start);
    }
    assert_eq!(output.batches[2].span.line, 5);
}

#[test]
fn test_output_destructures_into_tuple() {
    let (batches, diagnostics): (Vec<Batch>, Vec<Diagnostic>) = parse("SELECT 1").into();
    assert_eq!(batches.len(), 1);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_empty_input() {
    let output = parse("");
    assert!(output.batches.is_empty());
    assert!(output.diagnostics.is_empty());

    let output = parse("  \n-- only a comment\n");
    assert!(output.batches.is_empty());
}
