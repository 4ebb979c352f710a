//! Whole-corpus checks over the fixture scripts

use pretty_assertions::assert_eq;
use rust_tsqlparser::parser::token::TokenKind;
use rust_tsqlparser::parser::{tokenize, LexerSettings};
use rust_tsqlparser::{parse_sql_files, FileOptions, SourceBuffer};

use crate::common::span_walk::span_violations;
use crate::common::TestContext;

#[test]
fn test_corpus_relexes_byte_identically() {
    let ctx = TestContext::with_fixture("sales_db");
    let files = ctx.sql_files();
    assert!(!files.is_empty());

    for path in files {
        let source = SourceBuffer::from_bytes(&std::fs::read(&path).unwrap());
        let tokens = tokenize(source.text(), LexerSettings::default());
        assert!(
            !tokens.iter().any(|t| matches!(t.kind, TokenKind::Error(_))),
            "{}",
            path.display()
        );
        let rebuilt: String = tokens
            .iter()
            .map(|t| format!("{}{}", t.leading_trivia, t.text))
            .collect();
        assert_eq!(rebuilt, source.text(), "{}", path.display());
    }
}

#[test]
fn test_corpus_parses_without_errors() {
    let ctx = TestContext::with_fixture("sales_db");
    let files = ctx.sql_files();
    let parsed = parse_sql_files(&files, &FileOptions::default()).unwrap();

    for file in &parsed {
        let errors: Vec<_> = file
            .output
            .diagnostics
            .iter()
            .filter(|d| d.is_error())
            .collect();
        assert!(errors.is_empty(), "{}: {errors:?}", file.path.display());
        assert!(file.output.statements().count() > 0, "{}", file.path.display());
    }
}

#[test]
fn test_spans_map_back_to_statement_text() {
    let ctx = TestContext::with_fixture("sales_db");
    let parsed = parse_sql_files(&ctx.sql_files(), &FileOptions::default()).unwrap();

    for file in &parsed {
        for batch in &file.output.batches {
            for statement in &batch.statements {
                assert!(batch.span.contains(&statement.span));
                let text = file.source.slice(statement.span);
                assert_eq!(text.trim(), text, "{}", file.path.display());
                let (line, column) = file.source.line_col(statement.span.start);
                assert_eq!((line, column), (statement.span.line, statement.span.column));
            }
        }
    }
}

#[test]
fn test_corpus_child_spans_nest_in_parents() {
    let ctx = TestContext::with_fixture("sales_db");
    let parsed = parse_sql_files(&ctx.sql_files(), &FileOptions::default()).unwrap();

    let mut checked = 0;
    for file in &parsed {
        let walk = span_violations(&file.output.batches);
        assert!(
            walk.violations.is_empty(),
            "{}: {:#?}",
            file.path.display(),
            walk.violations
        );
        checked += walk.checked;
    }
    assert!(checked > 100, "only {checked} spans checked");
}
