//! Lexer behavior seen through the public API

use pretty_assertions::assert_eq;
use rust_tsqlparser::ast::{ExprKind, Literal, SelectItem, StatementKind};
use rust_tsqlparser::parser::keywords::Keyword;
use rust_tsqlparser::parser::token::{LexErrorKind, TokenKind};
use rust_tsqlparser::parser::{tokenize, LexerSettings};
use rust_tsqlparser::{parse, parse_with_options, DiagnosticKind, ParseOptions, Severity};

const SCRIPT: &str = "\u{FEFF}-- header\r\n\
SET NOCOUNT ON;\r\n\
SELECT [Order]]Id], N'caf\u{e9}', 0xFF, $1.25, @@ROWCOUNT /* a /* b */ */\r\n\
  FROM dbo.Orders o WITH (NOLOCK)\r\n\
 WHERE o.Total !< 10 AND o.Code <> 'x''y';\r\n\
GO 3\r\n\
:setvar Env Test\r\n\
PRINT '$(Env)'\t\r\n";

fn rebuild(src: &str, settings: LexerSettings) -> String {
    tokenize(src, settings)
        .iter()
        .map(|t| format!("{}{}", t.leading_trivia, t.text))
        .collect()
}

fn select_literal(sql: &str, options: &ParseOptions) -> ExprKind {
    let output = parse_with_options(sql, options);
    let statement = output
        .statements()
        .last()
        .cloned()
        .expect("at least one statement");
    let StatementKind::Select(query) = statement.kind else {
        panic!("expected SELECT, got {:?}", statement.kind);
    };
    match &query.first_select().unwrap().items[0] {
        SelectItem::Expr { expr, .. } => expr.kind.clone(),
        other => panic!("unexpected select item {other:?}"),
    }
}

#[test]
fn test_reconstruction_of_mixed_script() {
    let text = SCRIPT.trim_start_matches('\u{FEFF}');
    assert_eq!(rebuild(text, LexerSettings::default()), text);
}

#[test]
fn test_keywords_are_case_insensitive() {
    let tokens = tokenize("select SeLeCt SELECT", LexerSettings::default());
    let keywords: Vec<_> = tokens.iter().filter_map(|t| t.keyword()).collect();
    assert_eq!(keywords, vec![Keyword::SELECT; 3]);
}

#[test]
fn test_non_reserved_words_stay_identifiers() {
    let tokens = tokenize("LOGIN NOLOCK", LexerSettings::default());
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert!(tokens[2].is_eof());
}

#[test]
fn test_unterminated_string_is_one_lexical_error() {
    let output = parse("SELECT 1;\nSELECT 'abc");
    assert_eq!(output.diagnostics.len(), 1, "{:?}", output.diagnostics);
    let diagnostic = &output.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::Lexical);
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!((diagnostic.span.line, diagnostic.span.column), (2, 8));
    assert_eq!(output.statements().count(), 1);
}

#[test]
fn test_comment_depth_limit_from_options() {
    let sql = "SELECT /* a /* b */ */ 1";
    assert!(parse(sql).diagnostics.is_empty());

    let options = ParseOptions::default().with_max_nested_comment_depth(Some(1));
    let output = parse_with_options(sql, &options);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].kind, DiagnosticKind::Lexical);
    assert!(tokenize(sql, LexerSettings { max_nested_comment_depth: Some(1), ..LexerSettings::default() })
        .iter()
        .any(|t| t.kind == TokenKind::Error(LexErrorKind::CommentTooDeep { limit: 1 })));
}

#[test]
fn test_double_quotes_follow_initial_setting() {
    let on = select_literal("SELECT \"Name\"", &ParseOptions::default());
    assert!(matches!(on, ExprKind::Column(name) if name.name().value == "Name"));

    let off = ParseOptions::default().with_quoted_identifier(false);
    let literal = select_literal("SELECT \"It\"\"s\"", &off);
    assert_eq!(
        literal,
        ExprKind::Literal(Literal::String {
            value: "It\"s".to_string(),
            unicode: false,
        })
    );
}

#[test]
fn test_quoted_identifier_change_applies_to_next_batch() {
    let sql = "SET QUOTED_IDENTIFIER OFF;\nGO\nSELECT \"text\"";
    let literal = select_literal(sql, &ParseOptions::default());
    assert!(matches!(literal, ExprKind::Literal(Literal::String { ref value, .. }) if value == "text"));
}

#[test]
fn test_quoted_identifier_change_inside_block_applies_to_next_batch() {
    let sql = "IF 1 = 1\nBEGIN\n  SET QUOTED_IDENTIFIER OFF\nEND\nGO\nSELECT \"text\"";
    let literal = select_literal(sql, &ParseOptions::default());
    assert!(matches!(literal, ExprKind::Literal(Literal::String { .. })));
}

#[test]
fn test_separate_parses_do_not_share_settings() {
    let first = parse("SET QUOTED_IDENTIFIER OFF\nGO\nSELECT 1");
    assert!(first.diagnostics.is_empty());
    let second = select_literal("SELECT \"Name\"", &ParseOptions::default());
    assert!(matches!(second, ExprKind::Column(_)));
}
