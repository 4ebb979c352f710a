//! Reading, decoding and parsing files

use pretty_assertions::assert_eq;
use rust_tsqlparser::ast::{ExprKind, Literal, StatementKind};
use rust_tsqlparser::{
    parse_sql_file, parse_sql_files, DiagnosticKind, FileOptions, ParseOptions, Severity,
    TsqlError,
};

use crate::common::{fixture_path, utf16le_with_bom, TestContext};

fn print_text(kind: &StatementKind) -> Option<&str> {
    match kind {
        StatementKind::Print(expr) => match &expr.kind {
            ExprKind::Literal(Literal::String { value, .. }) => Some(value),
            _ => None,
        },
        _ => None,
    }
}

#[test]
fn test_utf16_file_with_bom() {
    let ctx = TestContext::empty();
    let path = ctx.write("unicode.sql", utf16le_with_bom("PRINT N'h\u{e9}llo \u{1F600}';\r\nGO\r\n"));

    let parsed = parse_sql_file(&path, &FileOptions::default()).unwrap();
    assert!(parsed.output.diagnostics.is_empty());
    let statement = parsed.output.statements().next().unwrap();
    assert_eq!(print_text(&statement.kind), Some("h\u{e9}llo \u{1F600}"));
    assert_eq!(parsed.source.path(), Some(path.as_path()));
}

#[test]
fn test_utf8_bom_does_not_shift_columns() {
    let ctx = TestContext::empty();
    let path = ctx.write("bom.sql", "\u{FEFF}SELECT FROM;");

    let parsed = parse_sql_file(&path, &FileOptions::default()).unwrap();
    assert_eq!(parsed.output.diagnostics.len(), 1);
    let span = parsed.output.diagnostics[0].span;
    assert_eq!((span.line, span.column), (1, 8));
    assert_eq!(parsed.source.slice(span), "FROM");
}

#[test]
fn test_windows_1252_fallback() {
    let ctx = TestContext::empty();
    // 0xE9 is 'é' in Windows-1252 and invalid on its own in UTF-8
    let path = ctx.write("legacy.sql", b"PRINT 'caf\xE9';".to_vec());

    let parsed = parse_sql_file(&path, &FileOptions::default()).unwrap();
    assert!(parsed.output.diagnostics.is_empty());
    let statement = parsed.output.statements().next().unwrap();
    assert_eq!(print_text(&statement.kind), Some("caf\u{e9}"));
}

#[test]
fn test_missing_file_is_an_error() {
    let ctx = TestContext::empty();
    let err = parse_sql_file(&ctx.path("nope.sql"), &FileOptions::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TsqlError>(),
        Some(TsqlError::SqlFileReadError { .. })
    ));
    assert!(err.to_string().contains("nope.sql"));
}

#[test]
fn test_many_files_keep_input_order() {
    let ctx = TestContext::empty();
    let paths: Vec<_> = (0..24)
        .map(|i| {
            let body = if i % 5 == 0 {
                format!("SELECT {i};\nSELECT FROM;\n")
            } else {
                format!("SELECT {i};\n")
            };
            ctx.write(&format!("f{i:02}.sql"), body)
        })
        .collect();

    let parsed = parse_sql_files(&paths, &FileOptions::default()).unwrap();
    assert_eq!(parsed.len(), paths.len());
    for (i, file) in parsed.iter().enumerate() {
        assert_eq!(file.path, paths[i]);
        let expected = usize::from(i % 5 == 0);
        assert_eq!(file.output.diagnostics.len(), expected, "{}", file.path.display());
        assert!(file
            .output
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::Syntax && d.span.line == 2));
    }
}

#[test]
fn test_one_unreadable_file_fails_the_set() {
    let ctx = TestContext::empty();
    let mut paths: Vec<_> = (0..10)
        .map(|i| ctx.write(&format!("f{i}.sql"), "SELECT 1"))
        .collect();
    paths.push(ctx.path("missing.sql"));
    assert!(parse_sql_files(&paths, &FileOptions::default()).is_err());
}

#[test]
fn test_session_settings_follow_the_script() {
    let path = fixture_path("scripts").join("session.sql");
    let parsed = parse_sql_file(&path, &FileOptions::default()).unwrap();
    assert!(parsed.output.diagnostics.is_empty(), "{:?}", parsed.output.diagnostics);

    let statements: Vec<_> = parsed.output.statements().collect();
    assert_eq!(print_text(&statements[2].kind), Some("double quoted text"));
    let StatementKind::Select(query) = &statements[4].kind else {
        panic!("expected SELECT, got {:?}", statements[4].kind);
    };
    let select = query.first_select().unwrap();
    assert!(matches!(
        &select.items[0],
        rust_tsqlparser::ast::SelectItem::Expr { expr, .. } if matches!(expr.kind, ExprKind::Column(_))
    ));
}

#[test]
fn test_legacy_script_under_both_strictness_levels() {
    let path = fixture_path("scripts").join("legacy.sql");

    let lenient = parse_sql_file(&path, &FileOptions::default()).unwrap();
    assert!(lenient.output.diagnostics.is_empty(), "{:?}", lenient.output.diagnostics);
    assert_eq!(lenient.output.batches.len(), 3);

    let strict = parse_sql_file(&path, &FileOptions::from(ParseOptions::strict())).unwrap();
    assert_eq!(strict.output.batches, lenient.output.batches);
    let errors: Vec<_> = strict
        .output
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.span.line)
        .collect();
    assert_eq!(errors, vec![4, 10, 13, 15]);
}

#[test]
fn test_broken_script_recovers() {
    let path = fixture_path("scripts").join("broken.sql");
    let parsed = parse_sql_file(&path, &FileOptions::default()).unwrap();

    assert_eq!(parsed.output.batches.len(), 3);
    let lines: Vec<_> = parsed.output.diagnostics.iter().map(|d| d.span.line).collect();
    assert_eq!(lines, vec![3, 8]);
    let kinds: Vec<_> = parsed
        .output
        .statements()
        .map(|s| match s.kind {
            StatementKind::Select(_) => "select",
            StatementKind::Update(_) => "update",
            StatementKind::Print(_) => "print",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["select", "update", "print"]);
}

#[test]
fn test_sqlcmd_expansion_for_plain_files() {
    let ctx = TestContext::empty();
    ctx.write("inc/part.sql", "PRINT '$(Greeting)';\n");
    let main = ctx.write(
        "main.sql",
        ":setvar Greeting hello\n:r inc\\part.sql\nGO\nPRINT 'after';\n",
    );

    let options = FileOptions {
        parse: ParseOptions::default(),
        sqlcmd: true,
    };
    let parsed = parse_sql_file(&main, &options).unwrap();
    assert!(parsed.output.diagnostics.is_empty(), "{:?}", parsed.output.diagnostics);
    let texts: Vec<_> = parsed
        .output
        .statements()
        .filter_map(|s| print_text(&s.kind))
        .collect();
    assert_eq!(texts, vec!["hello", "after"]);

    // Without expansion the directive lines are skipped
    let plain = parse_sql_file(&main, &FileOptions::default()).unwrap();
    let texts: Vec<_> = plain
        .output
        .statements()
        .filter_map(|s| print_text(&s.kind))
        .collect();
    assert_eq!(texts, vec!["after"]);
}

#[test]
fn test_circular_include_is_reported() {
    let ctx = TestContext::empty();
    ctx.write("a.sql", ":r b.sql\n");
    ctx.write("b.sql", ":r a.sql\n");
    let options = FileOptions {
        parse: ParseOptions::default(),
        sqlcmd: true,
    };
    let err = parse_sql_file(&ctx.path("a.sql"), &options).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TsqlError>(),
        Some(TsqlError::SqlcmdCircularInclude { .. })
    ));
}
