//! Parsing whole .sqlproj projects

use pretty_assertions::assert_eq;
use rust_tsqlparser::ast::{ExprKind, Literal, StatementKind};
use rust_tsqlparser::project::parse_sqlproj;
use rust_tsqlparser::{has_errors, parse_project, ParseOptions, TsqlError};

use crate::common::TestContext;

fn file_names(files: &[rust_tsqlparser::ParsedFile]) -> Vec<String> {
    files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
        .collect()
}

#[test]
fn test_project_items_and_settings() {
    let ctx = TestContext::with_fixture("sales_db");
    let project = parse_sqlproj(&ctx.project_path()).unwrap();

    assert_eq!(project.name, "project");
    assert!(project.quoted_identifier);
    assert_eq!(project.sql_files.len(), 7);
    assert!(project
        .post_deploy_script
        .as_ref()
        .is_some_and(|p| p.ends_with("Scripts/PostDeploy.sql")));
    assert!(project.pre_deploy_script.is_none());
    assert_eq!(
        project.sqlcmd_variable_map().get("Environment").map(String::as_str),
        Some("Development")
    );
    assert!(!project
        .sql_files
        .iter()
        .any(|p| p.ends_with("Scripts/SeedData.sql")));
}

#[test]
fn test_whole_project_parses_cleanly() {
    let ctx = TestContext::with_fixture("sales_db");
    let files = parse_project(&ctx.project_path(), None).unwrap();

    assert_eq!(
        file_names(&files),
        vec![
            "SplitList.sql",
            "GetCustomerOrders.sql",
            "Roles.sql",
            "Customers.sql",
            "Orders.sql",
            "CustomerTotals.sql",
            "PostDeploy.sql",
        ]
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>()
    );
    for file in &files {
        assert!(
            !has_errors(&file.output.diagnostics),
            "{}: {:?}",
            file.path.display(),
            file.output.diagnostics
        );
    }
}

#[test]
fn test_post_deploy_script_is_expanded() {
    let ctx = TestContext::with_fixture("sales_db");
    let files = parse_project(&ctx.project_path(), None).unwrap();
    let post = files.last().unwrap();
    assert!(post.path.ends_with("Scripts/PostDeploy.sql"));

    let text = post.source.text();
    assert!(text.contains("Deploying to Development"));
    assert!(text.contains("Seeding 3 customers"));
    assert!(!text.contains("$(Environment)"));

    let statements: Vec<_> = post.output.statements().collect();
    assert!(statements
        .iter()
        .any(|s| matches!(s.kind, StatementKind::Merge(_))));
    assert!(matches!(
        &statements[0].kind,
        StatementKind::Print(expr) if matches!(
            &expr.kind,
            ExprKind::Literal(Literal::String { value, .. }) if value == "Deploying to Development"
        )
    ));
}

#[test]
fn test_options_override_project_quoted_identifier() {
    let ctx = TestContext::with_fixture("sales_db");
    ctx.write("Tables/Notes.sql", "SELECT \"note\" AS [Text];\n");

    let files = parse_project(&ctx.project_path(), None).unwrap();
    let notes = files.iter().find(|f| f.path.ends_with("Tables/Notes.sql")).unwrap();
    let select = |file: &rust_tsqlparser::ParsedFile| -> ExprKind {
        let StatementKind::Select(query) = &file.output.statements().next().unwrap().kind else {
            panic!("expected SELECT");
        };
        match &query.first_select().unwrap().items[0] {
            rust_tsqlparser::ast::SelectItem::Expr { expr, .. } => expr.kind.clone(),
            other => panic!("unexpected item {other:?}"),
        }
    };
    assert!(matches!(select(notes), ExprKind::Column(_)));

    let off = ParseOptions::default().with_quoted_identifier(false);
    let files = parse_project(&ctx.project_path(), Some(off)).unwrap();
    let notes = files.iter().find(|f| f.path.ends_with("Tables/Notes.sql")).unwrap();
    assert!(matches!(select(notes), ExprKind::Literal(Literal::String { .. })));
}

#[test]
fn test_missing_include_in_deploy_script() {
    let ctx = TestContext::with_fixture("sales_db");
    std::fs::remove_file(ctx.path("Scripts/SeedData.sql")).unwrap();

    let err = parse_project(&ctx.project_path(), None).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TsqlError>(),
        Some(TsqlError::SqlcmdIncludeNotFound { .. })
    ));
}

#[test]
fn test_missing_project_file() {
    let ctx = TestContext::empty();
    let err = parse_project(&ctx.project_path(), None).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TsqlError>(),
        Some(TsqlError::ProjectReadError { .. })
    ));
}
