//! Deep nesting and span containment

use std::thread;

use pretty_assertions::assert_eq;
use rust_tsqlparser::ast::{Expr, ExprKind, SelectItem, Statement, StatementKind};
use rust_tsqlparser::parse;

use crate::span_walk::span_violations;

const DEPTH: usize = 1000;

/// Run `f` on a thread with a 2 MiB stack, the default for spawned threads.
fn on_small_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(f)
        .expect("spawn parser thread")
        .join()
        .expect("parser thread panicked")
}

fn first_item(statement: &Statement) -> &Expr {
    let StatementKind::Select(query) = &statement.kind else {
        panic!("expected SELECT, got {:?}", statement.kind);
    };
    match &query.first_select().expect("plain SELECT").items[0] {
        SelectItem::Expr { expr, .. } => expr,
        other => panic!("unexpected select item {other:?}"),
    }
}

#[test]
fn test_deeply_nested_subqueries() {
    let (diagnostics, depth) = on_small_stack(|| {
        let sql = format!("SELECT {}1{}", "(SELECT ".repeat(DEPTH), ")".repeat(DEPTH));
        let output = parse(&sql);
        let mut depth = 0;
        let mut expr = first_item(output.statements().next().expect("one statement"));
        while let ExprKind::Subquery(query) = &expr.kind {
            depth += 1;
            expr = match &query.first_select().expect("plain SELECT").items[0] {
                SelectItem::Expr { expr, .. } => expr,
                other => panic!("unexpected select item {other:?}"),
            };
        }
        (output.diagnostics.len(), depth)
    });
    assert_eq!(diagnostics, 0);
    assert_eq!(depth, DEPTH);
}

#[test]
fn test_deeply_nested_function_calls() {
    let (diagnostics, depth) = on_small_stack(|| {
        let sql = format!("SELECT {}-1{}", "ABS(".repeat(DEPTH), ")".repeat(DEPTH));
        let output = parse(&sql);
        let mut depth = 0;
        let mut expr = first_item(output.statements().next().expect("one statement"));
        while let ExprKind::Function(call) = &expr.kind {
            depth += 1;
            expr = &call.args[0];
        }
        (output.diagnostics.len(), depth)
    });
    assert_eq!(diagnostics, 0);
    assert_eq!(depth, DEPTH);
}

#[test]
fn test_deeply_nested_blocks() {
    let (diagnostics, depth, after) = on_small_stack(|| {
        let sql = format!(
            "{}PRINT 'innermost';\n{}SELECT 2;",
            "BEGIN\n".repeat(DEPTH),
            "END\n".repeat(DEPTH)
        );
        let output = parse(&sql);
        let statements: Vec<_> = output.statements().collect();
        let mut depth = 0;
        let mut statement = statements[0];
        while let StatementKind::Block(body) = &statement.kind {
            depth += 1;
            statement = &body[0];
        }
        let after = matches!(statements[1].kind, StatementKind::Select(_));
        (output.diagnostics.len(), depth, after)
    });
    assert_eq!(diagnostics, 0);
    assert_eq!(depth, DEPTH);
    assert!(after);
}

#[test]
fn test_deeply_nested_if_else_chain() {
    let diagnostics = on_small_stack(|| {
        let mut sql = String::new();
        for i in 0..DEPTH {
            sql.push_str(&format!("IF @x = {i} PRINT {i}\nELSE "));
        }
        sql.push_str("PRINT -1;");
        parse(&sql).diagnostics.len()
    });
    assert_eq!(diagnostics, 0);
}

#[test]
fn test_unclosed_deep_nesting_is_a_diagnostic() {
    let (errors, statements) = on_small_stack(|| {
        let sql = format!("SELECT {}1;\nSELECT 2;", "(SELECT ".repeat(DEPTH));
        let output = parse(&sql);
        (output.diagnostics.len(), output.statements().count())
    });
    assert_eq!(errors, 1);
    assert_eq!(statements, 1);
}

#[test]
fn test_child_spans_lie_within_parents() {
    let sql = "\
WITH totals (CustomerId, Total) AS (
    SELECT o.CustomerId, SUM(o.Amount) FROM dbo.Orders AS o GROUP BY o.CustomerId
)
SELECT c.Name,
       CASE WHEN t.Total > 100 THEN 'big' ELSE 'small' END AS Size,
       ROW_NUMBER() OVER (PARTITION BY c.Region ORDER BY t.Total DESC) AS Rank,
       (SELECT MAX(o.Amount) FROM dbo.Orders o WHERE o.CustomerId = c.Id) AS Largest
FROM dbo.Customers AS c
    INNER JOIN totals AS t ON t.CustomerId = c.Id
    LEFT JOIN (SELECT Id FROM dbo.Blocked) AS b ON b.Id = c.Id
WHERE c.Name LIKE N'A%' AND c.Id NOT IN (1, 2, 3) AND t.Total BETWEEN 1 AND 1000
ORDER BY c.Name;
UPDATE c SET c.Total = t.Total + 1 FROM dbo.Customers c JOIN totals t ON t.CustomerId = c.Id WHERE c.Id > 0;
IF EXISTS (SELECT 1 FROM dbo.Customers)
BEGIN
    DECLARE @n INT = (SELECT COUNT(*) FROM dbo.Customers);
    WHILE @n > 0 SET @n -= 1;
END
ELSE PRINT 'empty';
";
    let output = parse(sql);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let walk = span_violations(&output.batches);
    assert!(walk.violations.is_empty(), "{:#?}", walk.violations);
    assert!(walk.checked > 50, "only {} spans checked", walk.checked);
}

#[test]
fn test_deep_subquery_spans_nest() {
    let walk = on_small_stack(|| {
        let sql = format!("SELECT {}1{}", "(SELECT ".repeat(100), ")".repeat(100));
        let walk = span_violations(&parse(&sql).batches);
        (walk.violations, walk.checked)
    });
    assert!(walk.0.is_empty(), "{:#?}", walk.0);
    assert!(walk.1 >= 300);
}
