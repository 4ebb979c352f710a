//! Expression shapes through `parse`

use pretty_assertions::assert_eq;
use rust_tsqlparser::ast::{
    BinaryOp, Expr, ExprKind, Literal, SelectItem, StatementKind, UnaryOp,
};
use rust_tsqlparser::parse;

/// The first select-list expression of a one-statement script.
fn select_expr(sql: &str) -> Expr {
    let output = parse(sql);
    assert!(output.diagnostics.is_empty(), "{sql}: {:?}", output.diagnostics);
    let statement = output.statements().next().expect("one statement");
    let StatementKind::Select(query) = &statement.kind else {
        panic!("expected SELECT, got {:?}", statement.kind);
    };
    match &query.first_select().expect("plain SELECT").items[0] {
        SelectItem::Expr { expr, .. } => expr.clone(),
        other => panic!("unexpected select item {other:?}"),
    }
}

/// Span-free rendering of an expression tree.
fn shape(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Literal(Literal::Integer(v)) => v.clone(),
        ExprKind::Literal(Literal::String { value, .. }) => format!("'{value}'"),
        ExprKind::Literal(Literal::Null) => "NULL".to_string(),
        ExprKind::Column(name) => name
            .parts
            .iter()
            .map(|p| p.value.as_str())
            .collect::<Vec<_>>()
            .join("."),
        ExprKind::Variable(name) => name.clone(),
        ExprKind::Nested(inner) => shape(inner),
        ExprKind::Unary { op, expr } => format!("({op:?} {})", shape(expr)),
        ExprKind::Binary { op, left, right } => {
            format!("({op:?} {} {})", shape(left), shape(right))
        }
        ExprKind::Between { expr, low, high } => {
            format!("(Between {} {} {})", shape(expr), shape(low), shape(high))
        }
        ExprKind::IsNull { expr, negated } => {
            format!("(IsNull{} {})", if *negated { "Not" } else { "" }, shape(expr))
        }
        ExprKind::Function(call) => format!(
            "{}({})",
            call.name.name().value,
            call.args.iter().map(shape).collect::<Vec<_>>().join(" ")
        ),
        other => format!("{other:?}"),
    }
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    assert_eq!(shape(&select_expr("SELECT 1 + 2 * 3")), "(Add 1 (Multiply 2 3))");
}

#[test]
fn test_not_between_forms_normalize_identically() {
    let prefix = select_expr("SELECT CASE WHEN NOT A BETWEEN 1 AND 10 THEN 1 END");
    let infix = select_expr("SELECT CASE WHEN A NOT BETWEEN 1 AND 10 THEN 1 END");
    let condition = |e: &Expr| match &e.kind {
        ExprKind::Case { when_clauses, .. } => shape(&when_clauses[0].condition),
        other => panic!("expected CASE, got {other:?}"),
    };
    assert_eq!(condition(&prefix), "(Not (Between A 1 10))");
    assert_eq!(condition(&prefix), condition(&infix));
}

#[test]
fn test_precedence_ladder() {
    let cases = [
        ("SELECT 1 - 2 - 3", "(Subtract (Subtract 1 2) 3)"),
        ("SELECT 8 / 4 % 3", "(Modulo (Divide 8 4) 3)"),
        ("SELECT -1 + 2", "(Add (Minus 1) 2)"),
        ("SELECT ~1 & 2", "(BitAnd (BitNot 1) 2)"),
        ("SELECT 1 | 2 ^ 3 & 4", "(BitOr 1 (BitXor 2 (BitAnd 3 4)))"),
        ("SELECT 1 + 2 & 3", "(BitAnd (Add 1 2) 3)"),
        ("SELECT (1 + 2) * 3", "(Multiply (Add 1 2) 3)"),
    ];
    for (sql, expected) in cases {
        assert_eq!(shape(&select_expr(sql)), expected, "{sql}");
    }
}

#[test]
fn test_boolean_precedence_in_where() {
    let output = parse("SELECT a FROM t WHERE NOT x = 1 OR y = 2 AND z IS NOT NULL");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let StatementKind::Select(query) = &output.statements().next().unwrap().kind else {
        panic!("expected SELECT");
    };
    let selection = query.first_select().unwrap().selection.as_ref().unwrap();
    assert_eq!(
        shape(selection),
        "(Or (Not (Eq x 1)) (And (Eq y 2) (IsNullNot z)))"
    );
}

#[test]
fn test_comparison_operators() {
    let cases = [
        ("SELECT 1 WHERE a <> b", BinaryOp::NotEq),
        ("SELECT 1 WHERE a != b", BinaryOp::NotEq),
        ("SELECT 1 WHERE a !< b", BinaryOp::NotLt),
        ("SELECT 1 WHERE a !> b", BinaryOp::NotGt),
        ("SELECT 1 WHERE a <= b", BinaryOp::LtEq),
        ("SELECT 1 WHERE a >= b", BinaryOp::GtEq),
    ];
    for (sql, expected) in cases {
        let output = parse(sql);
        assert!(output.diagnostics.is_empty(), "{sql}: {:?}", output.diagnostics);
        let StatementKind::Select(query) = &output.statements().next().unwrap().kind else {
            panic!("expected SELECT");
        };
        let selection = query.first_select().unwrap().selection.clone().unwrap();
        match selection.kind {
            ExprKind::Binary { op, .. } => assert_eq!(op, expected, "{sql}"),
            other => panic!("{sql}: expected comparison, got {other:?}"),
        }
    }
}

#[test]
fn test_deep_parentheses_unnest_to_literal() {
    let depth = 200;
    let sql = format!("SELECT {}42{}", "(".repeat(depth), ")".repeat(depth));
    let expr = select_expr(&sql);
    assert_eq!(
        expr.unnested().kind,
        ExprKind::Literal(Literal::Integer("42".to_string()))
    );
}

#[test]
fn test_function_calls_and_niladic_functions() {
    assert_eq!(
        shape(&select_expr("SELECT ISNULL(@x, COALESCE(a, 0))")),
        "ISNULL(@x COALESCE(a 0))"
    );
    let ExprKind::Function(call) = select_expr("SELECT CURRENT_TIMESTAMP").kind else {
        panic!("expected niladic function");
    };
    assert!(call.niladic);
    assert!(call.args.is_empty());
}

#[test]
fn test_unary_not_wraps_exists() {
    let output = parse("SELECT 1 WHERE NOT EXISTS (SELECT 1 FROM t)");
    assert!(output.diagnostics.is_empty());
    let StatementKind::Select(query) = &output.statements().next().unwrap().kind else {
        panic!("expected SELECT");
    };
    let selection = query.first_select().unwrap().selection.as_ref().unwrap();
    let ExprKind::Unary { op, expr } = &selection.kind else {
        panic!("expected NOT");
    };
    assert_eq!(*op, UnaryOp::Not);
    assert!(matches!(expr.kind, ExprKind::Exists(_)));
}

#[test]
fn test_string_literals_decode_escapes() {
    assert_eq!(
        select_expr("SELECT N'It''s'").kind,
        ExprKind::Literal(Literal::String {
            value: "It's".to_string(),
            unicode: true,
        })
    );
}
