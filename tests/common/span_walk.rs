//! Walks a parsed tree and records every child whose span escapes its parent

use rust_tsqlparser::ast::{
    Batch, DeclareItem, Expr, ExprKind, FunctionBody, FunctionCall, GroupingElement,
    InsertSource, MergeAction, OrderByItem, ProcedureBody, Query, QueryExpr, SelectItem,
    SelectSpec, SetValue, Statement, StatementKind, TableSource, WindowSpec,
};
use rust_tsqlparser::SourceSpan;

/// Collects containment violations as `"<child> <span> outside <parent>"`.
#[derive(Default)]
pub struct SpanWalk {
    pub violations: Vec<String>,
    pub checked: usize,
}

/// All violations in `batches`; empty when every node nests properly.
pub fn span_violations(batches: &[Batch]) -> SpanWalk {
    let mut walk = SpanWalk::default();
    for batch in batches {
        for statement in &batch.statements {
            walk.check(batch.span, statement.span, "statement");
            walk.statement(statement);
        }
    }
    walk
}

impl SpanWalk {
    fn check(&mut self, parent: SourceSpan, child: SourceSpan, what: &str) {
        self.checked += 1;
        if !parent.contains(&child) {
            self.violations
                .push(format!("{what} {child:?} outside {parent:?}"));
        }
    }

    pub fn statement(&mut self, statement: &Statement) {
        let span = statement.span;
        match &statement.kind {
            StatementKind::Select(query) => self.query_in(span, query),
            StatementKind::Insert(insert) => {
                self.check(span, insert.span, "insert");
                self.table_source_in(insert.span, &insert.target);
                match &insert.source {
                    InsertSource::Values(rows) => {
                        for expr in rows.iter().flatten() {
                            self.expr_in(insert.span, expr);
                        }
                    }
                    InsertSource::Query(query) => self.query_in(insert.span, query),
                    InsertSource::DefaultValues | InsertSource::Execute(_) => {}
                }
            }
            StatementKind::Update(update) => {
                self.check(span, update.span, "update");
                self.table_source_in(update.span, &update.target);
                for assignment in &update.assignments {
                    self.check(update.span, assignment.span, "assignment");
                    self.expr_in(assignment.span, &assignment.target);
                    self.expr_in(assignment.span, &assignment.value);
                }
                for source in &update.from {
                    self.table_source_in(update.span, source);
                }
                if let Some(selection) = &update.selection {
                    self.expr_in(update.span, selection);
                }
            }
            StatementKind::Delete(delete) => {
                self.check(span, delete.span, "delete");
                self.table_source_in(delete.span, &delete.target);
                for source in &delete.from {
                    self.table_source_in(delete.span, source);
                }
                if let Some(selection) = &delete.selection {
                    self.expr_in(delete.span, selection);
                }
            }
            StatementKind::Merge(merge) => {
                self.check(span, merge.span, "merge");
                self.table_source_in(merge.span, &merge.target);
                self.table_source_in(merge.span, &merge.source);
                self.expr_in(merge.span, &merge.on);
                for clause in &merge.clauses {
                    self.check(merge.span, clause.span, "merge clause");
                    if let Some(condition) = &clause.condition {
                        self.expr_in(clause.span, condition);
                    }
                    match &clause.action {
                        MergeAction::Update(assignments) => {
                            for assignment in assignments {
                                self.check(clause.span, assignment.span, "assignment");
                                self.expr_in(assignment.span, &assignment.value);
                            }
                        }
                        MergeAction::Insert {
                            values: Some(values),
                            ..
                        } => {
                            for value in values {
                                self.expr_in(clause.span, value);
                            }
                        }
                        _ => {}
                    }
                }
            }
            StatementKind::Procedure(procedure) => {
                self.check(span, procedure.span, "procedure");
                if let ProcedureBody::Statements(body) = &procedure.body {
                    self.statements_in(procedure.span, body);
                }
            }
            StatementKind::Function(function) => {
                self.check(span, function.span, "function");
                match &function.body {
                    FunctionBody::Block(body) => self.statements_in(function.span, body),
                    FunctionBody::Return(query) => self.query_in(function.span, query),
                    FunctionBody::External(_) => {}
                }
            }
            StatementKind::Trigger(trigger) => {
                self.check(span, trigger.span, "trigger");
                if let ProcedureBody::Statements(body) = &trigger.body {
                    self.statements_in(trigger.span, body);
                }
            }
            StatementKind::View(view) => {
                self.check(span, view.span, "view");
                self.query_in(view.span, &view.query);
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expr_in(span, condition);
                self.statement_in(span, then_branch);
                if let Some(else_branch) = else_branch {
                    self.statement_in(span, else_branch);
                }
            }
            StatementKind::While { condition, body } => {
                self.expr_in(span, condition);
                self.statement_in(span, body);
            }
            StatementKind::Block(body) => self.statements_in(span, body),
            StatementKind::TryCatch {
                try_block,
                catch_block,
            } => {
                self.statements_in(span, try_block);
                self.statements_in(span, catch_block);
            }
            StatementKind::Print(expr) | StatementKind::Return(Some(expr)) => {
                self.expr_in(span, expr)
            }
            StatementKind::SetVariable(set) => {
                if let SetValue::Expr(expr) = &set.value {
                    self.expr_in(span, expr);
                }
            }
            StatementKind::Declare(items) => {
                for item in items {
                    if let DeclareItem::Variable {
                        value: Some(value),
                        span: item_span,
                        ..
                    } = item
                    {
                        self.check(span, *item_span, "declare item");
                        self.expr_in(*item_span, value);
                    }
                }
            }
            _ => {}
        }
    }

    fn statement_in(&mut self, parent: SourceSpan, statement: &Statement) {
        self.check(parent, statement.span, "statement");
        self.statement(statement);
    }

    fn statements_in(&mut self, parent: SourceSpan, statements: &[Statement]) {
        for statement in statements {
            self.statement_in(parent, statement);
        }
    }

    pub fn query_in(&mut self, parent: SourceSpan, query: &Query) {
        self.check(parent, query.span, "query");
        let span = query.span;
        if let Some(with) = &query.with {
            self.check(span, with.span, "with clause");
            for cte in &with.ctes {
                self.check(with.span, cte.span, "cte");
                self.query_in(cte.span, &cte.query);
            }
        }
        self.query_expr_in(span, &query.body);
        self.order_by_in(span, &query.order_by);
        if let Some(offset_fetch) = &query.offset_fetch {
            self.expr_in(span, &offset_fetch.offset);
            if let Some(fetch) = &offset_fetch.fetch {
                self.expr_in(span, fetch);
            }
        }
    }

    fn query_expr_in(&mut self, parent: SourceSpan, body: &QueryExpr) {
        match body {
            QueryExpr::Select(select) => self.select_in(parent, select),
            QueryExpr::SetOperation {
                left, right, span, ..
            } => {
                self.check(parent, *span, "set operation");
                self.query_expr_in(*span, left);
                self.query_expr_in(*span, right);
            }
            QueryExpr::Parenthesized(query) => self.query_in(parent, query),
        }
    }

    fn select_in(&mut self, parent: SourceSpan, select: &SelectSpec) {
        self.check(parent, select.span, "select");
        let span = select.span;
        if let Some(top) = &select.top {
            self.check(span, top.span, "top");
            self.expr_in(top.span, &top.quantity);
        }
        for item in &select.items {
            self.check(span, item.span(), "select item");
            match item {
                SelectItem::Expr { expr, span: item_span, .. }
                | SelectItem::Assignment { expr, span: item_span, .. } => {
                    self.expr_in(*item_span, expr)
                }
            }
        }
        for source in &select.from {
            self.table_source_in(span, source);
        }
        if let Some(selection) = &select.selection {
            self.expr_in(span, selection);
        }
        if let Some(group_by) = &select.group_by {
            self.check(span, group_by.span, "group by");
            for element in &group_by.items {
                match element {
                    GroupingElement::Expr(expr) => self.expr_in(group_by.span, expr),
                    GroupingElement::Rollup(exprs) | GroupingElement::Cube(exprs) => {
                        for expr in exprs {
                            self.expr_in(group_by.span, expr);
                        }
                    }
                    GroupingElement::GroupingSets(sets) => {
                        for expr in sets.iter().flatten() {
                            self.expr_in(group_by.span, expr);
                        }
                    }
                    GroupingElement::Empty => {}
                }
            }
        }
        if let Some(having) = &select.having {
            self.expr_in(span, having);
        }
    }

    pub fn table_source_in(&mut self, parent: SourceSpan, source: &TableSource) {
        let span = source.span();
        self.check(parent, span, "table source");
        match source {
            TableSource::Derived { subquery, .. } => self.query_in(span, subquery),
            TableSource::Values { rows, .. } => {
                for expr in rows.iter().flatten() {
                    self.expr_in(span, expr);
                }
            }
            TableSource::Function { call, .. } => self.expr_in(span, call),
            TableSource::Join {
                left, right, on, ..
            } => {
                self.table_source_in(span, left);
                self.table_source_in(span, right);
                if let Some(on) = on {
                    self.expr_in(span, on);
                }
            }
            TableSource::Pivot {
                source,
                aggregate,
                pivot_column,
                ..
            } => {
                self.table_source_in(span, source);
                self.function_in(span, aggregate);
                self.expr_in(span, pivot_column);
            }
            TableSource::Unpivot { source, .. } | TableSource::Nested { source, .. } => {
                self.table_source_in(span, source)
            }
            TableSource::Named { .. } | TableSource::Variable { .. } => {}
        }
    }

    fn function_in(&mut self, parent: SourceSpan, call: &FunctionCall) {
        self.check(parent, call.span, "function call");
        for arg in &call.args {
            self.expr_in(call.span, arg);
        }
        self.order_by_in(call.span, &call.within_group);
    }

    fn order_by_in(&mut self, parent: SourceSpan, items: &[OrderByItem]) {
        for item in items {
            self.check(parent, item.span, "order by item");
            self.expr_in(item.span, &item.expr);
        }
    }

    fn window_in(&mut self, parent: SourceSpan, over: &WindowSpec) {
        self.check(parent, over.span, "window");
        for expr in &over.partition_by {
            self.expr_in(over.span, expr);
        }
        self.order_by_in(over.span, &over.order_by);
    }

    pub fn expr_in(&mut self, parent: SourceSpan, expr: &Expr) {
        self.check(parent, expr.span, "expression");
        let span = expr.span;
        match &expr.kind {
            ExprKind::Unary { expr: inner, .. }
            | ExprKind::IsNull { expr: inner, .. }
            | ExprKind::Nested(inner)
            | ExprKind::Collate { expr: inner, .. }
            | ExprKind::MemberAccess { target: inner, .. } => self.expr_in(span, inner),
            ExprKind::Binary { left, right, .. }
            | ExprKind::LegacyOuterJoin { left, right, .. }
            | ExprKind::AtTimeZone {
                expr: left,
                zone: right,
            } => {
                self.expr_in(span, left);
                self.expr_in(span, right);
            }
            ExprKind::Function(call) => self.function_in(span, call),
            ExprKind::Window { function, over } => {
                self.function_in(span, function);
                self.window_in(span, over);
            }
            ExprKind::Case {
                operand,
                when_clauses,
                else_result,
            } => {
                for inner in operand.iter().chain(else_result.iter()) {
                    self.expr_in(span, inner);
                }
                for clause in when_clauses {
                    self.expr_in(span, &clause.condition);
                    self.expr_in(span, &clause.result);
                }
            }
            ExprKind::Subquery(query) | ExprKind::Exists(query) => self.query_in(span, query),
            ExprKind::Between {
                expr: inner,
                low,
                high,
            } => {
                self.expr_in(span, inner);
                self.expr_in(span, low);
                self.expr_in(span, high);
            }
            ExprKind::InList { expr: inner, list } => {
                self.expr_in(span, inner);
                for item in list {
                    self.expr_in(span, item);
                }
            }
            ExprKind::InSubquery {
                expr: inner,
                subquery,
            } => {
                self.expr_in(span, inner);
                self.query_in(span, subquery);
            }
            ExprKind::Like {
                expr: inner,
                pattern,
                escape,
            } => {
                self.expr_in(span, inner);
                self.expr_in(span, pattern);
                if let Some(escape) = escape {
                    self.expr_in(span, escape);
                }
            }
            ExprKind::Quantified { left, subquery, .. } => {
                self.expr_in(span, left);
                self.query_in(span, subquery);
            }
            ExprKind::Cast { expr: inner, .. } => self.expr_in(span, inner),
            ExprKind::Convert {
                expr: inner, style, ..
            } => {
                self.expr_in(span, inner);
                if let Some(style) = style {
                    self.expr_in(span, style);
                }
            }
            ExprKind::Parse {
                expr: inner,
                culture,
                ..
            } => {
                self.expr_in(span, inner);
                if let Some(culture) = culture {
                    self.expr_in(span, culture);
                }
            }
            ExprKind::MethodCall { target, args, .. } => {
                self.expr_in(span, target);
                for arg in args {
                    self.expr_in(span, arg);
                }
            }
            ExprKind::StaticMethodCall { args, .. } => {
                for arg in args {
                    self.expr_in(span, arg);
                }
            }
            ExprKind::NextValueFor { over: Some(over), .. } => self.window_in(span, over),
            _ => {}
        }
    }
}
