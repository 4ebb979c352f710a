//! INSERT, UPDATE, DELETE, MERGE and TRUNCATE parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! [WITH cte AS (...)]
//! INSERT [TOP (n) [PERCENT]] [INTO] target [WITH (hints)] [(columns)]
//!   [OUTPUT ... [INTO @t [(columns)]]]
//!   { VALUES (...) [, ...] | DEFAULT VALUES | query | EXEC proc ... }
//!
//! UPDATE [TOP (n)] target [WITH (hints)]
//!   SET col = expr | @v += expr | col.WRITE(expr, offset, length) [, ...]
//!   [OUTPUT ...] [FROM sources] [WHERE cond | WHERE CURRENT OF [GLOBAL] cursor]
//!   [OPTION (hints)]
//!
//! DELETE [TOP (n)] [FROM] target [OUTPUT ...] [FROM sources] [WHERE ...] [OPTION (...)]
//!
//! MERGE [TOP (n)] [INTO] target [WITH (hints)] [[AS] alias]
//!   USING source ON cond
//!   WHEN MATCHED [AND cond] THEN {UPDATE SET ... | DELETE}
//!   WHEN NOT MATCHED [BY TARGET] [AND cond] THEN INSERT [(cols)] {VALUES (...) | DEFAULT VALUES}
//!   WHEN NOT MATCHED BY SOURCE [AND cond] THEN {UPDATE SET ... | DELETE}
//!   [OUTPUT ...] [OPTION (...)];
//!
//! TRUNCATE TABLE name [WITH (PARTITIONS (1, 3 TO 5))]
//! ```

use super::keywords::Keyword;
use super::query_parser::assignment_op;
use super::token_parser_base::{ParseResult, TokenParser};
use super::token::Op;
use crate::ast::{
    Assignment, AssignmentOp, CurrentOf, DeleteStatement, Expr, ExprKind, InsertSource,
    InsertStatement, MergeAction, MergeClause, MergeMatch, MergeStatement, OutputClause,
    OutputInto, TableSource, TruncateStatement, UpdateStatement, WithClause,
};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    fn dml_start(&self, with: &Option<WithClause>) -> SourceSpan {
        with.as_ref().map_or_else(|| self.current_span(), |w| w.span)
    }

    // ========================================================================
    // INSERT
    // ========================================================================

    pub fn parse_insert(&mut self, with: Option<WithClause>) -> ParseResult<InsertStatement> {
        let start = self.dml_start(&with);
        self.expect_keyword(Keyword::INSERT)?;
        let top = self.parse_top()?;
        self.eat_keyword(Keyword::INTO);
        let target = self.parse_dml_target(false)?;

        let columns = if self.check_op(Op::LParen) && !self.starts_subquery_at(1) {
            self.parse_parenthesized_identifiers()?
        } else {
            Vec::new()
        };

        let output = self.parse_output_clauses()?;

        let (source, hints) = if self.check_keyword(Keyword::DEFAULT)
            && self.check_keyword_at(1, Keyword::VALUES)
        {
            self.advance();
            self.advance();
            (InsertSource::DefaultValues, self.parse_option_clause()?)
        } else if self.eat_keyword(Keyword::VALUES) {
            let rows = self.parse_values_rows()?;
            (InsertSource::Values(rows), self.parse_option_clause()?)
        } else if self.check_keyword(Keyword::EXEC) || self.check_keyword(Keyword::EXECUTE) {
            let exec = self.parse_execute()?;
            (InsertSource::Execute(Box::new(exec)), Vec::new())
        } else {
            let query = self.parse_query()?;
            (InsertSource::Query(Box::new(query)), Vec::new())
        };

        Ok(InsertStatement {
            with,
            top,
            target,
            columns,
            output,
            source,
            hints,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // UPDATE
    // ========================================================================

    pub fn parse_update(&mut self, with: Option<WithClause>) -> ParseResult<UpdateStatement> {
        let start = self.dml_start(&with);
        self.expect_keyword(Keyword::UPDATE)?;
        let top = self.parse_top()?;
        let target = self.parse_dml_target(false)?;
        self.expect_keyword(Keyword::SET)?;
        let assignments = self.parse_comma_separated(Self::parse_assignment)?;
        let output = self.parse_output_clauses()?;
        let from = self.parse_dml_from()?;
        let (selection, current_of) = self.parse_dml_where()?;
        let hints = self.parse_option_clause()?;
        Ok(UpdateStatement {
            with,
            top,
            target,
            assignments,
            output,
            from,
            selection,
            current_of,
            hints,
            span: self.span_from(start),
        })
    }

    /// One `SET` list entry.
    pub(crate) fn parse_assignment(&mut self) -> ParseResult<Assignment> {
        let start = self.current_span();
        let target = self.parse_operand()?;

        if let Some(op) = self.peek().op().and_then(assignment_op) {
            self.advance();
            let value = self.parse_expr()?;
            return Ok(Assignment {
                target,
                op,
                value,
                span: self.span_from(start),
            });
        }

        // col.WRITE(expr, offset, length)
        if let ExprKind::MethodCall {
            target: column,
            method,
            ..
        } = &target.kind
        {
            if method.matches("WRITE") {
                let column = (**column).clone();
                return Ok(Assignment {
                    target: column,
                    op: AssignmentOp::Assign,
                    value: target,
                    span: self.span_from(start),
                });
            }
        }
        Err(self.expected("'='"))
    }

    // ========================================================================
    // DELETE
    // ========================================================================

    pub fn parse_delete(&mut self, with: Option<WithClause>) -> ParseResult<DeleteStatement> {
        let start = self.dml_start(&with);
        self.expect_keyword(Keyword::DELETE)?;
        let top = self.parse_top()?;
        self.eat_keyword(Keyword::FROM);
        let target = self.parse_dml_target(false)?;
        let output = self.parse_output_clauses()?;
        let from = self.parse_dml_from()?;
        let (selection, current_of) = self.parse_dml_where()?;
        let hints = self.parse_option_clause()?;
        Ok(DeleteStatement {
            with,
            top,
            target,
            output,
            from,
            selection,
            current_of,
            hints,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // MERGE
    // ========================================================================

    pub fn parse_merge(&mut self, with: Option<WithClause>) -> ParseResult<MergeStatement> {
        let start = self.dml_start(&with);
        self.expect_keyword(Keyword::MERGE)?;
        let top = self.parse_top()?;
        self.eat_keyword(Keyword::INTO);
        let target = self.parse_dml_target(true)?;
        self.expect_word_ci("USING")?;
        let source = self.parse_table_source()?;
        self.expect_keyword(Keyword::ON)?;
        let on = self.parse_expr()?;

        let mut clauses = Vec::new();
        while self.check_keyword(Keyword::WHEN) {
            clauses.push(self.parse_merge_clause()?);
        }
        if clauses.is_empty() {
            return Err(self.expected("WHEN"));
        }

        let output = self.parse_output_clauses()?;
        let hints = self.parse_option_clause()?;
        Ok(MergeStatement {
            with,
            top,
            target,
            source,
            on,
            clauses,
            output,
            hints,
            span: self.span_from(start),
        })
    }

    fn parse_merge_clause(&mut self) -> ParseResult<MergeClause> {
        let start = self.expect_keyword(Keyword::WHEN)?;
        let kind = if self.eat_word_ci("MATCHED") {
            MergeMatch::Matched
        } else {
            self.expect_keyword(Keyword::NOT)?;
            self.expect_word_ci("MATCHED")?;
            if self.eat_keyword(Keyword::BY) {
                if self.eat_word_ci("SOURCE") {
                    MergeMatch::NotMatchedBySource
                } else {
                    self.expect_word_ci("TARGET")?;
                    MergeMatch::NotMatchedByTarget
                }
            } else {
                MergeMatch::NotMatchedByTarget
            }
        };
        let condition = if self.eat_keyword(Keyword::AND) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect_keyword(Keyword::THEN)?;

        let action = if self.eat_keyword(Keyword::UPDATE) {
            self.expect_keyword(Keyword::SET)?;
            MergeAction::Update(self.parse_comma_separated(Self::parse_assignment)?)
        } else if self.eat_keyword(Keyword::DELETE) {
            MergeAction::Delete
        } else if self.eat_keyword(Keyword::INSERT) {
            let columns = if self.check_op(Op::LParen) {
                self.parse_parenthesized_identifiers()?
            } else {
                Vec::new()
            };
            let values = if self.eat_keyword(Keyword::DEFAULT) {
                self.expect_keyword(Keyword::VALUES)?;
                None
            } else {
                self.expect_keyword(Keyword::VALUES)?;
                self.expect_op(Op::LParen)?;
                let values = self.parse_expr_list()?;
                self.expect_op(Op::RParen)?;
                Some(values)
            };
            MergeAction::Insert { columns, values }
        } else {
            return Err(self.expected("UPDATE, DELETE or INSERT"));
        };

        if kind == MergeMatch::NotMatchedByTarget && !matches!(action, MergeAction::Insert { .. }) {
            return Err(self.error_at(
                "WHEN NOT MATCHED BY TARGET only allows INSERT",
                self.span_from(start),
            ));
        }
        if kind != MergeMatch::NotMatchedByTarget && matches!(action, MergeAction::Insert { .. }) {
            return Err(self.error_at(
                "INSERT is only allowed in WHEN NOT MATCHED [BY TARGET]",
                self.span_from(start),
            ));
        }

        Ok(MergeClause {
            kind,
            condition,
            action,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // TRUNCATE
    // ========================================================================

    pub fn parse_truncate(&mut self) -> ParseResult<TruncateStatement> {
        let start = self.expect_keyword(Keyword::TRUNCATE)?;
        self.expect_keyword(Keyword::TABLE)?;
        let table = self.parse_object_name()?;
        let partitions = if self.check_keyword(Keyword::WITH) && self.check_op_at(1, Op::LParen) {
            self.advance();
            let span = self.consume_parenthesized()?;
            Some(self.text(span).to_string())
        } else {
            None
        };
        Ok(TruncateStatement {
            table,
            partitions,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // Shared clauses
    // ========================================================================

    /// The modified object of a DML statement: table (with `WITH` hints),
    /// table variable, or rowset function such as `OPENQUERY`.
    pub(crate) fn parse_dml_target(&mut self, allow_alias: bool) -> ParseResult<TableSource> {
        let start = self.current_span();
        if self.check_variable() {
            let name = self.parse_variable_name()?;
            let alias = if allow_alias {
                self.parse_table_alias(false)?
            } else {
                None
            };
            return Ok(TableSource::Variable {
                name,
                alias,
                span: self.span_from(start),
            });
        }
        if self.peek().keyword().is_some_and(|kw| kw.is_function_name()) {
            let call = self.parse_operand()?;
            return Ok(TableSource::Function {
                call,
                with_schema: None,
                alias: None,
                span: self.span_from(start),
            });
        }

        let name = self.parse_object_name()?;
        let mut hints = self.parse_with_table_hints()?;
        let alias = if allow_alias {
            self.parse_table_alias(false)?
        } else {
            None
        };
        hints.extend(self.parse_with_table_hints()?);
        Ok(TableSource::Named {
            name,
            alias,
            hints,
            legacy_hints: false,
            tablesample: None,
            temporal: None,
            span: self.span_from(start),
        })
    }

    fn parse_with_table_hints(&mut self) -> ParseResult<Vec<crate::ast::TableHint>> {
        if self.check_keyword(Keyword::WITH) && self.check_op_at(1, Op::LParen) {
            self.advance();
            self.parse_table_hint_list()
        } else {
            Ok(Vec::new())
        }
    }

    /// Zero or more `OUTPUT items [INTO target [(columns)]]` clauses.
    pub(crate) fn parse_output_clauses(&mut self) -> ParseResult<Vec<OutputClause>> {
        let mut clauses = Vec::new();
        while self.check_word_ci("OUTPUT") {
            let start = self.advance().span;
            let items = self.parse_comma_separated(Self::parse_select_item)?;
            let into = if self.eat_keyword(Keyword::INTO) {
                let target = self.parse_dml_target(false)?;
                let columns = if self.check_op(Op::LParen) {
                    self.parse_parenthesized_identifiers()?
                } else {
                    Vec::new()
                };
                Some(OutputInto { target, columns })
            } else {
                None
            };
            clauses.push(OutputClause {
                items,
                into,
                span: self.span_from(start),
            });
        }
        Ok(clauses)
    }

    fn parse_dml_from(&mut self) -> ParseResult<Vec<TableSource>> {
        if self.eat_keyword(Keyword::FROM) {
            self.parse_comma_separated(Self::parse_table_source)
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_dml_where(&mut self) -> ParseResult<(Option<Expr>, Option<CurrentOf>)> {
        if !self.eat_keyword(Keyword::WHERE) {
            return Ok((None, None));
        }
        if self.check_keyword(Keyword::CURRENT) && self.check_keyword_at(1, Keyword::OF) {
            self.advance();
            self.advance();
            let global = self.eat_word_ci("GLOBAL");
            let cursor = if self.check_variable() {
                self.parse_variable_name()?
            } else {
                self.parse_identifier()?.value
            };
            return Ok((None, Some(CurrentOf { global, cursor })));
        }
        Ok((Some(self.parse_expr()?), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{MergeAction, SelectItem};
    use crate::parser::lexer::Lexer;

    fn parser(sql: &str) -> TokenParser<'_> {
        TokenParser::new(sql, Lexer::new(sql), SourceSpan::default())
    }

    #[test]
    fn test_insert_values_with_columns() {
        let sql = "INSERT INTO dbo.Users (Id, Name) VALUES (1, N'a'), (2, DEFAULT)";
        let insert = parser(sql).parse_insert(None).unwrap();
        assert_eq!(insert.columns.len(), 2);
        let InsertSource::Values(rows) = insert.source else {
            panic!("expected VALUES");
        };
        assert_eq!(rows.len(), 2);
        assert!(matches!(rows[1][1].kind, ExprKind::Default));
    }

    #[test]
    fn test_insert_select_and_exec() {
        let insert = parser("INSERT #t SELECT a FROM b").parse_insert(None).unwrap();
        assert!(matches!(insert.source, InsertSource::Query(_)));

        let insert = parser("INSERT INTO @t (a) EXEC dbo.GetRows @id = 1")
            .parse_insert(None)
            .unwrap();
        assert!(matches!(insert.target, TableSource::Variable { .. }));
        assert!(matches!(insert.source, InsertSource::Execute(_)));

        let insert = parser("INSERT INTO t DEFAULT VALUES").parse_insert(None).unwrap();
        assert_eq!(insert.source, InsertSource::DefaultValues);
    }

    #[test]
    fn test_insert_output_into() {
        let insert = parser(
            "INSERT INTO t (a) OUTPUT inserted.id, inserted.a INTO @ids (id, a) VALUES (1)",
        )
        .parse_insert(None)
        .unwrap();
        assert_eq!(insert.output.len(), 1);
        let output = &insert.output[0];
        assert_eq!(output.items.len(), 2);
        assert_eq!(output.into.as_ref().unwrap().columns.len(), 2);
    }

    #[test]
    fn test_update_with_from_and_compound_assignment() {
        let update = parser(
            "UPDATE TOP (10) o SET o.Total += 1, @n = o.Id FROM dbo.Orders o JOIN c ON c.id = o.cid WHERE o.Total > 0 OPTION (MAXDOP 1)",
        )
        .parse_update(None)
        .unwrap();
        assert!(update.top.is_some());
        assert_eq!(update.assignments.len(), 2);
        assert_eq!(update.assignments[0].op, AssignmentOp::Add);
        assert_eq!(update.from.len(), 1);
        assert!(update.selection.is_some());
        assert_eq!(update.hints.len(), 1);
    }

    #[test]
    fn test_update_write_method() {
        let update = parser("UPDATE d SET Body.WRITE(N'x', 0, 1) WHERE Id = 1")
            .parse_update(None)
            .unwrap();
        let assignment = &update.assignments[0];
        assert!(matches!(&assignment.target.kind, ExprKind::Column(n) if n.name().matches("Body")));
        assert!(matches!(assignment.value.kind, ExprKind::MethodCall { .. }));
    }

    #[test]
    fn test_delete_current_of() {
        let delete = parser("DELETE FROM t WHERE CURRENT OF GLOBAL c1")
            .parse_delete(None)
            .unwrap();
        let current = delete.current_of.unwrap();
        assert!(current.global);
        assert_eq!(current.cursor, "c1");
    }

    #[test]
    fn test_delete_with_output() {
        let delete = parser("DELETE TOP (5) FROM q WITH (READPAST) OUTPUT deleted.* WHERE id < 10")
            .parse_delete(None)
            .unwrap();
        assert_eq!(delete.output.len(), 1);
        assert!(matches!(
            delete.output[0].items[0],
            SelectItem::Expr { .. }
        ));
    }

    #[test]
    fn test_merge_clauses() {
        let merge = parser(
            "MERGE INTO dbo.Target WITH (HOLDLOCK) AS t \
             USING (SELECT id, v FROM s) AS src ON t.id = src.id \
             WHEN MATCHED AND t.v <> src.v THEN UPDATE SET t.v = src.v \
             WHEN NOT MATCHED THEN INSERT (id, v) VALUES (src.id, src.v) \
             WHEN NOT MATCHED BY SOURCE THEN DELETE \
             OUTPUT $action, inserted.id;",
        )
        .parse_merge(None)
        .unwrap();
        assert_eq!(merge.clauses.len(), 3);
        assert_eq!(merge.clauses[1].kind, MergeMatch::NotMatchedByTarget);
        assert!(matches!(merge.clauses[2].action, MergeAction::Delete));
        assert_eq!(merge.output.len(), 1);
    }

    #[test]
    fn test_merge_rejects_insert_when_matched() {
        let result = parser("MERGE t USING s ON t.id = s.id WHEN MATCHED THEN INSERT VALUES (1)")
            .parse_merge(None);
        assert!(result.is_err());
    }

    #[test]
    fn test_truncate_partitions() {
        let truncate = parser("TRUNCATE TABLE dbo.Big WITH (PARTITIONS (1, 3 TO 5))")
            .parse_truncate()
            .unwrap();
        assert_eq!(truncate.table.name().value, "Big");
        assert_eq!(
            truncate.partitions.as_deref(),
            Some("(PARTITIONS (1, 3 TO 5))")
        );
    }
}
