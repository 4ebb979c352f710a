//! SELECT query parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! [WITH cte [(cols)] AS (query) [, ...]]
//! SELECT [ALL | DISTINCT] [TOP (n) [PERCENT] [WITH TIES]] items
//!   [INTO new_table] [FROM sources] [WHERE cond]
//!   [GROUP BY [ALL] items | ROLLUP(...) | CUBE(...) | GROUPING SETS(...) [WITH ROLLUP | CUBE]]
//!   [HAVING cond]
//! [{UNION [ALL] | EXCEPT | INTERSECT} ...]
//! [ORDER BY items [OFFSET n ROWS [FETCH NEXT m ROWS ONLY]]]
//! [COMPUTE fn(expr) [BY expr]]
//! [FOR BROWSE | FOR XML mode [, directives] | FOR JSON mode [, directives]]
//! [OPTION (hints)]
//! ```

use super::keywords::Keyword;
use super::token::{Op, TokenKind};
use super::token_parser_base::{grow_stack, ParseResult, TokenParser};
use crate::ast::{
    AssignmentOp, ComputeClause, Cte, ExprKind, ForClause, GroupBy, GroupByModifier,
    GroupingElement, Ident, JoinHint, JsonMode, LegacyConstruct, OffsetFetch,
    OptimizeForVariable, Query, QueryExpr, QueryHint, QueryHintKind, RawOption, SelectItem,
    SelectSpec, SetOperator, TableSource, Top, WithClause, XmlMode,
};
use crate::diagnostics::Diagnostic;
use crate::source::SourceSpan;

/// Words that never act as an implicit column alias because they begin the
/// next statement.
const NON_ALIAS_WORDS: &[&str] = &["THROW", "RECEIVE", "SEND", "ENABLE", "DISABLE", "MOVE", "GET"];

impl<'a> TokenParser<'a> {
    /// Parse a complete query, including a leading `WITH` clause.
    pub fn parse_query(&mut self) -> ParseResult<Query> {
        grow_stack(|| self.parse_query_with_prefix())
    }

    fn parse_query_with_prefix(&mut self) -> ParseResult<Query> {
        let with = if self.check_keyword(Keyword::WITH) {
            Some(self.parse_with_clause()?)
        } else {
            None
        };
        self.parse_query_after_with(with)
    }

    /// Parse a query whose `WITH` clause (if any) was already consumed.
    pub(crate) fn parse_query_after_with(&mut self, with: Option<WithClause>) -> ParseResult<Query> {
        let start = with
            .as_ref()
            .map_or_else(|| self.current_span(), |w| w.span);
        let body = self.parse_query_expr()?;

        let mut order_by = Vec::new();
        if self.check_keyword(Keyword::ORDER) && self.check_keyword_at(1, Keyword::BY) {
            self.advance();
            self.advance();
            order_by = self.parse_order_by_list()?;
        }
        let offset_fetch = self.parse_offset_fetch()?;

        let mut compute = Vec::new();
        while self.check_keyword(Keyword::COMPUTE) {
            compute.push(self.parse_compute_clause()?);
        }

        let for_clause = self.parse_for_clause()?;
        let hints = self.parse_option_clause()?;

        Ok(Query {
            with,
            body,
            order_by,
            offset_fetch,
            compute,
            for_clause,
            hints,
            span: self.span_from(start),
        })
    }

    /// `( query )`; returns the query and the span of the closing parenthesis.
    pub(crate) fn parse_parenthesized_query(&mut self) -> ParseResult<(Query, SourceSpan)> {
        self.expect_op(Op::LParen)?;
        let query = self.parse_query()?;
        let close = self.expect_op(Op::RParen)?;
        Ok((query, close))
    }

    // ========================================================================
    // Common table expressions
    // ========================================================================

    pub(crate) fn parse_with_clause(&mut self) -> ParseResult<WithClause> {
        let start = self.expect_keyword(Keyword::WITH)?;
        let mut ctes = Vec::new();
        loop {
            if self.check_word_ci("XMLNAMESPACES") && self.check_op_at(1, Op::LParen) {
                let word = self.advance().span;
                let span = word.to(self.consume_parenthesized()?);
                self.push_diagnostic(Diagnostic::unsupported(
                    "WITH XMLNAMESPACES declarations are not interpreted",
                    span,
                ));
            } else {
                ctes.push(self.parse_cte()?);
            }
            if !self.eat_op(Op::Comma) {
                break;
            }
        }
        for cte in &ctes {
            self.validate_recursive_cte(cte);
        }
        Ok(WithClause {
            ctes,
            span: self.span_from(start),
        })
    }

    fn parse_cte(&mut self) -> ParseResult<Cte> {
        let name = self.parse_identifier()?;
        let start = name.span;
        let columns = if self.check_op(Op::LParen) {
            self.parse_parenthesized_identifiers()?
        } else {
            Vec::new()
        };
        self.expect_keyword(Keyword::AS)?;
        let (query, _) = self.parse_parenthesized_query()?;
        Ok(Cte {
            name,
            columns,
            query: Box::new(query),
            span: self.span_from(start),
        })
    }

    /// A CTE that names itself must be `anchor UNION ALL recursive`, with an
    /// anchor that does not reference the CTE.
    fn validate_recursive_cte(&mut self, cte: &Cte) {
        let name = cte.name.value.as_str();
        if !query_expr_references(&cte.query.body, name) {
            return;
        }
        let message = match &cte.query.body {
            body @ QueryExpr::SetOperation { .. } => {
                if query_expr_references(body.leftmost(), name) {
                    Some(format!(
                        "anchor member of recursive common table expression '{name}' must not reference '{name}'"
                    ))
                } else if !contains_union_all(body) {
                    Some(format!(
                        "recursive common table expression '{name}' must combine its members with UNION ALL"
                    ))
                } else {
                    None
                }
            }
            _ => Some(format!(
                "recursive common table expression '{name}' needs an anchor member and a recursive member joined by UNION ALL"
            )),
        };
        if let Some(message) = message {
            self.push_diagnostic(Diagnostic::syntax(message, cte.span));
        }
    }

    // ========================================================================
    // Set operations
    // ========================================================================

    /// UNION and EXCEPT chains; INTERSECT binds tighter.
    fn parse_query_expr(&mut self) -> ParseResult<QueryExpr> {
        let mut left = self.parse_intersect_chain()?;
        loop {
            let op = if self.check_keyword(Keyword::UNION) {
                SetOperator::Union
            } else if self.check_keyword(Keyword::EXCEPT) {
                SetOperator::Except
            } else {
                return Ok(left);
            };
            self.advance();
            let all = self.eat_keyword(Keyword::ALL);
            let right = self.parse_intersect_chain()?;
            let span = left.span().to(right.span());
            left = QueryExpr::SetOperation {
                op,
                all,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
    }

    fn parse_intersect_chain(&mut self) -> ParseResult<QueryExpr> {
        let mut left = self.parse_query_term()?;
        while self.eat_keyword(Keyword::INTERSECT) {
            let right = self.parse_query_term()?;
            let span = left.span().to(right.span());
            left = QueryExpr::SetOperation {
                op: SetOperator::Intersect,
                all: false,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_query_term(&mut self) -> ParseResult<QueryExpr> {
        if self.check_op(Op::LParen) {
            let (query, _) = self.parse_parenthesized_query()?;
            return Ok(QueryExpr::Parenthesized(Box::new(query)));
        }
        Ok(QueryExpr::Select(Box::new(self.parse_select_spec()?)))
    }

    // ========================================================================
    // SELECT block
    // ========================================================================

    fn parse_select_spec(&mut self) -> ParseResult<SelectSpec> {
        let start = self.expect_keyword(Keyword::SELECT)?;
        let distinct = self.eat_keyword(Keyword::DISTINCT);
        if !distinct {
            self.eat_keyword(Keyword::ALL);
        }
        let top = self.parse_top()?;
        let items = self.parse_comma_separated(Self::parse_select_item)?;

        let into = if self.eat_keyword(Keyword::INTO) {
            Some(self.parse_object_name()?)
        } else {
            None
        };

        let from = if self.eat_keyword(Keyword::FROM) {
            self.parse_comma_separated(Self::parse_table_source)?
        } else {
            Vec::new()
        };

        let selection = if self.eat_keyword(Keyword::WHERE) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let group_by = if self.check_keyword(Keyword::GROUP) {
            Some(self.parse_group_by()?)
        } else {
            None
        };

        let having = if self.eat_keyword(Keyword::HAVING) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(SelectSpec {
            distinct,
            top,
            items,
            into,
            from,
            selection,
            group_by,
            having,
            span: self.span_from(start),
        })
    }

    /// `TOP n`, `TOP (expr)`, with `PERCENT` and `WITH TIES`.
    pub(crate) fn parse_top(&mut self) -> ParseResult<Option<Top>> {
        if !self.check_keyword(Keyword::TOP) {
            return Ok(None);
        }
        let start = self.advance().span;
        let parenthesized = self.eat_op(Op::LParen);
        let quantity = if parenthesized {
            let expr = self.parse_expr()?;
            self.expect_op(Op::RParen)?;
            expr
        } else {
            self.parse_operand()?
        };
        let percent = self.eat_keyword(Keyword::PERCENT);
        let with_ties = self.check_keyword(Keyword::WITH) && self.check_word_ci_at(1, "TIES");
        if with_ties {
            self.advance();
            self.advance();
        }
        Ok(Some(Top {
            quantity,
            percent,
            with_ties,
            parenthesized,
            span: self.span_from(start),
        }))
    }

    /// One select-list (or OUTPUT-list) item.
    pub(crate) fn parse_select_item(&mut self) -> ParseResult<SelectItem> {
        let start = self.current_span();

        // @var = expr, @var += expr, ...
        if self.check_variable() {
            if let Some(op) = self.peek_nth(1).op().and_then(assignment_op) {
                let variable = self.advance().text.to_string();
                self.advance();
                let expr = self.parse_expr()?;
                return Ok(SelectItem::Assignment {
                    variable,
                    op,
                    expr,
                    span: self.span_from(start),
                });
            }
        }

        // alias = expr
        if self.check_op_at(1, Op::Eq) {
            let alias = match self.peek().kind {
                TokenKind::Identifier | TokenKind::QuotedIdentifier(_) => {
                    Some(self.parse_identifier()?)
                }
                TokenKind::StringLiteral(_) => {
                    let token = self.advance();
                    Some(Ident::new(token.string_value(), token.span))
                }
                _ => None,
            };
            if let Some(alias) = alias {
                self.advance();
                let expr = self.parse_expr()?;
                return Ok(SelectItem::Expr {
                    expr,
                    alias: Some(alias),
                    span: self.span_from(start),
                });
            }
        }

        let expr = self.parse_expr()?;
        let alias = self.parse_column_alias()?;
        Ok(SelectItem::Expr {
            expr,
            alias,
            span: self.span_from(start),
        })
    }

    /// `[AS] alias` after a select-list expression.
    fn parse_column_alias(&mut self) -> ParseResult<Option<Ident>> {
        if self.eat_keyword(Keyword::AS) {
            if self.check_string() {
                let token = self.advance();
                return Ok(Some(Ident::new(token.string_value(), token.span)));
            }
            return Ok(Some(self.parse_identifier()?));
        }
        match self.peek().kind {
            TokenKind::QuotedIdentifier(_) => Ok(Some(self.parse_identifier()?)),
            TokenKind::Identifier => {
                let token = *self.peek();
                let excluded = NON_ALIAS_WORDS
                    .iter()
                    .any(|w| token.text.eq_ignore_ascii_case(w))
                    || self.check_op_at(1, Op::Colon);
                if excluded {
                    Ok(None)
                } else {
                    Ok(Some(self.parse_identifier()?))
                }
            }
            TokenKind::StringLiteral(_) => {
                let token = self.advance();
                Ok(Some(Ident::new(token.string_value(), token.span)))
            }
            _ => Ok(None),
        }
    }

    // ========================================================================
    // GROUP BY
    // ========================================================================

    fn parse_group_by(&mut self) -> ParseResult<GroupBy> {
        let start = self.expect_keyword(Keyword::GROUP)?;
        self.expect_keyword(Keyword::BY)?;
        let all = self.eat_keyword(Keyword::ALL);
        let items = self.parse_comma_separated(Self::parse_grouping_element)?;
        let modifier = if self.check_keyword(Keyword::WITH) && self.check_word_ci_at(1, "ROLLUP") {
            self.advance();
            self.advance();
            Some(GroupByModifier::Rollup)
        } else if self.check_keyword(Keyword::WITH) && self.check_word_ci_at(1, "CUBE") {
            self.advance();
            self.advance();
            Some(GroupByModifier::Cube)
        } else {
            None
        };
        Ok(GroupBy {
            all,
            items,
            modifier,
            span: self.span_from(start),
        })
    }

    fn parse_grouping_element(&mut self) -> ParseResult<GroupingElement> {
        if self.check_word_ci("ROLLUP") && self.check_op_at(1, Op::LParen) {
            self.advance();
            return Ok(GroupingElement::Rollup(self.parse_grouping_list()?));
        }
        if self.check_word_ci("CUBE") && self.check_op_at(1, Op::LParen) {
            self.advance();
            return Ok(GroupingElement::Cube(self.parse_grouping_list()?));
        }
        if self.check_word_ci("GROUPING") && self.check_word_ci_at(1, "SETS") {
            self.advance();
            self.advance();
            self.expect_op(Op::LParen)?;
            let sets = self.parse_comma_separated(|p| {
                if p.check_op(Op::LParen) {
                    p.parse_grouping_list()
                } else {
                    Ok(vec![p.parse_expr()?])
                }
            })?;
            self.expect_op(Op::RParen)?;
            return Ok(GroupingElement::GroupingSets(sets));
        }
        if self.check_op(Op::LParen) && self.check_op_at(1, Op::RParen) {
            self.advance();
            self.advance();
            return Ok(GroupingElement::Empty);
        }
        Ok(GroupingElement::Expr(self.parse_expr()?))
    }

    /// `( [expr, ...] )`
    fn parse_grouping_list(&mut self) -> ParseResult<Vec<crate::ast::Expr>> {
        self.expect_op(Op::LParen)?;
        if self.eat_op(Op::RParen) {
            return Ok(Vec::new());
        }
        let list = self.parse_expr_list()?;
        self.expect_op(Op::RParen)?;
        Ok(list)
    }

    // ========================================================================
    // Query tail clauses
    // ========================================================================

    fn parse_offset_fetch(&mut self) -> ParseResult<Option<OffsetFetch>> {
        if !self.check_word_ci("OFFSET") {
            return Ok(None);
        }
        self.advance();
        let offset = self.parse_expr()?;
        self.expect_row_or_rows()?;
        let fetch = if self.eat_keyword(Keyword::FETCH) {
            if !(self.eat_word_ci("NEXT") || self.eat_word_ci("FIRST")) {
                return Err(self.expected("NEXT or FIRST"));
            }
            let count = self.parse_expr()?;
            self.expect_row_or_rows()?;
            self.expect_word_ci("ONLY")?;
            Some(count)
        } else {
            None
        };
        Ok(Some(OffsetFetch { offset, fetch }))
    }

    fn expect_row_or_rows(&mut self) -> ParseResult<()> {
        if self.eat_word_ci("ROWS") || self.eat_word_ci("ROW") {
            Ok(())
        } else {
            Err(self.expected("ROWS"))
        }
    }

    fn parse_compute_clause(&mut self) -> ParseResult<ComputeClause> {
        let start = self.expect_keyword(Keyword::COMPUTE)?;
        let functions = self.parse_expr_list()?;
        let by = if self.eat_keyword(Keyword::BY) {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        let span = self.span_from(start);
        self.note_legacy(LegacyConstruct::ComputeBy, span);
        Ok(ComputeClause {
            functions,
            by,
            span,
        })
    }

    fn parse_for_clause(&mut self) -> ParseResult<Option<ForClause>> {
        if !self.check_keyword(Keyword::FOR) {
            return Ok(None);
        }
        if self.check_word_ci_at(1, "BROWSE") {
            self.advance();
            self.advance();
            return Ok(Some(ForClause::Browse));
        }
        if self.check_word_ci_at(1, "XML") {
            self.advance();
            self.advance();
            let mode = if self.eat_word_ci("RAW") {
                XmlMode::Raw
            } else if self.eat_word_ci("AUTO") {
                XmlMode::Auto
            } else if self.eat_word_ci("EXPLICIT") {
                XmlMode::Explicit
            } else if self.eat_word_ci("PATH") {
                XmlMode::Path
            } else {
                return Err(self.expected("RAW, AUTO, EXPLICIT or PATH"));
            };
            let element_name = if self.eat_op(Op::LParen) {
                let name = self.parse_string_value()?;
                self.expect_op(Op::RParen)?;
                Some(name)
            } else {
                None
            };
            let directives = self.parse_for_directives()?;
            return Ok(Some(ForClause::Xml {
                mode,
                element_name,
                directives,
            }));
        }
        if self.check_word_ci_at(1, "JSON") {
            self.advance();
            self.advance();
            let mode = if self.eat_word_ci("AUTO") {
                JsonMode::Auto
            } else if self.eat_word_ci("PATH") {
                JsonMode::Path
            } else {
                return Err(self.expected("AUTO or PATH"));
            };
            let directives = self.parse_for_directives()?;
            return Ok(Some(ForClause::Json { mode, directives }));
        }
        Ok(None)
    }

    /// `, ELEMENTS XSINIL`, `, ROOT('r')`, `, TYPE`, `, BINARY BASE64`, ...
    fn parse_for_directives(&mut self) -> ParseResult<Vec<RawOption>> {
        let mut directives = Vec::new();
        while self.eat_op(Op::Comma) {
            let start = self.current_span();
            let first = self.parse_identifier_or_keyword()?;
            let mut name = first.value.to_uppercase();
            for modifier in ["XSINIL", "ABSENT", "BASE64"] {
                if self.eat_word_ci(modifier) {
                    name.push(' ');
                    name.push_str(modifier);
                }
            }
            let value = if self.check_op(Op::LParen) {
                let span = self.consume_parenthesized()?;
                let inner = self.text(span);
                Some(inner[1..inner.len() - 1].trim().to_string())
            } else {
                None
            };
            directives.push(RawOption {
                name,
                value,
                span: self.span_from(start),
            });
        }
        Ok(directives)
    }

    // ========================================================================
    // OPTION (query hints)
    // ========================================================================

    /// `OPTION ( hint [, ...] )`; empty when absent.
    pub(crate) fn parse_option_clause(&mut self) -> ParseResult<Vec<QueryHint>> {
        if !(self.check_keyword(Keyword::OPTION) && self.check_op_at(1, Op::LParen)) {
            return Ok(Vec::new());
        }
        self.advance();
        self.expect_op(Op::LParen)?;
        let hints = self.parse_comma_separated(Self::parse_query_hint)?;
        self.expect_op(Op::RParen)?;
        Ok(hints)
    }

    fn parse_query_hint(&mut self) -> ParseResult<QueryHint> {
        let start = self.current_span();
        let kind = if self.eat_word_ci("MAXDOP") {
            QueryHintKind::MaxDop(self.parse_integer_text()?)
        } else if self.eat_word_ci("MAXRECURSION") {
            QueryHintKind::MaxRecursion(self.parse_integer_text()?)
        } else if self.eat_word_ci("FAST") {
            QueryHintKind::Fast(self.parse_integer_text()?)
        } else if self.eat_word_ci("RECOMPILE") {
            QueryHintKind::Recompile
        } else if self.eat_word_ci("OPTIMIZE") {
            self.expect_keyword(Keyword::FOR)?;
            if self.eat_word_ci("UNKNOWN") {
                QueryHintKind::OptimizeForUnknown
            } else {
                self.expect_op(Op::LParen)?;
                let vars = self.parse_comma_separated(|p| {
                    let variable = p.parse_variable_name()?;
                    let value = if p.eat_word_ci("UNKNOWN") {
                        None
                    } else {
                        p.expect_op(Op::Eq)?;
                        Some(p.parse_expr()?)
                    };
                    Ok(OptimizeForVariable { variable, value })
                })?;
                self.expect_op(Op::RParen)?;
                QueryHintKind::OptimizeFor(vars)
            }
        } else if self.check_word_ci("FORCE") && self.check_keyword_at(1, Keyword::ORDER) {
            self.advance();
            self.advance();
            QueryHintKind::ForceOrder
        } else if self.check_keyword_at(1, Keyword::JOIN) {
            let word = self.peek().text;
            match JoinHint::from_word(word) {
                Some(hint) => {
                    self.advance();
                    self.advance();
                    QueryHintKind::Join(hint)
                }
                None => return Err(self.expected("LOOP, HASH or MERGE")),
            }
        } else if self.check_keyword_at(1, Keyword::GROUP) {
            let word = self.advance().text.to_uppercase();
            self.advance();
            QueryHintKind::Group(word)
        } else if self.check_keyword_at(1, Keyword::UNION) {
            let word = self.advance().text.to_uppercase();
            self.advance();
            QueryHintKind::Union(word)
        } else if self.check_word_ci("KEEP") && self.check_keyword_at(1, Keyword::PLAN) {
            self.advance();
            self.advance();
            QueryHintKind::KeepPlan
        } else if self.check_word_ci("KEEPFIXED") && self.check_keyword_at(1, Keyword::PLAN) {
            self.advance();
            self.advance();
            QueryHintKind::KeepFixedPlan
        } else if self.check_word_ci("EXPAND") && self.check_word_ci_at(1, "VIEWS") {
            self.advance();
            self.advance();
            QueryHintKind::ExpandViews
        } else if self.check_word_ci("ROBUST") && self.check_keyword_at(1, Keyword::PLAN) {
            self.advance();
            self.advance();
            QueryHintKind::RobustPlan
        } else if self.check_keyword(Keyword::USE) && self.check_word_ci_at(1, "HINT") {
            self.advance();
            self.advance();
            self.expect_op(Op::LParen)?;
            let names = self.parse_comma_separated(Self::parse_string_value)?;
            self.expect_op(Op::RParen)?;
            QueryHintKind::UseHint(names)
        } else if self.check_keyword(Keyword::TABLE) && self.check_word_ci_at(1, "HINT") {
            self.advance();
            self.advance();
            self.expect_op(Op::LParen)?;
            let object = self.parse_object_name()?.parts;
            let mut hints = Vec::new();
            while self.eat_op(Op::Comma) {
                hints.push(self.parse_table_hint()?);
            }
            self.expect_op(Op::RParen)?;
            QueryHintKind::TableHint { object, hints }
        } else {
            let span = self.consume_until_list_end()?;
            QueryHintKind::Other(self.text(span).to_string())
        };
        Ok(QueryHint {
            kind,
            span: self.span_from(start),
        })
    }
}

/// Map an operator token to the assignment it denotes, if any.
pub(crate) fn assignment_op(op: Op) -> Option<AssignmentOp> {
    match op {
        Op::Eq => Some(AssignmentOp::Assign),
        Op::PlusEq => Some(AssignmentOp::Add),
        Op::MinusEq => Some(AssignmentOp::Subtract),
        Op::StarEq => Some(AssignmentOp::Multiply),
        Op::SlashEq => Some(AssignmentOp::Divide),
        Op::PercentEq => Some(AssignmentOp::Modulo),
        Op::AmpersandEq => Some(AssignmentOp::BitAnd),
        Op::CaretEq => Some(AssignmentOp::BitXor),
        Op::PipeEq => Some(AssignmentOp::BitOr),
        _ => None,
    }
}

// ============================================================================
// CTE reference checks
// ============================================================================

fn query_expr_references(expr: &QueryExpr, name: &str) -> bool {
    grow_stack(|| match expr {
        QueryExpr::Select(select) => select
            .from
            .iter()
            .any(|source| table_source_references(source, name)),
        QueryExpr::SetOperation { left, right, .. } => {
            query_expr_references(left, name) || query_expr_references(right, name)
        }
        QueryExpr::Parenthesized(query) => query_expr_references(&query.body, name),
    })
}

fn table_source_references(source: &TableSource, name: &str) -> bool {
    grow_stack(|| match source {
        TableSource::Named { name: table, .. } => table.is_single() && table.name().matches(name),
        TableSource::Derived { subquery, .. } => query_expr_references(&subquery.body, name),
        TableSource::Join { left, right, .. } => {
            table_source_references(left, name) || table_source_references(right, name)
        }
        TableSource::Pivot { source, .. }
        | TableSource::Unpivot { source, .. }
        | TableSource::Nested { source, .. } => table_source_references(source, name),
        TableSource::Function { call, .. } => matches!(
            &call.kind,
            ExprKind::Function(f) if f.name.is_single() && f.name.name().matches(name)
        ),
        TableSource::Values { .. } | TableSource::Variable { .. } => false,
    })
}

fn contains_union_all(expr: &QueryExpr) -> bool {
    match expr {
        QueryExpr::SetOperation {
            op, all, left, right, ..
        } => {
            (*op == SetOperator::Union && *all)
                || contains_union_all(left)
                || contains_union_all(right)
        }
        _ => false,
    }
}
