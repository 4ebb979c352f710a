//! FROM clause parsing: table sources, joins and table hints
//!
//! ## Supported Syntax
//!
//! ```sql
//! FROM dbo.t [AS] a WITH (NOLOCK, INDEX(ix_a))
//! FROM dbo.t (NOLOCK)
//! FROM dbo.t FOR SYSTEM_TIME AS OF @at
//! FROM dbo.t TABLESAMPLE (10 PERCENT) REPEATABLE (1)
//! FROM (SELECT ...) AS d (c1, c2)
//! FROM (VALUES (1, 'a'), (2, 'b')) AS v (id, name)
//! FROM dbo.fn(@p) AS f
//! FROM OPENJSON(@json) WITH (id INT '$.id') AS j
//! FROM @xml.nodes('/r/i') AS T(c)
//! FROM a LEFT JOIN b ON ... CROSS APPLY fn(a.id) OUTER APPLY ...
//! FROM a INNER HASH JOIN b ON ...
//! FROM a LEFT JOIN b INNER JOIN c ON b.x = c.x ON a.y = b.y
//! FROM t PIVOT (SUM(v) FOR k IN ([a], [b])) AS p
//! FROM t UNPIVOT (v FOR k IN (a, b)) AS u
//! ```

use super::keywords::Keyword;
use super::token::{NumberKind, Op, TokenKind};
use super::token_parser_base::{grow_stack, ParseResult, TokenParser};
use crate::ast::{Expr, ExprKind, Ident, JoinHint, JoinKind, TableAlias, TableHint, TableSource};

/// Non-reserved words that may follow a table source without being its alias.
const TABLE_ALIAS_STOP_WORDS: &[&str] = &[
    "OUTPUT", "USING", "THROW", "RECEIVE", "SEND", "ENABLE", "DISABLE", "MOVE", "GET",
];

/// Rowset functions that accept a `WITH (...)` column schema.
const SCHEMA_FUNCTIONS: &[&str] = &["OPENJSON", "OPENXML"];

impl<'a> TokenParser<'a> {
    /// A table source with any joins chained onto it.
    pub fn parse_table_source(&mut self) -> ParseResult<TableSource> {
        grow_stack(|| {
            let primary = self.parse_table_primary()?;
            self.parse_joins(primary)
        })
    }

    fn parse_joins(&mut self, mut left: TableSource) -> ParseResult<TableSource> {
        while let Some((kind, hint)) = self.parse_join_operator()? {
            let mut right = self.parse_table_primary()?;
            let on = if kind.has_condition() {
                // `a JOIN b JOIN c ON ... ON ...` nests the inner join under b
                if !self.check_keyword(Keyword::ON) && self.check_join_operator() {
                    right = self.parse_joins(right)?;
                }
                self.expect_keyword(Keyword::ON)?;
                Some(self.parse_expr()?)
            } else {
                None
            };
            let span = left.span().to(self.prev_span());
            left = TableSource::Join {
                left: Box::new(left),
                right: Box::new(right),
                kind,
                hint,
                on,
                span,
            };
        }
        Ok(left)
    }

    fn check_join_operator(&self) -> bool {
        self.check_keyword(Keyword::JOIN)
            || self.check_keyword(Keyword::INNER)
            || self.check_keyword(Keyword::LEFT)
            || self.check_keyword(Keyword::RIGHT)
            || self.check_keyword(Keyword::FULL)
            || self.check_keyword(Keyword::CROSS)
            || (self.check_keyword(Keyword::OUTER) && self.check_word_ci_at(1, "APPLY"))
    }

    /// Consume a join operator, if one is next.
    fn parse_join_operator(&mut self) -> ParseResult<Option<(JoinKind, Option<JoinHint>)>> {
        if self.check_keyword(Keyword::CROSS) {
            self.advance();
            if self.eat_word_ci("APPLY") {
                return Ok(Some((JoinKind::CrossApply, None)));
            }
            self.expect_keyword(Keyword::JOIN)?;
            return Ok(Some((JoinKind::Cross, None)));
        }
        if self.check_keyword(Keyword::OUTER) && self.check_word_ci_at(1, "APPLY") {
            self.advance();
            self.advance();
            return Ok(Some((JoinKind::OuterApply, None)));
        }

        let kind = if self.check_keyword(Keyword::JOIN) {
            JoinKind::Inner
        } else if self.eat_keyword(Keyword::INNER) {
            JoinKind::Inner
        } else if self.eat_keyword(Keyword::LEFT) {
            self.eat_keyword(Keyword::OUTER);
            JoinKind::LeftOuter
        } else if self.eat_keyword(Keyword::RIGHT) {
            self.eat_keyword(Keyword::OUTER);
            JoinKind::RightOuter
        } else if self.eat_keyword(Keyword::FULL) {
            self.eat_keyword(Keyword::OUTER);
            JoinKind::FullOuter
        } else {
            return Ok(None);
        };

        let hint = if self.check_keyword(Keyword::JOIN) {
            None
        } else {
            let hint = JoinHint::from_word(self.peek().text);
            if hint.is_none() {
                return Err(self.expected("JOIN"));
            }
            self.advance();
            hint
        };
        self.expect_keyword(Keyword::JOIN)?;
        Ok(Some((kind, hint)))
    }

    // ========================================================================
    // Primary table sources
    // ========================================================================

    fn parse_table_primary(&mut self) -> ParseResult<TableSource> {
        let source = if self.check_op(Op::LParen) {
            self.parse_parenthesized_source()?
        } else if self.check_variable() {
            self.parse_variable_source()?
        } else if self.peek().keyword().is_some_and(|kw| kw.is_function_name()) {
            self.parse_function_source()?
        } else {
            self.parse_named_source()?
        };
        self.parse_pivots(source)
    }

    fn parse_parenthesized_source(&mut self) -> ParseResult<TableSource> {
        let start = self.current_span();

        if self.starts_subquery_at(1) {
            return self.parse_derived_source();
        }

        if self.check_keyword_at(1, Keyword::VALUES) {
            self.advance();
            self.advance();
            let rows = self.parse_values_rows()?;
            self.expect_op(Op::RParen)?;
            let alias = self.parse_table_alias(true)?;
            return Ok(TableSource::Values {
                rows,
                alias,
                span: self.span_from(start),
            });
        }

        // `((SELECT ...) UNION (SELECT ...)) AS d` or a parenthesized join
        if let Some(source) = self.try_parse(Self::parse_derived_source) {
            return Ok(source);
        }
        self.expect_op(Op::LParen)?;
        let inner = self.parse_table_source()?;
        self.expect_op(Op::RParen)?;
        Ok(TableSource::Nested {
            source: Box::new(inner),
            span: self.span_from(start),
        })
    }

    fn parse_derived_source(&mut self) -> ParseResult<TableSource> {
        let start = self.current_span();
        let (query, _) = self.parse_parenthesized_query()?;
        let alias = self.parse_table_alias(true)?;
        Ok(TableSource::Derived {
            subquery: Box::new(query),
            alias,
            span: self.span_from(start),
        })
    }

    /// `@t [AS] alias` or `@xml.nodes(...) AS T(c)`
    fn parse_variable_source(&mut self) -> ParseResult<TableSource> {
        let start = self.current_span();
        if self.check_op_at(1, Op::Dot) {
            let call = self.parse_operand()?;
            let alias = self.parse_table_alias(true)?;
            return Ok(TableSource::Function {
                call,
                with_schema: None,
                alias,
                span: self.span_from(start),
            });
        }
        let name = self.parse_variable_name()?;
        let alias = self.parse_table_alias(false)?;
        Ok(TableSource::Variable {
            name,
            alias,
            span: self.span_from(start),
        })
    }

    /// Table-valued or rowset function call.
    fn parse_function_source(&mut self) -> ParseResult<TableSource> {
        let start = self.current_span();
        let call = self.parse_operand()?;
        let accepts_schema = match &call.kind {
            ExprKind::Function(f) => SCHEMA_FUNCTIONS.iter().any(|n| f.name.name().matches(n)),
            _ => false,
        };
        let with_schema = if accepts_schema && self.check_keyword(Keyword::WITH) {
            self.advance();
            let span = if self.check_op(Op::LParen) {
                self.consume_parenthesized()?
            } else {
                // OPENXML ... WITH existing_table
                self.parse_object_name()?.span
            };
            Some(self.text(span).to_string())
        } else {
            None
        };
        let alias = self.parse_table_alias(true)?;
        Ok(TableSource::Function {
            call,
            with_schema,
            alias,
            span: self.span_from(start),
        })
    }

    fn parse_named_source(&mut self) -> ParseResult<TableSource> {
        let start = self.current_span();
        let pos = self.pos();
        let name = self.parse_object_name()?;

        if self.check_op(Op::LParen) && !self.check_table_hint_at(1) {
            self.rewind(pos);
            return self.parse_function_source();
        }

        let temporal = if self.check_keyword(Keyword::FOR) && self.check_word_ci_at(1, "SYSTEM_TIME")
        {
            Some(self.parse_temporal_clause()?)
        } else {
            None
        };

        let mut hints = Vec::new();
        let mut legacy_hints = false;
        if self.check_op(Op::LParen) {
            hints = self.parse_table_hint_list()?;
            legacy_hints = true;
        }

        let alias = self.parse_table_alias(false)?;

        let tablesample = if self.check_keyword(Keyword::TABLESAMPLE) {
            Some(self.parse_tablesample()?)
        } else {
            None
        };

        if self.check_keyword(Keyword::WITH) && self.check_op_at(1, Op::LParen) {
            self.advance();
            hints.extend(self.parse_table_hint_list()?);
        } else if hints.is_empty() && self.check_op(Op::LParen) && self.check_table_hint_at(1) {
            // `t alias (NOLOCK)`
            hints = self.parse_table_hint_list()?;
            legacy_hints = true;
        }

        Ok(TableSource::Named {
            name,
            alias,
            hints,
            legacy_hints,
            tablesample,
            temporal,
            span: self.span_from(start),
        })
    }

    /// `[AS] alias [(col, ...)]`
    pub(crate) fn parse_table_alias(&mut self, allow_columns: bool) -> ParseResult<Option<TableAlias>> {
        let name = if self.eat_keyword(Keyword::AS) {
            if self.check_string() {
                let token = self.advance();
                Ident::new(token.string_value(), token.span)
            } else {
                self.parse_identifier()?
            }
        } else {
            match self.peek().kind {
                TokenKind::QuotedIdentifier(_) => self.parse_identifier()?,
                TokenKind::Identifier => {
                    let word = self.peek().text;
                    let stop = TABLE_ALIAS_STOP_WORDS
                        .iter()
                        .any(|w| word.eq_ignore_ascii_case(w))
                        || self.check_op_at(1, Op::Colon);
                    if stop {
                        return Ok(None);
                    }
                    self.parse_identifier()?
                }
                _ => return Ok(None),
            }
        };
        let columns = if allow_columns
            && self.check_op(Op::LParen)
            && !self.check_table_hint_at(1)
        {
            self.parse_parenthesized_identifiers()?
        } else {
            Vec::new()
        };
        Ok(Some(TableAlias { name, columns }))
    }

    /// `FOR SYSTEM_TIME {AS OF x | FROM x TO y | BETWEEN x AND y | CONTAINED IN (x, y) | ALL}`
    fn parse_temporal_clause(&mut self) -> ParseResult<String> {
        let start = self.expect_keyword(Keyword::FOR)?;
        self.expect_word_ci("SYSTEM_TIME")?;
        if self.eat_keyword(Keyword::ALL) {
            return Ok(self.text(self.span_from(start)).to_string());
        }
        if self.eat_keyword(Keyword::AS) {
            self.expect_keyword(Keyword::OF)?;
            self.parse_operand()?;
        } else if self.eat_keyword(Keyword::FROM) {
            self.parse_operand()?;
            self.expect_keyword(Keyword::TO)?;
            self.parse_operand()?;
        } else if self.eat_keyword(Keyword::BETWEEN) {
            self.parse_operand()?;
            self.expect_keyword(Keyword::AND)?;
            self.parse_operand()?;
        } else if self.eat_word_ci("CONTAINED") {
            self.expect_keyword(Keyword::IN)?;
            self.consume_parenthesized()?;
        } else {
            return Err(self.expected("AS OF, FROM, BETWEEN, CONTAINED IN or ALL"));
        }
        Ok(self.text(self.span_from(start)).to_string())
    }

    /// `TABLESAMPLE [SYSTEM] (n [PERCENT | ROWS]) [REPEATABLE (seed)]`
    fn parse_tablesample(&mut self) -> ParseResult<String> {
        let start = self.expect_keyword(Keyword::TABLESAMPLE)?;
        self.eat_word_ci("SYSTEM");
        self.consume_parenthesized()?;
        if self.eat_word_ci("REPEATABLE") {
            self.consume_parenthesized()?;
        }
        Ok(self.text(self.span_from(start)).to_string())
    }

    // ========================================================================
    // Table hints
    // ========================================================================

    /// Whether the token at `offset` names a table hint.
    fn check_table_hint_at(&self, offset: usize) -> bool {
        let token = self.peek_nth(offset);
        matches!(token.kind, TokenKind::Identifier | TokenKind::Keyword(_))
            && TableHint::from_word(token.text).is_some()
    }

    /// `( hint [[,] hint ...] )`
    pub(crate) fn parse_table_hint_list(&mut self) -> ParseResult<Vec<TableHint>> {
        self.expect_op(Op::LParen)?;
        let mut hints = vec![self.parse_table_hint()?];
        loop {
            if self.eat_op(Op::Comma) || !self.check_op(Op::RParen) {
                hints.push(self.parse_table_hint()?);
            } else {
                break;
            }
        }
        self.expect_op(Op::RParen)?;
        Ok(hints)
    }

    pub(crate) fn parse_table_hint(&mut self) -> ParseResult<TableHint> {
        let start = self.current_span();
        if self.eat_keyword(Keyword::INDEX) {
            let mut values = Vec::new();
            if self.eat_op(Op::Eq) {
                values.push(self.parse_index_hint_value()?);
            } else {
                self.expect_op(Op::LParen)?;
                values = self.parse_comma_separated(Self::parse_index_hint_value)?;
                self.expect_op(Op::RParen)?;
            }
            return Ok(TableHint::Index(values));
        }
        if self.eat_word_ci("FORCESEEK") {
            let detail = if self.check_op(Op::LParen) {
                let span = self.consume_parenthesized()?;
                let text = self.text(span);
                Some(text[1..text.len() - 1].trim().to_string())
            } else {
                None
            };
            return Ok(TableHint::ForceSeek(detail));
        }
        if self.eat_word_ci("SPATIAL_WINDOW_MAX_CELLS") {
            self.expect_op(Op::Eq)?;
            self.parse_integer_text()?;
            return Ok(TableHint::Other(self.text(self.span_from(start)).to_string()));
        }
        let token = *self.peek();
        if !matches!(token.kind, TokenKind::Identifier | TokenKind::Keyword(_)) {
            return Err(self.expected("table hint"));
        }
        self.advance();
        Ok(TableHint::from_word(token.text)
            .unwrap_or_else(|| TableHint::Other(token.text.to_uppercase())))
    }

    fn parse_index_hint_value(&mut self) -> ParseResult<String> {
        if matches!(self.peek().kind, TokenKind::Number(NumberKind::Integer)) {
            return Ok(self.advance().text.to_string());
        }
        Ok(self.parse_identifier()?.value)
    }

    // ========================================================================
    // PIVOT / UNPIVOT
    // ========================================================================

    fn parse_pivots(&mut self, mut source: TableSource) -> ParseResult<TableSource> {
        loop {
            if self.check_keyword(Keyword::PIVOT) {
                source = self.parse_pivot(source)?;
            } else if self.check_keyword(Keyword::UNPIVOT) {
                source = self.parse_unpivot(source)?;
            } else {
                return Ok(source);
            }
        }
    }

    fn parse_pivot(&mut self, source: TableSource) -> ParseResult<TableSource> {
        let start = source.span();
        self.expect_keyword(Keyword::PIVOT)?;
        self.expect_op(Op::LParen)?;
        let aggregate_span = self.current_span();
        let aggregate = match self.parse_operand()? {
            Expr {
                kind: ExprKind::Function(call),
                ..
            } => call,
            _ => {
                return Err(self.error_at("expected aggregate function in PIVOT", aggregate_span));
            }
        };
        self.expect_keyword(Keyword::FOR)?;
        let pivot_column = self.parse_operand()?;
        self.expect_keyword(Keyword::IN)?;
        let values = self.parse_parenthesized_identifiers()?;
        self.expect_op(Op::RParen)?;
        let alias = self.parse_table_alias(false)?;
        Ok(TableSource::Pivot {
            source: Box::new(source),
            aggregate,
            pivot_column,
            values,
            alias,
            span: self.span_from(start),
        })
    }

    fn parse_unpivot(&mut self, source: TableSource) -> ParseResult<TableSource> {
        let start = source.span();
        self.expect_keyword(Keyword::UNPIVOT)?;
        self.expect_op(Op::LParen)?;
        let value_column = self.parse_identifier()?;
        self.expect_keyword(Keyword::FOR)?;
        let pivot_column = self.parse_identifier()?;
        self.expect_keyword(Keyword::IN)?;
        let columns = self.parse_parenthesized_identifiers()?;
        self.expect_op(Op::RParen)?;
        let alias = self.parse_table_alias(false)?;
        Ok(TableSource::Unpivot {
            source: Box::new(source),
            value_column,
            pivot_column,
            columns,
            alias,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // VALUES rows
    // ========================================================================

    /// `(a, b), (c, d)` after `VALUES`.
    pub(crate) fn parse_values_rows(&mut self) -> ParseResult<Vec<Vec<Expr>>> {
        self.parse_comma_separated(|p| {
            p.expect_op(Op::LParen)?;
            let row = p.parse_expr_list()?;
            p.expect_op(Op::RParen)?;
            Ok(row)
        })
    }
}
