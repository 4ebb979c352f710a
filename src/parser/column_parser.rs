//! Column definition and table element parsing for T-SQL
//!
//! ## Supported Syntax
//!
//! Regular columns:
//! ```sql
//! [Name] TYPE [COLLATE collation] [IDENTITY(seed, increment) [NOT FOR REPLICATION]]
//!     [NOT NULL|NULL]
//!     [CONSTRAINT name DEFAULT (value)|DEFAULT (value)]
//!     [CONSTRAINT name CHECK (expr)|CHECK (expr)]
//!     [PRIMARY KEY|UNIQUE|REFERENCES ...]
//!     [ROWGUIDCOL] [SPARSE] [FILESTREAM] [HIDDEN]
//!     [GENERATED ALWAYS AS ROW START|END]
//!     [MASKED WITH (FUNCTION = '...')] [ENCRYPTED WITH (...)]
//!     [INDEX ix [CLUSTERED|NONCLUSTERED]]
//! ```
//!
//! Computed columns:
//! ```sql
//! [Name] AS (expression) [PERSISTED] [NOT NULL]
//! ```
//!
//! Table element lists (CREATE TABLE, table variables, table types):
//! ```sql
//! ( column, ..., table_constraint, ...,
//!   INDEX ix [UNIQUE] [CLUSTERED|NONCLUSTERED] [COLUMNSTORE] (cols),
//!   PERIOD FOR SYSTEM_TIME (ValidFrom, ValidTo) )
//! ```

use super::keywords::Keyword;
use super::token::Op;
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{ColumnDef, Identity, InlineIndex, TableElements};

impl<'a> TokenParser<'a> {
    /// Parse `( element [, ...] )` of a table definition.
    pub(crate) fn parse_table_elements(&mut self) -> ParseResult<TableElements> {
        self.expect_op(Op::LParen)?;
        let mut elements = TableElements::default();
        loop {
            if self.check_constraint_start() {
                elements.constraints.push(self.parse_table_constraint()?);
            } else if self.check_keyword(Keyword::INDEX) {
                elements.indexes.push(self.parse_inline_index()?);
            } else if self.check_word_ci("PERIOD") && self.check_keyword_at(1, Keyword::FOR) {
                self.advance();
                self.advance();
                self.expect_word_ci("SYSTEM_TIME")?;
                self.expect_op(Op::LParen)?;
                let start_column = self.parse_identifier()?;
                self.expect_op(Op::Comma)?;
                let end_column = self.parse_identifier()?;
                self.expect_op(Op::RParen)?;
                elements.period = Some((start_column, end_column));
            } else {
                elements.columns.push(self.parse_column_def()?);
            }
            if !self.eat_op(Op::Comma) {
                break;
            }
            // Trailing comma before the closing parenthesis
            if self.check_op(Op::RParen) {
                break;
            }
        }
        self.expect_op(Op::RParen)?;
        Ok(elements)
    }

    /// `INDEX name [UNIQUE] [CLUSTERED|NONCLUSTERED] [COLUMNSTORE] (cols) [...]`
    fn parse_inline_index(&mut self) -> ParseResult<InlineIndex> {
        let start = self.expect_keyword(Keyword::INDEX)?;
        let name = self.parse_identifier()?;
        let unique = self.eat_keyword(Keyword::UNIQUE);
        let clustered = self.parse_clustered_option();
        let columnstore = self.eat_word_ci("COLUMNSTORE");
        let columns = if self.check_op(Op::LParen) {
            self.parse_index_column_list()?
        } else {
            Vec::new()
        };
        // INCLUDE, WHERE, WITH and ON tails are not modelled on inline indexes
        if self.eat_word_ci("INCLUDE") {
            self.consume_parenthesized()?;
        }
        if self.eat_keyword(Keyword::WHERE) {
            self.parse_expr()?;
        }
        if self.check_keyword(Keyword::WITH) && self.check_op_at(1, Op::LParen) {
            self.advance();
            self.consume_parenthesized()?;
        }
        if self.check_keyword(Keyword::ON) {
            self.parse_storage_clause()?;
        }
        Ok(InlineIndex {
            name,
            unique,
            clustered,
            columnstore,
            columns,
            span: self.span_from(start),
        })
    }

    /// Parse one column definition.
    pub(crate) fn parse_column_def(&mut self) -> ParseResult<ColumnDef> {
        // First token should be the column name (identifier)
        let name = self.parse_identifier()?;
        let start = name.span;

        let mut column = ColumnDef {
            name,
            data_type: None,
            computed: None,
            persisted: false,
            collation: None,
            nullable: None,
            identity: None,
            rowguidcol: false,
            sparse: false,
            filestream: false,
            constraints: Vec::new(),
            attributes: Vec::new(),
            span: start,
        };

        // Check if this is a computed column: [Name] AS (expression)
        if self.eat_keyword(Keyword::AS) {
            column.computed = Some(self.parse_expr()?);
        } else {
            // Regular column: parse data type
            column.data_type = Some(self.parse_data_type()?);
        }

        self.parse_column_modifiers(&mut column)?;
        column.span = self.span_from(start);
        Ok(column)
    }

    /// Parse column modifiers (IDENTITY, NOT NULL, DEFAULT, CHECK, etc.) in any order.
    fn parse_column_modifiers(&mut self, column: &mut ColumnDef) -> ParseResult<()> {
        loop {
            let modifier_start = self.current_span();

            // Check for COLLATE
            if self.eat_keyword(Keyword::COLLATE) {
                column.collation = Some(self.parse_identifier()?);
                continue;
            }

            // Check for IDENTITY
            if self.eat_keyword(Keyword::IDENTITY) {
                let mut identity = Identity {
                    seed: None,
                    increment: None,
                    not_for_replication: false,
                };
                if self.eat_op(Op::LParen) {
                    let seed = self.consume_until_list_end()?;
                    identity.seed = Some(self.text(seed).to_string());
                    self.expect_op(Op::Comma)?;
                    let increment = self.consume_until_list_end()?;
                    identity.increment = Some(self.text(increment).to_string());
                    self.expect_op(Op::RParen)?;
                }
                identity.not_for_replication = self.parse_not_for_replication()?;
                column.identity = Some(identity);
                continue;
            }

            // Check for NOT NULL
            if self.check_keyword(Keyword::NOT) && self.check_keyword_at(1, Keyword::NULL) {
                self.advance();
                self.advance();
                column.nullable = Some(false);
                continue;
            }

            // Check for NULL (explicit nullable)
            if self.eat_keyword(Keyword::NULL) {
                column.nullable = Some(true);
                continue;
            }

            // Check for CONSTRAINT keyword (names the next constraint)
            if self.eat_keyword(Keyword::CONSTRAINT) {
                let name = self.parse_identifier()?;
                let constraint = self.parse_constraint_body(Some(name), true, modifier_start)?;
                column.constraints.push(constraint);
                continue;
            }

            // Unnamed DEFAULT / CHECK / PRIMARY KEY / UNIQUE / REFERENCES
            if self.check_constraint_start() {
                let constraint = self.parse_constraint_body(None, true, modifier_start)?;
                column.constraints.push(constraint);
                continue;
            }

            // Check for ROWGUIDCOL
            if self.eat_keyword(Keyword::ROWGUIDCOL) {
                column.rowguidcol = true;
                continue;
            }

            // Check for SPARSE
            if self.eat_word_ci("SPARSE") {
                column.sparse = true;
                continue;
            }

            // Check for FILESTREAM
            if self.eat_word_ci("FILESTREAM") {
                column.filestream = true;
                continue;
            }

            // Check for PERSISTED (computed columns)
            if self.eat_word_ci("PERSISTED") {
                column.persisted = true;
                continue;
            }

            // Check for GENERATED ALWAYS AS ROW START/END (temporal table period columns)
            if self.check_word_ci("GENERATED") {
                self.advance();
                self.expect_word_ci("ALWAYS")?;
                self.expect_keyword(Keyword::AS)?;
                self.advance();
                if !(self.eat_word_ci("START") || self.eat_keyword(Keyword::END)) {
                    return Err(self.expected("START or END"));
                }
                column
                    .attributes
                    .push(self.text(self.span_from(modifier_start)).to_string());
                continue;
            }

            // Check for HIDDEN (temporal table hidden period columns)
            if self.eat_word_ci("HIDDEN") {
                column.attributes.push("HIDDEN".to_string());
                continue;
            }

            // Check for MASKED WITH (...) / ENCRYPTED WITH (...)
            if (self.check_word_ci("MASKED") || self.check_word_ci("ENCRYPTED"))
                && self.check_keyword_at(1, Keyword::WITH)
            {
                self.advance();
                self.advance();
                self.consume_parenthesized()?;
                column
                    .attributes
                    .push(self.text(self.span_from(modifier_start)).to_string());
                continue;
            }

            // Check for inline column INDEX
            if self.check_keyword(Keyword::INDEX) {
                self.advance();
                self.parse_identifier()?;
                self.parse_clustered_option();
                column
                    .attributes
                    .push(self.text(self.span_from(modifier_start)).to_string());
                continue;
            }

            break;
        }
        Ok(())
    }
}
