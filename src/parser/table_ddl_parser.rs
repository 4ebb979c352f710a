//! CREATE TABLE and ALTER TABLE parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE TABLE [schema].[name] ( elements ) [AS NODE | AS EDGE]
//!     [ON storage] [TEXTIMAGE_ON storage] [FILESTREAM_ON storage]
//!     [WITH (SYSTEM_VERSIONING = ON (...), DATA_COMPRESSION = PAGE, ...)]
//!
//! ALTER TABLE name [WITH CHECK | WITH NOCHECK] ADD column_or_constraint [, ...]
//! ALTER TABLE name ALTER COLUMN col type [COLLATE c] [NULL | NOT NULL]
//! ALTER TABLE name ALTER COLUMN col {ADD | DROP} {ROWGUIDCOL | PERSISTED | SPARSE | ...}
//! ALTER TABLE name DROP [CONSTRAINT] [IF EXISTS] name [, ...]
//! ALTER TABLE name DROP COLUMN [IF EXISTS] name [, ...]
//! ALTER TABLE name [WITH CHECK | WITH NOCHECK] {CHECK | NOCHECK} CONSTRAINT {ALL | names}
//! ALTER TABLE name {ENABLE | DISABLE} TRIGGER {ALL | names}
//! ALTER TABLE name SET (LOCK_ESCALATION = AUTO)
//! ALTER TABLE name SWITCH ... | REBUILD ...      -- kept as text
//! ```

use super::keywords::Keyword;
use super::token::Op;
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{
    AlterTableAction, AlterTableStatement, CreateTableStatement, GraphTableKind, Ident,
};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    /// Parse CREATE TABLE after the `CREATE` keyword.
    pub(crate) fn parse_create_table(&mut self, start: SourceSpan) -> ParseResult<CreateTableStatement> {
        // Expect TABLE keyword
        self.expect_keyword(Keyword::TABLE)?;
        let name = self.parse_object_name()?;
        let elements = self.parse_table_elements()?;

        let graph = if self.check_keyword(Keyword::AS) && self.check_word_ci_at(1, "NODE") {
            self.advance();
            self.advance();
            Some(GraphTableKind::Node)
        } else if self.check_keyword(Keyword::AS) && self.check_word_ci_at(1, "EDGE") {
            self.advance();
            self.advance();
            Some(GraphTableKind::Edge)
        } else {
            None
        };

        let mut on = None;
        let mut textimage_on = None;
        let mut options = Vec::new();
        loop {
            if self.check_keyword(Keyword::ON) {
                on = Some(self.parse_storage_clause()?);
            } else if self.eat_word_ci("TEXTIMAGE_ON") {
                textimage_on = Some(self.parse_storage_target()?);
            } else if self.eat_word_ci("FILESTREAM_ON") {
                let start = self.prev_span();
                let target = self.parse_storage_target()?;
                options.push(crate::ast::RawOption {
                    name: "FILESTREAM_ON".to_string(),
                    value: Some(target),
                    span: self.span_from(start),
                });
            } else if self.check_keyword(Keyword::WITH) && self.check_op_at(1, Op::LParen) {
                self.advance();
                options.extend(self.parse_raw_option_list()?);
            } else {
                break;
            }
        }

        Ok(CreateTableStatement {
            name,
            elements,
            graph,
            on,
            textimage_on,
            options,
            span: self.span_from(start),
        })
    }

    /// Parse ALTER TABLE after the `ALTER` keyword.
    pub(crate) fn parse_alter_table(&mut self, start: SourceSpan) -> ParseResult<AlterTableStatement> {
        // Expect TABLE keyword
        self.expect_keyword(Keyword::TABLE)?;
        let name = self.parse_object_name()?;

        // Optional WITH CHECK or WITH NOCHECK
        let with_check = if self.check_keyword(Keyword::WITH) && self.check_keyword_at(1, Keyword::CHECK) {
            self.advance();
            self.advance();
            Some(true)
        } else if self.check_keyword(Keyword::WITH) && self.check_keyword_at(1, Keyword::NOCHECK) {
            self.advance();
            self.advance();
            Some(false)
        } else {
            None
        };

        let action = if self.eat_keyword(Keyword::ADD) {
            self.parse_alter_table_add()?
        } else if self.check_keyword(Keyword::ALTER) && self.check_keyword_at(1, Keyword::COLUMN) {
            self.advance();
            self.advance();
            self.parse_alter_column()?
        } else if self.eat_keyword(Keyword::DROP) {
            self.parse_alter_table_drop()?
        } else if (self.check_keyword(Keyword::CHECK) || self.check_keyword(Keyword::NOCHECK))
            && self.check_keyword_at(1, Keyword::CONSTRAINT)
        {
            let enable = self.check_keyword(Keyword::CHECK);
            self.advance();
            self.advance();
            let names = self.parse_all_or_names()?;
            AlterTableAction::CheckConstraints { enable, names }
        } else if (self.check_word_ci("ENABLE") || self.check_word_ci("DISABLE"))
            && self.check_keyword_at(1, Keyword::TRIGGER)
        {
            let enable = self.check_word_ci("ENABLE");
            self.advance();
            self.advance();
            let names = self.parse_all_or_names()?;
            AlterTableAction::Trigger { enable, names }
        } else if self.check_keyword(Keyword::SET) && self.check_op_at(1, Op::LParen) {
            self.advance();
            AlterTableAction::Set(self.parse_raw_option_list()?)
        } else {
            let span = self.consume_statement_text(&[]);
            if span.is_empty() {
                return Err(self.expected("ALTER TABLE action"));
            }
            AlterTableAction::Other(self.text(span).to_string())
        };

        Ok(AlterTableStatement {
            name,
            with_check,
            action,
            span: self.span_from(start),
        })
    }

    /// `ADD` followed by column definitions and/or table constraints.
    fn parse_alter_table_add(&mut self) -> ParseResult<AlterTableAction> {
        if self.check_word_ci("PERIOD") {
            let span = self.consume_statement_text(&[]);
            return Ok(AlterTableAction::Other(format!("ADD {}", self.text(span))));
        }
        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        loop {
            if self.check_constraint_start() {
                constraints.push(self.parse_table_constraint()?);
            } else {
                columns.push(self.parse_column_def()?);
            }
            if !self.eat_op(Op::Comma) {
                break;
            }
        }
        Ok(AlterTableAction::Add {
            columns,
            constraints,
        })
    }

    fn parse_alter_column(&mut self) -> ParseResult<AlterTableAction> {
        let name = self.parse_identifier()?;

        // ALTER COLUMN c {ADD | DROP} property
        if self.check_keyword(Keyword::ADD) || self.check_keyword(Keyword::DROP) {
            let span = self.consume_statement_text(&[]);
            return Ok(AlterTableAction::AlterColumn {
                name,
                data_type: None,
                collation: None,
                nullable: None,
                property: Some(self.text(span).to_string()),
            });
        }

        let data_type = Some(self.parse_data_type()?);
        let collation = if self.eat_keyword(Keyword::COLLATE) {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        let nullable = if self.check_keyword(Keyword::NOT) && self.check_keyword_at(1, Keyword::NULL) {
            self.advance();
            self.advance();
            Some(false)
        } else if self.eat_keyword(Keyword::NULL) {
            Some(true)
        } else {
            None
        };
        // WITH (ONLINE = ON)
        if self.check_keyword(Keyword::WITH) && self.check_op_at(1, Op::LParen) {
            self.advance();
            self.consume_parenthesized()?;
        }
        Ok(AlterTableAction::AlterColumn {
            name,
            data_type,
            collation,
            nullable,
            property: None,
        })
    }

    fn parse_alter_table_drop(&mut self) -> ParseResult<AlterTableAction> {
        let columns = self.eat_keyword(Keyword::COLUMN);
        if !columns {
            self.eat_keyword(Keyword::CONSTRAINT);
        }
        let if_exists = self.parse_if_exists()?;
        let names = self.parse_comma_separated(|p| {
            let name = p.parse_identifier()?;
            // DROP CONSTRAINT pk WITH (ONLINE = ON)
            if p.check_keyword(Keyword::WITH) && p.check_op_at(1, Op::LParen) {
                p.advance();
                p.consume_parenthesized()?;
            }
            Ok(name)
        })?;
        if columns {
            Ok(AlterTableAction::DropColumns { if_exists, names })
        } else {
            Ok(AlterTableAction::DropConstraints { if_exists, names })
        }
    }

    /// `ALL` (returns an empty list) or a comma-separated list of names.
    pub(crate) fn parse_all_or_names(&mut self) -> ParseResult<Vec<Ident>> {
        if self.eat_keyword(Keyword::ALL) {
            return Ok(Vec::new());
        }
        self.parse_comma_separated(Self::parse_identifier)
    }

    /// `IF EXISTS`, if present.
    pub(crate) fn parse_if_exists(&mut self) -> ParseResult<bool> {
        if self.check_keyword(Keyword::IF) && self.check_keyword_at(1, Keyword::EXISTS) {
            self.advance();
            self.advance();
            return Ok(true);
        }
        Ok(false)
    }
}
