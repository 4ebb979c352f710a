//! Constraint parsing for T-SQL table definitions
//!
//! ## Supported Syntax
//!
//! Table-level constraints:
//! ```sql
//! CONSTRAINT [name] PRIMARY KEY CLUSTERED ([Col1], [Col2] DESC) WITH (FILLFACTOR = 80) ON [PRIMARY]
//! CONSTRAINT [name] UNIQUE NONCLUSTERED ([Col1])
//! CONSTRAINT [name] FOREIGN KEY ([Col]) REFERENCES [Table]([Col]) ON DELETE CASCADE
//! CONSTRAINT [name] CHECK NOT FOR REPLICATION ([expression])
//! CONSTRAINT [name] DEFAULT (0) FOR [Col]       -- ALTER TABLE ADD only
//! PRIMARY KEY ([Col1])                          -- unnamed
//! ```
//!
//! Column-level constraints omit the column list:
//! ```sql
//! [Id] INT CONSTRAINT [PK_T] PRIMARY KEY NONCLUSTERED
//! [ParentId] INT REFERENCES [dbo].[Parent] ([Id])
//! ```

use super::keywords::Keyword;
use super::token::Op;
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{
    Constraint, ConstraintKind, Ident, IndexColumn, RawOption, ReferentialAction, SortDirection,
};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    /// Whether the next tokens begin a constraint definition.
    pub(crate) fn check_constraint_start(&self) -> bool {
        self.check_keyword(Keyword::CONSTRAINT)
            || self.check_keyword(Keyword::PRIMARY)
            || self.check_keyword(Keyword::UNIQUE)
            || self.check_keyword(Keyword::CHECK)
            || self.check_keyword(Keyword::FOREIGN)
            || self.check_keyword(Keyword::REFERENCES)
            || self.check_keyword(Keyword::DEFAULT)
    }

    /// Parse a table-level constraint, named (CONSTRAINT [name] ...) or unnamed.
    pub(crate) fn parse_table_constraint(&mut self) -> ParseResult<Constraint> {
        let start = self.current_span();

        // Check for optional CONSTRAINT keyword and name
        let name = if self.eat_keyword(Keyword::CONSTRAINT) {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        self.parse_constraint_body(name, false, start)
    }

    /// Parse what follows `CONSTRAINT name` (or the bare constraint keyword).
    pub(crate) fn parse_constraint_body(
        &mut self,
        name: Option<Ident>,
        column_level: bool,
        start: SourceSpan,
    ) -> ParseResult<Constraint> {
        // Determine constraint type
        let kind = if self.check_keyword(Keyword::PRIMARY) {
            self.parse_primary_key_constraint(column_level)?
        } else if self.check_keyword(Keyword::UNIQUE) {
            self.parse_unique_constraint(column_level)?
        } else if self.check_keyword(Keyword::FOREIGN) || self.check_keyword(Keyword::REFERENCES) {
            self.parse_foreign_key_constraint(column_level)?
        } else if self.check_keyword(Keyword::CHECK) {
            self.parse_check_constraint()?
        } else if self.check_keyword(Keyword::DEFAULT) {
            self.parse_default_constraint(column_level)?
        } else {
            return Err(self.expected("PRIMARY KEY, UNIQUE, FOREIGN KEY, CHECK or DEFAULT"));
        };

        Ok(Constraint {
            name,
            kind,
            span: self.span_from(start),
        })
    }

    /// Parse PRIMARY KEY constraint
    fn parse_primary_key_constraint(&mut self, column_level: bool) -> ParseResult<ConstraintKind> {
        // Expect PRIMARY KEY keywords
        self.expect_keyword(Keyword::PRIMARY)?;
        self.expect_keyword(Keyword::KEY)?;

        let clustered = self.parse_clustered_option();
        let columns = self.parse_key_columns(column_level)?;
        let options = self.parse_constraint_index_options()?;

        Ok(ConstraintKind::PrimaryKey {
            clustered,
            columns,
            options,
        })
    }

    /// Parse UNIQUE constraint
    fn parse_unique_constraint(&mut self, column_level: bool) -> ParseResult<ConstraintKind> {
        // Expect UNIQUE keyword
        self.expect_keyword(Keyword::UNIQUE)?;

        let clustered = self.parse_clustered_option();
        let columns = self.parse_key_columns(column_level)?;
        let options = self.parse_constraint_index_options()?;

        Ok(ConstraintKind::Unique {
            clustered,
            columns,
            options,
        })
    }

    /// `CLUSTERED` / `NONCLUSTERED`, if present.
    pub(crate) fn parse_clustered_option(&mut self) -> Option<bool> {
        if self.eat_keyword(Keyword::CLUSTERED) {
            Some(true)
        } else if self.eat_keyword(Keyword::NONCLUSTERED) {
            Some(false)
        } else {
            None
        }
    }

    fn parse_key_columns(&mut self, column_level: bool) -> ParseResult<Vec<IndexColumn>> {
        // A column-level key may still name its column explicitly
        if column_level && !self.check_op(Op::LParen) {
            return Ok(Vec::new());
        }
        self.parse_index_column_list()
    }

    /// `WITH (options)`, legacy `WITH FILLFACTOR = n`, and `ON storage` after a key.
    fn parse_constraint_index_options(&mut self) -> ParseResult<Vec<RawOption>> {
        let mut options = Vec::new();
        if self.check_keyword(Keyword::WITH) && self.check_op_at(1, Op::LParen) {
            self.advance();
            options = self.parse_raw_option_list()?;
        } else if self.check_keyword(Keyword::WITH) && self.check_keyword_at(1, Keyword::FILLFACTOR) {
            self.advance();
            options.push(self.parse_raw_option()?);
        }
        if self.check_keyword(Keyword::ON) && !self.check_keyword_at(1, Keyword::DELETE) {
            let start = self.current_span();
            let storage = self.parse_storage_clause()?;
            options.push(RawOption {
                name: "ON".to_string(),
                value: Some(storage),
                span: self.span_from(start),
            });
        }
        Ok(options)
    }

    /// Parse FOREIGN KEY constraint
    fn parse_foreign_key_constraint(&mut self, column_level: bool) -> ParseResult<ConstraintKind> {
        // FOREIGN KEY (columns) is optional at column level
        let columns = if self.eat_keyword(Keyword::FOREIGN) {
            self.expect_keyword(Keyword::KEY)?;
            if column_level && !self.check_op(Op::LParen) {
                Vec::new()
            } else {
                self.parse_parenthesized_identifiers()?
            }
        } else {
            Vec::new()
        };

        // Expect REFERENCES keyword
        self.expect_keyword(Keyword::REFERENCES)?;
        let references = self.parse_object_name()?;
        let referenced_columns = if self.check_op(Op::LParen) {
            self.parse_parenthesized_identifiers()?
        } else {
            Vec::new()
        };

        // ON DELETE / ON UPDATE in either order
        let mut on_delete = None;
        let mut on_update = None;
        while self.check_keyword(Keyword::ON) {
            if self.check_keyword_at(1, Keyword::DELETE) {
                self.advance();
                self.advance();
                on_delete = Some(self.parse_referential_action()?);
            } else if self.check_keyword_at(1, Keyword::UPDATE) {
                self.advance();
                self.advance();
                on_update = Some(self.parse_referential_action()?);
            } else {
                break;
            }
        }

        let not_for_replication = self.parse_not_for_replication()?;

        Ok(ConstraintKind::ForeignKey {
            columns,
            references,
            referenced_columns,
            on_delete,
            on_update,
            not_for_replication,
        })
    }

    fn parse_referential_action(&mut self) -> ParseResult<ReferentialAction> {
        if self.eat_word_ci("NO") {
            self.expect_word_ci("ACTION")?;
            Ok(ReferentialAction::NoAction)
        } else if self.eat_keyword(Keyword::CASCADE) {
            Ok(ReferentialAction::Cascade)
        } else if self.eat_keyword(Keyword::SET) {
            if self.eat_keyword(Keyword::NULL) {
                Ok(ReferentialAction::SetNull)
            } else {
                self.expect_keyword(Keyword::DEFAULT)?;
                Ok(ReferentialAction::SetDefault)
            }
        } else {
            Err(self.expected("NO ACTION, CASCADE, SET NULL or SET DEFAULT"))
        }
    }

    /// `NOT FOR REPLICATION`, if present.
    pub(crate) fn parse_not_for_replication(&mut self) -> ParseResult<bool> {
        if self.check_keyword(Keyword::NOT) && self.check_keyword_at(1, Keyword::FOR) {
            self.advance();
            self.advance();
            self.expect_keyword(Keyword::REPLICATION)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Parse CHECK constraint
    fn parse_check_constraint(&mut self) -> ParseResult<ConstraintKind> {
        // Expect CHECK keyword
        self.expect_keyword(Keyword::CHECK)?;
        let not_for_replication = self.parse_not_for_replication()?;

        // Parse expression in parentheses
        self.expect_op(Op::LParen)?;
        let expr = self.parse_expr()?;
        self.expect_op(Op::RParen)?;

        Ok(ConstraintKind::Check {
            expr,
            not_for_replication,
        })
    }

    /// Parse DEFAULT constraint: `DEFAULT expr [FOR column] [WITH VALUES]`
    fn parse_default_constraint(&mut self, column_level: bool) -> ParseResult<ConstraintKind> {
        self.expect_keyword(Keyword::DEFAULT)?;
        let expr = self.parse_expr()?;
        let for_column = if !column_level && self.eat_keyword(Keyword::FOR) {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        if self.check_keyword(Keyword::WITH) && self.check_word_ci_at(1, "VALUES") {
            self.advance();
            self.advance();
        }
        Ok(ConstraintKind::Default { expr, for_column })
    }

    /// Parse a column list for a key or index.
    /// Format: ([Col1] [ASC|DESC], [Col2] [ASC|DESC], ...)
    pub(crate) fn parse_index_column_list(&mut self) -> ParseResult<Vec<IndexColumn>> {
        self.expect_op(Op::LParen)?;
        let columns = self.parse_comma_separated(|p| {
            let name = p.parse_identifier()?;
            let direction = if p.eat_keyword(Keyword::ASC) {
                Some(SortDirection::Asc)
            } else if p.eat_keyword(Keyword::DESC) {
                Some(SortDirection::Desc)
            } else {
                None
            };
            Ok(IndexColumn { name, direction })
        })?;
        self.expect_op(Op::RParen)?;
        Ok(columns)
    }

    /// `ON {filegroup | partition_scheme (column) | "default" | PRIMARY}` as text,
    /// with the leading `ON` consumed.
    pub(crate) fn parse_storage_clause(&mut self) -> ParseResult<String> {
        self.expect_keyword(Keyword::ON)?;
        self.parse_storage_target()
    }

    /// Storage target after `ON`, `TEXTIMAGE_ON` or `FILESTREAM_ON`.
    pub(crate) fn parse_storage_target(&mut self) -> ParseResult<String> {
        let start = self.current_span();
        if self.eat_keyword(Keyword::PRIMARY) || self.eat_keyword(Keyword::DEFAULT) {
            return Ok(self.text(self.span_from(start)).to_string());
        }
        if self.check_string() {
            return self.parse_string_value();
        }
        self.parse_identifier()?;
        if self.check_op(Op::LParen) {
            self.consume_parenthesized()?;
        }
        Ok(self.text(self.span_from(start)).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Lexer;

    fn parse(sql: &str) -> Constraint {
        let mut parser = TokenParser::new(sql, Lexer::new(sql), SourceSpan::default());
        let constraint = parser.parse_table_constraint().unwrap();
        assert!(parser.is_at_end(), "unconsumed input in {sql}");
        constraint
    }

    #[test]
    fn test_table_pk_named() {
        let c = parse("CONSTRAINT [PK_Orders] PRIMARY KEY CLUSTERED ([Id] ASC, [Line] DESC)");
        assert_eq!(c.name.unwrap().value, "PK_Orders");
        let ConstraintKind::PrimaryKey {
            clustered, columns, ..
        } = c.kind
        else {
            panic!("expected primary key");
        };
        assert_eq!(clustered, Some(true));
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1].direction, Some(SortDirection::Desc));
    }

    #[test]
    fn test_table_pk_unnamed_with_options() {
        let c = parse("PRIMARY KEY NONCLUSTERED (Id) WITH (FILLFACTOR = 80) ON [PRIMARY]");
        assert!(c.name.is_none());
        let ConstraintKind::PrimaryKey {
            clustered, options, ..
        } = c.kind
        else {
            panic!("expected primary key");
        };
        assert_eq!(clustered, Some(false));
        let names: Vec<_> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["FILLFACTOR", "ON"]);
    }

    #[test]
    fn test_table_unique_unnamed() {
        let c = parse("UNIQUE ([Email])");
        assert!(matches!(
            c.kind,
            ConstraintKind::Unique {
                clustered: None,
                ..
            }
        ));
    }

    #[test]
    fn test_table_fk_with_actions() {
        let c = parse(
            "CONSTRAINT FK_Child_Parent FOREIGN KEY (ParentId) REFERENCES dbo.Parent (Id) \
             ON UPDATE NO ACTION ON DELETE CASCADE NOT FOR REPLICATION",
        );
        let ConstraintKind::ForeignKey {
            columns,
            references,
            on_delete,
            on_update,
            not_for_replication,
            ..
        } = c.kind
        else {
            panic!("expected foreign key");
        };
        assert_eq!(columns[0].value, "ParentId");
        assert_eq!(references.to_string(), "dbo.Parent");
        assert_eq!(on_delete, Some(ReferentialAction::Cascade));
        assert_eq!(on_update, Some(ReferentialAction::NoAction));
        assert!(not_for_replication);
    }

    #[test]
    fn test_table_check_nested_parens() {
        let c = parse("CONSTRAINT CK_Range CHECK (([Qty] > (0)) AND [Qty] < 100)");
        assert!(matches!(c.kind, ConstraintKind::Check { .. }));
    }

    #[test]
    fn test_default_for_column() {
        let c = parse("CONSTRAINT DF_Created DEFAULT (GETDATE()) FOR [Created]");
        let ConstraintKind::Default { for_column, .. } = c.kind else {
            panic!("expected default");
        };
        assert_eq!(for_column.unwrap().value, "Created");
    }
}
