//! Index definition parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE [UNIQUE] [CLUSTERED | NONCLUSTERED] INDEX [name] ON [schema].[table] (columns)
//! CREATE NONCLUSTERED INDEX [IX_Name] ON [dbo].[Table] ([Col1], [Col2] DESC)
//! CREATE UNIQUE CLUSTERED INDEX [IX_Name] ON [dbo].[Table] ([Col]) INCLUDE ([Col2])
//! CREATE NONCLUSTERED INDEX [IX_Name] ON [dbo].[Table] ([Col]) WHERE [Status] = 'Active'
//! CREATE NONCLUSTERED INDEX [IX_Name] ON [dbo].[Table] ([Col]) WITH (FILLFACTOR = 80) ON [PRIMARY]
//! CREATE INDEX ix ON t (c) WITH FILLFACTOR = 80, PAD_INDEX        -- legacy option list
//! CREATE CLUSTERED COLUMNSTORE INDEX cci ON dbo.Fact
//! CREATE NONCLUSTERED COLUMNSTORE INDEX ncci ON dbo.Fact (A, B)
//! CREATE PRIMARY XML INDEX px ON dbo.Docs (Body)
//! CREATE XML INDEX sx ON dbo.Docs (Body) USING XML INDEX px FOR PATH
//! CREATE SPATIAL INDEX si ON dbo.Places (Location) USING GEOGRAPHY_GRID WITH (...)
//!
//! ALTER INDEX {name | ALL} ON table {REBUILD | REORGANIZE | DISABLE | ...}
//!     [PARTITION = {ALL | n}] [WITH (options)]
//! ALTER INDEX name ON table SET (ALLOW_PAGE_LOCKS = ON)
//! ```

use super::keywords::Keyword;
use super::token::{Op, TokenKind};
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{AlterIndexStatement, CreateIndexStatement, IndexKind, RawOption};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    pub(crate) fn parse_create_index(&mut self, start: SourceSpan) -> ParseResult<CreateIndexStatement> {
        let unique = self.eat_keyword(Keyword::UNIQUE);
        let clustered = self.parse_clustered_option();

        let kind = if self.eat_word_ci("COLUMNSTORE") {
            IndexKind::Columnstore
        } else if self.eat_keyword(Keyword::PRIMARY) {
            self.expect_word_ci("XML")?;
            IndexKind::Xml { primary: true }
        } else if self.eat_word_ci("XML") {
            IndexKind::Xml { primary: false }
        } else if self.eat_word_ci("SPATIAL") {
            IndexKind::Spatial
        } else {
            IndexKind::Rowstore
        };

        self.expect_keyword(Keyword::INDEX)?;
        let name = self.parse_identifier()?;
        self.expect_keyword(Keyword::ON)?;
        let table = self.parse_object_name()?;

        // A clustered columnstore index covers the whole table
        let columns = if self.check_op(Op::LParen) {
            self.parse_index_column_list()?
        } else if kind == IndexKind::Columnstore && clustered == Some(true) {
            Vec::new()
        } else {
            return Err(self.expected("'('"));
        };

        let mut include = Vec::new();
        let mut filter = None;
        let mut using = None;
        let mut options = Vec::new();
        let mut on = None;
        loop {
            if self.eat_word_ci("INCLUDE") {
                include = self.parse_parenthesized_identifiers()?;
            } else if self.eat_keyword(Keyword::WHERE) {
                filter = Some(self.parse_expr()?);
            } else if self.check_word_ci("USING") {
                using = Some(self.parse_index_using()?);
            } else if self.check_word_ci("ORDER") && self.check_op_at(1, Op::LParen) {
                // Ordered clustered columnstore
                let option_start = self.advance().span;
                let span = self.consume_parenthesized()?;
                options.push(RawOption {
                    name: "ORDER".to_string(),
                    value: Some(self.text(span).to_string()),
                    span: self.span_from(option_start),
                });
            } else if self.check_keyword(Keyword::WITH) && self.check_op_at(1, Op::LParen) {
                self.advance();
                options.extend(self.parse_raw_option_list()?);
            } else if self.eat_keyword(Keyword::WITH) {
                options.extend(self.parse_comma_separated(Self::parse_unparenthesized_option)?);
            } else if self.check_keyword(Keyword::ON) {
                on = Some(self.parse_storage_clause()?);
            } else if self.eat_word_ci("FILESTREAM_ON") {
                let option_start = self.prev_span();
                let target = self.parse_storage_target()?;
                options.push(RawOption {
                    name: "FILESTREAM_ON".to_string(),
                    value: Some(target),
                    span: self.span_from(option_start),
                });
            } else {
                break;
            }
        }

        Ok(CreateIndexStatement {
            unique,
            clustered,
            kind,
            name,
            table,
            columns,
            include,
            filter,
            using,
            options,
            on,
            span: self.span_from(start),
        })
    }

    /// `USING XML INDEX parent FOR PATH` or `USING GEOMETRY_GRID`, as text.
    fn parse_index_using(&mut self) -> ParseResult<String> {
        self.expect_word_ci("USING")?;
        let start = self.current_span();
        let begin = self.pos();
        while !self.is_at_end()
            && !self.check_keyword(Keyword::WITH)
            && !self.check_keyword(Keyword::ON)
            && !self.check_op(Op::Semicolon)
            && !self.peek().keyword().is_some_and(Keyword::starts_statement)
        {
            self.advance();
        }
        if self.pos() == begin {
            return Err(self.expected("index type after USING"));
        }
        Ok(self.text(self.span_from(start)).to_string())
    }

    pub(crate) fn parse_alter_index(&mut self, start: SourceSpan) -> ParseResult<AlterIndexStatement> {
        self.expect_keyword(Keyword::INDEX)?;
        let name = if self.eat_keyword(Keyword::ALL) {
            None
        } else {
            Some(self.parse_identifier()?)
        };
        self.expect_keyword(Keyword::ON)?;
        let table = self.parse_object_name()?;

        let action = match self.peek().kind {
            TokenKind::Identifier | TokenKind::Keyword(_) => self.advance().text.to_uppercase(),
            _ => return Err(self.expected("ALTER INDEX action")),
        };

        let mut options = Vec::new();
        if action == "SET" {
            options = self.parse_raw_option_list()?;
        }
        loop {
            if self.check_word_ci("PARTITION") && self.check_op_at(1, Op::Eq) {
                let option_start = self.advance().span;
                self.advance();
                let value = self.advance().text.to_string();
                options.push(RawOption {
                    name: "PARTITION".to_string(),
                    value: Some(value),
                    span: self.span_from(option_start),
                });
            } else if self.check_keyword(Keyword::WITH) && self.check_op_at(1, Op::LParen) {
                self.advance();
                options.extend(self.parse_raw_option_list()?);
            } else {
                break;
            }
        }

        Ok(AlterIndexStatement {
            name,
            table,
            action,
            options,
            span: self.span_from(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SortDirection, Statement, StatementKind};
    use crate::parser::lexer::Lexer;

    fn parse(sql: &str) -> Vec<Statement> {
        let mut p = TokenParser::new(sql, Lexer::new(sql), SourceSpan::default());
        let statements = p.parse_statements();
        let diags = p.into_diagnostics();
        assert!(diags.is_empty(), "unexpected diagnostics for {sql}: {diags:?}");
        statements
    }

    fn parse_index(sql: &str) -> CreateIndexStatement {
        let mut statements = parse(sql);
        assert_eq!(statements.len(), 1);
        match statements.remove(0).kind {
            StatementKind::CreateIndex(index) => *index,
            other => panic!("expected CREATE INDEX, got {other:?}"),
        }
    }

    #[test]
    fn test_create_unique_clustered_index() {
        let index = parse_index("CREATE UNIQUE CLUSTERED INDEX [IX_Orders_Id] ON [dbo].[Orders] ([Id])");
        assert!(index.unique);
        assert_eq!(index.clustered, Some(true));
        assert_eq!(index.kind, IndexKind::Rowstore);
        assert_eq!(index.name.value, "IX_Orders_Id");
        assert_eq!(index.columns.len(), 1);
    }

    #[test]
    fn test_index_columns_include_filter_options() {
        let index = parse_index(
            "CREATE NONCLUSTERED INDEX IX_Name ON dbo.T (A, B DESC)
             INCLUDE (C, D)
             WHERE Status = 'Active'
             WITH (FILLFACTOR = 80, DATA_COMPRESSION = PAGE)
             ON [PRIMARY]",
        );
        assert_eq!(index.clustered, Some(false));
        assert_eq!(index.columns[1].direction, Some(SortDirection::Desc));
        assert_eq!(index.include.len(), 2);
        assert!(index.filter.is_some());
        assert_eq!(index.options.len(), 2);
        assert_eq!(index.options[0].name, "FILLFACTOR");
        assert_eq!(index.options[0].value.as_deref(), Some("80"));
        assert_eq!(index.on.as_deref(), Some("[PRIMARY]"));
    }

    #[test]
    fn test_legacy_option_list() {
        let index = parse_index("CREATE INDEX ix ON t (c) WITH FILLFACTOR = 70, PAD_INDEX ON [PRIMARY]");
        assert_eq!(index.clustered, None);
        let names: Vec<_> = index.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["FILLFACTOR", "PAD_INDEX"]);
        assert!(index.on.is_some());
    }

    #[test]
    fn test_columnstore_indexes() {
        let index = parse_index("CREATE CLUSTERED COLUMNSTORE INDEX cci ON dbo.Fact");
        assert_eq!(index.kind, IndexKind::Columnstore);
        assert!(index.columns.is_empty());

        let index = parse_index("CREATE NONCLUSTERED COLUMNSTORE INDEX ncci ON dbo.Fact (A, B)");
        assert_eq!(index.columns.len(), 2);
    }

    #[test]
    fn test_xml_and_spatial_indexes() {
        let index = parse_index("CREATE PRIMARY XML INDEX px ON dbo.Docs (Body)");
        assert_eq!(index.kind, IndexKind::Xml { primary: true });

        let index = parse_index("CREATE XML INDEX sx ON dbo.Docs (Body) USING XML INDEX px FOR PATH");
        assert_eq!(index.kind, IndexKind::Xml { primary: false });
        assert_eq!(index.using.as_deref(), Some("XML INDEX px FOR PATH"));

        let index = parse_index(
            "CREATE SPATIAL INDEX si ON dbo.Places (Location) USING GEOGRAPHY_GRID WITH (GRIDS = (LEVEL_1 = MEDIUM), CELLS_PER_OBJECT = 16)",
        );
        assert_eq!(index.kind, IndexKind::Spatial);
        assert_eq!(index.using.as_deref(), Some("GEOGRAPHY_GRID"));
        assert_eq!(index.options.len(), 2);
    }

    #[test]
    fn test_alter_index() {
        let statements = parse(
            "ALTER INDEX ALL ON dbo.Orders REBUILD PARTITION = ALL WITH (ONLINE = ON);
             ALTER INDEX IX_A ON dbo.Orders SET (ALLOW_PAGE_LOCKS = OFF);
             ALTER INDEX IX_A ON dbo.Orders DISABLE",
        );
        let StatementKind::AlterIndex(rebuild) = &statements[0].kind else {
            panic!("expected ALTER INDEX");
        };
        assert!(rebuild.name.is_none());
        assert_eq!(rebuild.action, "REBUILD");
        assert_eq!(rebuild.options.len(), 2);
        let StatementKind::AlterIndex(set) = &statements[1].kind else {
            panic!("expected ALTER INDEX");
        };
        assert_eq!(set.action, "SET");
        assert_eq!(set.options[0].name, "ALLOW_PAGE_LOCKS");
        let StatementKind::AlterIndex(disable) = &statements[2].kind else {
            panic!("expected ALTER INDEX");
        };
        assert!(disable.options.is_empty());
    }
}
