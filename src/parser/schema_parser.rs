//! CREATE SCHEMA and ALTER SCHEMA parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE SCHEMA Sales
//! CREATE SCHEMA Sales AUTHORIZATION dbo
//! CREATE SCHEMA AUTHORIZATION dbo
//! CREATE SCHEMA Sales AUTHORIZATION dbo
//!     CREATE TABLE Orders (Id INT)
//!     CREATE VIEW vOrders AS SELECT Id FROM Orders
//!     GRANT SELECT ON vOrders TO reader
//!
//! ALTER SCHEMA Sales TRANSFER dbo.Orders
//! ALTER SCHEMA Sales TRANSFER OBJECT::dbo.Orders
//! ALTER SCHEMA Sales TRANSFER TYPE::dbo.Amount
//! ```

use super::keywords::Keyword;
use super::token::{Op, TokenKind};
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{
    AlterSchemaStatement, CreateMode, CreateSchemaStatement, Statement, StatementKind,
};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    pub(crate) fn parse_create_schema(&mut self, start: SourceSpan) -> ParseResult<CreateSchemaStatement> {
        self.expect_keyword(Keyword::SCHEMA)?;
        let name = if self.check_keyword(Keyword::AUTHORIZATION) {
            None
        } else {
            Some(self.parse_identifier()?)
        };
        let authorization = if self.eat_keyword(Keyword::AUTHORIZATION) {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        // Schema elements are not separated by semicolons; a semicolon
        // ends the CREATE SCHEMA.
        let mut elements = Vec::new();
        while self.check_schema_element() {
            let element_start = self.current_span();
            let kind = if self.check_keyword(Keyword::CREATE) {
                let create = self.advance().span;
                if self.check_keyword(Keyword::TABLE) {
                    StatementKind::CreateTable(Box::new(self.parse_create_table(create)?))
                } else {
                    StatementKind::View(Box::new(self.parse_view(CreateMode::Create, create)?))
                }
            } else {
                StatementKind::Permission(Box::new(self.parse_permission()?))
            };
            elements.push(Statement::new(kind, self.span_from(element_start)));
        }

        Ok(CreateSchemaStatement {
            name,
            authorization,
            elements,
            span: self.span_from(start),
        })
    }

    fn check_schema_element(&self) -> bool {
        (self.check_keyword(Keyword::CREATE)
            && (self.check_keyword_at(1, Keyword::TABLE) || self.check_keyword_at(1, Keyword::VIEW)))
            || self.check_keyword(Keyword::GRANT)
            || self.check_keyword(Keyword::DENY)
            || self.check_keyword(Keyword::REVOKE)
    }

    pub(crate) fn parse_alter_schema(&mut self, start: SourceSpan) -> ParseResult<AlterSchemaStatement> {
        self.expect_keyword(Keyword::SCHEMA)?;
        let name = self.parse_identifier()?;
        self.expect_word_ci("TRANSFER")?;
        let class = self.parse_securable_class()?;
        let transfer = self.parse_object_name()?;
        Ok(AlterSchemaStatement {
            name,
            class,
            transfer,
            span: self.span_from(start),
        })
    }

    /// `OBJECT ::`, `XML SCHEMA COLLECTION ::` and similar prefixes, upper-cased
    /// with single spaces between words. `None` when no `::` follows.
    pub(crate) fn parse_securable_class(&mut self) -> ParseResult<Option<String>> {
        let Some(words) = (1..=4).find(|&n| {
            self.check_op_at(n, Op::DoubleColon)
                && (0..n).all(|i| {
                    matches!(
                        self.peek_nth(i).kind,
                        TokenKind::Identifier | TokenKind::Keyword(_)
                    )
                })
        }) else {
            return Ok(None);
        };
        let mut class = Vec::with_capacity(words);
        for _ in 0..words {
            class.push(self.advance().text.to_uppercase());
        }
        self.expect_op(Op::DoubleColon)?;
        Ok(Some(class.join(" ")))
    }
}
