//! View definition parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE VIEW [schema].[name] AS SELECT ...
//! CREATE OR ALTER VIEW name (col1, col2) WITH SCHEMABINDING, VIEW_METADATA AS SELECT ...
//! ALTER VIEW name AS WITH cte AS (...) SELECT ... [WITH CHECK OPTION]
//! ```

use super::keywords::Keyword;
use super::token::Op;
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{CreateMode, ViewStatement};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    pub(crate) fn parse_view(&mut self, mode: CreateMode, start: SourceSpan) -> ParseResult<ViewStatement> {
        self.expect_keyword(Keyword::VIEW)?;
        let name = self.parse_object_name()?;
        let columns = if self.check_op(Op::LParen) {
            self.parse_parenthesized_identifiers()?
        } else {
            Vec::new()
        };
        let options = self.parse_module_options()?;

        self.expect_keyword(Keyword::AS)?;
        let query = Box::new(self.parse_query()?);

        let with_check_option = if self.check_keyword(Keyword::WITH) && self.check_keyword_at(1, Keyword::CHECK) {
            self.advance();
            self.advance();
            self.expect_keyword(Keyword::OPTION)?;
            true
        } else {
            false
        };

        Ok(ViewStatement {
            mode,
            name,
            columns,
            options,
            query,
            with_check_option,
            span: self.span_from(start),
        })
    }
}
