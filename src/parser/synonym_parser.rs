//! CREATE SYNONYM parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE SYNONYM [schema].[name] FOR [target_schema].[target_name]
//! CREATE SYNONYM [schema].[name] FOR [database].[target_schema].[target_name]
//! CREATE SYNONYM [schema].[name] FOR [server].[database].[target_schema].[target_name]
//! CREATE SYNONYM [schema].[name] FOR [database]..[target_name]
//! ```

use super::keywords::Keyword;
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::SynonymStatement;
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    pub(crate) fn parse_synonym(&mut self, start: SourceSpan) -> ParseResult<SynonymStatement> {
        self.expect_word_ci("SYNONYM")?;
        let name = self.parse_object_name()?;
        self.expect_keyword(Keyword::FOR)?;
        let target = self.parse_object_name()?;
        if target.parts.len() > 4 {
            return Err(self.error_at("synonym target has more than four name parts", target.span));
        }
        Ok(SynonymStatement {
            name,
            target,
            span: self.span_from(start),
        })
    }
}
