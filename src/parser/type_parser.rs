//! CREATE TYPE parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE TYPE [schema].[name] FROM NVARCHAR(50) [NULL | NOT NULL]
//! CREATE TYPE [schema].[name] AS TABLE (
//!     [Col1] INT NOT NULL,
//!     [Col2] NVARCHAR(50) DEFAULT 'value',
//!     PRIMARY KEY CLUSTERED ([Col1]),
//!     UNIQUE NONCLUSTERED ([Col2]),
//!     CHECK ([Col1] > 0),
//!     INDEX [IX_Name] NONCLUSTERED ([Col2])
//! ) [WITH (MEMORY_OPTIMIZED = ON)]
//! CREATE TYPE [schema].[name] EXTERNAL NAME assembly.[class]
//! ```

use super::keywords::Keyword;
use super::token::Op;
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{CreateTypeStatement, TypeDefinition};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    pub(crate) fn parse_create_type(&mut self, start: SourceSpan) -> ParseResult<CreateTypeStatement> {
        self.expect_word_ci("TYPE")?;
        let name = self.parse_object_name()?;

        let mut options = Vec::new();
        let definition = if self.eat_keyword(Keyword::FROM) {
            let base = self.parse_data_type()?;
            let nullable = if self.eat_keyword(Keyword::NULL) {
                Some(true)
            } else if self.check_keyword(Keyword::NOT) && self.check_keyword_at(1, Keyword::NULL) {
                self.advance();
                self.advance();
                Some(false)
            } else {
                None
            };
            TypeDefinition::Alias { base, nullable }
        } else if self.eat_keyword(Keyword::AS) {
            self.expect_keyword(Keyword::TABLE)?;
            let elements = self.parse_table_elements()?;
            if self.check_keyword(Keyword::WITH) && self.check_op_at(1, Op::LParen) {
                self.advance();
                options = self.parse_raw_option_list()?;
            }
            TypeDefinition::Table(elements)
        } else if self.check_keyword(Keyword::EXTERNAL) && self.check_word_ci_at(1, "NAME") {
            self.advance();
            self.advance();
            TypeDefinition::External(self.parse_object_name()?)
        } else {
            return Err(self.expected("FROM, AS TABLE or EXTERNAL NAME"));
        };

        Ok(CreateTypeStatement {
            name,
            definition,
            options,
            span: self.span_from(start),
        })
    }
}
