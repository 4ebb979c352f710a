//! Sequence definition parsing
//!
//! ## Supported Syntax
//!
//! CREATE SEQUENCE:
//! ```sql
//! CREATE SEQUENCE [schema].[name] AS BIGINT START WITH 1 INCREMENT BY 1
//! CREATE SEQUENCE [schema].[name] MINVALUE 0 MAXVALUE 1000000 NO CYCLE
//! CREATE SEQUENCE [schema].[name] AS INT START WITH 100 INCREMENT BY 10 CACHE 50
//! CREATE SEQUENCE [schema].[name] NO MINVALUE NO MAXVALUE CYCLE NO CACHE
//! ```
//!
//! ALTER SEQUENCE:
//! ```sql
//! ALTER SEQUENCE [schema].[name] RESTART WITH 1000
//! ALTER SEQUENCE [schema].[name] INCREMENT BY 5
//! ALTER SEQUENCE [schema].[name] MINVALUE 1 MAXVALUE 10000 CYCLE
//! ```

use super::keywords::Keyword;
use super::token::TokenKind;
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{CreateMode, Expr, SequenceOption, SequenceStatement};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    pub(crate) fn parse_sequence(&mut self, mode: CreateMode, start: SourceSpan) -> ParseResult<SequenceStatement> {
        self.expect_word_ci("SEQUENCE")?;
        let name = self.parse_object_name()?;

        let data_type = if mode != CreateMode::Alter && self.eat_keyword(Keyword::AS) {
            Some(self.parse_data_type()?)
        } else {
            None
        };

        let mut options = Vec::new();
        while let Some(option) = self.parse_sequence_option(mode)? {
            options.push(option);
        }

        Ok(SequenceStatement {
            mode,
            name,
            data_type,
            options,
            span: self.span_from(start),
        })
    }

    fn parse_sequence_option(&mut self, mode: CreateMode) -> ParseResult<Option<SequenceOption>> {
        let option = if self.eat_word_ci("START") {
            self.expect_keyword(Keyword::WITH)?;
            SequenceOption::StartWith(self.parse_sequence_value()?)
        } else if mode == CreateMode::Alter && self.eat_word_ci("RESTART") {
            let value = if self.eat_keyword(Keyword::WITH) {
                Some(self.parse_sequence_value()?)
            } else {
                None
            };
            SequenceOption::Restart(value)
        } else if self.eat_word_ci("INCREMENT") {
            self.expect_keyword(Keyword::BY)?;
            SequenceOption::IncrementBy(self.parse_sequence_value()?)
        } else if self.eat_word_ci("MINVALUE") {
            SequenceOption::MinValue(Some(self.parse_sequence_value()?))
        } else if self.eat_word_ci("MAXVALUE") {
            SequenceOption::MaxValue(Some(self.parse_sequence_value()?))
        } else if self.eat_word_ci("CYCLE") {
            SequenceOption::Cycle(true)
        } else if self.eat_word_ci("CACHE") {
            // The size is optional
            let size = if matches!(self.peek().kind, TokenKind::Number(_) | TokenKind::Variable) {
                Some(self.parse_sequence_value()?)
            } else {
                None
            };
            SequenceOption::Cache(size)
        } else if self.eat_word_ci("NO") {
            if self.eat_word_ci("MINVALUE") {
                SequenceOption::MinValue(None)
            } else if self.eat_word_ci("MAXVALUE") {
                SequenceOption::MaxValue(None)
            } else if self.eat_word_ci("CYCLE") {
                SequenceOption::Cycle(false)
            } else if self.eat_word_ci("CACHE") {
                SequenceOption::Cache(None)
            } else {
                return Err(self.expected("MINVALUE, MAXVALUE, CYCLE or CACHE"));
            }
        } else {
            return Ok(None);
        };
        Ok(Some(option))
    }

    /// A constant, possibly signed. Operands keep `START WITH -1 INCREMENT BY 1`
    /// from reading as a subtraction.
    fn parse_sequence_value(&mut self) -> ParseResult<Expr> {
        self.parse_operand()
    }
}
