//! Function definition parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE FUNCTION [schema].[name](@param1 TYPE, ...) RETURNS TYPE [WITH options] AS BEGIN ... END
//! CREATE OR ALTER FUNCTION [schema].[name](...) RETURNS TABLE [AS] RETURN (SELECT ...)
//! ALTER FUNCTION [schema].[name](...) RETURNS @t TABLE (Id INT, ...) AS BEGIN ... RETURN END
//! CREATE FUNCTION [schema].[name](...) RETURNS TYPE AS EXTERNAL NAME asm.class.method
//! ```
//!
//! Function types supported:
//! - Scalar functions (RETURNS <type>)
//! - Inline table-valued functions (RETURNS TABLE)
//! - Multi-statement table-valued functions (RETURNS @var TABLE)

use super::keywords::Keyword;
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{CreateMode, FunctionBody, FunctionReturns, FunctionStatement};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    pub(crate) fn parse_function(&mut self, mode: CreateMode, start: SourceSpan) -> ParseResult<FunctionStatement> {
        self.expect_keyword(Keyword::FUNCTION)?;
        let name = self.parse_object_name()?;
        let parameters = self.parse_parenthesized_parameters()?;

        self.expect_word_ci("RETURNS")?;
        let returns = if self.eat_keyword(Keyword::TABLE) {
            FunctionReturns::Table
        } else if self.check_variable() {
            let variable = self.parse_variable_name()?;
            self.expect_keyword(Keyword::TABLE)?;
            let elements = self.parse_table_elements()?;
            FunctionReturns::TableVariable { variable, elements }
        } else {
            FunctionReturns::Scalar(self.parse_data_type()?)
        };

        let options = self.parse_module_options()?;
        self.eat_keyword(Keyword::AS);

        let body = if self.check_keyword(Keyword::EXTERNAL) && self.check_word_ci_at(1, "NAME") {
            self.advance();
            self.advance();
            FunctionBody::External(self.parse_object_name()?)
        } else if matches!(returns, FunctionReturns::Table) {
            self.expect_keyword(Keyword::RETURN)?;
            FunctionBody::Return(Box::new(self.parse_query()?))
        } else {
            self.expect_keyword(Keyword::BEGIN)?;
            if self.eat_word_ci("ATOMIC") {
                self.expect_keyword(Keyword::WITH)?;
                self.consume_parenthesized()?;
            }
            FunctionBody::Block(self.parse_block_body()?)
        };

        Ok(FunctionStatement {
            mode,
            name,
            parameters,
            returns,
            options,
            body,
            span: self.span_from(start),
        })
    }
}
