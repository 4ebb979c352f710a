//! Cursor statement parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! OPEN [GLOBAL] cursor_name | OPEN @cursor_variable
//! CLOSE [GLOBAL] cursor_name
//! DEALLOCATE [GLOBAL] cursor_name
//! FETCH [NEXT | PRIOR | FIRST | LAST | ABSOLUTE n | RELATIVE n] [FROM]
//!     [GLOBAL] cursor_name [INTO @var, ...]
//! ```
//!
//! DECLARE CURSOR lives with the other DECLARE forms.

use super::keywords::Keyword;
use super::token::TokenKind;
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{CursorRef, FetchDirection, FetchStatement, NameOrVariable};

impl<'a> TokenParser<'a> {
    /// `[GLOBAL] name | @variable`
    pub(crate) fn parse_cursor_ref(&mut self) -> ParseResult<CursorRef> {
        // GLOBAL is itself a valid cursor name
        let global = self.check_word_ci("GLOBAL")
            && matches!(
                self.peek_nth(1).kind,
                TokenKind::Identifier | TokenKind::QuotedIdentifier(_) | TokenKind::Variable
            );
        if global {
            self.advance();
        }

        let name = if self.check_variable() {
            let token = self.advance();
            NameOrVariable::Variable {
                name: token.text.to_string(),
                span: token.span,
            }
        } else {
            NameOrVariable::Name(self.parse_identifier()?)
        };
        Ok(CursorRef { global, name })
    }

    pub(crate) fn parse_fetch(&mut self) -> ParseResult<FetchStatement> {
        self.expect_keyword(Keyword::FETCH)?;

        let direction = if self.eat_word_ci("NEXT") {
            Some(FetchDirection::Next)
        } else if self.eat_word_ci("PRIOR") {
            Some(FetchDirection::Prior)
        } else if self.eat_word_ci("FIRST") {
            Some(FetchDirection::First)
        } else if self.eat_word_ci("LAST") {
            Some(FetchDirection::Last)
        } else if self.eat_word_ci("ABSOLUTE") {
            Some(FetchDirection::Absolute(self.parse_operand()?))
        } else if self.eat_word_ci("RELATIVE") {
            Some(FetchDirection::Relative(self.parse_operand()?))
        } else {
            None
        };

        let from = self.eat_keyword(Keyword::FROM);
        if direction.is_some() && !from {
            return Err(self.expected("FROM"));
        }

        let cursor = self.parse_cursor_ref()?;
        let into = if self.eat_keyword(Keyword::INTO) {
            self.parse_comma_separated(Self::parse_variable_name)?
        } else {
            Vec::new()
        };

        Ok(FetchStatement {
            direction,
            cursor,
            into,
        })
    }
}
