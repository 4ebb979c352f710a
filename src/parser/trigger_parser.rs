//! Trigger definition parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE TRIGGER [schema].[name] ON [schema].[table] FOR INSERT, UPDATE AS ...
//! CREATE TRIGGER [schema].[name] ON [schema].[table] AFTER DELETE AS ...
//! CREATE TRIGGER [schema].[name] ON [schema].[view] INSTEAD OF INSERT AS ...
//! CREATE OR ALTER TRIGGER name ON table WITH ENCRYPTION AFTER INSERT NOT FOR REPLICATION AS ...
//! CREATE TRIGGER name ON table FOR UPDATE WITH APPEND AS ...
//! CREATE TRIGGER name ON DATABASE FOR CREATE_TABLE, DROP_TABLE AS ...
//! CREATE TRIGGER name ON ALL SERVER FOR LOGON AS ...
//! ```

use super::keywords::Keyword;
use super::token::TokenKind;
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{CreateMode, TriggerStatement, TriggerTarget, TriggerTiming};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    pub(crate) fn parse_trigger(&mut self, mode: CreateMode, start: SourceSpan) -> ParseResult<TriggerStatement> {
        self.expect_keyword(Keyword::TRIGGER)?;
        let name = self.parse_object_name()?;

        self.expect_keyword(Keyword::ON)?;
        let target = if self.eat_keyword(Keyword::DATABASE) {
            TriggerTarget::Database
        } else if self.check_keyword(Keyword::ALL) && self.check_word_ci_at(1, "SERVER") {
            self.advance();
            self.advance();
            TriggerTarget::AllServer
        } else {
            TriggerTarget::Object(self.parse_object_name()?)
        };

        let options = self.parse_module_options()?;

        let timing = if self.eat_keyword(Keyword::FOR) {
            TriggerTiming::For
        } else if self.eat_word_ci("AFTER") {
            TriggerTiming::After
        } else if self.eat_word_ci("INSTEAD") {
            self.expect_keyword(Keyword::OF)?;
            TriggerTiming::InsteadOf
        } else {
            return Err(self.expected("FOR, AFTER or INSTEAD OF"));
        };

        let events = self.parse_comma_separated(|p| match p.peek().kind {
            TokenKind::Keyword(_) | TokenKind::Identifier => Ok(p.advance().text.to_uppercase()),
            _ => Err(p.expected("trigger event")),
        })?;

        let with_append = if self.check_keyword(Keyword::WITH) && self.check_word_ci_at(1, "APPEND") {
            self.advance();
            self.advance();
            true
        } else {
            false
        };
        let not_for_replication = self.parse_not_for_replication()?;

        self.expect_keyword(Keyword::AS)?;
        let body = self.parse_procedure_body()?;

        Ok(TriggerStatement {
            mode,
            name,
            target,
            options,
            timing,
            events,
            with_append,
            not_for_replication,
            body,
            span: self.span_from(start),
        })
    }
}
