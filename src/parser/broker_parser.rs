//! Service Broker parsing: RECEIVE, queues and services
//!
//! ## Supported Syntax
//!
//! ```sql
//! RECEIVE [TOP (n)] column_list FROM queue [INTO @table_variable] [WHERE condition]
//!
//! CREATE QUEUE name [WITH STATUS = ON, RETENTION = OFF, ACTIVATION (...),
//!     POISON_MESSAGE_HANDLING (STATUS = ON)] [ON {filegroup | DEFAULT}]
//! ALTER QUEUE name WITH option [, ...]
//! ALTER QUEUE name {REBUILD | REORGANIZE | MOVE TO} ...   -- kept as an option
//!
//! CREATE SERVICE name [AUTHORIZATION owner] ON QUEUE queue [(contract [, ...])]
//! ALTER SERVICE name [ON QUEUE queue] [(ADD CONTRACT c | DROP CONTRACT c [, ...])]
//! ```
//!
//! SEND, GET CONVERSATION GROUP, MOVE CONVERSATION, BEGIN DIALOG and END
//! CONVERSATION are kept as text by the statement dispatcher.

use super::keywords::Keyword;
use super::token::Op;
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{CreateMode, QueueStatement, RawOption, ReceiveStatement, ServiceStatement};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    pub(crate) fn parse_receive(&mut self) -> ParseResult<ReceiveStatement> {
        self.expect_word_ci("RECEIVE")?;
        let top = self.parse_top()?;
        let items = self.parse_comma_separated(Self::parse_select_item)?;
        self.expect_keyword(Keyword::FROM)?;
        let queue = self.parse_object_name()?;
        let into = if self.eat_keyword(Keyword::INTO) {
            Some(self.parse_variable_name()?)
        } else {
            None
        };
        let selection = if self.eat_keyword(Keyword::WHERE) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(ReceiveStatement {
            top,
            items,
            queue,
            into,
            selection,
        })
    }

    // ========================================================================
    // Queues
    // ========================================================================

    pub(crate) fn parse_queue(&mut self, mode: CreateMode, start: SourceSpan) -> ParseResult<QueueStatement> {
        self.expect_word_ci("QUEUE")?;
        let name = self.parse_object_name()?;

        let mut options = Vec::new();
        if self.eat_keyword(Keyword::WITH) {
            options = self.parse_comma_separated(Self::parse_unparenthesized_option)?;
        } else if mode == CreateMode::Alter && !self.at_statement_end() {
            // REBUILD, REORGANIZE, MOVE TO
            let option_start = self.current_span();
            let action = self.advance().text.to_uppercase();
            let rest = self.consume_statement_text(&[Keyword::WITH]);
            options.push(RawOption {
                name: action,
                value: (!rest.is_empty()).then(|| self.text(rest).to_string()),
                span: self.span_from(option_start),
            });
        }

        let on = if self.check_keyword(Keyword::ON) {
            Some(self.parse_storage_clause()?)
        } else {
            None
        };

        Ok(QueueStatement {
            mode,
            name,
            options,
            on,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // Services
    // ========================================================================

    pub(crate) fn parse_service(&mut self, mode: CreateMode, start: SourceSpan) -> ParseResult<ServiceStatement> {
        self.expect_word_ci("SERVICE")?;
        let name = self.parse_identifier()?;
        let authorization = if self.eat_keyword(Keyword::AUTHORIZATION) {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        let queue = if self.check_keyword(Keyword::ON) && self.check_word_ci_at(1, "QUEUE") {
            self.advance();
            self.advance();
            Some(self.parse_object_name()?)
        } else {
            None
        };

        let mut contracts = Vec::new();
        let mut dropped_contracts = Vec::new();
        if self.eat_op(Op::LParen) {
            loop {
                if mode == CreateMode::Alter && self.eat_keyword(Keyword::ADD) {
                    self.expect_word_ci("CONTRACT")?;
                    contracts.push(self.parse_identifier()?);
                } else if mode == CreateMode::Alter && self.eat_keyword(Keyword::DROP) {
                    self.expect_word_ci("CONTRACT")?;
                    dropped_contracts.push(self.parse_identifier()?);
                } else {
                    contracts.push(self.parse_identifier()?);
                }
                if !self.eat_op(Op::Comma) {
                    break;
                }
            }
            self.expect_op(Op::RParen)?;
        }

        Ok(ServiceStatement {
            mode,
            name,
            authorization,
            queue,
            contracts,
            dropped_contracts,
            span: self.span_from(start),
        })
    }
}
