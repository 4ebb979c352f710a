//! Control-of-flow and transaction statements
//!
//! ## Supported Syntax
//!
//! ```sql
//! IF condition statement [ELSE statement]
//! WHILE condition statement
//! BEGIN statements END
//! BEGIN TRY statements END TRY BEGIN CATCH statements END CATCH
//! BEGIN ATOMIC WITH (TRANSACTION ISOLATION LEVEL = SNAPSHOT, LANGUAGE = N'English') ... END
//! RETURN [expr]
//! WAITFOR {DELAY 'hh:mm:ss' | TIME 'hh:mm:ss' | (RECEIVE ...) [, TIMEOUT n]}
//! RAISERROR (msg, severity, state [, args]) [WITH LOG | NOWAIT | SETERROR]
//! RAISERROR 50001 'legacy message'
//! THROW [number, message, state]
//! BEGIN [DISTRIBUTED] TRAN[SACTION] [name] [WITH MARK ['description']]
//! COMMIT [TRAN[SACTION] [name] | WORK] [WITH (DELAYED_DURABILITY = ON)]
//! ROLLBACK [TRAN[SACTION] [name] | WORK]
//! SAVE TRAN[SACTION] name
//! ```

use super::keywords::Keyword;
use super::token::{Op, TokenKind};
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{
    LegacyConstruct, NameOrVariable, RaiserrorStatement, Statement, StatementKind,
    ThrowStatement, TransactionStatement, WaitForKind,
};

impl<'a> TokenParser<'a> {
    // ========================================================================
    // Blocks
    // ========================================================================

    /// `END` closing a block (not `END CONVERSATION`).
    pub(crate) fn check_block_end(&self) -> bool {
        self.check_keyword(Keyword::END) && !self.check_word_ci_at(1, "CONVERSATION")
    }

    /// Statements up to and including the `END` of a block whose `BEGIN`
    /// has already been consumed.
    pub(crate) fn parse_block_body(&mut self) -> ParseResult<Vec<Statement>> {
        self.block_depth += 1;
        let statements = self.parse_statement_list(Self::check_block_end);
        self.block_depth -= 1;
        self.expect_keyword(Keyword::END)?;
        Ok(statements)
    }

    /// Everything that starts with `BEGIN`.
    pub(crate) fn parse_begin(&mut self) -> ParseResult<StatementKind> {
        if self.check_keyword_at(1, Keyword::TRAN)
            || self.check_keyword_at(1, Keyword::TRANSACTION)
            || self.check_keyword_at(1, Keyword::DISTRIBUTED)
        {
            return Ok(StatementKind::Transaction(self.parse_transaction()?));
        }
        if self.check_word_ci_at(1, "DIALOG") {
            return Ok(self.parse_opaque(2, &[]));
        }
        if self.check_word_ci_at(1, "CONVERSATION") && self.check_word_ci_at(2, "TIMER") {
            return Ok(self.parse_opaque(3, &[]));
        }
        if self.check_word_ci_at(1, "TRY") {
            return self.parse_try_catch();
        }

        self.expect_keyword(Keyword::BEGIN)?;
        // Natively compiled module body
        if self.eat_word_ci("ATOMIC") {
            self.expect_keyword(Keyword::WITH)?;
            self.consume_parenthesized()?;
        }
        Ok(StatementKind::Block(self.parse_block_body()?))
    }

    fn parse_try_catch(&mut self) -> ParseResult<StatementKind> {
        // Expect BEGIN TRY
        self.expect_keyword(Keyword::BEGIN)?;
        self.expect_word_ci("TRY")?;
        let try_block = self.parse_block_body()?;
        self.expect_word_ci("TRY")?;

        // Expect BEGIN CATCH
        self.expect_keyword(Keyword::BEGIN)?;
        self.expect_word_ci("CATCH")?;
        let catch_block = self.parse_block_body()?;
        self.expect_word_ci("CATCH")?;

        Ok(StatementKind::TryCatch {
            try_block,
            catch_block,
        })
    }

    // ========================================================================
    // IF / WHILE / RETURN
    // ========================================================================

    pub(crate) fn parse_if(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::IF)?;
        let condition = self.parse_expr()?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat_keyword(Keyword::ELSE) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StatementKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    pub(crate) fn parse_while(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::WHILE)?;
        let condition = self.parse_expr()?;
        let body = Box::new(self.parse_statement()?);
        Ok(StatementKind::While { condition, body })
    }

    /// `RETURN` takes a value unless the statement ends right after it.
    pub(crate) fn parse_return(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::RETURN)?;
        if self.at_statement_end() {
            return Ok(StatementKind::Return(None));
        }
        Ok(StatementKind::Return(Some(self.parse_expr()?)))
    }

    // ========================================================================
    // WAITFOR
    // ========================================================================

    pub(crate) fn parse_waitfor(&mut self) -> ParseResult<WaitForKind> {
        self.expect_keyword(Keyword::WAITFOR)?;
        if self.eat_word_ci("DELAY") {
            return Ok(WaitForKind::Delay(self.parse_operand()?));
        }
        if self.eat_word_ci("TIME") {
            return Ok(WaitForKind::Time(self.parse_operand()?));
        }

        // WAITFOR (RECEIVE ...) or WAITFOR (GET CONVERSATION GROUP ...)
        let open = self.expect_op(Op::LParen)?;
        let kind = if self.check_word_ci("RECEIVE") {
            StatementKind::Receive(Box::new(self.parse_receive()?))
        } else if self.check_word_ci("GET") {
            self.parse_opaque(3, &[])
        } else {
            return Err(self.expected("RECEIVE or GET CONVERSATION GROUP"));
        };
        let inner_span = self.span_from(open);
        self.expect_op(Op::RParen)?;
        let timeout = if self.eat_op(Op::Comma) {
            self.expect_word_ci("TIMEOUT")?;
            Some(self.parse_operand()?)
        } else {
            None
        };
        Ok(WaitForKind::Receive {
            statement: Box::new(Statement::new(kind, inner_span)),
            timeout,
        })
    }

    // ========================================================================
    // RAISERROR / THROW
    // ========================================================================

    pub(crate) fn parse_raiserror(&mut self) -> ParseResult<RaiserrorStatement> {
        let start = self.expect_keyword(Keyword::RAISERROR)?;

        // Legacy form: RAISERROR 50001 'message' (or with variables)
        if !self.check_op(Op::LParen) {
            let number = self.parse_operand()?;
            let text = self.parse_operand()?;
            self.note_legacy(LegacyConstruct::RaiserrorLegacySyntax, self.span_from(start));
            return Ok(RaiserrorStatement {
                message: number,
                severity: None,
                state: None,
                args: vec![text],
                options: Vec::new(),
                legacy: true,
            });
        }

        self.expect_op(Op::LParen)?;
        let message = self.parse_expr()?;
        self.expect_op(Op::Comma)?;
        let severity = Some(self.parse_expr()?);
        self.expect_op(Op::Comma)?;
        let state = Some(self.parse_expr()?);
        let mut args = Vec::new();
        while self.eat_op(Op::Comma) {
            args.push(self.parse_expr()?);
        }
        self.expect_op(Op::RParen)?;

        let mut options = Vec::new();
        if self.eat_keyword(Keyword::WITH) {
            options = self.parse_comma_separated(|p| {
                if p.check_word_ci("LOG") || p.check_word_ci("NOWAIT") || p.check_word_ci("SETERROR") {
                    Ok(p.advance().text.to_uppercase())
                } else {
                    Err(p.expected("LOG, NOWAIT or SETERROR"))
                }
            })?;
        }

        Ok(RaiserrorStatement {
            message,
            severity,
            state,
            args,
            options,
            legacy: false,
        })
    }

    /// `THROW` alone rethrows inside CATCH; otherwise all three arguments are required.
    pub(crate) fn parse_throw(&mut self) -> ParseResult<ThrowStatement> {
        self.expect_word_ci("THROW")?;
        if self.at_statement_end() {
            return Ok(ThrowStatement {
                error_number: None,
                message: None,
                state: None,
            });
        }
        let error_number = self.parse_expr()?;
        self.expect_op(Op::Comma)?;
        let message = self.parse_expr()?;
        self.expect_op(Op::Comma)?;
        let state = self.parse_expr()?;
        Ok(ThrowStatement {
            error_number: Some(error_number),
            message: Some(message),
            state: Some(state),
        })
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    pub(crate) fn parse_transaction(&mut self) -> ParseResult<TransactionStatement> {
        let token = self.advance();
        match token.keyword() {
            Some(Keyword::BEGIN) => {
                let distributed = self.eat_keyword(Keyword::DISTRIBUTED);
                self.expect_tran_keyword()?;
                let name = self.parse_transaction_name()?;
                let mark = if self.check_keyword(Keyword::WITH) && self.check_word_ci_at(1, "MARK") {
                    self.advance();
                    self.advance();
                    if self.check_string() {
                        Some(Some(self.parse_string_value()?))
                    } else {
                        Some(None)
                    }
                } else {
                    None
                };
                Ok(TransactionStatement::Begin {
                    distributed,
                    name,
                    mark,
                })
            }
            Some(Keyword::COMMIT) => {
                let name = if self.eat_tran_keyword() {
                    self.parse_transaction_name()?
                } else {
                    self.eat_word_ci("WORK");
                    None
                };
                let mut delayed_durability = None;
                if self.check_keyword(Keyword::WITH) && self.check_op_at(1, Op::LParen) {
                    self.advance();
                    self.advance();
                    self.expect_word_ci("DELAYED_DURABILITY")?;
                    self.expect_op(Op::Eq)?;
                    delayed_durability = Some(if self.eat_keyword(Keyword::ON) {
                        true
                    } else {
                        self.expect_keyword(Keyword::OFF)?;
                        false
                    });
                    self.expect_op(Op::RParen)?;
                }
                Ok(TransactionStatement::Commit {
                    name,
                    delayed_durability,
                })
            }
            Some(Keyword::ROLLBACK) => {
                let name = if self.eat_tran_keyword() {
                    self.parse_transaction_name()?
                } else {
                    self.eat_word_ci("WORK");
                    None
                };
                Ok(TransactionStatement::Rollback { name })
            }
            Some(Keyword::SAVE) => {
                self.expect_tran_keyword()?;
                let name = self
                    .parse_transaction_name()?
                    .ok_or_else(|| self.expected("savepoint name"))?;
                Ok(TransactionStatement::Save { name })
            }
            _ => Err(self.error_at(
                format!("expected transaction statement, found '{}'", token.text),
                token.span,
            )),
        }
    }

    fn eat_tran_keyword(&mut self) -> bool {
        self.eat_keyword(Keyword::TRAN) || self.eat_keyword(Keyword::TRANSACTION)
    }

    fn expect_tran_keyword(&mut self) -> ParseResult<()> {
        if self.eat_tran_keyword() {
            Ok(())
        } else {
            Err(self.expected("TRAN or TRANSACTION"))
        }
    }

    /// Optional transaction or savepoint name: an identifier or a variable.
    fn parse_transaction_name(&mut self) -> ParseResult<Option<NameOrVariable>> {
        if self.check_variable() {
            let token = self.advance();
            return Ok(Some(NameOrVariable::Variable {
                name: token.text.to_string(),
                span: token.span,
            }));
        }
        let is_name = matches!(
            self.peek().kind,
            TokenKind::Identifier | TokenKind::QuotedIdentifier(_)
        ) && !self.check_statement_word();
        if is_name {
            return Ok(Some(NameOrVariable::Name(self.parse_identifier()?)));
        }
        Ok(None)
    }
}
