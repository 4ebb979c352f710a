//! EXECUTE, EXECUTE AS and REVERT parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! EXEC [@rc =] [db.]schema.proc[;N] [[@p =] value [OUTPUT] [, ...]]
//!     [WITH RECOMPILE | RESULT SETS {NONE | UNDEFINED | ((col type, ...), ...)}]
//! EXEC @proc_variable args
//! EXEC ('SELECT ' + @cols + ' FROM t') [AS {USER | LOGIN} = 'name'] [AT linked_server]
//! proc_name args                      -- first statement of a batch
//!
//! EXECUTE AS {CALLER | SELF | OWNER | USER = 'name' | LOGIN = 'name'}
//!     [WITH NO REVERT | WITH COOKIE INTO @cookie]
//! REVERT [WITH COOKIE = @cookie]
//! ```

use super::keywords::Keyword;
use super::token::{NumberKind, Op, TokenKind};
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{
    ExecuteArg, ExecuteAsPrincipal, ExecuteAsStatement, ExecuteOption, ExecuteStatement,
    ExecuteTarget, LegacyConstruct, ResultColumn, ResultSetDefinition, ResultSets, StatementKind,
};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    // ========================================================================
    // EXECUTE
    // ========================================================================

    pub(crate) fn parse_execute(&mut self) -> ParseResult<ExecuteStatement> {
        let start = self.current_span();
        if !self.eat_keyword(Keyword::EXEC) {
            self.expect_keyword(Keyword::EXECUTE)?;
        }

        if self.check_op(Op::LParen) {
            return self.parse_dynamic_execute(start);
        }
        self.parse_execute_call(start)
    }

    /// `EXEC ( string_expr [, ...] ) [AS USER|LOGIN = 'x'] [AT server]`
    fn parse_dynamic_execute(&mut self, start: SourceSpan) -> ParseResult<ExecuteStatement> {
        self.expect_op(Op::LParen)?;
        let batch = self.parse_expr_list()?;
        self.expect_op(Op::RParen)?;

        let context = if self.check_keyword(Keyword::AS)
            && (self.check_keyword_at(1, Keyword::USER) || self.check_word_ci_at(1, "LOGIN"))
        {
            self.advance();
            Some(self.parse_execute_as_principal()?)
        } else {
            None
        };

        let at_server = if self.eat_word_ci("AT") {
            // AT DATA_SOURCE name
            self.eat_word_ci("DATA_SOURCE");
            Some(self.parse_identifier()?)
        } else {
            None
        };

        Ok(ExecuteStatement {
            return_status: None,
            target: ExecuteTarget::Dynamic(batch),
            args: Vec::new(),
            context,
            at_server,
            options: Vec::new(),
            span: self.span_from(start),
        })
    }

    /// A procedure call after `EXEC`, or on its own at the start of a batch.
    pub(crate) fn parse_execute_call(&mut self, start: SourceSpan) -> ParseResult<ExecuteStatement> {
        let return_status = if self.check_variable() && self.check_op_at(1, Op::Eq) {
            let name = self.parse_variable_name()?;
            self.advance();
            Some(name)
        } else {
            None
        };

        let target = if self.check_variable() {
            ExecuteTarget::ProcedureVariable(self.parse_variable_name()?)
        } else {
            let name = self.parse_object_name()?;
            let number = self.parse_procedure_number()?;
            ExecuteTarget::Procedure { name, number }
        };

        let args = if self.check_execute_arg_start() {
            self.parse_comma_separated(Self::parse_execute_arg)?
        } else {
            Vec::new()
        };

        let mut options = Vec::new();
        if self.check_keyword(Keyword::WITH)
            && (self.check_word_ci_at(1, "RECOMPILE") || self.check_word_ci_at(1, "RESULT"))
        {
            self.advance();
            options = self.parse_comma_separated(Self::parse_execute_option)?;
        }

        Ok(ExecuteStatement {
            return_status,
            target,
            args,
            context: None,
            at_server: None,
            options,
            span: self.span_from(start),
        })
    }

    /// `;N` written directly after a procedure name.
    pub(crate) fn parse_procedure_number(&mut self) -> ParseResult<Option<u32>> {
        let semicolon = *self.peek();
        if semicolon.op() != Some(Op::Semicolon)
            || !semicolon.leading_trivia.is_empty()
            || !self.check_adjacent_integer_at(1)
        {
            return Ok(None);
        }
        self.advance();
        let span = self.current_span();
        let value = self.parse_positive_integer()?;
        let number = u32::try_from(value)
            .map_err(|_| self.error_at(format!("procedure number {value} is out of range"), span))?;
        self.note_legacy(LegacyConstruct::NumberedProcedure, semicolon.span.to(span));
        Ok(Some(number))
    }

    /// An integer literal at `offset` with no whitespace before it.
    pub(crate) fn check_adjacent_integer_at(&self, offset: usize) -> bool {
        let token = self.peek_nth(offset);
        matches!(token.kind, TokenKind::Number(NumberKind::Integer)) && token.leading_trivia.is_empty()
    }

    fn check_execute_arg_start(&self) -> bool {
        match self.peek().kind {
            TokenKind::Variable
            | TokenKind::Number(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::BinaryLiteral
            | TokenKind::Operator(Op::Minus | Op::Plus) => true,
            TokenKind::Keyword(Keyword::DEFAULT | Keyword::NULL) => true,
            TokenKind::Identifier | TokenKind::QuotedIdentifier(_) => !self.check_statement_word(),
            _ => false,
        }
    }

    fn parse_execute_arg(&mut self) -> ParseResult<ExecuteArg> {
        let start = self.current_span();
        let name = if self.check_variable() && self.check_op_at(1, Op::Eq) {
            let name = self.parse_variable_name()?;
            self.advance();
            Some(name)
        } else {
            None
        };
        let value = self.parse_expr()?;
        let output = self.eat_word_ci("OUTPUT") || self.eat_word_ci("OUT");
        Ok(ExecuteArg {
            name,
            value,
            output,
            span: self.span_from(start),
        })
    }

    fn parse_execute_option(&mut self) -> ParseResult<ExecuteOption> {
        if self.eat_word_ci("RECOMPILE") {
            return Ok(ExecuteOption::Recompile);
        }
        self.expect_word_ci("RESULT")?;
        self.expect_word_ci("SETS")?;
        if self.eat_word_ci("NONE") {
            return Ok(ExecuteOption::ResultSets(ResultSets::None));
        }
        if self.eat_word_ci("UNDEFINED") {
            return Ok(ExecuteOption::ResultSets(ResultSets::Undefined));
        }
        self.expect_op(Op::LParen)?;
        let definitions = self.parse_comma_separated(Self::parse_result_set_definition)?;
        self.expect_op(Op::RParen)?;
        Ok(ExecuteOption::ResultSets(ResultSets::Definitions(definitions)))
    }

    fn parse_result_set_definition(&mut self) -> ParseResult<ResultSetDefinition> {
        if self.eat_keyword(Keyword::AS) {
            if self.eat_word_ci("OBJECT") {
                return Ok(ResultSetDefinition::Object(self.parse_object_name()?));
            }
            if self.eat_word_ci("TYPE") {
                return Ok(ResultSetDefinition::Type(self.parse_object_name()?));
            }
            self.expect_keyword(Keyword::FOR)?;
            self.expect_word_ci("XML")?;
            return Ok(ResultSetDefinition::ForXml);
        }
        self.expect_op(Op::LParen)?;
        let columns = self.parse_comma_separated(Self::parse_result_column)?;
        self.expect_op(Op::RParen)?;
        Ok(ResultSetDefinition::Columns(columns))
    }

    fn parse_result_column(&mut self) -> ParseResult<ResultColumn> {
        let name = self.parse_identifier()?;
        let data_type = self.parse_data_type()?;
        // Collation does not change the shape of the result
        if self.eat_keyword(Keyword::COLLATE) {
            self.parse_identifier()?;
        }
        let nullable = if self.eat_keyword(Keyword::NULL) {
            Some(true)
        } else if self.check_keyword(Keyword::NOT) && self.check_keyword_at(1, Keyword::NULL) {
            self.advance();
            self.advance();
            Some(false)
        } else {
            None
        };
        Ok(ResultColumn {
            name,
            data_type,
            nullable,
        })
    }

    // ========================================================================
    // EXECUTE AS / REVERT
    // ========================================================================

    pub(crate) fn parse_execute_as(&mut self) -> ParseResult<ExecuteAsStatement> {
        if !self.eat_keyword(Keyword::EXEC) {
            self.expect_keyword(Keyword::EXECUTE)?;
        }
        self.expect_keyword(Keyword::AS)?;
        let principal = self.parse_execute_as_principal()?;

        let mut no_revert = false;
        let mut cookie_into = None;
        if self.eat_keyword(Keyword::WITH) {
            if self.eat_word_ci("NO") {
                self.expect_keyword(Keyword::REVERT)?;
                no_revert = true;
            } else {
                self.expect_word_ci("COOKIE")?;
                self.expect_keyword(Keyword::INTO)?;
                cookie_into = Some(self.parse_variable_name()?);
            }
        }

        Ok(ExecuteAsStatement {
            principal,
            no_revert,
            cookie_into,
        })
    }

    /// The principal after `EXECUTE AS`, also used in module WITH lists.
    pub(crate) fn parse_execute_as_principal(&mut self) -> ParseResult<ExecuteAsPrincipal> {
        if self.eat_word_ci("CALLER") {
            return Ok(ExecuteAsPrincipal::Caller);
        }
        if self.eat_word_ci("SELF") {
            return Ok(ExecuteAsPrincipal::SelfPrincipal);
        }
        if self.eat_word_ci("OWNER") {
            return Ok(ExecuteAsPrincipal::Owner);
        }
        if self.check_string() {
            return Ok(ExecuteAsPrincipal::Named(self.parse_string_value()?));
        }
        if self.eat_keyword(Keyword::USER) {
            self.expect_op(Op::Eq)?;
            return Ok(ExecuteAsPrincipal::User(self.parse_string_value()?));
        }
        if self.eat_word_ci("LOGIN") {
            self.expect_op(Op::Eq)?;
            return Ok(ExecuteAsPrincipal::Login(self.parse_string_value()?));
        }
        Err(self.expected("CALLER, SELF, OWNER, USER or LOGIN"))
    }

    pub(crate) fn parse_revert(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::REVERT)?;
        let cookie = if self.check_keyword(Keyword::WITH) && self.check_word_ci_at(1, "COOKIE") {
            self.advance();
            self.advance();
            self.expect_op(Op::Eq)?;
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(StatementKind::Revert { cookie })
    }
}
