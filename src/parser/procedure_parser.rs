//! Procedure definition parsing, plus the parameter and module option
//! grammar shared with functions, triggers and views
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE PROCEDURE [schema].[name] AS ...
//! CREATE PROC [schema].[name] AS ...
//! CREATE OR ALTER PROCEDURE [schema].[name] AS ...
//! ALTER PROC [schema].[name] AS ...
//! CREATE PROCEDURE [schema].[name] @param1 TYPE, @param2 TYPE OUTPUT AS ...
//! CREATE PROCEDURE [schema].[name] (@p INT = 0, @items [dbo].[TableType] READONLY) AS ...
//! CREATE PROCEDURE name;2 AS ...                       -- legacy numbered procedure
//! CREATE PROCEDURE name WITH RECOMPILE, EXECUTE AS OWNER FOR REPLICATION AS ...
//! CREATE PROCEDURE name AS EXTERNAL NAME asm.class.method
//! ```
//!
//! The body runs to the end of the batch.

use super::keywords::Keyword;
use super::token::{Op, TokenKind};
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{
    CreateMode, ModuleOption, Parameter, ProcedureBody, ProcedureStatement, RawOption,
};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    /// Parse a procedure definition after CREATE / ALTER / CREATE OR ALTER.
    pub(crate) fn parse_procedure(&mut self, mode: CreateMode, start: SourceSpan) -> ParseResult<ProcedureStatement> {
        // Expect PROCEDURE or PROC keyword
        if !self.eat_keyword(Keyword::PROCEDURE) {
            self.expect_keyword(Keyword::PROC)?;
        }
        let name = self.parse_object_name()?;
        let number = self.parse_procedure_number()?;

        // Parameters may or may not be wrapped in parentheses
        let parameters = if self.check_op(Op::LParen) {
            self.parse_parenthesized_parameters()?
        } else if self.check_variable() {
            self.parse_comma_separated(Self::parse_parameter)?
        } else {
            Vec::new()
        };

        let options = self.parse_module_options()?;
        let for_replication = if self.check_keyword(Keyword::FOR) && self.check_keyword_at(1, Keyword::REPLICATION) {
            self.advance();
            self.advance();
            true
        } else {
            false
        };

        self.expect_keyword(Keyword::AS)?;
        let body = self.parse_procedure_body()?;

        Ok(ProcedureStatement {
            mode,
            name,
            number,
            parameters,
            options,
            for_replication,
            body,
            span: self.span_from(start),
        })
    }

    /// Module body after `AS`: `EXTERNAL NAME a.b.c` or every remaining
    /// statement of the batch.
    pub(crate) fn parse_procedure_body(&mut self) -> ParseResult<ProcedureBody> {
        if self.check_keyword(Keyword::EXTERNAL) && self.check_word_ci_at(1, "NAME") {
            self.advance();
            self.advance();
            return Ok(ProcedureBody::External(self.parse_object_name()?));
        }
        if self.is_at_end() {
            return Err(self.expected("module body"));
        }
        let statements = self.parse_statement_list(|_| false);
        Ok(ProcedureBody::Statements(statements))
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// `( [param [, ...]] )`
    pub(crate) fn parse_parenthesized_parameters(&mut self) -> ParseResult<Vec<Parameter>> {
        self.expect_op(Op::LParen)?;
        if self.eat_op(Op::RParen) {
            return Ok(Vec::new());
        }
        let parameters = self.parse_comma_separated(Self::parse_parameter)?;
        self.expect_op(Op::RParen)?;
        Ok(parameters)
    }

    /// `@name [AS] type [VARYING] [NULL | NOT NULL] [= default] [OUT | OUTPUT] [READONLY]`
    pub(crate) fn parse_parameter(&mut self) -> ParseResult<Parameter> {
        let start = self.current_span();
        let name = self.parse_variable_name()?;
        self.eat_keyword(Keyword::AS);
        let data_type = self.parse_data_type()?;
        let varying = self.eat_keyword(Keyword::VARYING);

        // Natively compiled modules allow nullability on parameters
        if !self.eat_keyword(Keyword::NULL)
            && self.check_keyword(Keyword::NOT)
            && self.check_keyword_at(1, Keyword::NULL)
        {
            self.advance();
            self.advance();
        }

        let mut default = None;
        let mut output = false;
        let mut readonly = false;
        // Modifiers can appear in various orders
        loop {
            if self.eat_op(Op::Eq) {
                default = Some(self.parse_expr()?);
            } else if self.eat_word_ci("OUTPUT") || self.eat_word_ci("OUT") {
                output = true;
            } else if self.eat_word_ci("READONLY") {
                readonly = true;
            } else {
                break;
            }
        }

        Ok(Parameter {
            name,
            data_type,
            varying,
            default,
            output,
            readonly,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // Module options
    // ========================================================================

    /// `WITH option [, ...]` before a module body. Stops short of
    /// `WITH CHECK OPTION` and `WITH APPEND`, which belong to the caller.
    pub(crate) fn parse_module_options(&mut self) -> ParseResult<Vec<ModuleOption>> {
        if !self.check_keyword(Keyword::WITH)
            || self.check_keyword_at(1, Keyword::CHECK)
            || self.check_word_ci_at(1, "APPEND")
        {
            return Ok(Vec::new());
        }
        self.advance();
        self.parse_comma_separated(Self::parse_module_option)
    }

    fn parse_module_option(&mut self) -> ParseResult<ModuleOption> {
        if self.check_keyword(Keyword::EXECUTE) || self.check_keyword(Keyword::EXEC) {
            self.advance();
            self.expect_keyword(Keyword::AS)?;
            return Ok(ModuleOption::ExecuteAs(self.parse_execute_as_principal()?));
        }
        if self.eat_word_ci("RETURNS") {
            self.expect_keyword(Keyword::NULL)?;
            self.expect_keyword(Keyword::ON)?;
            self.expect_keyword(Keyword::NULL)?;
            self.expect_word_ci("INPUT")?;
            return Ok(ModuleOption::ReturnsNullOnNullInput);
        }
        if self.eat_word_ci("CALLED") {
            self.expect_keyword(Keyword::ON)?;
            self.expect_keyword(Keyword::NULL)?;
            self.expect_word_ci("INPUT")?;
            return Ok(ModuleOption::CalledOnNullInput);
        }

        let option = self.parse_unparenthesized_option()?;
        let kind = match (option.name.as_str(), &option.value) {
            ("RECOMPILE", None) => ModuleOption::Recompile,
            ("ENCRYPTION", None) => ModuleOption::Encryption,
            ("SCHEMABINDING", None) => ModuleOption::SchemaBinding,
            ("NATIVE_COMPILATION", None) => ModuleOption::NativeCompilation,
            ("VIEW_METADATA", None) => ModuleOption::ViewMetadata,
            _ => ModuleOption::Other(option),
        };
        Ok(kind)
    }

    /// One item of a WITH list that has no parentheses around it:
    /// `NAME`, `NAME = value`, or `NAME (...)`. The value is a single token or
    /// a balanced group, since the list is followed directly by more syntax.
    pub(crate) fn parse_unparenthesized_option(&mut self) -> ParseResult<RawOption> {
        let start = self.current_span();
        let name = self.parse_identifier_or_keyword()?.value.to_uppercase();
        let value = if self.check_op(Op::LParen) {
            let span = self.consume_parenthesized()?;
            Some(self.text(span).to_string())
        } else if self.eat_op(Op::Eq) {
            match self.peek().kind {
                TokenKind::Eof | TokenKind::Operator(_) => return Err(self.expected("option value")),
                _ => Some(self.advance().text.to_string()),
            }
        } else {
            None
        };
        Ok(RawOption {
            name,
            value,
            span: self.span_from(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExecuteAsPrincipal, Statement, StatementKind};
    use crate::diagnostics::Diagnostic;
    use crate::options::DialectStrictness;
    use crate::parser::lexer::Lexer;

    fn parse_with(sql: &str, strictness: DialectStrictness) -> (Vec<Statement>, Vec<Diagnostic>) {
        let mut p = TokenParser::new(sql, Lexer::new(sql), SourceSpan::default())
            .with_strictness(strictness);
        let statements = p.parse_statements();
        (statements, p.into_diagnostics())
    }

    fn parse_proc(sql: &str) -> ProcedureStatement {
        let (mut statements, diags) = parse_with(sql, DialectStrictness::Lenient);
        assert!(diags.is_empty(), "unexpected diagnostics for {sql}: {diags:?}");
        assert_eq!(statements.len(), 1);
        match statements.remove(0).kind {
            StatementKind::Procedure(proc) => *proc,
            other => panic!("expected procedure, got {other:?}"),
        }
    }

    #[test]
    fn test_parameters_without_parens() {
        let proc = parse_proc(
            "CREATE PROCEDURE [dbo].[usp_GetOrders]
                 @CustomerId INT,
                 @FromDate DATETIME2 = NULL,
                 @Total DECIMAL(18, 2) OUTPUT,
                 @Items dbo.OrderItems READONLY
             AS
             SELECT * FROM dbo.Orders WHERE CustomerId = @CustomerId;
             SET @Total = 0;",
        );
        assert_eq!(proc.mode, CreateMode::Create);
        assert_eq!(proc.name.to_string(), "[dbo].[usp_GetOrders]");
        assert_eq!(proc.parameters.len(), 4);
        assert!(proc.parameters[1].default.is_some());
        assert!(proc.parameters[2].output);
        assert!(proc.parameters[3].readonly);
        let ProcedureBody::Statements(body) = &proc.body else {
            panic!("expected statements");
        };
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn test_parenthesized_parameters_and_options() {
        let proc = parse_proc(
            "CREATE OR ALTER PROC dbo.p (@a INT = -1, @b NVARCHAR(MAX) OUT)
             WITH RECOMPILE, EXECUTE AS 'app_user'
             AS BEGIN SET NOCOUNT ON; RETURN 0; END",
        );
        assert_eq!(proc.mode, CreateMode::CreateOrAlter);
        assert_eq!(proc.parameters.len(), 2);
        assert_eq!(
            proc.options,
            vec![
                ModuleOption::Recompile,
                ModuleOption::ExecuteAs(ExecuteAsPrincipal::Named("app_user".to_string()))
            ]
        );
        let ProcedureBody::Statements(body) = &proc.body else {
            panic!("expected statements");
        };
        assert!(matches!(&body[0].kind, StatementKind::Block(inner) if inner.len() == 2));
    }

    #[test]
    fn test_cursor_varying_parameter_and_replication() {
        let proc = parse_proc(
            "ALTER PROCEDURE dbo.OpenRows @c CURSOR VARYING OUTPUT FOR REPLICATION AS SET @c = CURSOR FOR SELECT 1",
        );
        assert_eq!(proc.mode, CreateMode::Alter);
        assert!(proc.parameters[0].varying);
        assert!(proc.parameters[0].output);
        assert!(proc.for_replication);
    }

    #[test]
    fn test_external_body() {
        let proc = parse_proc("CREATE PROCEDURE dbo.clr_proc @x INT AS EXTERNAL NAME Asm.[Ns.Class].Method");
        assert!(matches!(&proc.body, ProcedureBody::External(name) if name.parts.len() == 3));
    }

    #[test]
    fn test_numbered_procedure() {
        let proc = parse_proc("CREATE PROCEDURE dbo.orderproc;2 AS SELECT 2");
        assert_eq!(proc.number, Some(2));

        let (_, diags) = parse_with("CREATE PROCEDURE dbo.orderproc;2 AS SELECT 2", DialectStrictness::Strict);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("numbered procedure"));
    }

    #[test]
    fn test_native_compilation_options() {
        let proc = parse_proc(
            "CREATE PROCEDURE dbo.native @id INT NOT NULL
             WITH NATIVE_COMPILATION, SCHEMABINDING, EXECUTE AS OWNER
             AS BEGIN ATOMIC WITH (TRANSACTION ISOLATION LEVEL = SNAPSHOT, LANGUAGE = N'us_english')
                 SELECT @id
             END",
        );
        assert_eq!(proc.options.len(), 3);
        assert_eq!(proc.options[0], ModuleOption::NativeCompilation);
    }

    #[test]
    fn test_missing_as_is_an_error() {
        let (_, diags) = parse_with("CREATE PROCEDURE dbo.p @a INT SELECT 1", DialectStrictness::Lenient);
        assert!(!diags.is_empty());
        assert!(diags[0].is_error());
    }
}
