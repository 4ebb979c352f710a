//! DECLARE and SET parsing
//!
//! ## Supported Syntax
//!
//! ```sql
//! DECLARE @a INT = 1, @b AS NVARCHAR(50), @t TABLE (Id INT PRIMARY KEY), @c CURSOR
//! DECLARE cur CURSOR [LOCAL | GLOBAL] [FORWARD_ONLY | SCROLL] ... FOR select
//!     [FOR {READ ONLY | UPDATE [OF col, ...]}]
//! DECLARE cur [INSENSITIVE] [SCROLL] CURSOR FOR select
//!
//! SET @v = expr | SET @v += expr | SET @udt.Prop = expr | SET @c = CURSOR ... FOR select
//! SET NOCOUNT ON
//! SET ANSI_NULLS, QUOTED_IDENTIFIER ON
//! SET IDENTITY_INSERT dbo.t ON
//! SET STATISTICS IO, TIME ON
//! SET ROWCOUNT 10 | SET LANGUAGE us_english | SET DEADLOCK_PRIORITY LOW
//! SET TRANSACTION ISOLATION LEVEL {READ UNCOMMITTED | READ COMMITTED | REPEATABLE READ | SNAPSHOT | SERIALIZABLE}
//! ```

use super::keywords::Keyword;
use super::query_parser::assignment_op;
use super::token::{Op, TokenKind};
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{
    CursorDefinition, DeclareItem, IsolationLevel, SetOptionStatement, SetOptionValue, SetValue,
    SetVariableStatement, StatementKind,
};
use crate::source::SourceSpan;

impl<'a> TokenParser<'a> {
    // ========================================================================
    // DECLARE
    // ========================================================================

    pub(crate) fn parse_declare(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::DECLARE)?;

        // DECLARE cursor_name ... CURSOR
        if matches!(
            self.peek().kind,
            TokenKind::Identifier | TokenKind::QuotedIdentifier(_)
        ) {
            let name = self.parse_identifier()?;
            let start = self.current_span();
            let mut options = Vec::new();
            // ISO syntax puts INSENSITIVE / SCROLL before CURSOR
            while !self.check_keyword(Keyword::CURSOR) {
                if self.check_word_ci("INSENSITIVE") || self.check_word_ci("SCROLL") {
                    options.push(self.advance().text.to_uppercase());
                } else {
                    return Err(self.expected("CURSOR"));
                }
            }
            self.advance();
            let mut definition = self.parse_cursor_definition(start)?;
            options.append(&mut definition.options);
            definition.options = options;
            return Ok(StatementKind::DeclareCursor { name, definition });
        }

        let items = self.parse_comma_separated(Self::parse_declare_item)?;
        Ok(StatementKind::Declare(items))
    }

    fn parse_declare_item(&mut self) -> ParseResult<DeclareItem> {
        let start = self.current_span();
        let name = self.parse_variable_name()?;
        self.eat_keyword(Keyword::AS);

        if self.eat_keyword(Keyword::TABLE) {
            let elements = self.parse_table_elements()?;
            return Ok(DeclareItem::Table {
                name,
                elements,
                span: self.span_from(start),
            });
        }
        if self.eat_keyword(Keyword::CURSOR) {
            return Ok(DeclareItem::CursorVariable {
                name,
                span: self.span_from(start),
            });
        }

        let data_type = self.parse_data_type()?;
        let value = if self.eat_op(Op::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(DeclareItem::Variable {
            name,
            data_type,
            value,
            span: self.span_from(start),
        })
    }

    /// Cursor options, `FOR select`, and the optional `FOR READ ONLY` /
    /// `FOR UPDATE [OF ...]` tail. `CURSOR` has been consumed.
    pub(crate) fn parse_cursor_definition(&mut self, start: SourceSpan) -> ParseResult<CursorDefinition> {
        let mut options = Vec::new();
        while !self.check_keyword(Keyword::FOR) {
            match self.peek().kind {
                TokenKind::Identifier | TokenKind::Keyword(_) if !self.at_statement_end() => {
                    options.push(self.advance().text.to_uppercase());
                }
                _ => return Err(self.expected("FOR")),
            }
        }
        self.expect_keyword(Keyword::FOR)?;
        let query = Box::new(self.parse_query()?);

        let mut for_update = None;
        let mut read_only = false;
        if self.check_keyword(Keyword::FOR) && self.check_keyword_at(1, Keyword::READ) {
            self.advance();
            self.advance();
            self.expect_word_ci("ONLY")?;
            read_only = true;
        } else if self.check_keyword(Keyword::FOR) && self.check_keyword_at(1, Keyword::UPDATE) {
            self.advance();
            self.advance();
            let columns = if self.eat_keyword(Keyword::OF) {
                self.parse_comma_separated(Self::parse_identifier)?
            } else {
                Vec::new()
            };
            for_update = Some(columns);
        }

        Ok(CursorDefinition {
            options,
            query,
            for_update,
            read_only,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // SET
    // ========================================================================

    pub(crate) fn parse_set(&mut self) -> ParseResult<StatementKind> {
        self.expect_keyword(Keyword::SET)?;

        if self.check_variable() {
            return Ok(StatementKind::SetVariable(Box::new(self.parse_set_variable()?)));
        }
        if self.check_keyword(Keyword::TRANSACTION) {
            return Ok(StatementKind::SetTransactionIsolation(self.parse_isolation_level()?));
        }
        Ok(StatementKind::SetOption(self.parse_set_option()?))
    }

    fn parse_set_variable(&mut self) -> ParseResult<SetVariableStatement> {
        let variable = self.parse_variable_name()?;
        let member = if self.eat_op(Op::Dot) {
            Some(self.parse_identifier_or_keyword()?)
        } else {
            None
        };

        let op = self
            .peek()
            .op()
            .and_then(assignment_op)
            .ok_or_else(|| self.expected("assignment operator"))?;
        self.advance();

        let value = if self.check_keyword(Keyword::CURSOR) {
            let start = self.advance().span;
            SetValue::Cursor(self.parse_cursor_definition(start)?)
        } else {
            SetValue::Expr(self.parse_expr()?)
        };
        Ok(SetVariableStatement {
            variable,
            member,
            op,
            value,
        })
    }

    fn parse_isolation_level(&mut self) -> ParseResult<IsolationLevel> {
        // Expect TRANSACTION ISOLATION LEVEL
        self.expect_keyword(Keyword::TRANSACTION)?;
        self.expect_word_ci("ISOLATION")?;
        self.expect_word_ci("LEVEL")?;

        if self.eat_keyword(Keyword::READ) {
            if self.eat_word_ci("UNCOMMITTED") {
                return Ok(IsolationLevel::ReadUncommitted);
            }
            self.expect_word_ci("COMMITTED")?;
            return Ok(IsolationLevel::ReadCommitted);
        }
        if self.eat_word_ci("REPEATABLE") {
            self.expect_keyword(Keyword::READ)?;
            return Ok(IsolationLevel::RepeatableRead);
        }
        if self.eat_word_ci("SNAPSHOT") {
            return Ok(IsolationLevel::Snapshot);
        }
        if self.eat_word_ci("SERIALIZABLE") {
            return Ok(IsolationLevel::Serializable);
        }
        Err(self.expected("isolation level"))
    }

    fn parse_set_option(&mut self) -> ParseResult<SetOptionStatement> {
        let mut options = Vec::new();
        let mut target = None;
        loop {
            let token = self.peek();
            if !matches!(token.kind, TokenKind::Identifier | TokenKind::Keyword(_)) {
                return Err(self.expected("SET option"));
            }
            let name = self.advance().text.to_uppercase();
            match name.as_str() {
                // STATISTICS IO, TIME, PROFILE, XML
                "STATISTICS" => {
                    let word = self.parse_identifier_or_keyword()?;
                    options.push(format!("STATISTICS {}", word.value.to_uppercase()));
                    while self.check_op(Op::Comma) && !self.check_keyword_at(1, Keyword::STATISTICS) {
                        self.advance();
                        let word = self.parse_identifier_or_keyword()?;
                        options.push(format!("STATISTICS {}", word.value.to_uppercase()));
                    }
                }
                // OFFSETS SELECT, FROM, ... ON
                "OFFSETS" => {
                    while !self.check_keyword(Keyword::ON) && !self.check_keyword(Keyword::OFF) {
                        if self.is_at_end() || self.check_op(Op::Semicolon) {
                            return Err(self.expected("ON or OFF"));
                        }
                        self.advance();
                    }
                    options.push(name);
                }
                "IDENTITY_INSERT" => {
                    target = Some(self.parse_object_name()?);
                    options.push(name);
                }
                _ => options.push(name),
            }
            if !self.eat_op(Op::Comma) {
                break;
            }
        }

        let value = if self.eat_keyword(Keyword::ON) {
            SetOptionValue::On
        } else if self.eat_keyword(Keyword::OFF) {
            SetOptionValue::Off
        } else {
            SetOptionValue::Value(self.parse_expr()?)
        };

        Ok(SetOptionStatement {
            options,
            target,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AssignmentOp, ExprKind, Statement};
    use crate::parser::lexer::Lexer;

    fn parse_one(sql: &str) -> StatementKind {
        let mut p = TokenParser::new(sql, Lexer::new(sql), SourceSpan::default());
        let mut statements: Vec<Statement> = p.parse_statements();
        let diags = p.into_diagnostics();
        assert!(diags.is_empty(), "unexpected diagnostics for {sql}: {diags:?}");
        assert_eq!(statements.len(), 1);
        statements.remove(0).kind
    }

    #[test]
    fn test_declare_variables() {
        let StatementKind::Declare(items) =
            parse_one("DECLARE @a INT = 5, @b AS NVARCHAR(50), @c CURSOR, @t TABLE (Id INT PRIMARY KEY, Name SYSNAME)")
        else {
            panic!("expected DECLARE");
        };
        assert_eq!(items.len(), 4);
        assert!(matches!(&items[0], DeclareItem::Variable { name, value: Some(_), .. } if name == "@a"));
        assert!(matches!(&items[1], DeclareItem::Variable { data_type, .. } if data_type.base_name() == "NVARCHAR"));
        assert!(matches!(&items[2], DeclareItem::CursorVariable { .. }));
        assert!(matches!(&items[3], DeclareItem::Table { elements, .. } if elements.columns.len() == 2));
    }

    #[test]
    fn test_declare_cursor() {
        let kind = parse_one(
            "DECLARE emp_cursor CURSOR LOCAL FAST_FORWARD FOR SELECT Id FROM dbo.Employees ORDER BY Id",
        );
        let StatementKind::DeclareCursor { name, definition } = kind else {
            panic!("expected DECLARE CURSOR");
        };
        assert_eq!(name.value, "emp_cursor");
        assert_eq!(definition.options, vec!["LOCAL", "FAST_FORWARD"]);
        assert_eq!(definition.query.order_by.len(), 1);
    }

    #[test]
    fn test_declare_iso_cursor_for_update() {
        let kind = parse_one("DECLARE c INSENSITIVE SCROLL CURSOR FOR SELECT a FROM t FOR UPDATE OF a, b");
        let StatementKind::DeclareCursor { definition, .. } = kind else {
            panic!("expected DECLARE CURSOR");
        };
        assert_eq!(definition.options, vec!["INSENSITIVE", "SCROLL"]);
        assert_eq!(definition.for_update.map(|c| c.len()), Some(2));

        let kind = parse_one("DECLARE c CURSOR FOR SELECT a FROM t FOR READ ONLY");
        let StatementKind::DeclareCursor { definition, .. } = kind else {
            panic!("expected DECLARE CURSOR");
        };
        assert!(definition.read_only);
    }

    #[test]
    fn test_set_variable_forms() {
        let StatementKind::SetVariable(set) = parse_one("SET @total += @amount * 2") else {
            panic!("expected SET");
        };
        assert_eq!(set.op, AssignmentOp::Add);

        let StatementKind::SetVariable(set) = parse_one("SET @p.X = 10") else {
            panic!("expected SET");
        };
        assert_eq!(set.member.map(|m| m.value), Some("X".to_string()));

        let StatementKind::SetVariable(set) = parse_one("SET @n = (SELECT COUNT(*) FROM t)") else {
            panic!("expected SET");
        };
        assert!(matches!(&set.value, SetValue::Expr(e) if matches!(e.kind, ExprKind::Subquery(_))));

        let StatementKind::SetVariable(set) = parse_one("SET @c = CURSOR FORWARD_ONLY FOR SELECT 1") else {
            panic!("expected SET");
        };
        assert!(matches!(set.value, SetValue::Cursor(_)));
    }

    #[test]
    fn test_set_options() {
        let StatementKind::SetOption(set) = parse_one("SET ANSI_NULLS, QUOTED_IDENTIFIER ON") else {
            panic!("expected SET option");
        };
        assert_eq!(set.options, vec!["ANSI_NULLS", "QUOTED_IDENTIFIER"]);
        assert_eq!(set.quoted_identifier(), Some(true));

        let StatementKind::SetOption(set) = parse_one("SET IDENTITY_INSERT dbo.Orders ON") else {
            panic!("expected SET option");
        };
        assert_eq!(set.target.map(|t| t.name().value.clone()), Some("Orders".to_string()));

        let StatementKind::SetOption(set) = parse_one("SET ROWCOUNT 100") else {
            panic!("expected SET option");
        };
        assert!(matches!(set.value, SetOptionValue::Value(_)));

        let StatementKind::SetOption(set) = parse_one("SET STATISTICS IO, TIME OFF") else {
            panic!("expected SET option");
        };
        assert_eq!(set.options, vec!["STATISTICS IO", "STATISTICS TIME"]);

        let StatementKind::SetOption(set) = parse_one("SET ANSI_DEFAULTS OFF") else {
            panic!("expected SET option");
        };
        assert_eq!(set.quoted_identifier(), Some(false));
    }

    #[test]
    fn test_set_isolation_level() {
        assert_eq!(
            parse_one("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ"),
            StatementKind::SetTransactionIsolation(IsolationLevel::RepeatableRead)
        );
        assert_eq!(
            parse_one("SET TRANSACTION ISOLATION LEVEL READ UNCOMMITTED"),
            StatementKind::SetTransactionIsolation(IsolationLevel::ReadUncommitted)
        );
    }
}
