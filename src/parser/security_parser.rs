//! Security statements: logins, users, roles, credentials and
//! GRANT / DENY / REVOKE
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE LOGIN name WITH PASSWORD = 'x' [HASHED] [MUST_CHANGE] [, CHECK_POLICY = ON, ...]
//! CREATE LOGIN [DOMAIN\user] FROM WINDOWS [WITH DEFAULT_DATABASE = master]
//! CREATE LOGIN name FROM {EXTERNAL PROVIDER | CERTIFICATE c | ASYMMETRIC KEY k}
//! ALTER LOGIN name {ENABLE | DISABLE | WITH option [, ...] | {ADD | DROP} CREDENTIAL c}
//!
//! CREATE USER name [{FOR | FROM} LOGIN login | WITHOUT LOGIN | FROM EXTERNAL PROVIDER]
//!     [WITH DEFAULT_SCHEMA = s [, ...]]
//! ALTER USER name WITH NAME = n, DEFAULT_SCHEMA = s, LOGIN = l
//!
//! CREATE [SERVER] ROLE name [AUTHORIZATION owner]
//! CREATE APPLICATION ROLE name WITH PASSWORD = 'x' [, DEFAULT_SCHEMA = s]
//! ALTER [SERVER] ROLE name {ADD | DROP} MEMBER member
//! ALTER ROLE name WITH NAME = new_name
//!
//! CREATE [DATABASE SCOPED] CREDENTIAL name WITH IDENTITY = 'x' [, SECRET = 'y']
//!     [FOR CRYPTOGRAPHIC PROVIDER p]
//!
//! GRANT permission [(cols)] [, ...] [ON [class::] securable [(cols)]] TO principal [, ...]
//!     [WITH GRANT OPTION] [AS principal]
//! DENY permission [, ...] [ON ...] TO principal [, ...] [CASCADE] [AS principal]
//! REVOKE [GRANT OPTION FOR] permission [, ...] [ON ...] {TO | FROM} principal [, ...]
//!     [CASCADE] [AS principal]
//! ```

use super::keywords::Keyword;
use super::token::{Op, TokenKind};
use super::token_parser_base::{ParseResult, TokenParser};
use crate::ast::{
    CreateMode, CredentialStatement, LoginStatement, Permission, PermissionAction,
    PermissionStatement, RawOption, RoleKind, RoleMemberChange, RoleStatement, Securable,
    UserSource, UserStatement,
};
use crate::source::SourceSpan;

/// Flags that follow `PASSWORD = ...` without a comma.
const PASSWORD_FLAGS: &[&str] = &["HASHED", "MUST_CHANGE", "UNLOCK"];

impl<'a> TokenParser<'a> {
    // ========================================================================
    // Logins
    // ========================================================================

    pub(crate) fn parse_login(&mut self, mode: CreateMode, start: SourceSpan) -> ParseResult<LoginStatement> {
        self.expect_word_ci("LOGIN")?;
        let name = self.parse_identifier()?;

        let mut source = None;
        let mut options = Vec::new();
        let mut enable = None;

        if mode == CreateMode::Alter && self.eat_word_ci("ENABLE") {
            enable = Some(true);
        } else if mode == CreateMode::Alter && self.eat_word_ci("DISABLE") {
            enable = Some(false);
        } else if mode == CreateMode::Alter
            && (self.check_keyword(Keyword::ADD) || self.check_keyword(Keyword::DROP))
            && self.check_word_ci_at(1, "CREDENTIAL")
        {
            let option_start = self.current_span();
            let action = self.advance().text.to_uppercase();
            self.advance();
            let credential = self.parse_identifier()?;
            options.push(RawOption {
                name: format!("{action} CREDENTIAL"),
                value: Some(credential.to_string()),
                span: self.span_from(option_start),
            });
        } else {
            if self.eat_keyword(Keyword::FROM) {
                source = Some(self.parse_principal_source()?);
            }
            if self.eat_keyword(Keyword::WITH) {
                options = self.parse_login_options()?;
            }
        }

        Ok(LoginStatement {
            mode,
            name,
            source,
            options,
            enable,
            span: self.span_from(start),
        })
    }

    /// `WINDOWS`, `EXTERNAL PROVIDER`, `CERTIFICATE c`, `ASYMMETRIC KEY k`,
    /// kept as text up to a WITH clause.
    fn parse_principal_source(&mut self) -> ParseResult<String> {
        let start = self.current_span();
        let begin = self.pos();
        while !self.is_at_end()
            && !self.check_keyword(Keyword::WITH)
            && !self.check_op(Op::Semicolon)
            && !self.at_statement_end()
        {
            self.advance();
        }
        if self.pos() == begin {
            return Err(self.expected("principal source"));
        }
        Ok(self.text(self.span_from(start)).to_string())
    }

    /// Option list with `HASHED`, `MUST_CHANGE` and `UNLOCK` kept as
    /// separate options after the password.
    fn parse_login_options(&mut self) -> ParseResult<Vec<RawOption>> {
        let mut options = Vec::new();
        loop {
            options.push(self.parse_unparenthesized_option()?);
            while PASSWORD_FLAGS.iter().any(|flag| self.check_word_ci(flag)) {
                let token = self.advance();
                options.push(RawOption {
                    name: token.text.to_uppercase(),
                    value: None,
                    span: token.span,
                });
            }
            if !self.eat_op(Op::Comma) {
                break;
            }
        }
        Ok(options)
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub(crate) fn parse_user(&mut self, mode: CreateMode, start: SourceSpan) -> ParseResult<UserStatement> {
        self.expect_keyword(Keyword::USER)?;
        let name = self.parse_identifier()?;

        let source = if (self.check_keyword(Keyword::FOR) || self.check_keyword(Keyword::FROM))
            && self.check_word_ci_at(1, "LOGIN")
        {
            self.advance();
            self.advance();
            Some(UserSource::Login(self.parse_identifier()?))
        } else if self.eat_word_ci("WITHOUT") {
            self.expect_word_ci("LOGIN")?;
            Some(UserSource::WithoutLogin)
        } else if self.check_keyword(Keyword::FOR) || self.check_keyword(Keyword::FROM) {
            let source_start = self.advance().span;
            self.parse_principal_source()?;
            Some(UserSource::Other(self.text(self.span_from(source_start)).to_string()))
        } else {
            None
        };

        let options = if self.eat_keyword(Keyword::WITH) {
            self.parse_comma_separated(Self::parse_unparenthesized_option)?
        } else {
            Vec::new()
        };

        Ok(UserStatement {
            mode,
            name,
            source,
            options,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // Roles
    // ========================================================================

    pub(crate) fn parse_role(&mut self, mode: CreateMode, start: SourceSpan) -> ParseResult<RoleStatement> {
        let kind = if self.eat_word_ci("SERVER") {
            RoleKind::Server
        } else if self.eat_word_ci("APPLICATION") {
            RoleKind::Application
        } else {
            RoleKind::Database
        };
        self.expect_word_ci("ROLE")?;
        let name = self.parse_identifier()?;

        let authorization = if self.eat_keyword(Keyword::AUTHORIZATION) {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        let mut members = Vec::new();
        while (self.check_keyword(Keyword::ADD) || self.check_keyword(Keyword::DROP))
            && self.check_word_ci_at(1, "MEMBER")
        {
            let add = self.check_keyword(Keyword::ADD);
            self.advance();
            self.advance();
            members.push(RoleMemberChange {
                add,
                member: self.parse_identifier()?,
            });
        }

        let options = if self.eat_keyword(Keyword::WITH) {
            self.parse_comma_separated(Self::parse_unparenthesized_option)?
        } else {
            Vec::new()
        };

        Ok(RoleStatement {
            mode,
            kind,
            name,
            authorization,
            members,
            options,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // Credentials
    // ========================================================================

    pub(crate) fn parse_credential(&mut self, mode: CreateMode, start: SourceSpan) -> ParseResult<CredentialStatement> {
        let database_scoped = self.eat_keyword(Keyword::DATABASE);
        if database_scoped {
            self.expect_word_ci("SCOPED")?;
        }
        self.expect_word_ci("CREDENTIAL")?;
        let name = self.parse_identifier()?;

        let mut identity = None;
        let mut secret = None;
        if self.eat_keyword(Keyword::WITH) {
            loop {
                if self.eat_word_ci("IDENTITY") || self.eat_keyword(Keyword::IDENTITY) {
                    self.expect_op(Op::Eq)?;
                    identity = Some(self.parse_string_value()?);
                } else if self.eat_word_ci("SECRET") {
                    self.expect_op(Op::Eq)?;
                    secret = Some(self.parse_string_value()?);
                } else {
                    return Err(self.expected("IDENTITY or SECRET"));
                }
                if !self.eat_op(Op::Comma) {
                    break;
                }
            }
        }

        let provider = if self.check_keyword(Keyword::FOR) && self.check_word_ci_at(1, "CRYPTOGRAPHIC") {
            self.advance();
            self.advance();
            self.expect_word_ci("PROVIDER")?;
            Some(self.parse_identifier()?)
        } else {
            None
        };

        Ok(CredentialStatement {
            mode,
            database_scoped,
            name,
            identity,
            secret,
            provider,
            span: self.span_from(start),
        })
    }

    // ========================================================================
    // GRANT / DENY / REVOKE
    // ========================================================================

    pub(crate) fn parse_permission(&mut self) -> ParseResult<PermissionStatement> {
        let start = self.current_span();
        let action = if self.eat_keyword(Keyword::GRANT) {
            PermissionAction::Grant
        } else if self.eat_keyword(Keyword::DENY) {
            PermissionAction::Deny
        } else {
            self.expect_keyword(Keyword::REVOKE)?;
            PermissionAction::Revoke
        };

        let grant_option_for = action == PermissionAction::Revoke
            && self.check_keyword(Keyword::GRANT)
            && self.check_word_ci_at(1, "OPTION");
        if grant_option_for {
            self.advance();
            self.advance();
            self.expect_keyword(Keyword::FOR)?;
        }

        let permissions = self.parse_comma_separated(Self::parse_permission_item)?;

        let on = if self.eat_keyword(Keyword::ON) {
            let class = self.parse_securable_class()?;
            let name = self.parse_object_name()?;
            let columns = if self.check_op(Op::LParen) {
                self.parse_parenthesized_identifiers()?
            } else {
                Vec::new()
            };
            Some(Securable {
                class,
                name,
                columns,
            })
        } else {
            None
        };

        if !self.eat_keyword(Keyword::TO) {
            if action == PermissionAction::Revoke {
                self.expect_keyword(Keyword::FROM)?;
            } else {
                return Err(self.expected("TO"));
            }
        }
        let principals = self.parse_comma_separated(Self::parse_identifier_or_keyword)?;

        let mut with_grant_option = false;
        let mut cascade = false;
        let mut as_principal = None;
        loop {
            if self.check_keyword(Keyword::WITH) && self.check_keyword_at(1, Keyword::GRANT) {
                self.advance();
                self.advance();
                self.expect_word_ci("OPTION")?;
                with_grant_option = true;
            } else if self.eat_keyword(Keyword::CASCADE) {
                cascade = true;
            } else if self.eat_keyword(Keyword::AS) {
                as_principal = Some(self.parse_identifier_or_keyword()?);
            } else {
                break;
            }
        }

        Ok(PermissionStatement {
            action,
            grant_option_for,
            permissions,
            on,
            principals,
            with_grant_option,
            cascade,
            as_principal,
            span: self.span_from(start),
        })
    }

    /// A permission name (may be multi-word like `VIEW DEFINITION`,
    /// `ALTER ANY SCHEMA`) with an optional column list.
    fn parse_permission_item(&mut self) -> ParseResult<Permission> {
        let mut words = Vec::new();
        loop {
            if self.check_keyword(Keyword::ON)
                || self.check_keyword(Keyword::TO)
                || self.check_keyword(Keyword::FROM)
            {
                break;
            }
            match self.peek().kind {
                TokenKind::Identifier | TokenKind::Keyword(_) => {
                    words.push(self.advance().text.to_uppercase());
                }
                _ => break,
            }
        }
        if words.is_empty() {
            return Err(self.expected("permission"));
        }
        let columns = if self.check_op(Op::LParen) {
            self.parse_parenthesized_identifiers()?
        } else {
            Vec::new()
        };
        Ok(Permission {
            name: words.join(" "),
            columns,
        })
    }
}
