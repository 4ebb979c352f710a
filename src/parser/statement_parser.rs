//! Statement dispatch and the statement loop
//!
//! Each statement is recognized by its leading token(s) and handed to the
//! family parser that owns it. The loop here is the only place where a
//! [`ParseError`](super::token_parser_base::ParseError) becomes a diagnostic:
//! it reports the error, skips to the next statement boundary, and carries on.
//!
//! ## Dispatch
//!
//! ```sql
//! WITH cte AS (...) {SELECT | INSERT | UPDATE | DELETE | MERGE}
//! CREATE [OR ALTER] | ALTER  -> per object kind
//! DROP kind [IF EXISTS] names
//! GRANT | DENY | REVOKE
//! IF | WHILE | BEGIN ... END | BEGIN TRY | BEGIN TRAN | RETURN | ...
//! DECLARE | SET | USE | EXEC | EXECUTE AS | REVERT
//! OPEN | CLOSE | DEALLOCATE | FETCH | RECEIVE
//! label:
//! proc_name args        -- first statement of a batch only
//! DBCC | BACKUP | RESTORE | BULK INSERT | ...    -- kept as text
//! ```

use super::keywords::Keyword;
use super::token::{Op, TokenKind};
use super::token_parser_base::{grow_stack, ParseResult, TokenParser};
use crate::ast::{CreateMode, DropStatement, Ident, ObjectKind, ObjectName, Statement, StatementKind};
use crate::diagnostics::Diagnostic;
use crate::source::SourceSpan;

/// Non-reserved words that begin a statement.
const STATEMENT_WORDS: &[&str] = &["THROW", "RECEIVE", "SEND", "GET", "MOVE", "ENABLE", "DISABLE"];

/// Statements recognized by their first keyword and kept as text.
const OPAQUE_KEYWORDS: &[Keyword] = &[
    Keyword::DBCC,
    Keyword::BACKUP,
    Keyword::RESTORE,
    Keyword::CHECKPOINT,
    Keyword::RECONFIGURE,
    Keyword::SHUTDOWN,
    Keyword::KILL,
    Keyword::READTEXT,
    Keyword::WRITETEXT,
    Keyword::UPDATETEXT,
    Keyword::SETUSER,
];

impl<'a> TokenParser<'a> {
    // ========================================================================
    // Statement loop
    // ========================================================================

    /// Parse every statement up to EOF.
    pub fn parse_statements(&mut self) -> Vec<Statement> {
        self.parse_statement_list(|_| false)
    }

    /// Parse statements until EOF, cancellation, or `stop` holds at a
    /// statement boundary. Errors are reported and recovered from here.
    pub(crate) fn parse_statement_list(&mut self, stop: impl Fn(&Self) -> bool) -> Vec<Statement> {
        let mut statements = Vec::new();
        while !self.is_at_end() && !stop(self) {
            if self.check_cancelled() {
                break;
            }
            let before = self.pos();
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(err) => {
                    if self.was_cancelled() {
                        break;
                    }
                    if !err.at_lexical_error {
                        self.push_diagnostic(Diagnostic::syntax(err.message, err.span));
                    }
                    if self.pos() == before || !self.at_statement_boundary() {
                        self.synchronize();
                    }
                }
            }
        }
        statements
    }

    /// Whether the current token can begin the next statement.
    fn at_statement_boundary(&self) -> bool {
        match self.peek().keyword() {
            Some(Keyword::END) => self.block_depth > 0,
            Some(kw) => kw.starts_statement(),
            None => false,
        }
    }

    /// Parse one statement, including an optional trailing `;`.
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Statement> {
        grow_stack(|| self.parse_terminated_statement())
    }

    fn parse_terminated_statement(&mut self) -> ParseResult<Statement> {
        let start = self.current_span();
        if self.eat_op(Op::Semicolon) {
            return Ok(Statement::new(StatementKind::Empty, start));
        }
        let kind = self.parse_statement_kind()?;
        self.eat_op(Op::Semicolon);
        Ok(Statement::new(kind, self.span_from(start)))
    }

    /// Whether the current token is a non-reserved word that begins a
    /// statement (`THROW`, `RECEIVE`, ...) or a `label:`.
    pub(crate) fn check_statement_word(&self) -> bool {
        if !matches!(self.peek().kind, TokenKind::Identifier) {
            return false;
        }
        self.check_op_at(1, Op::Colon) || STATEMENT_WORDS.iter().any(|w| self.check_word_ci(w))
    }

    /// Whether the current token ends the statement being parsed: EOF, `;`,
    /// `ELSE`, a block's `END`, or the start of another statement.
    pub(crate) fn at_statement_end(&self) -> bool {
        if self.is_at_end() || self.check_op(Op::Semicolon) || self.check_keyword(Keyword::ELSE) {
            return true;
        }
        self.at_statement_boundary() || self.check_statement_word()
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn parse_statement_kind(&mut self) -> ParseResult<StatementKind> {
        let token = *self.peek();
        let start = token.span;
        match token.kind {
            TokenKind::Keyword(kw) => self.parse_keyword_statement(kw, start),
            TokenKind::Operator(Op::LParen) => {
                Ok(StatementKind::Select(Box::new(self.parse_query()?)))
            }
            TokenKind::Identifier if self.check_op_at(1, Op::Colon) => {
                let label = self.parse_identifier()?;
                self.advance();
                Ok(StatementKind::Label(label))
            }
            TokenKind::Identifier if self.check_word_ci("THROW") => {
                Ok(StatementKind::Throw(self.parse_throw()?))
            }
            TokenKind::Identifier if self.check_word_ci("RECEIVE") => {
                Ok(StatementKind::Receive(Box::new(self.parse_receive()?)))
            }
            TokenKind::Identifier
                if self.check_word_ci("SEND")
                    || self.check_word_ci("GET")
                    || self.check_word_ci("MOVE") =>
            {
                Ok(self.parse_opaque(2, &[]))
            }
            TokenKind::Identifier
                if (self.check_word_ci("ENABLE") || self.check_word_ci("DISABLE"))
                    && self.check_keyword_at(1, Keyword::TRIGGER) =>
            {
                Ok(self.parse_opaque(2, &[]))
            }
            // A procedure name alone at the start of a batch runs it.
            TokenKind::Identifier | TokenKind::QuotedIdentifier(_)
                if self.pos() == 0 && self.block_depth == 0 =>
            {
                let exec = self.parse_execute_call(start)?;
                Ok(StatementKind::Execute(Box::new(exec)))
            }
            _ => Err(self.expected("statement")),
        }
    }

    fn parse_keyword_statement(&mut self, kw: Keyword, start: SourceSpan) -> ParseResult<StatementKind> {
        match kw {
            Keyword::WITH => self.parse_with_statement(),
            Keyword::SELECT => Ok(StatementKind::Select(Box::new(self.parse_query()?))),
            Keyword::INSERT => Ok(StatementKind::Insert(Box::new(self.parse_insert(None)?))),
            Keyword::UPDATE => Ok(StatementKind::Update(Box::new(self.parse_update(None)?))),
            Keyword::DELETE => Ok(StatementKind::Delete(Box::new(self.parse_delete(None)?))),
            Keyword::MERGE => Ok(StatementKind::Merge(Box::new(self.parse_merge(None)?))),
            Keyword::TRUNCATE => Ok(StatementKind::Truncate(self.parse_truncate()?)),
            Keyword::CREATE | Keyword::ALTER => self.parse_create_or_alter(),
            Keyword::DROP => self.parse_drop(),
            Keyword::GRANT | Keyword::DENY | Keyword::REVOKE => {
                Ok(StatementKind::Permission(Box::new(self.parse_permission()?)))
            }
            Keyword::IF => self.parse_if(),
            Keyword::WHILE => self.parse_while(),
            Keyword::BEGIN => self.parse_begin(),
            Keyword::RETURN => self.parse_return(),
            Keyword::BREAK => {
                self.advance();
                Ok(StatementKind::Break)
            }
            Keyword::CONTINUE => {
                self.advance();
                Ok(StatementKind::Continue)
            }
            Keyword::GOTO => {
                self.advance();
                Ok(StatementKind::Goto(self.parse_identifier()?))
            }
            Keyword::WAITFOR => Ok(StatementKind::WaitFor(self.parse_waitfor()?)),
            Keyword::RAISERROR => Ok(StatementKind::Raiserror(Box::new(self.parse_raiserror()?))),
            Keyword::PRINT => {
                self.advance();
                Ok(StatementKind::Print(self.parse_expr()?))
            }
            Keyword::COMMIT | Keyword::ROLLBACK | Keyword::SAVE => {
                Ok(StatementKind::Transaction(self.parse_transaction()?))
            }
            Keyword::DECLARE => self.parse_declare(),
            Keyword::SET => self.parse_set(),
            Keyword::USE => {
                self.advance();
                Ok(StatementKind::Use(self.parse_identifier()?))
            }
            Keyword::EXEC | Keyword::EXECUTE if self.check_keyword_at(1, Keyword::AS) => {
                Ok(StatementKind::ExecuteAs(self.parse_execute_as()?))
            }
            Keyword::EXEC | Keyword::EXECUTE => {
                Ok(StatementKind::Execute(Box::new(self.parse_execute()?)))
            }
            Keyword::REVERT => self.parse_revert(),
            Keyword::OPEN => {
                self.advance();
                Ok(StatementKind::OpenCursor(self.parse_cursor_ref()?))
            }
            Keyword::CLOSE => {
                self.advance();
                Ok(StatementKind::CloseCursor(self.parse_cursor_ref()?))
            }
            Keyword::DEALLOCATE => {
                self.advance();
                Ok(StatementKind::DeallocateCursor(self.parse_cursor_ref()?))
            }
            Keyword::FETCH => Ok(StatementKind::Fetch(self.parse_fetch()?)),
            Keyword::BULK => Ok(self.parse_opaque(2, &[])),
            Keyword::END if self.check_word_ci_at(1, "CONVERSATION") => Ok(self.parse_opaque(2, &[])),
            _ if OPAQUE_KEYWORDS.contains(&kw) => Ok(self.parse_opaque(1, &[])),
            _ => Err(self.error_at(
                format!("unexpected '{}' at start of statement", self.peek().text),
                start,
            )),
        }
    }

    /// `WITH cte AS (...)` followed by the statement it belongs to.
    fn parse_with_statement(&mut self) -> ParseResult<StatementKind> {
        let with = Some(self.parse_with_clause()?);
        let kind = match self.peek().keyword() {
            Some(Keyword::INSERT) => StatementKind::Insert(Box::new(self.parse_insert(with)?)),
            Some(Keyword::UPDATE) => StatementKind::Update(Box::new(self.parse_update(with)?)),
            Some(Keyword::DELETE) => StatementKind::Delete(Box::new(self.parse_delete(with)?)),
            Some(Keyword::MERGE) => StatementKind::Merge(Box::new(self.parse_merge(with)?)),
            _ => StatementKind::Select(Box::new(self.parse_query_after_with(with)?)),
        };
        Ok(kind)
    }

    /// A statement kept as source text, with an unsupported-construct warning.
    /// The first `words` tokens name the statement.
    pub(crate) fn parse_opaque(&mut self, words: usize, allow: &[Keyword]) -> StatementKind {
        let start = self.current_span();
        let mut keyword = Vec::with_capacity(words);
        for _ in 0..words {
            if self.is_at_end() || self.check_op(Op::Semicolon) {
                break;
            }
            keyword.push(self.advance().text.to_uppercase());
        }
        self.consume_statement_text(allow);
        let span = self.span_from(start);
        let keyword = keyword.join(" ");
        self.push_diagnostic(Diagnostic::unsupported(
            format!("{keyword} is recognized but not interpreted"),
            span,
        ));
        StatementKind::Opaque {
            keyword,
            text: self.text(span).to_string(),
        }
    }

    // ========================================================================
    // CREATE / ALTER
    // ========================================================================

    fn parse_create_or_alter(&mut self) -> ParseResult<StatementKind> {
        let begin = self.pos();
        let start = self.current_span();
        let mode = if self.eat_keyword(Keyword::ALTER) {
            CreateMode::Alter
        } else {
            self.expect_keyword(Keyword::CREATE)?;
            if self.check_keyword(Keyword::OR) && self.check_keyword_at(1, Keyword::ALTER) {
                self.advance();
                self.advance();
                CreateMode::CreateOrAlter
            } else {
                CreateMode::Create
            }
        };
        let creating = mode == CreateMode::Create;
        // Words naming the statement when it is kept as text
        let opaque_words = if mode == CreateMode::CreateOrAlter { 4 } else { 2 };

        match self.peek().keyword() {
            Some(Keyword::TABLE) if creating => {
                Ok(StatementKind::CreateTable(Box::new(self.parse_create_table(start)?)))
            }
            Some(Keyword::TABLE) if mode == CreateMode::Alter => {
                Ok(StatementKind::AlterTable(Box::new(self.parse_alter_table(start)?)))
            }
            Some(Keyword::VIEW) => Ok(StatementKind::View(Box::new(self.parse_view(mode, start)?))),
            Some(Keyword::PROC | Keyword::PROCEDURE) => {
                Ok(StatementKind::Procedure(Box::new(self.parse_procedure(mode, start)?)))
            }
            Some(Keyword::FUNCTION) => {
                Ok(StatementKind::Function(Box::new(self.parse_function(mode, start)?)))
            }
            Some(Keyword::TRIGGER) => {
                Ok(StatementKind::Trigger(Box::new(self.parse_trigger(mode, start)?)))
            }
            Some(Keyword::INDEX) if mode == CreateMode::Alter => {
                Ok(StatementKind::AlterIndex(Box::new(self.parse_alter_index(start)?)))
            }
            Some(Keyword::INDEX | Keyword::UNIQUE | Keyword::CLUSTERED | Keyword::NONCLUSTERED)
                if creating =>
            {
                Ok(StatementKind::CreateIndex(Box::new(self.parse_create_index(start)?)))
            }
            Some(Keyword::PRIMARY) if creating && self.check_word_ci_at(1, "XML") => {
                Ok(StatementKind::CreateIndex(Box::new(self.parse_create_index(start)?)))
            }
            Some(Keyword::SCHEMA) if creating => {
                Ok(StatementKind::CreateSchema(Box::new(self.parse_create_schema(start)?)))
            }
            Some(Keyword::SCHEMA) if mode == CreateMode::Alter => {
                Ok(StatementKind::AlterSchema(self.parse_alter_schema(start)?))
            }
            Some(Keyword::USER) => Ok(StatementKind::User(Box::new(self.parse_user(mode, start)?))),
            Some(Keyword::DATABASE)
                if self.check_word_ci_at(1, "SCOPED") && self.check_word_ci_at(2, "CREDENTIAL") =>
            {
                Ok(StatementKind::Credential(Box::new(self.parse_credential(mode, start)?)))
            }
            Some(Keyword::DATABASE) => {
                self.rewind(begin);
                Ok(self.parse_opaque(opaque_words, &[Keyword::SET]))
            }
            _ => match self.parse_create_or_alter_word(mode, start)? {
                Some(kind) => Ok(kind),
                None if self.is_at_end() => Err(self.expected("object type")),
                None => {
                    self.rewind(begin);
                    Ok(self.parse_opaque(opaque_words, &[]))
                }
            },
        }
    }

    /// Object kinds named by non-reserved words. `None` when the kind is not
    /// one this parser interprets.
    fn parse_create_or_alter_word(
        &mut self,
        mode: CreateMode,
        start: SourceSpan,
    ) -> ParseResult<Option<StatementKind>> {
        let creating = mode == CreateMode::Create;
        let kind = if creating
            && (self.check_word_ci("COLUMNSTORE")
                || self.check_word_ci("XML")
                || self.check_word_ci("SPATIAL"))
            && self.check_keyword_at(1, Keyword::INDEX)
        {
            StatementKind::CreateIndex(Box::new(self.parse_create_index(start)?))
        } else if creating && self.check_word_ci("SYNONYM") {
            StatementKind::Synonym(self.parse_synonym(start)?)
        } else if self.check_word_ci("SEQUENCE") {
            StatementKind::Sequence(Box::new(self.parse_sequence(mode, start)?))
        } else if creating && self.check_word_ci("TYPE") {
            StatementKind::CreateType(Box::new(self.parse_create_type(start)?))
        } else if self.check_word_ci("LOGIN") {
            StatementKind::Login(Box::new(self.parse_login(mode, start)?))
        } else if self.check_word_ci("ROLE")
            || (self.check_word_ci("SERVER") && self.check_word_ci_at(1, "ROLE"))
            || (self.check_word_ci("APPLICATION") && self.check_word_ci_at(1, "ROLE"))
        {
            StatementKind::Role(Box::new(self.parse_role(mode, start)?))
        } else if self.check_word_ci("CREDENTIAL") {
            StatementKind::Credential(Box::new(self.parse_credential(mode, start)?))
        } else if self.check_word_ci("QUEUE") {
            StatementKind::Queue(Box::new(self.parse_queue(mode, start)?))
        } else if self.check_word_ci("SERVICE") {
            StatementKind::Service(Box::new(self.parse_service(mode, start)?))
        } else {
            return Ok(None);
        };
        Ok(Some(kind))
    }

    // ========================================================================
    // DROP
    // ========================================================================

    fn parse_drop(&mut self) -> ParseResult<StatementKind> {
        let begin = self.pos();
        let start = self.expect_keyword(Keyword::DROP)?;
        let kind = match self.peek().keyword() {
            Some(Keyword::TABLE) => Some(ObjectKind::Table),
            Some(Keyword::VIEW) => Some(ObjectKind::View),
            Some(Keyword::PROC | Keyword::PROCEDURE) => Some(ObjectKind::Procedure),
            Some(Keyword::FUNCTION) => Some(ObjectKind::Function),
            Some(Keyword::TRIGGER) => Some(ObjectKind::Trigger),
            Some(Keyword::INDEX) => Some(ObjectKind::Index),
            Some(Keyword::SCHEMA) => Some(ObjectKind::Schema),
            Some(Keyword::USER) => Some(ObjectKind::User),
            Some(Keyword::DEFAULT) => Some(ObjectKind::Default),
            Some(Keyword::RULE) => Some(ObjectKind::Rule),
            Some(Keyword::STATISTICS) => Some(ObjectKind::Statistics),
            Some(Keyword::DATABASE)
                if self.check_word_ci_at(1, "SCOPED") && self.check_word_ci_at(2, "CREDENTIAL") =>
            {
                self.advance();
                self.advance();
                Some(ObjectKind::DatabaseScopedCredential)
            }
            Some(Keyword::DATABASE) => Some(ObjectKind::Other("DATABASE".to_string())),
            Some(_) => None,
            None => self.drop_word_kind(),
        };
        let Some(kind) = kind else {
            self.rewind(begin);
            return Ok(self.parse_opaque(2, &[]));
        };
        self.advance();

        let if_exists = self.parse_if_exists()?;
        let names = self.parse_comma_separated(Self::parse_object_name)?;
        let on = if self.eat_keyword(Keyword::ON) {
            if self.check_keyword(Keyword::DATABASE) {
                let token = self.advance();
                Some(ObjectName::from_ident(Ident::new("DATABASE", token.span)))
            } else if self.check_keyword(Keyword::ALL) && self.check_word_ci_at(1, "SERVER") {
                let first = self.advance().span;
                let last = self.advance().span;
                Some(ObjectName::from_ident(Ident::new("ALL SERVER", first.to(last))))
            } else {
                Some(self.parse_object_name()?)
            }
        } else {
            None
        };
        // DROP INDEX ix ON t WITH (ONLINE = ON)
        if self.check_keyword(Keyword::WITH) && self.check_op_at(1, Op::LParen) {
            self.advance();
            self.consume_parenthesized()?;
        }

        Ok(StatementKind::Drop(DropStatement {
            kind,
            if_exists,
            names,
            on,
            span: self.span_from(start),
        }))
    }

    /// Object kinds after DROP that are not reserved words. Multi-word kinds
    /// consume all but their last word here.
    fn drop_word_kind(&mut self) -> Option<ObjectKind> {
        let word = self.peek().text.to_uppercase();
        let kind = match word.as_str() {
            "SYNONYM" => ObjectKind::Synonym,
            "SEQUENCE" => ObjectKind::Sequence,
            "LOGIN" => ObjectKind::Login,
            "ROLE" => ObjectKind::Role,
            "CREDENTIAL" => ObjectKind::Credential,
            "QUEUE" => ObjectKind::Queue,
            "SERVICE" => ObjectKind::Service,
            "TYPE" => ObjectKind::Type,
            "SERVER" | "APPLICATION" if self.check_word_ci_at(1, "ROLE") => {
                self.advance();
                if word == "SERVER" {
                    ObjectKind::ServerRole
                } else {
                    ObjectKind::ApplicationRole
                }
            }
            "ASSEMBLY" | "CONTRACT" | "CERTIFICATE" | "ROUTE" | "AGGREGATE" | "ENDPOINT" => {
                ObjectKind::Other(word)
            }
            _ => return None,
        };
        Some(kind)
    }
}
