//! Base token parser providing common helper methods for T-SQL parsing.
//!
//! [`TokenParser`] owns the significant tokens of one batch plus a cursor
//! into them. The grammar is spread over the `*_parser.rs` modules, each of
//! which adds an `impl TokenParser` block for its statement family, so all
//! families share one cursor and can call into each other (a procedure body
//! parses statements, a statement parses expressions, an expression parses
//! subqueries).
//!
//! Grammar routines return [`ParseResult`] and use `?`. Only the statement
//! loop turns a [`ParseError`] into a diagnostic and resynchronizes.

use super::keywords::Keyword;
use super::token::{NumberKind, Op, QuoteStyle, Token, TokenKind};
use crate::ast::{DataType, Ident, IdentQuote, LegacyConstruct, ObjectName, RawOption, TypeArg};
use crate::diagnostics::Diagnostic;
use crate::options::{CancellationFlag, DialectStrictness};
use crate::source::SourceSpan;

/// A grammar violation at a specific token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: SourceSpan,
    /// The offending token is itself a lexical error, already reported.
    pub at_lexical_error: bool,
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Stack left free before descending into a nested construct.
const STACK_RED_ZONE: usize = 256 * 1024;
/// Size of each stack segment allocated once the red zone is reached.
const STACK_SEGMENT: usize = 4 * 1024 * 1024;

/// Run a recursive grammar routine, switching to a fresh heap-allocated
/// stack segment when the current one runs low. Nesting of subqueries,
/// blocks and calls is then limited by memory, not by the thread's stack.
pub(crate) fn grow_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, f)
}

/// Per-batch parser state.
pub struct TokenParser<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    strictness: DialectStrictness,
    cancellation: Option<CancellationFlag>,
    cancelled: bool,
    /// Nesting of `BEGIN ... END` style blocks being parsed.
    pub(crate) block_depth: u32,
}

impl<'a> TokenParser<'a> {
    /// Create a parser over a batch's tokens. Comments and SQLCMD directive
    /// lines are dropped; an EOF token at `end` is appended.
    pub fn new(
        source: &'a str,
        tokens: impl IntoIterator<Item = Token<'a>>,
        end: SourceSpan,
    ) -> Self {
        let mut tokens: Vec<Token<'a>> = tokens.into_iter().filter(|t| !t.is_trivia()).collect();
        tokens.retain(|t| !t.is_eof());
        tokens.push(Token {
            kind: TokenKind::Eof,
            text: "",
            span: end,
            leading_trivia: "",
        });
        Self {
            source,
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            strictness: DialectStrictness::Lenient,
            cancellation: None,
            cancelled: false,
            block_depth: 0,
        }
    }

    pub fn with_strictness(mut self, strictness: DialectStrictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_cancellation(mut self, flag: Option<CancellationFlag>) -> Self {
        self.cancellation = flag;
        self
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Whether parsing stopped because of cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Check the cancellation flag; records a diagnostic the first time it is seen set.
    pub(crate) fn check_cancelled(&mut self) -> bool {
        if self.cancelled {
            return true;
        }
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
        {
            self.cancelled = true;
            let span = self.current_span().empty_at_start();
            self.diagnostics.push(Diagnostic::cancelled(span));
        }
        self.cancelled
    }

    /// Record a legacy construct. Silent when lenient; an error when strict.
    pub(crate) fn note_legacy(&mut self, construct: LegacyConstruct, span: SourceSpan) {
        if self.strictness == DialectStrictness::Strict {
            self.diagnostics.push(Diagnostic::syntax(
                format!("{} is not allowed in strict mode", construct.description()),
                span,
            ));
        }
    }

    // ========================================================================
    // Position and state
    // ========================================================================

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the cursor back to a position previously read with [`Self::pos`].
    pub(crate) fn rewind(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len() - 1);
    }

    // ========================================================================
    // Token access
    // ========================================================================

    /// Current token. At the end this is the EOF token.
    #[inline]
    pub fn peek(&self) -> &Token<'a> {
        self.peek_nth(0)
    }

    /// Token `offset` positions ahead, clamped to EOF.
    #[inline]
    pub fn peek_nth(&self, offset: usize) -> &Token<'a> {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)]
    }

    /// Consume and return the current token. EOF is never consumed.
    pub fn advance(&mut self) -> Token<'a> {
        let token = *self.peek();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    #[inline]
    pub fn current_span(&self) -> SourceSpan {
        self.peek().span
    }

    /// Span of the most recently consumed token.
    pub fn prev_span(&self) -> SourceSpan {
        if self.pos == 0 {
            return self.current_span().empty_at_start();
        }
        self.tokens[self.pos - 1].span
    }

    /// Span from `start` through the most recently consumed token.
    pub fn span_from(&self, start: SourceSpan) -> SourceSpan {
        start.to(self.prev_span())
    }

    /// Source text covered by `span`.
    pub fn text(&self, span: SourceSpan) -> &'a str {
        self.source.get(span.start..span.end).unwrap_or("")
    }

    // ========================================================================
    // Token type checks
    // ========================================================================

    #[inline]
    pub fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek().keyword() == Some(keyword)
    }

    #[inline]
    pub fn check_keyword_at(&self, offset: usize, keyword: Keyword) -> bool {
        self.peek_nth(offset).keyword() == Some(keyword)
    }

    /// Check if the current token is an unquoted word matching `word`
    /// (case-insensitive). Used for the many non-reserved T-SQL words.
    #[inline]
    pub fn check_word_ci(&self, word: &str) -> bool {
        self.check_word_ci_at(0, word)
    }

    pub fn check_word_ci_at(&self, offset: usize, word: &str) -> bool {
        let token = self.peek_nth(offset);
        matches!(token.kind, TokenKind::Identifier | TokenKind::Keyword(_))
            && token.text.eq_ignore_ascii_case(word)
    }

    #[inline]
    pub fn check_op(&self, op: Op) -> bool {
        self.peek().op() == Some(op)
    }

    #[inline]
    pub fn check_op_at(&self, offset: usize, op: Op) -> bool {
        self.peek_nth(offset).op() == Some(op)
    }

    /// Whether the current token can be read as an identifier.
    pub fn check_identifier(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Identifier | TokenKind::QuotedIdentifier(_)
        )
    }

    pub fn check_variable(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Variable)
    }

    pub fn check_string(&self) -> bool {
        matches!(self.peek().kind, TokenKind::StringLiteral(_))
    }

    // ========================================================================
    // Consuming checks
    // ========================================================================

    pub fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn eat_word_ci(&mut self, word: &str) -> bool {
        if self.check_word_ci(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn eat_op(&mut self, op: Op) -> bool {
        if self.check_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ========================================================================
    // Expect methods (check and advance, or fail)
    // ========================================================================

    pub fn expect_keyword(&mut self, keyword: Keyword) -> ParseResult<SourceSpan> {
        if self.check_keyword(keyword) {
            Ok(self.advance().span)
        } else {
            Err(self.expected(keyword.as_str()))
        }
    }

    pub fn expect_word_ci(&mut self, word: &str) -> ParseResult<SourceSpan> {
        if self.check_word_ci(word) {
            Ok(self.advance().span)
        } else {
            Err(self.expected(word))
        }
    }

    pub fn expect_op(&mut self, op: Op) -> ParseResult<SourceSpan> {
        if self.check_op(op) {
            Ok(self.advance().span)
        } else {
            Err(self.expected(&format!("'{}'", op.as_str())))
        }
    }

    /// Error naming what was expected and what was found instead.
    pub fn expected(&self, what: &str) -> ParseError {
        let token = self.peek();
        let found = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", truncate(token.text, 40)),
        };
        ParseError {
            message: format!("expected {what}, found {found}"),
            span: token.span,
            at_lexical_error: matches!(token.kind, TokenKind::Error(_)),
        }
    }

    pub fn error_at(&self, message: impl Into<String>, span: SourceSpan) -> ParseError {
        ParseError {
            message: message.into(),
            span,
            at_lexical_error: false,
        }
    }

    // ========================================================================
    // Backtracking and recovery
    // ========================================================================

    /// Run `f`; on failure restore the cursor and drop any diagnostics it added.
    pub fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> Option<T> {
        let pos = self.pos;
        let diag_len = self.diagnostics.len();
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = pos;
                self.diagnostics.truncate(diag_len);
                None
            }
        }
    }

    /// Panic-mode recovery: skip to just after `;`, or to the next token that
    /// starts a statement, or to EOF. Always consumes at least one token
    /// unless already at EOF. Inside a block, `END` also stops the skip.
    pub fn synchronize(&mut self) {
        let start = self.pos;
        while !self.is_at_end() {
            let token = *self.peek();
            if token.op() == Some(Op::Semicolon) {
                self.advance();
                return;
            }
            if self.pos > start {
                if let Some(kw) = token.keyword() {
                    if kw.starts_statement() || (kw == Keyword::END && self.block_depth > 0) {
                        return;
                    }
                }
            }
            self.advance();
        }
    }

    // ========================================================================
    // Identifier parsing
    // ========================================================================

    /// Parse an identifier (bracketed, quoted, or a non-reserved word).
    pub fn parse_identifier(&mut self) -> ParseResult<Ident> {
        match self.peek().kind {
            TokenKind::Identifier | TokenKind::QuotedIdentifier(_) => Ok(self.ident_from_token()),
            _ => Err(self.expected("identifier")),
        }
    }

    /// Like [`Self::parse_identifier`], but reserved keywords are accepted too.
    /// Used after `.` and for option names.
    pub fn parse_identifier_or_keyword(&mut self) -> ParseResult<Ident> {
        match self.peek().kind {
            TokenKind::Identifier | TokenKind::QuotedIdentifier(_) | TokenKind::Keyword(_) => {
                Ok(self.ident_from_token())
            }
            _ => Err(self.expected("identifier")),
        }
    }

    fn ident_from_token(&mut self) -> Ident {
        let token = self.advance();
        let quote = match token.kind {
            TokenKind::QuotedIdentifier(QuoteStyle::Bracket) => IdentQuote::Bracket,
            TokenKind::QuotedIdentifier(QuoteStyle::DoubleQuote) => IdentQuote::DoubleQuote,
            _ => IdentQuote::None,
        };
        Ident {
            value: token.identifier_value(),
            quote,
            span: token.span,
        }
    }

    /// Parse a qualified name: `a`, `a.b`, `[a].[b].c`, `db..t`, `srv.db.s.t`.
    pub fn parse_object_name(&mut self) -> ParseResult<ObjectName> {
        let first = self.parse_identifier()?;
        let start = first.span;
        let mut parts = vec![first];
        while self.check_op(Op::Dot) {
            let dot = self.advance().span;
            if self.check_op(Op::Dot) {
                parts.push(Ident::new("", dot.empty_at_end()));
                continue;
            }
            parts.push(self.parse_identifier_or_keyword()?);
        }
        Ok(ObjectName {
            parts,
            span: self.span_from(start),
        })
    }

    /// `(a, b, c)`
    pub fn parse_parenthesized_identifiers(&mut self) -> ParseResult<Vec<Ident>> {
        self.expect_op(Op::LParen)?;
        let idents = self.parse_comma_separated(Self::parse_identifier)?;
        self.expect_op(Op::RParen)?;
        Ok(idents)
    }

    pub fn parse_comma_separated<T>(
        &mut self,
        mut f: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut items = vec![f(self)?];
        while self.eat_op(Op::Comma) {
            items.push(f(self)?);
        }
        Ok(items)
    }

    /// Consume a variable token and return its text (`@name`).
    pub fn parse_variable_name(&mut self) -> ParseResult<String> {
        if self.check_variable() {
            Ok(self.advance().text.to_string())
        } else {
            Err(self.expected("variable"))
        }
    }

    /// Consume a string literal and return its decoded value.
    pub fn parse_string_value(&mut self) -> ParseResult<String> {
        if self.check_string() {
            Ok(self.advance().string_value())
        } else {
            Err(self.expected("string literal"))
        }
    }

    // ========================================================================
    // Numeric parsing
    // ========================================================================

    /// Parse an unsigned integer literal and return its text.
    pub fn parse_integer_text(&mut self) -> ParseResult<String> {
        match self.peek().kind {
            TokenKind::Number(NumberKind::Integer) => Ok(self.advance().text.to_string()),
            _ => Err(self.expected("integer")),
        }
    }

    /// Parse an optionally negative integer literal and return its text.
    pub fn parse_signed_integer_text(&mut self) -> ParseResult<String> {
        let start = self.current_span();
        if self.eat_op(Op::Minus) || self.eat_op(Op::Plus) {
            self.parse_integer_text()?;
            return Ok(self.text(self.span_from(start)).to_string());
        }
        self.parse_integer_text()
    }

    pub fn parse_positive_integer(&mut self) -> ParseResult<u64> {
        let span = self.current_span();
        let text = self.parse_integer_text()?;
        text.parse::<u64>()
            .map_err(|_| self.error_at(format!("integer '{text}' is out of range"), span))
    }

    // ========================================================================
    // Data type parsing
    // ========================================================================

    /// Parse a data type with optional arguments.
    pub fn parse_data_type(&mut self) -> ParseResult<DataType> {
        let start = self.current_span();
        let name = if self.check_keyword(Keyword::DOUBLE) {
            self.advance();
            self.expect_keyword(Keyword::PRECISION)?;
            self.multiword_type_name(start)
        } else if self.check_keyword(Keyword::NATIONAL) {
            self.advance();
            if !(self.eat_word_ci("CHAR") || self.eat_word_ci("CHARACTER") || self.eat_word_ci("TEXT"))
            {
                return Err(self.expected("CHAR, CHARACTER or TEXT"));
            }
            self.eat_keyword(Keyword::VARYING);
            self.multiword_type_name(start)
        } else if (self.check_word_ci("CHAR")
            || self.check_word_ci("CHARACTER")
            || self.check_word_ci("BINARY"))
            && self.check_keyword_at(1, Keyword::VARYING)
        {
            self.advance();
            self.advance();
            self.multiword_type_name(start)
        } else if self.check_keyword(Keyword::CURSOR) {
            let token = self.advance();
            ObjectName::from_ident(Ident::new(token.text, token.span))
        } else {
            self.parse_object_name()?
        };

        let mut args = Vec::new();
        if self.check_op(Op::LParen) {
            self.advance();
            loop {
                args.push(self.parse_type_arg()?);
                if !self.eat_op(Op::Comma) {
                    break;
                }
            }
            self.expect_op(Op::RParen)?;
        }
        Ok(DataType {
            name,
            args,
            span: self.span_from(start),
        })
    }

    fn multiword_type_name(&self, start: SourceSpan) -> ObjectName {
        let span = self.span_from(start);
        let words: Vec<&str> = self.text(span).split_whitespace().collect();
        ObjectName::from_ident(Ident::new(words.join(" ").to_uppercase(), span))
    }

    fn parse_type_arg(&mut self) -> ParseResult<TypeArg> {
        if self.check_word_ci("MAX") && self.is_arg_end(1) {
            self.advance();
            return Ok(TypeArg::Max);
        }
        if matches!(self.peek().kind, TokenKind::Number(NumberKind::Integer)) && self.is_arg_end(1) {
            return Ok(TypeArg::Number(self.advance().text.to_string()));
        }
        let span = self.consume_until_list_end()?;
        Ok(TypeArg::Other(self.text(span).to_string()))
    }

    fn is_arg_end(&self, offset: usize) -> bool {
        self.check_op_at(offset, Op::Comma) || self.check_op_at(offset, Op::RParen)
    }

    // ========================================================================
    // Raw text capture
    // ========================================================================

    /// Consume tokens up to (not including) a `,` or `)` at nesting depth
    /// zero. Unparenthesized option lists also end at `;` or at a keyword
    /// that starts a statement. Returns the span of what was consumed.
    pub fn consume_until_list_end(&mut self) -> ParseResult<SourceSpan> {
        let start = self.current_span();
        let mut depth = 0usize;
        let begin = self.pos;
        while !self.is_at_end() {
            let token = *self.peek();
            match token.op() {
                Some(Op::LParen) => depth += 1,
                Some(Op::RParen) if depth == 0 => break,
                Some(Op::RParen) => depth -= 1,
                Some(Op::Comma | Op::Semicolon) if depth == 0 => break,
                _ => {}
            }
            if depth == 0
                && self.pos > begin
                && token.keyword().is_some_and(Keyword::starts_statement)
            {
                break;
            }
            self.advance();
        }
        if self.pos == begin {
            return Err(self.expected("value"));
        }
        Ok(self.span_from(start))
    }

    /// Consume a balanced `( ... )` group and return its span.
    pub fn consume_parenthesized(&mut self) -> ParseResult<SourceSpan> {
        let start = self.expect_op(Op::LParen)?;
        let mut depth = 1usize;
        while depth > 0 {
            if self.is_at_end() {
                return Err(self.expected("')'"));
            }
            match self.advance().op() {
                Some(Op::LParen) => depth += 1,
                Some(Op::RParen) => depth -= 1,
                _ => {}
            }
        }
        Ok(self.span_from(start))
    }

    /// Consume the rest of a statement kept as text: up to `;`, EOF, an
    /// unbalanced `)`, or a token that starts another statement at nesting
    /// depth zero. Keywords
    /// listed in `allow` do not end the statement.
    pub fn consume_statement_text(&mut self, allow: &[Keyword]) -> SourceSpan {
        let start = self.current_span();
        let begin = self.pos;
        let mut depth = 0usize;
        while !self.is_at_end() {
            let token = *self.peek();
            match token.op() {
                Some(Op::Semicolon) if depth == 0 => break,
                Some(Op::LParen) => depth += 1,
                Some(Op::RParen) if depth == 0 => break,
                Some(Op::RParen) => depth -= 1,
                _ => {}
            }
            if depth == 0 && self.pos > begin {
                if let Some(kw) = token.keyword() {
                    if (kw.starts_statement() && !allow.contains(&kw))
                        || (kw == Keyword::END && self.block_depth > 0)
                    {
                        break;
                    }
                }
            }
            self.advance();
        }
        if self.pos == begin {
            return start.empty_at_start();
        }
        self.span_from(start)
    }

    // ========================================================================
    // Option lists
    // ========================================================================

    /// Parse `name [= value]` where the name may be several words and the
    /// value runs to the next `,` or `)` at depth zero.
    pub fn parse_raw_option(&mut self) -> ParseResult<RawOption> {
        let start = self.current_span();
        let mut words = Vec::new();
        while matches!(
            self.peek().kind,
            TokenKind::Identifier | TokenKind::Keyword(_) | TokenKind::QuotedIdentifier(_)
        ) {
            words.push(self.advance().text.to_uppercase());
            if self.check_op(Op::LParen) || self.check_op(Op::Eq) {
                break;
            }
        }
        if words.is_empty() {
            return Err(self.expected("option name"));
        }
        let value = if self.eat_op(Op::Eq) || self.check_op(Op::LParen) {
            let span = self.consume_until_list_end()?;
            Some(self.text(span).to_string())
        } else {
            None
        };
        Ok(RawOption {
            name: words.join(" "),
            value,
            span: self.span_from(start),
        })
    }

    /// `( option [, option ...] )`
    pub fn parse_raw_option_list(&mut self) -> ParseResult<Vec<RawOption>> {
        self.expect_op(Op::LParen)?;
        let options = self.parse_comma_separated(Self::parse_raw_option)?;
        self.expect_op(Op::RParen)?;
        Ok(options)
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
