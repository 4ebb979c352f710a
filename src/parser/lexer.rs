//! Hand-written T-SQL lexer
//!
//! The lexer is a lazy [`Iterator`] over [`Token`]s terminated by a single
//! [`TokenKind::Eof`]. It never fails: malformed input becomes an
//! [`TokenKind::Error`] token and scanning either continues (bad character,
//! over-deep comment) or stops at end of input (unterminated literal or
//! comment).
//!
//! Whitespace is never a token; it is attached to the following token as
//! `leading_trivia` so the input can be rebuilt byte for byte.

use super::keywords::Keyword;
use super::token::{
    CommentKind, LexErrorKind, NumberKind, Op, QuoteStyle, StringKind, Token, TokenKind,
};
use crate::source::SourceSpan;

/// Settings the lexer consults while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerSettings {
    pub quoted_identifier: bool,
    pub max_nested_comment_depth: Option<u32>,
}

impl Default for LexerSettings {
    fn default() -> Self {
        Self {
            quoted_identifier: true,
            max_nested_comment_depth: None,
        }
    }
}

/// SQLCMD commands recognized after a `:` at the start of a line.
const SQLCMD_COMMANDS: &[&str] = &[
    "setvar",
    "r",
    "on",
    "connect",
    "out",
    "error",
    "exit",
    "quit",
    "reset",
    "ed",
    "list",
    "listvar",
    "serverlist",
    "help",
    "perftrace",
    "xml",
];

/// What follows `GO` on a separator line.
#[derive(Debug, Default)]
struct SeparatorTail {
    /// Bytes after `GO` that belong to the separator token.
    len: usize,
    repeat_count: Option<u32>,
    invalid_count: bool,
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    at_line_start: bool,
    settings: LexerSettings,
    /// A terminal error was emitted; only EOF remains.
    halted: bool,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::with_settings(src, LexerSettings::default())
    }

    pub fn with_settings(src: &'a str, settings: LexerSettings) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            at_line_start: true,
            settings,
            halted: false,
            finished: false,
        }
    }

    pub fn settings(&self) -> LexerSettings {
        self.settings
    }

    /// Change how `"..."` is scanned from the next token on.
    pub fn set_quoted_identifier(&mut self, on: bool) {
        self.settings.quoted_identifier = on;
    }

    /// Byte offset of the next unscanned character.
    pub fn offset(&self) -> usize {
        self.pos
    }

    // ========================================================================
    // Character navigation
    // ========================================================================

    #[inline]
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    #[inline]
    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    #[inline]
    fn peek_char_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    #[inline]
    fn peek_byte(&self, n: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        match c {
            '\n' => self.new_line(),
            '\r' if self.peek_byte(0) != Some(b'\n') => self.new_line(),
            _ => self.column += 1,
        }
        Some(c)
    }

    /// Advance over `n` ASCII bytes known not to contain line breaks.
    #[inline]
    fn bump_ascii(&mut self, n: usize) {
        self.pos += n;
        self.column += n as u32;
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.column = 1;
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            if c == '\n' || c == '\r' {
                self.at_line_start = true;
            }
            self.bump();
        }
    }

    fn skip_to_end(&mut self) {
        while self.bump().is_some() {}
    }

    // ========================================================================
    // Token scanners
    // ========================================================================

    fn scan(&mut self) -> TokenKind {
        let Some(c) = self.peek_char() else {
            return TokenKind::Eof;
        };
        let next = self.peek_char_at(1);
        match c {
            '-' if next == Some('-') => self.scan_line_comment(),
            '/' if next == Some('*') => self.scan_block_comment(),
            '\'' => self.scan_string(StringKind::Ansi),
            'N' | 'n' if next == Some('\'') => {
                self.bump_ascii(1);
                self.scan_string(StringKind::Unicode)
            }
            '"' if self.settings.quoted_identifier => self.scan_double_quoted_identifier(),
            '"' => self.scan_double_quoted_string(),
            '[' => self.scan_bracket_identifier(),
            '@' => self.scan_variable(),
            '0' if matches!(next, Some('x' | 'X')) => self.scan_binary(),
            '0'..='9' => self.scan_number(),
            '.' if next.is_some_and(|n| n.is_ascii_digit()) => self.scan_number(),
            '$' => self.scan_dollar(),
            ':' if self.at_line_start && self.is_sqlcmd_command() => self.scan_to_line_end(),
            '!' if self.at_line_start && next == Some('!') => self.scan_to_line_end(),
            c if is_identifier_start(c) => self.scan_word(),
            _ => self.scan_operator(c, next),
        }
    }

    fn scan_to_line_end(&mut self) -> TokenKind {
        self.bump_while(|c| c != '\n' && c != '\r');
        TokenKind::SqlcmdDirective
    }

    fn scan_line_comment(&mut self) -> TokenKind {
        self.bump_ascii(2);
        self.bump_while(|c| c != '\n' && c != '\r');
        TokenKind::Comment(CommentKind::Line)
    }

    fn scan_block_comment(&mut self) -> TokenKind {
        self.bump_ascii(2);
        let mut depth: u32 = 1;
        let mut max_depth: u32 = 1;
        loop {
            let rest = self.rest();
            if rest.starts_with("/*") {
                self.bump_ascii(2);
                depth += 1;
                max_depth = max_depth.max(depth);
            } else if rest.starts_with("*/") {
                self.bump_ascii(2);
                depth -= 1;
                if depth == 0 {
                    break;
                }
            } else if self.bump().is_none() {
                return TokenKind::Error(LexErrorKind::UnterminatedComment);
            }
        }
        match self.settings.max_nested_comment_depth {
            Some(limit) if max_depth > limit => {
                TokenKind::Error(LexErrorKind::CommentTooDeep { limit })
            }
            _ => TokenKind::Comment(CommentKind::Block),
        }
    }

    /// Scan text closed by `close`, where a doubled `close` is an escape.
    /// The opening delimiter must already be current. Returns false when
    /// input ends first.
    fn scan_delimited(&mut self, close: char) -> bool {
        self.bump();
        loop {
            match self.bump() {
                Some(c) if c == close => {
                    if self.peek_char() == Some(close) {
                        self.bump();
                    } else {
                        return true;
                    }
                }
                Some(_) => {}
                None => return false,
            }
        }
    }

    fn scan_string(&mut self, kind: StringKind) -> TokenKind {
        if self.scan_delimited('\'') {
            TokenKind::StringLiteral(kind)
        } else {
            TokenKind::Error(LexErrorKind::UnterminatedString)
        }
    }

    fn scan_double_quoted_string(&mut self) -> TokenKind {
        if self.scan_delimited('"') {
            TokenKind::StringLiteral(StringKind::Ansi)
        } else {
            TokenKind::Error(LexErrorKind::UnterminatedString)
        }
    }

    fn scan_double_quoted_identifier(&mut self) -> TokenKind {
        if self.scan_delimited('"') {
            TokenKind::QuotedIdentifier(QuoteStyle::DoubleQuote)
        } else {
            TokenKind::Error(LexErrorKind::UnterminatedQuotedIdentifier)
        }
    }

    fn scan_bracket_identifier(&mut self) -> TokenKind {
        if self.scan_delimited(']') {
            TokenKind::QuotedIdentifier(QuoteStyle::Bracket)
        } else {
            TokenKind::Error(LexErrorKind::UnterminatedBracketIdentifier)
        }
    }

    fn scan_variable(&mut self) -> TokenKind {
        let start = self.pos;
        self.bump_ascii(1);
        if self.peek_char() == Some('@') {
            self.bump_ascii(1);
        }
        let name_start = self.pos;
        self.bump_while(is_identifier_part);
        if self.pos == name_start {
            self.pos = start;
            self.column -= (name_start - start) as u32;
            self.bump_ascii(1);
            return TokenKind::Error(LexErrorKind::UnexpectedCharacter);
        }
        TokenKind::Variable
    }

    fn scan_binary(&mut self) -> TokenKind {
        self.bump_ascii(2);
        self.bump_while(|c| c.is_ascii_hexdigit());
        TokenKind::BinaryLiteral
    }

    fn scan_digits(&mut self) -> usize {
        let start = self.pos;
        self.bump_while(|c| c.is_ascii_digit());
        self.pos - start
    }

    fn scan_number(&mut self) -> TokenKind {
        self.scan_digits();
        let mut kind = NumberKind::Integer;
        if self.peek_char() == Some('.') {
            self.bump_ascii(1);
            self.scan_digits();
            kind = NumberKind::Decimal;
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let sign = matches!(self.peek_char_at(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_char_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.bump_ascii(digit_at);
                self.scan_digits();
                kind = NumberKind::Float;
            }
        }
        TokenKind::Number(kind)
    }

    fn scan_dollar(&mut self) -> TokenKind {
        let next = self.peek_char_at(1);
        match next {
            Some(c) if c.is_ascii_digit() => {
                self.bump_ascii(1);
                self.scan_number_money()
            }
            Some('.') if self.peek_char_at(2).is_some_and(|c| c.is_ascii_digit()) => {
                self.bump_ascii(1);
                self.scan_number_money()
            }
            // Unexpanded SQLCMD variable: $(Name)
            Some('(') => {
                let close = self.rest().find(')');
                match close {
                    Some(end) if self.rest()[2..end].chars().all(is_identifier_part) && end > 2 => {
                        self.bump_ascii(end + 1);
                        TokenKind::Identifier
                    }
                    _ => {
                        self.bump_ascii(1);
                        TokenKind::Error(LexErrorKind::UnexpectedCharacter)
                    }
                }
            }
            Some(c) if is_identifier_start(c) => {
                self.bump_ascii(1);
                self.bump_while(is_identifier_part);
                TokenKind::Identifier
            }
            _ => {
                self.bump_ascii(1);
                TokenKind::Error(LexErrorKind::UnexpectedCharacter)
            }
        }
    }

    fn scan_number_money(&mut self) -> TokenKind {
        self.scan_digits();
        if self.peek_char() == Some('.') {
            self.bump_ascii(1);
            self.scan_digits();
        }
        TokenKind::Number(NumberKind::Money)
    }

    fn scan_word(&mut self) -> TokenKind {
        let start = self.pos;
        self.bump();
        self.bump_while(is_identifier_part);
        let word = &self.src[start..self.pos];
        if self.at_line_start && word.eq_ignore_ascii_case("GO") {
            if let Some(tail) = self.batch_separator_tail() {
                self.bump_ascii(tail.len);
                return TokenKind::BatchSeparator {
                    repeat_count: tail.repeat_count,
                    invalid_count: tail.invalid_count,
                };
            }
        }
        match Keyword::lookup(word) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier,
        }
    }

    /// After `GO` at line start: `[ws count] [ws] [;]` followed by optional
    /// whitespace and then end of line, end of input, or a line comment.
    fn batch_separator_tail(&self) -> Option<SeparatorTail> {
        let bytes = self.rest().as_bytes();
        let is_blank = |b: u8| b == b' ' || b == b'\t';
        let mut i = 0;
        let mut tail = SeparatorTail::default();

        while i < bytes.len() && is_blank(bytes[i]) {
            i += 1;
        }
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i > digits_start {
            if digits_start == 0 {
                return None;
            }
            // Zero and counts beyond u32 are still separators, but carry no count.
            tail.repeat_count = self.rest()[digits_start..i]
                .parse::<u32>()
                .ok()
                .filter(|&count| count > 0);
            tail.invalid_count = tail.repeat_count.is_none();
            tail.len = i;
            while i < bytes.len() && is_blank(bytes[i]) {
                i += 1;
            }
        }
        if i < bytes.len() && bytes[i] == b';' {
            i += 1;
            tail.len = i;
        }
        let rest = self.rest()[i..]
            .trim_start_matches(|c: char| c.is_whitespace() && c != '\n' && c != '\r');
        let ends_line = rest.is_empty() || rest.starts_with(['\n', '\r']) || rest.starts_with("--");
        ends_line.then_some(tail)
    }

    fn is_sqlcmd_command(&self) -> bool {
        let rest = &self.rest()[1..];
        let end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let word = &rest[..end];
        !word.is_empty()
            && SQLCMD_COMMANDS
                .iter()
                .any(|cmd| cmd.eq_ignore_ascii_case(word))
    }

    fn scan_operator(&mut self, c: char, next: Option<char>) -> TokenKind {
        let (op, len) = match (c, next) {
            ('(', _) => (Op::LParen, 1),
            (')', _) => (Op::RParen, 1),
            ('{', _) => (Op::LBrace, 1),
            ('}', _) => (Op::RBrace, 1),
            (',', _) => (Op::Comma, 1),
            ('.', _) => (Op::Dot, 1),
            (';', _) => (Op::Semicolon, 1),
            (':', Some(':')) => (Op::DoubleColon, 2),
            (':', _) => (Op::Colon, 1),
            ('+', Some('=')) => (Op::PlusEq, 2),
            ('+', _) => (Op::Plus, 1),
            ('-', Some('=')) => (Op::MinusEq, 2),
            ('-', _) => (Op::Minus, 1),
            ('*', Some('=')) => (Op::StarEq, 2),
            ('*', _) => (Op::Star, 1),
            ('/', Some('=')) => (Op::SlashEq, 2),
            ('/', _) => (Op::Slash, 1),
            ('%', Some('=')) => (Op::PercentEq, 2),
            ('%', _) => (Op::Percent, 1),
            ('&', Some('=')) => (Op::AmpersandEq, 2),
            ('&', _) => (Op::Ampersand, 1),
            ('|', Some('=')) => (Op::PipeEq, 2),
            ('|', _) => (Op::Pipe, 1),
            ('^', Some('=')) => (Op::CaretEq, 2),
            ('^', _) => (Op::Caret, 1),
            ('~', _) => (Op::Tilde, 1),
            ('=', Some('*')) => (Op::EqStar, 2),
            ('=', _) => (Op::Eq, 1),
            ('<', Some('>')) => (Op::NotEq, 2),
            ('<', Some('=')) => (Op::LtEq, 2),
            ('<', _) => (Op::Lt, 1),
            ('>', Some('=')) => (Op::GtEq, 2),
            ('>', _) => (Op::Gt, 1),
            ('!', Some('=')) => (Op::BangEq, 2),
            ('!', Some('<')) => (Op::NotLt, 2),
            ('!', Some('>')) => (Op::NotGt, 2),
            _ => {
                self.bump();
                return TokenKind::Error(LexErrorKind::UnexpectedCharacter);
            }
        };
        self.bump_ascii(len);
        TokenKind::Operator(op)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.finished {
            return None;
        }
        let trivia_start = self.pos;
        self.skip_whitespace();
        let leading_trivia = &self.src[trivia_start..self.pos];

        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let kind = if self.halted {
            self.skip_to_end();
            TokenKind::Eof
        } else {
            self.scan()
        };

        match kind {
            TokenKind::Eof => self.finished = true,
            TokenKind::Error(err) if err.is_terminal() => {
                self.skip_to_end();
                self.halted = true;
            }
            _ => {}
        }
        self.at_line_start = false;

        Some(Token {
            kind,
            text: &self.src[start..self.pos],
            span: SourceSpan::new(start, self.pos, line, column),
            leading_trivia,
        })
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '#'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '$')
}

/// Lex the whole input into a vector (EOF included).
pub fn tokenize(src: &str, settings: LexerSettings) -> Vec<Token<'_>> {
    Lexer::with_settings(src, settings).collect()
}
