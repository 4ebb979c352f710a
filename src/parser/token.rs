//! Token types produced by the lexer

use std::fmt;

use serde::Serialize;

use super::keywords::Keyword;
use crate::source::SourceSpan;

/// Delimiter used by a quoted identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QuoteStyle {
    /// `[name]`
    Bracket,
    /// `"name"` (only with QUOTED_IDENTIFIER ON)
    DoubleQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StringKind {
    /// `'text'`, or `"text"` with QUOTED_IDENTIFIER OFF
    Ansi,
    /// `N'text'`
    Unicode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NumberKind {
    Integer,
    Decimal,
    /// Scientific notation (`1.5E10`)
    Float,
    /// `$12.50`
    Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommentKind {
    /// `-- ...` up to end of line
    Line,
    /// `/* ... */`, possibly nested
    Block,
}

/// Punctuation and operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Op {
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,
    Colon,
    DoubleColon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    Eq,
    /// `<>`
    NotEq,
    /// `!=`
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `!<`
    NotLt,
    /// `!>`
    NotGt,
    PlusEq,
    MinusEq,
    /// `*=`: compound multiply, or the legacy left outer join operator
    StarEq,
    SlashEq,
    PercentEq,
    AmpersandEq,
    CaretEq,
    PipeEq,
    /// `=*`: legacy right outer join operator
    EqStar,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Op::LParen => "(",
            Op::RParen => ")",
            Op::LBrace => "{",
            Op::RBrace => "}",
            Op::Comma => ",",
            Op::Dot => ".",
            Op::Semicolon => ";",
            Op::Colon => ":",
            Op::DoubleColon => "::",
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Star => "*",
            Op::Slash => "/",
            Op::Percent => "%",
            Op::Ampersand => "&",
            Op::Pipe => "|",
            Op::Caret => "^",
            Op::Tilde => "~",
            Op::Eq => "=",
            Op::NotEq => "<>",
            Op::BangEq => "!=",
            Op::Lt => "<",
            Op::LtEq => "<=",
            Op::Gt => ">",
            Op::GtEq => ">=",
            Op::NotLt => "!<",
            Op::NotGt => "!>",
            Op::PlusEq => "+=",
            Op::MinusEq => "-=",
            Op::StarEq => "*=",
            Op::SlashEq => "/=",
            Op::PercentEq => "%=",
            Op::AmpersandEq => "&=",
            Op::CaretEq => "^=",
            Op::PipeEq => "|=",
            Op::EqStar => "=*",
        }
    }
}

/// Why the lexer produced an [`TokenKind::Error`] token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LexErrorKind {
    UnterminatedString,
    UnterminatedQuotedIdentifier,
    UnterminatedBracketIdentifier,
    UnterminatedComment,
    CommentTooDeep { limit: u32 },
    UnexpectedCharacter,
    InvalidRepeatCount,
}

impl LexErrorKind {
    /// Whether lexing stops after this error (the token runs to end of input).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LexErrorKind::UnterminatedString
                | LexErrorKind::UnterminatedQuotedIdentifier
                | LexErrorKind::UnterminatedBracketIdentifier
                | LexErrorKind::UnterminatedComment
        )
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexErrorKind::UnterminatedString => f.write_str("unterminated string literal"),
            LexErrorKind::UnterminatedQuotedIdentifier => {
                f.write_str("unterminated quoted identifier")
            }
            LexErrorKind::UnterminatedBracketIdentifier => {
                f.write_str("unterminated bracketed identifier")
            }
            LexErrorKind::UnterminatedComment => f.write_str("unterminated block comment"),
            LexErrorKind::CommentTooDeep { limit } => {
                write!(f, "block comment nesting exceeds maximum depth of {limit}")
            }
            LexErrorKind::UnexpectedCharacter => f.write_str("unexpected character"),
            LexErrorKind::InvalidRepeatCount => {
                write!(f, "GO repeat count must be between 1 and {}", u32::MAX)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Identifier,
    QuotedIdentifier(QuoteStyle),
    /// `@name` or `@@name`
    Variable,
    StringLiteral(StringKind),
    Number(NumberKind),
    /// `0x...`
    BinaryLiteral,
    Keyword(Keyword),
    Operator(Op),
    Comment(CommentKind),
    /// A SQLCMD line such as `:setvar` or `:on error exit`
    SqlcmdDirective,
    /// `GO [count]` at the start of a line
    BatchSeparator {
        repeat_count: Option<u32>,
        /// A count was written but is zero or does not fit in a `u32`.
        invalid_count: bool,
    },
    Error(LexErrorKind),
    Eof,
}

/// A lexeme plus the whitespace that precedes it.
///
/// Concatenating `leading_trivia` and `text` over every token up to and
/// including EOF reproduces the input exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw source text, original case and delimiters preserved.
    pub text: &'a str,
    pub span: SourceSpan,
    pub leading_trivia: &'a str,
}

impl<'a> Token<'a> {
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Comments and SQLCMD directive lines carry no grammar.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Comment(_) | TokenKind::SqlcmdDirective
        )
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    pub fn op(&self) -> Option<Op> {
        match self.kind {
            TokenKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// Decoded identifier text: delimiters removed and doubled closing
    /// delimiters collapsed. Keywords yield their source spelling.
    pub fn identifier_value(&self) -> String {
        match self.kind {
            TokenKind::QuotedIdentifier(QuoteStyle::Bracket) => unescape_delimited(self.text, ']'),
            TokenKind::QuotedIdentifier(QuoteStyle::DoubleQuote) => {
                unescape_delimited(self.text, '"')
            }
            _ => self.text.to_string(),
        }
    }

    /// Decoded string literal value, `N` prefix and quotes removed.
    pub fn string_value(&self) -> String {
        let body = match self.kind {
            TokenKind::StringLiteral(StringKind::Unicode) => &self.text[1..],
            _ => self.text,
        };
        let quote = if body.starts_with('"') { '"' } else { '\'' };
        unescape_delimited(body, quote)
    }
}

/// Strip the first and last character of `text` and collapse doubled `close`.
fn unescape_delimited(text: &str, close: char) -> String {
    let mut chars = text.chars();
    chars.next();
    let inner = chars.as_str();
    let inner = inner.strip_suffix(close).unwrap_or(inner);
    let doubled: String = [close, close].iter().collect();
    inner.replace(&doubled, &close.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, text: &str) -> Token<'_> {
        Token {
            kind,
            text,
            span: SourceSpan::default(),
            leading_trivia: "",
        }
    }

    #[test]
    fn test_bracket_identifier_value() {
        let t = token(
            TokenKind::QuotedIdentifier(QuoteStyle::Bracket),
            "[Column]]Escaped]",
        );
        assert_eq!(t.identifier_value(), "Column]Escaped");
    }

    #[test]
    fn test_string_value_unescapes_quotes() {
        let t = token(TokenKind::StringLiteral(StringKind::Unicode), "N'it''s'");
        assert_eq!(t.string_value(), "it's");
        let t = token(TokenKind::StringLiteral(StringKind::Ansi), "\"say \"\"hi\"\"\"");
        assert_eq!(t.string_value(), "say \"hi\"");
    }
}
