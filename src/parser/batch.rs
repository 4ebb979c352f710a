//! Batch splitting at `GO` separators
//!
//! [`BatchSplitter`] pulls tokens lazily from any token iterator and groups
//! them into [`RawBatch`]es. Because the lexer behind it is only advanced as
//! far as the current batch, the driver can change lexer settings between
//! batches through [`BatchSplitter::source_mut`].

use super::token::{LexErrorKind, Token, TokenKind};
use crate::ast::BatchSeparator;
use crate::source::SourceSpan;

/// Tokens of one batch, not yet parsed.
#[derive(Debug, Clone)]
pub struct RawBatch<'a> {
    pub index: usize,
    /// All tokens of the batch, comments and error tokens included. The
    /// separator and EOF tokens are not part of the batch.
    pub tokens: Vec<Token<'a>>,
    /// The `GO` that closed this batch, if any.
    pub separator: Option<BatchSeparator>,
    /// A lexical problem on the separator line itself.
    pub separator_error: Option<LexErrorKind>,
    /// End of the batch body (start of the separator, or end of input).
    pub end: SourceSpan,
}

impl<'a> RawBatch<'a> {
    /// Whether the batch holds anything besides comments.
    pub fn has_content(&self) -> bool {
        self.tokens.iter().any(|t| !t.is_trivia())
    }

    /// Span from the first to the last token; zero-width at `end` when empty.
    pub fn span(&self) -> SourceSpan {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => first.span.to(last.span),
            _ => self.end,
        }
    }
}

pub struct BatchSplitter<I> {
    source: I,
    index: usize,
    finished: bool,
}

impl<I> BatchSplitter<I> {
    pub fn new(source: I) -> Self {
        Self {
            source,
            index: 0,
            finished: false,
        }
    }

    /// The underlying token source, for adjusting lexer settings between batches.
    pub fn source_mut(&mut self) -> &mut I {
        &mut self.source
    }
}

impl<'a, I> Iterator for BatchSplitter<I>
where
    I: Iterator<Item = Token<'a>>,
{
    type Item = RawBatch<'a>;

    fn next(&mut self) -> Option<RawBatch<'a>> {
        if self.finished {
            return None;
        }
        let mut tokens = Vec::new();
        loop {
            let Some(token) = self.source.next() else {
                self.finished = true;
                return self.finish_trailing(tokens, SourceSpan::default());
            };
            match token.kind {
                TokenKind::BatchSeparator {
                    repeat_count,
                    invalid_count,
                } => {
                    let batch = RawBatch {
                        index: self.index,
                        tokens,
                        separator: Some(BatchSeparator {
                            span: token.span,
                            repeat_count,
                        }),
                        separator_error: invalid_count.then_some(LexErrorKind::InvalidRepeatCount),
                        end: token.span.empty_at_start(),
                    };
                    self.index += 1;
                    return Some(batch);
                }
                TokenKind::Eof => {
                    self.finished = true;
                    return self.finish_trailing(tokens, token.span);
                }
                _ => tokens.push(token),
            }
        }
    }
}

impl<I> BatchSplitter<I> {
    /// The segment after the last separator is a batch only if it holds
    /// something other than comments.
    fn finish_trailing<'a>(
        &mut self,
        tokens: Vec<Token<'a>>,
        eof: SourceSpan,
    ) -> Option<RawBatch<'a>> {
        let batch = RawBatch {
            index: self.index,
            tokens,
            separator: None,
            separator_error: None,
            end: eof.empty_at_start(),
        };
        if !batch.has_content() {
            return None;
        }
        self.index += 1;
        Some(batch)
    }
}
