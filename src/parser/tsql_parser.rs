//! T-SQL parse driver
//!
//! Wires the pipeline together: a lazy [`Lexer`] feeds the [`BatchSplitter`],
//! each batch is parsed by its own [`TokenParser`], and `SET QUOTED_IDENTIFIER`
//! statements found in a finished batch are fed back into the lexer before the
//! next batch is scanned.

use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;
use tracing::{debug, debug_span, trace};

use super::batch::{BatchSplitter, RawBatch};
use super::lexer::{Lexer, LexerSettings};
use super::sqlcmd::expand_includes;
use super::token::TokenKind;
use super::token_parser_base::{grow_stack, TokenParser};
use crate::ast::{Batch, Statement, StatementKind};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::TsqlError;
use crate::options::{ParseOptions, RepeatCountPolicy};
use crate::source::SourceBuffer;

/// Below this many files, parsing stays on the calling thread.
const PARALLEL_THRESHOLD: usize = 8;

/// Batches and diagnostics of one parse, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutput {
    pub batches: Vec<Batch>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        crate::diagnostics::has_errors(&self.diagnostics)
    }

    /// All statements across batches.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.batches.iter().flat_map(|b| b.statements.iter())
    }
}

impl From<ParseOutput> for (Vec<Batch>, Vec<Diagnostic>) {
    fn from(output: ParseOutput) -> Self {
        (output.batches, output.diagnostics)
    }
}

/// Settings that in-source statements may change while a script is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub quoted_identifier: bool,
}

impl From<&ParseOptions> for SessionSettings {
    fn from(options: &ParseOptions) -> Self {
        Self {
            quoted_identifier: options.quoted_identifier,
        }
    }
}

/// Parse a whole script.
pub fn parse_source(source: &SourceBuffer, options: &ParseOptions) -> ParseOutput {
    let text = source.text();
    let mut session = SessionSettings::from(options);
    let lexer = Lexer::with_settings(
        text,
        LexerSettings {
            quoted_identifier: session.quoted_identifier,
            max_nested_comment_depth: options.max_nested_comment_depth,
        },
    );
    let mut splitter = BatchSplitter::new(lexer);
    let mut output = ParseOutput::default();

    while let Some(raw) = splitter.next() {
        if options.is_cancelled() {
            output
                .diagnostics
                .push(Diagnostic::cancelled(raw.span().empty_at_start()));
            break;
        }

        let (batch, diagnostics, cancelled) = parse_batch(text, raw, options);
        debug!(
            batch = batch.index,
            statements = batch.statements.len(),
            diagnostics = diagnostics.len(),
            "parsed batch"
        );

        if let Some(on) = quoted_identifier_setting(&batch.statements) {
            if on != session.quoted_identifier {
                trace!(batch = batch.index, quoted_identifier = on, "QUOTED_IDENTIFIER changed");
                session.quoted_identifier = on;
                splitter.source_mut().set_quoted_identifier(on);
            }
        }

        output.batches.push(batch);
        output.diagnostics.extend(diagnostics);
        if cancelled {
            break;
        }
    }

    output
}

/// Parse one batch. Returns the batch, its diagnostics in source order and
/// whether parsing was cancelled inside it.
fn parse_batch<'a>(
    text: &'a str,
    raw: RawBatch<'a>,
    options: &ParseOptions,
) -> (Batch, Vec<Diagnostic>, bool) {
    let span = raw.span();
    let mut diagnostics: Vec<Diagnostic> = raw
        .tokens
        .iter()
        .filter_map(|token| match token.kind {
            TokenKind::Error(kind) => Some(Diagnostic::lexical(kind.to_string(), token.span)),
            _ => None,
        })
        .collect();

    if let (Some(kind), Some(separator)) = (raw.separator_error, raw.separator) {
        diagnostics.push(Diagnostic::lexical(kind.to_string(), separator.span));
    }
    if let Some(separator) = raw.separator {
        if let (Some(count), RepeatCountPolicy::Reject) = (separator.repeat_count, options.repeat_count) {
            diagnostics.push(Diagnostic::syntax(
                format!("GO repeat count {count} is not allowed"),
                separator.span,
            ));
        }
    }

    let mut parser = TokenParser::new(text, raw.tokens, raw.end)
        .with_strictness(options.dialect_strictness)
        .with_cancellation(options.cancellation.clone());
    let statements = parser.parse_statements();
    let cancelled = parser.was_cancelled();
    diagnostics.extend(parser.into_diagnostics());
    diagnostics.sort_by_key(|d| d.span.start);

    let batch = Batch {
        index: raw.index,
        statements,
        span,
        separator: raw.separator,
    };
    (batch, diagnostics, cancelled)
}

/// The last QUOTED_IDENTIFIER setting made anywhere in `statements`,
/// including inside blocks and IF/WHILE bodies.
fn quoted_identifier_setting(statements: &[Statement]) -> Option<bool> {
    statements.iter().fold(None, |current, statement| {
        statement_quoted_identifier(statement).or(current)
    })
}

fn statement_quoted_identifier(statement: &Statement) -> Option<bool> {
    grow_stack(|| match &statement.kind {
        StatementKind::SetOption(set) => set.quoted_identifier(),
        StatementKind::Block(body) => quoted_identifier_setting(body),
        StatementKind::TryCatch {
            try_block,
            catch_block,
        } => quoted_identifier_setting(catch_block).or(quoted_identifier_setting(try_block)),
        StatementKind::If {
            then_branch,
            else_branch,
            ..
        } => else_branch
            .as_deref()
            .and_then(statement_quoted_identifier)
            .or_else(|| statement_quoted_identifier(then_branch)),
        StatementKind::While { body, .. } => statement_quoted_identifier(body),
        _ => None,
    })
}

// ============================================================================
// Files
// ============================================================================

/// A parsed file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub source: SourceBuffer,
    pub output: ParseOutput,
}

/// How files are loaded before parsing.
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    pub parse: ParseOptions,
    /// Expand SQLCMD `:r` includes and `$(var)` references first.
    pub sqlcmd: bool,
}

impl From<ParseOptions> for FileOptions {
    fn from(parse: ParseOptions) -> Self {
        Self { parse, sqlcmd: false }
    }
}

/// Parse a single SQL file.
pub fn parse_sql_file(path: &Path, options: &FileOptions) -> Result<ParsedFile> {
    let _span = debug_span!("parse_file", path = %path.display()).entered();
    let bytes = std::fs::read(path).map_err(|e| TsqlError::SqlFileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut source = SourceBuffer::from_bytes(&bytes);
    if options.sqlcmd {
        source = SourceBuffer::new(expand_includes(source.text(), path)?);
    }
    let source = source.with_path(path);
    let output = parse_source(&source, &options.parse);
    debug!(
        batches = output.batches.len(),
        diagnostics = output.diagnostics.len(),
        "parsed file"
    );
    Ok(ParsedFile {
        path: path.to_path_buf(),
        source,
        output,
    })
}

/// Parse multiple SQL files, in parallel for larger sets.
///
/// Results come back in the order of `files` regardless of which worker
/// finished first. The first file that cannot be read fails the call.
pub fn parse_sql_files(files: &[PathBuf], options: &FileOptions) -> Result<Vec<ParsedFile>> {
    let sink = DiagnosticSink::with_slots(files.len());
    let parse_one = |(index, file): (usize, &PathBuf)| -> Result<ParsedFile> {
        let mut parsed = parse_sql_file(file, options)?;
        sink.publish(index, std::mem::take(&mut parsed.output.diagnostics));
        Ok(parsed)
    };

    let results: Vec<Result<ParsedFile>> = if files.len() >= PARALLEL_THRESHOLD {
        files.par_iter().enumerate().map(parse_one).collect()
    } else {
        // Sequential processing for small sets (avoids rayon overhead)
        files.iter().enumerate().map(parse_one).collect()
    };

    let mut parsed = results.into_iter().collect::<Result<Vec<_>>>()?;
    for (file, diagnostics) in parsed.iter_mut().zip(sink.into_ordered()) {
        file.output.diagnostics = diagnostics;
    }
    Ok(parsed)
}
