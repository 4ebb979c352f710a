//! Source buffers and spans
//!
//! A [`SourceBuffer`] owns the fully decoded text of one input unit (a file or
//! an in-memory string). Every token and AST node points back into it through
//! a [`SourceSpan`].

use std::fmt;
use std::path::{Path, PathBuf};

use encoding_rs::{UTF_16BE, UTF_16LE, WINDOWS_1252};
use serde::Serialize;

/// A byte range into a [`SourceBuffer`] plus the 1-based line/column of its start.
///
/// Columns count Unicode code points, not bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SourceSpan {
    /// Byte offset of the first character (inclusive).
    pub start: usize,
    /// Byte offset one past the last character (exclusive).
    pub end: usize,
    /// 1-based line of `start`.
    pub line: u32,
    /// 1-based column of `start`.
    pub column: u32,
}

impl SourceSpan {
    pub const fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// A zero-width span at the start of `self`.
    pub const fn empty_at_start(self) -> Self {
        Self {
            start: self.start,
            end: self.start,
            line: self.line,
            column: self.column,
        }
    }

    /// A zero-width span at the end of `self`. Line/column stay those of `self`.
    pub const fn empty_at_end(self) -> Self {
        Self {
            start: self.end,
            end: self.end,
            line: self.line,
            column: self.column,
        }
    }

    /// Span running from the start of `self` to the end of `other`.
    pub fn to(self, other: SourceSpan) -> Self {
        if other.end <= self.start {
            return self;
        }
        Self {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely within `self`.
    pub fn contains(&self, other: &SourceSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Debug for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}@{}:{}",
            self.start, self.end, self.line, self.column
        )
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Fully materialized source text with a line index.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    path: Option<PathBuf>,
    text: String,
    line_starts: Vec<usize>,
}

impl SourceBuffer {
    /// Create a buffer from already-decoded text. A leading BOM is dropped.
    pub fn new(text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.starts_with('\u{FEFF}') {
            text.drain(..'\u{FEFF}'.len_utf8());
        }
        let line_starts = compute_line_starts(&text);
        Self {
            path: None,
            text,
            line_starts,
        }
    }

    /// Decode raw bytes: UTF-16 when a UTF-16 BOM is present, UTF-8 otherwise,
    /// falling back to Windows-1252 for bytes that are not valid UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(decode_bytes(bytes))
    }

    /// Attach the path the text was loaded from (used in diagnostics output).
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The source text covered by `span`, or `""` if the span is out of range.
    pub fn slice(&self, span: SourceSpan) -> &str {
        self.text.get(span.start..span.end).unwrap_or("")
    }

    /// 1-based (line, column) of a byte offset. Columns count code points.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.text.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        let column = self
            .text
            .get(line_start..offset)
            .map_or(0, |s| s.chars().count());
        (line_idx as u32 + 1, column as u32 + 1)
    }

    /// Build a span for a byte range, computing its line/column.
    pub fn span(&self, start: usize, end: usize) -> SourceSpan {
        let (line, column) = self.line_col(start);
        SourceSpan::new(start, end, line, column)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::with_capacity(text.len() / 40 + 1);
    starts.push(0);
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => starts.push(i + 1),
            b'\r' if bytes.get(i + 1) != Some(&b'\n') => starts.push(i + 1),
            _ => {}
        }
        i += 1;
    }
    starts
}

fn decode_bytes(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let (decoded, _) = UTF_16LE.decode_without_bom_handling(rest);
        return decoded.into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let (decoded, _) = UTF_16BE.decode_without_bom_handling(rest);
        return decoded.into_owned();
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // SQL files saved on Windows without a BOM are frequently code page 1252
        Err(_) => {
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}
