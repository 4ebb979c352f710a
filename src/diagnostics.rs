//! Diagnostics produced by the lexer and parser
//!
//! Diagnostics are plain values collected during a parse. None of them abort
//! parsing; callers decide what to do with them (the CLI fails on any
//! [`Severity::Error`]).

use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

use crate::source::SourceSpan;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Which stage produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// Malformed token (unterminated string or comment, bad character).
    Lexical,
    /// Unexpected token or missing clause.
    Syntax,
    /// Recognized syntax that is deliberately kept opaque.
    UnsupportedConstruct,
    /// Parsing was stopped through a [`crate::CancellationFlag`].
    Cancelled,
}

/// A single lexical or syntax problem attached to a source span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: SourceSpan,
}

impl Diagnostic {
    pub fn lexical(message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Error,
            kind: DiagnosticKind::Lexical,
            message: message.into(),
            span,
        }
    }

    pub fn syntax(message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Error,
            kind: DiagnosticKind::Syntax,
            message: message.into(),
            span,
        }
    }

    pub fn unsupported(message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Warning,
            kind: DiagnosticKind::UnsupportedConstruct,
            message: message.into(),
            span,
        }
    }

    pub fn cancelled(span: SourceSpan) -> Self {
        Self {
            severity: Severity::Error,
            kind: DiagnosticKind::Cancelled,
            message: "parse cancelled".to_string(),
            span,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.span, self.severity, self.message)
    }
}

/// Whether any diagnostic in the slice is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Append-only, index-keyed collection shared by parallel parse workers.
///
/// Each slot is written at most once (by the worker owning that index), so
/// no lock is needed and draining yields diagnostics in index order no
/// matter which worker finished first.
#[derive(Debug)]
pub struct DiagnosticSink {
    slots: Vec<OnceLock<Vec<Diagnostic>>>,
}

impl DiagnosticSink {
    pub fn with_slots(count: usize) -> Self {
        Self {
            slots: (0..count).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Publish the diagnostics for `index`. Returns `false` if the index is out
    /// of range or the slot was already filled.
    pub fn publish(&self, index: usize, diagnostics: Vec<Diagnostic>) -> bool {
        match self.slots.get(index) {
            Some(slot) => slot.set(diagnostics).is_ok(),
            None => false,
        }
    }

    /// Diagnostics per index, in index order. Unfilled slots yield empty vectors.
    pub fn into_ordered(self) -> Vec<Vec<Diagnostic>> {
        self.slots
            .into_iter()
            .map(|slot| slot.into_inner().unwrap_or_default())
            .collect()
    }
}
