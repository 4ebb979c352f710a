//! Parse configuration

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How deprecated or ambiguous legacy forms are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialectStrictness {
    /// Legacy forms (`*=` joins, `COMPUTE BY`, numbered procedures, old
    /// `RAISERROR` syntax) parse silently into their legacy AST shapes.
    #[default]
    Lenient,
    /// Legacy forms still parse, but every occurrence is reported as an error.
    Strict,
}

/// What to do with a `GO n` repeat count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatCountPolicy {
    /// Keep the count as batch metadata.
    #[default]
    Preserve,
    /// Keep the count but report it as an error.
    Reject,
}

/// Cooperative cancellation flag, checked at statement boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options consumed by the lexer and parser.
///
/// Each parse invocation clones these into its own session state; in-source
/// `SET QUOTED_IDENTIFIER` statements change the session copy only.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Initial QUOTED_IDENTIFIER setting. When on, `"x"` is an identifier;
    /// when off, it is a string literal.
    pub quoted_identifier: bool,
    /// Maximum nesting depth for `/* */` comments. `None` means unbounded.
    pub max_nested_comment_depth: Option<u32>,
    pub dialect_strictness: DialectStrictness,
    pub repeat_count: RepeatCountPolicy,
    pub cancellation: Option<CancellationFlag>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            quoted_identifier: true,
            max_nested_comment_depth: None,
            dialect_strictness: DialectStrictness::Lenient,
            repeat_count: RepeatCountPolicy::Preserve,
            cancellation: None,
        }
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            dialect_strictness: DialectStrictness::Strict,
            ..Self::default()
        }
    }

    pub fn with_quoted_identifier(mut self, on: bool) -> Self {
        self.quoted_identifier = on;
        self
    }

    pub fn with_max_nested_comment_depth(mut self, depth: Option<u32>) -> Self {
        self.max_nested_comment_depth = depth;
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
    }
}
