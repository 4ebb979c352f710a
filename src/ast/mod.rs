//! Abstract syntax tree
//!
//! Every node owns its children exclusively and carries the [`SourceSpan`]
//! it was parsed from. Nodes are plain data; consumers read them and build
//! new trees rather than mutating in place.

mod common;
mod ddl;
mod dml;
mod expr;
mod hints;
mod query;
mod statement;

pub use common::*;
pub use ddl::*;
pub use dml::*;
pub use expr::*;
pub use hints::*;
pub use query::*;
pub use statement::*;

use crate::source::SourceSpan;

/// A `GO` line closing a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSeparator {
    pub span: SourceSpan,
    /// `GO 5`. Repetition is left to whoever executes the batch.
    pub repeat_count: Option<u32>,
}

/// The statements between two `GO` separators.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub index: usize,
    pub statements: Vec<Statement>,
    pub span: SourceSpan,
    pub separator: Option<BatchSeparator>,
}

impl Batch {
    /// Whether the batch contains no statements other than empty ones.
    pub fn is_empty(&self) -> bool {
        self.statements
            .iter()
            .all(|s| matches!(s.kind, StatementKind::Empty))
    }
}
