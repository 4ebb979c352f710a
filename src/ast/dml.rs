//! INSERT, UPDATE, DELETE and MERGE

use super::common::{Ident, ObjectName};
use super::expr::Expr;
use super::hints::QueryHint;
use super::query::{AssignmentOp, Query, SelectItem, TableSource, Top, WithClause};
use super::statement::ExecuteStatement;
use crate::source::SourceSpan;

/// `OUTPUT items [INTO target [(columns)]]`
#[derive(Debug, Clone, PartialEq)]
pub struct OutputClause {
    pub items: Vec<SelectItem>,
    pub into: Option<OutputInto>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputInto {
    pub target: TableSource,
    pub columns: Vec<Ident>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Values(Vec<Vec<Expr>>),
    DefaultValues,
    Query(Box<Query>),
    /// `INSERT ... EXEC proc`
    Execute(Box<ExecuteStatement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub with: Option<WithClause>,
    pub top: Option<Top>,
    /// Target table, variable or rowset function, with its hints
    pub target: TableSource,
    pub columns: Vec<Ident>,
    pub output: Vec<OutputClause>,
    pub source: InsertSource,
    pub hints: Vec<QueryHint>,
    pub span: SourceSpan,
}

/// `target op value` in an UPDATE or MERGE SET list.
///
/// `SET col.WRITE(expr, offset, length)` has no operator; it is recorded as
/// an [`AssignmentOp::Assign`] of the method call to `col`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Column or variable
    pub target: Expr,
    pub op: AssignmentOp,
    pub value: Expr,
    pub span: SourceSpan,
}

/// `WHERE CURRENT OF [GLOBAL] cursor`
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentOf {
    pub global: bool,
    pub cursor: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub with: Option<WithClause>,
    pub top: Option<Top>,
    pub target: TableSource,
    pub assignments: Vec<Assignment>,
    pub output: Vec<OutputClause>,
    /// Multi-table `UPDATE t SET ... FROM t JOIN ...`
    pub from: Vec<TableSource>,
    pub selection: Option<Expr>,
    pub current_of: Option<CurrentOf>,
    pub hints: Vec<QueryHint>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub with: Option<WithClause>,
    pub top: Option<Top>,
    pub target: TableSource,
    pub output: Vec<OutputClause>,
    pub from: Vec<TableSource>,
    pub selection: Option<Expr>,
    pub current_of: Option<CurrentOf>,
    pub hints: Vec<QueryHint>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMatch {
    Matched,
    /// `NOT MATCHED [BY TARGET]`
    NotMatchedByTarget,
    NotMatchedBySource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeAction {
    Update(Vec<Assignment>),
    Delete,
    Insert {
        columns: Vec<Ident>,
        /// `None` for `DEFAULT VALUES`
        values: Option<Vec<Expr>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeClause {
    pub kind: MergeMatch,
    pub condition: Option<Expr>,
    pub action: MergeAction,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeStatement {
    pub with: Option<WithClause>,
    pub top: Option<Top>,
    pub target: TableSource,
    pub source: TableSource,
    pub on: Expr,
    pub clauses: Vec<MergeClause>,
    pub output: Vec<OutputClause>,
    pub hints: Vec<QueryHint>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TruncateStatement {
    pub table: ObjectName,
    /// `WITH (PARTITIONS (...))` text
    pub partitions: Option<String>,
    pub span: SourceSpan,
}
