//! SELECT queries and table sources

use super::common::{Ident, ObjectName, RawOption};
use super::expr::{Expr, FunctionCall, OrderByItem};
use super::hints::{JoinHint, QueryHint, TableHint};
use crate::source::SourceSpan;

/// A complete query: optional CTEs, a query expression and its tail clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub with: Option<WithClause>,
    pub body: QueryExpr,
    pub order_by: Vec<OrderByItem>,
    pub offset_fetch: Option<OffsetFetch>,
    /// Legacy `COMPUTE ... [BY ...]` clauses after ORDER BY.
    pub compute: Vec<ComputeClause>,
    pub for_clause: Option<ForClause>,
    /// `OPTION (...)`
    pub hints: Vec<QueryHint>,
    pub span: SourceSpan,
}

impl Query {
    /// The leftmost SELECT block, looking through set operations and parentheses.
    pub fn first_select(&self) -> Option<&SelectSpec> {
        match self.body.leftmost() {
            QueryExpr::Select(select) => Some(select),
            QueryExpr::Parenthesized(query) => query.first_select(),
            QueryExpr::SetOperation { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithClause {
    pub ctes: Vec<Cte>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub name: Ident,
    pub columns: Vec<Ident>,
    pub query: Box<Query>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Except,
    Intersect,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpr {
    Select(Box<SelectSpec>),
    SetOperation {
        op: SetOperator,
        all: bool,
        left: Box<QueryExpr>,
        right: Box<QueryExpr>,
        span: SourceSpan,
    },
    /// `(query)` used as a set operand
    Parenthesized(Box<Query>),
}

impl QueryExpr {
    pub fn span(&self) -> SourceSpan {
        match self {
            QueryExpr::Select(select) => select.span,
            QueryExpr::SetOperation { span, .. } => *span,
            QueryExpr::Parenthesized(query) => query.span,
        }
    }

    /// The leftmost operand of a set operation chain.
    pub fn leftmost(&self) -> &QueryExpr {
        let mut expr = self;
        while let QueryExpr::SetOperation { left, .. } = expr {
            expr = left;
        }
        expr
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Top {
    pub quantity: Expr,
    pub percent: bool,
    pub with_ties: bool,
    /// `TOP (n)` rather than legacy `TOP n`
    pub parenthesized: bool,
    pub span: SourceSpan,
}

/// One `SELECT ... FROM ... WHERE ...` block.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectSpec {
    pub distinct: bool,
    pub top: Option<Top>,
    pub items: Vec<SelectItem>,
    /// `INTO new_table`
    pub into: Option<ObjectName>,
    /// Comma-separated sources (old-style joins); each may hold ANSI joins.
    pub from: Vec<TableSource>,
    pub selection: Option<Expr>,
    pub group_by: Option<GroupBy>,
    pub having: Option<Expr>,
    pub span: SourceSpan,
}

/// Assignment operator used by `SET`, `UPDATE ... SET` and `SELECT @v = ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOp {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitAnd,
    BitXor,
    BitOr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `expr [[AS] alias]` or `alias = expr`
    Expr {
        expr: Expr,
        alias: Option<Ident>,
        span: SourceSpan,
    },
    /// `@var = expr`
    Assignment {
        variable: String,
        op: AssignmentOp,
        expr: Expr,
        span: SourceSpan,
    },
}

impl SelectItem {
    pub fn span(&self) -> SourceSpan {
        match self {
            SelectItem::Expr { span, .. } | SelectItem::Assignment { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupingElement {
    Expr(Expr),
    Rollup(Vec<Expr>),
    Cube(Vec<Expr>),
    GroupingSets(Vec<Vec<Expr>>),
    /// `()`
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupByModifier {
    /// `WITH ROLLUP`
    Rollup,
    /// `WITH CUBE`
    Cube,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    /// `GROUP BY ALL`
    pub all: bool,
    pub items: Vec<GroupingElement>,
    pub modifier: Option<GroupByModifier>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputeClause {
    pub functions: Vec<Expr>,
    pub by: Vec<Expr>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OffsetFetch {
    pub offset: Expr,
    pub fetch: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlMode {
    Raw,
    Auto,
    Explicit,
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonMode {
    Auto,
    Path,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForClause {
    Browse,
    Xml {
        mode: XmlMode,
        /// `RAW('row')` / `PATH('item')`
        element_name: Option<String>,
        directives: Vec<RawOption>,
    },
    Json {
        mode: JsonMode,
        directives: Vec<RawOption>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
    CrossApply,
    OuterApply,
}

impl JoinKind {
    /// Whether the join takes an `ON` condition.
    pub fn has_condition(self) -> bool {
        matches!(
            self,
            JoinKind::Inner | JoinKind::LeftOuter | JoinKind::RightOuter | JoinKind::FullOuter
        )
    }
}

/// Alias with optional column list: `AS t (a, b)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAlias {
    pub name: Ident,
    pub columns: Vec<Ident>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Named {
        name: ObjectName,
        alias: Option<TableAlias>,
        hints: Vec<TableHint>,
        /// Hints written as `t (NOLOCK)` without `WITH`
        legacy_hints: bool,
        /// `TABLESAMPLE ...` clause text
        tablesample: Option<String>,
        /// `FOR SYSTEM_TIME ...` clause text
        temporal: Option<String>,
        span: SourceSpan,
    },
    Derived {
        subquery: Box<Query>,
        alias: Option<TableAlias>,
        span: SourceSpan,
    },
    /// `(VALUES (...), (...)) AS t (cols)`
    Values {
        rows: Vec<Vec<Expr>>,
        alias: Option<TableAlias>,
        span: SourceSpan,
    },
    /// Table-valued function, rowset function (`OPENROWSET`, `OPENJSON`) or
    /// method call (`@xml.nodes(...)`)
    Function {
        call: Expr,
        /// `WITH (...)` column schema of OPENJSON / OPENXML, as text
        with_schema: Option<String>,
        alias: Option<TableAlias>,
        span: SourceSpan,
    },
    Variable {
        name: String,
        alias: Option<TableAlias>,
        span: SourceSpan,
    },
    Join {
        left: Box<TableSource>,
        right: Box<TableSource>,
        kind: JoinKind,
        hint: Option<JoinHint>,
        on: Option<Expr>,
        span: SourceSpan,
    },
    Pivot {
        source: Box<TableSource>,
        aggregate: FunctionCall,
        pivot_column: Expr,
        values: Vec<Ident>,
        alias: Option<TableAlias>,
        span: SourceSpan,
    },
    Unpivot {
        source: Box<TableSource>,
        value_column: Ident,
        pivot_column: Ident,
        columns: Vec<Ident>,
        alias: Option<TableAlias>,
        span: SourceSpan,
    },
    /// Parenthesized join tree
    Nested {
        source: Box<TableSource>,
        span: SourceSpan,
    },
}

impl TableSource {
    pub fn span(&self) -> SourceSpan {
        match self {
            TableSource::Named { span, .. }
            | TableSource::Derived { span, .. }
            | TableSource::Values { span, .. }
            | TableSource::Function { span, .. }
            | TableSource::Variable { span, .. }
            | TableSource::Join { span, .. }
            | TableSource::Pivot { span, .. }
            | TableSource::Unpivot { span, .. }
            | TableSource::Nested { span, .. } => *span,
        }
    }
}
