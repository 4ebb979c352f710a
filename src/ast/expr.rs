//! Expression nodes

use super::common::{DataType, Ident, ObjectName, SortDirection};
use super::query::Query;
use crate::source::SourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: SourceSpan,
}

impl Expr {
    pub fn new(kind: ExprKind, span: SourceSpan) -> Self {
        Self { kind, span }
    }

    /// Strip any number of redundant parentheses.
    pub fn unnested(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Nested(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(String),
    Decimal(String),
    Float(String),
    Money(String),
    String { value: String, unicode: bool },
    /// Hex digits after `0x`, as written.
    Binary(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Multiply,
    Divide,
    Modulo,
    Add,
    Subtract,
    BitAnd,
    BitXor,
    BitOr,
    Eq,
    /// `<>` or `!=`
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    NotLt,
    NotGt,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
                | BinaryOp::NotLt
                | BinaryOp::NotGt
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Any,
    Some,
}

/// Side of a legacy `*=` / `=*` outer join predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OuterJoinSide {
    /// `*=`
    Left,
    /// `=*`
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: ObjectName,
    pub args: Vec<Expr>,
    pub distinct: bool,
    /// Called without parentheses (`CURRENT_TIMESTAMP`, `SESSION_USER`).
    pub niladic: bool,
    /// `WITHIN GROUP (ORDER BY ...)`
    pub within_group: Vec<OrderByItem>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    pub direction: Option<SortDirection>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFrameUnits {
    Rows,
    Range,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowFrameBound {
    UnboundedPreceding,
    Preceding(Box<Expr>),
    CurrentRow,
    Following(Box<Expr>),
    UnboundedFollowing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    pub units: WindowFrameUnits,
    pub start: WindowFrameBound,
    /// Present for `BETWEEN start AND end`.
    pub end: Option<WindowFrameBound>,
}

/// Contents of an `OVER (...)` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub frame: Option<WindowFrame>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhenClause {
    pub condition: Expr,
    pub result: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// `@name` or `@@name`
    Variable(String),
    /// Column or other bare name reference (`t.col`, `$action`)
    Column(ObjectName),
    /// `*` or `alias.*`
    Wildcard { qualifier: Option<ObjectName> },
    /// `DEFAULT` in a VALUES row or procedure argument
    Default,
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Function(FunctionCall),
    /// Aggregate, ranking or analytic function with `OVER (...)`
    Window {
        function: FunctionCall,
        over: WindowSpec,
    },
    Case {
        operand: Option<Box<Expr>>,
        when_clauses: Vec<WhenClause>,
        else_result: Option<Box<Expr>>,
    },
    Subquery(Box<Query>),
    Exists(Box<Query>),
    /// `expr BETWEEN low AND high`. `NOT BETWEEN` is represented as
    /// [`UnaryOp::Not`] around this node.
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
    },
    InSubquery {
        expr: Box<Expr>,
        subquery: Box<Query>,
    },
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        escape: Option<Box<Expr>>,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    /// `left op ALL|ANY|SOME (subquery)`
    Quantified {
        left: Box<Expr>,
        op: BinaryOp,
        quantifier: Quantifier,
        subquery: Box<Query>,
    },
    /// `CAST(expr AS type)` / `TRY_CAST(...)`
    Cast {
        expr: Box<Expr>,
        data_type: DataType,
        is_try: bool,
    },
    /// `CONVERT(type, expr [, style])` / `TRY_CONVERT(...)`
    Convert {
        data_type: DataType,
        expr: Box<Expr>,
        style: Option<Box<Expr>>,
        is_try: bool,
    },
    /// `PARSE(expr AS type [USING culture])` / `TRY_PARSE(...)`
    Parse {
        expr: Box<Expr>,
        data_type: DataType,
        culture: Option<Box<Expr>>,
        is_try: bool,
    },
    Collate {
        expr: Box<Expr>,
        collation: Ident,
    },
    /// `expr AT TIME ZONE zone`
    AtTimeZone {
        expr: Box<Expr>,
        zone: Box<Expr>,
    },
    /// Parenthesized expression
    Nested(Box<Expr>),
    /// `target.method(args)`, e.g. `@xml.value('(/a)[1]', 'int')`
    MethodCall {
        target: Box<Expr>,
        method: Ident,
        args: Vec<Expr>,
    },
    /// `target.property` on an expression that is not a plain name
    MemberAccess {
        target: Box<Expr>,
        member: Ident,
    },
    /// `type::method(args)`, e.g. `geography::Point(1, 2, 4326)`
    StaticMethodCall {
        type_name: ObjectName,
        method: Ident,
        args: Vec<Expr>,
    },
    NextValueFor {
        sequence: ObjectName,
        over: Option<WindowSpec>,
    },
    /// Legacy `a *= b` / `a =* b` outer join predicate
    LegacyOuterJoin {
        left: Box<Expr>,
        right: Box<Expr>,
        side: OuterJoinSide,
    },
    /// Recognized but uninterpreted syntax (ODBC `{fn ...}` escapes)
    Opaque(String),
}
