//! Statement nodes

use super::common::{DataType, ExecuteAsPrincipal, Ident, NameOrVariable, ObjectName};
use super::ddl::{
    AlterIndexStatement, AlterSchemaStatement, AlterTableStatement, CreateIndexStatement,
    CreateSchemaStatement, CreateTableStatement, CreateTypeStatement, CredentialStatement,
    DropStatement, FunctionStatement, LoginStatement, PermissionStatement, ProcedureStatement,
    QueueStatement, RoleStatement, SequenceStatement, ServiceStatement, SynonymStatement,
    TableElements, TriggerStatement, UserStatement, ViewStatement,
};
use super::dml::{
    DeleteStatement, InsertStatement, MergeStatement, TruncateStatement, UpdateStatement,
};
use super::expr::Expr;
use super::query::{AssignmentOp, Query, SelectItem, Top};
use crate::source::SourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: SourceSpan,
}

impl Statement {
    pub fn new(kind: StatementKind, span: SourceSpan) -> Self {
        Self { kind, span }
    }
}

/// Deprecated syntax accepted under [`crate::DialectStrictness::Lenient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyConstruct {
    /// `*=` / `=*` outer join predicates
    OuterJoinOperator,
    /// `COMPUTE ... BY ...`
    ComputeBy,
    /// `CREATE PROCEDURE name;N`
    NumberedProcedure,
    /// `RAISERROR 50001 'message'`
    RaiserrorLegacySyntax,
}

impl LegacyConstruct {
    pub fn description(self) -> &'static str {
        match self {
            LegacyConstruct::OuterJoinOperator => "legacy outer join operator (*= or =*)",
            LegacyConstruct::ComputeBy => "COMPUTE clause",
            LegacyConstruct::NumberedProcedure => "numbered procedure",
            LegacyConstruct::RaiserrorLegacySyntax => "legacy RAISERROR syntax",
        }
    }
}

// ============================================================================
// Variables and session settings
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DeclareItem {
    Variable {
        name: String,
        data_type: DataType,
        value: Option<Expr>,
        span: SourceSpan,
    },
    Table {
        name: String,
        elements: TableElements,
        span: SourceSpan,
    },
    /// `DECLARE @c CURSOR`
    CursorVariable { name: String, span: SourceSpan },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CursorDefinition {
    /// `LOCAL`, `SCROLL`, `FAST_FORWARD`, `INSENSITIVE`, ... upper-cased
    pub options: Vec<String>,
    pub query: Box<Query>,
    /// `FOR UPDATE [OF cols]`; an empty list means all columns
    pub for_update: Option<Vec<Ident>>,
    /// `FOR READ ONLY`
    pub read_only: bool,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Expr(Expr),
    Cursor(CursorDefinition),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetVariableStatement {
    pub variable: String,
    /// `SET @udt.Property = ...`
    pub member: Option<Ident>,
    pub op: AssignmentOp,
    pub value: SetValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetOptionValue {
    On,
    Off,
    Value(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOptionStatement {
    /// Upper-cased option names (`ANSI_NULLS`, `STATISTICS IO`)
    pub options: Vec<String>,
    /// Table of `SET IDENTITY_INSERT t ON`
    pub target: Option<ObjectName>,
    pub value: SetOptionValue,
}

impl SetOptionStatement {
    /// The QUOTED_IDENTIFIER setting this statement implies, if any.
    /// `ANSI_DEFAULTS` implies QUOTED_IDENTIFIER.
    pub fn quoted_identifier(&self) -> Option<bool> {
        let affects = self
            .options
            .iter()
            .any(|o| o == "QUOTED_IDENTIFIER" || o == "ANSI_DEFAULTS");
        match (&self.value, affects) {
            (SetOptionValue::On, true) => Some(true),
            (SetOptionValue::Off, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Snapshot,
    Serializable,
}

// ============================================================================
// Control flow
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum WaitForKind {
    Delay(Expr),
    Time(Expr),
    /// `WAITFOR (RECEIVE ...) [, TIMEOUT n]`
    Receive {
        statement: Box<Statement>,
        timeout: Option<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RaiserrorStatement {
    pub message: Expr,
    pub severity: Option<Expr>,
    pub state: Option<Expr>,
    pub args: Vec<Expr>,
    /// `LOG`, `NOWAIT`, `SETERROR`
    pub options: Vec<String>,
    /// Written as `RAISERROR number 'message'`; `message` then holds the
    /// number and `args` the text.
    pub legacy: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStatement {
    /// All three are present, or none (rethrow inside CATCH).
    pub error_number: Option<Expr>,
    pub message: Option<Expr>,
    pub state: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionStatement {
    Begin {
        distributed: bool,
        name: Option<NameOrVariable>,
        /// `WITH MARK ['description']`
        mark: Option<Option<String>>,
    },
    Commit {
        name: Option<NameOrVariable>,
        delayed_durability: Option<bool>,
    },
    Rollback {
        name: Option<NameOrVariable>,
    },
    Save {
        name: NameOrVariable,
    },
}

// ============================================================================
// Cursors and Service Broker
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CursorRef {
    pub global: bool,
    pub name: NameOrVariable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchDirection {
    Next,
    Prior,
    First,
    Last,
    Absolute(Expr),
    Relative(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchStatement {
    pub direction: Option<FetchDirection>,
    pub cursor: CursorRef,
    pub into: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveStatement {
    pub top: Option<Top>,
    pub items: Vec<SelectItem>,
    pub queue: ObjectName,
    pub into: Option<String>,
    pub selection: Option<Expr>,
}

// ============================================================================
// EXECUTE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteTarget {
    Procedure {
        name: ObjectName,
        /// `proc;N`
        number: Option<u32>,
    },
    /// `EXEC @proc_name_variable`
    ProcedureVariable(String),
    /// `EXEC (string_expr [, arg ...])`; the first item is the batch text
    Dynamic(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteArg {
    /// `@param =`
    pub name: Option<String>,
    pub value: Expr,
    pub output: bool,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    pub name: Ident,
    pub data_type: DataType,
    pub nullable: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultSetDefinition {
    Columns(Vec<ResultColumn>),
    /// `AS OBJECT name`
    Object(ObjectName),
    /// `AS TYPE name`
    Type(ObjectName),
    /// `AS FOR XML`
    ForXml,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultSets {
    None,
    Undefined,
    Definitions(Vec<ResultSetDefinition>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOption {
    Recompile,
    ResultSets(ResultSets),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteStatement {
    /// `EXEC @rc = proc`
    pub return_status: Option<String>,
    pub target: ExecuteTarget,
    pub args: Vec<ExecuteArg>,
    /// `EXEC ('...') AS USER = 'x'`
    pub context: Option<ExecuteAsPrincipal>,
    /// `AT linked_server`
    pub at_server: Option<Ident>,
    pub options: Vec<ExecuteOption>,
    pub span: SourceSpan,
}

/// A view over an `EXEC sp_executesql` call.
#[derive(Debug, Clone, Copy)]
pub struct SpExecuteSql<'a> {
    pub statement: &'a Expr,
    pub parameter_definitions: Option<&'a Expr>,
    pub arguments: &'a [ExecuteArg],
}

impl ExecuteStatement {
    /// Split an `sp_executesql` call into its statement string, parameter
    /// definition string and the values passed for those parameters. The
    /// statement string is not parsed.
    pub fn as_sp_executesql(&self) -> Option<SpExecuteSql<'_>> {
        let ExecuteTarget::Procedure { name, .. } = &self.target else {
            return None;
        };
        if !name.name().matches("sp_executesql") {
            return None;
        }
        let (first, rest) = self.args.split_first()?;
        let (parameter_definitions, arguments) = match rest.split_first() {
            Some((defs, args))
                if defs
                    .name
                    .as_deref()
                    .map_or(true, |n| n.eq_ignore_ascii_case("@params")) =>
            {
                (Some(&defs.value), args)
            }
            _ => (None, rest),
        };
        Some(SpExecuteSql {
            statement: &first.value,
            parameter_definitions,
            arguments,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteAsStatement {
    pub principal: ExecuteAsPrincipal,
    pub no_revert: bool,
    pub cookie_into: Option<String>,
}

// ============================================================================
// Statement kinds
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    // DML
    Select(Box<Query>),
    Insert(Box<InsertStatement>),
    Update(Box<UpdateStatement>),
    Delete(Box<DeleteStatement>),
    Merge(Box<MergeStatement>),
    Truncate(TruncateStatement),

    // DDL
    CreateTable(Box<CreateTableStatement>),
    AlterTable(Box<AlterTableStatement>),
    Procedure(Box<ProcedureStatement>),
    Function(Box<FunctionStatement>),
    Trigger(Box<TriggerStatement>),
    View(Box<ViewStatement>),
    CreateIndex(Box<CreateIndexStatement>),
    AlterIndex(Box<AlterIndexStatement>),
    CreateSchema(Box<CreateSchemaStatement>),
    AlterSchema(AlterSchemaStatement),
    Synonym(SynonymStatement),
    Sequence(Box<SequenceStatement>),
    CreateType(Box<CreateTypeStatement>),
    Login(Box<LoginStatement>),
    User(Box<UserStatement>),
    Role(Box<RoleStatement>),
    Credential(Box<CredentialStatement>),
    Queue(Box<QueueStatement>),
    Service(Box<ServiceStatement>),
    Drop(DropStatement),

    // Security
    Permission(Box<PermissionStatement>),

    // Control flow
    If {
        condition: Expr,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    While {
        condition: Expr,
        body: Box<Statement>,
    },
    Block(Vec<Statement>),
    TryCatch {
        try_block: Vec<Statement>,
        catch_block: Vec<Statement>,
    },
    WaitFor(WaitForKind),
    Raiserror(Box<RaiserrorStatement>),
    Throw(ThrowStatement),
    Transaction(TransactionStatement),
    Print(Expr),
    Return(Option<Expr>),
    Break,
    Continue,
    Goto(Ident),
    Label(Ident),

    // Variables and session
    Declare(Vec<DeclareItem>),
    DeclareCursor {
        name: Ident,
        definition: CursorDefinition,
    },
    SetVariable(Box<SetVariableStatement>),
    SetOption(SetOptionStatement),
    SetTransactionIsolation(IsolationLevel),
    Use(Ident),

    // Execution context
    Execute(Box<ExecuteStatement>),
    ExecuteAs(ExecuteAsStatement),
    Revert {
        cookie: Option<Expr>,
    },

    // Cursors and Service Broker
    OpenCursor(CursorRef),
    CloseCursor(CursorRef),
    DeallocateCursor(CursorRef),
    Fetch(FetchStatement),
    Receive(Box<ReceiveStatement>),

    /// Recognized statement kept as source text
    Opaque {
        /// Leading words identifying the statement (`DBCC`, `BULK INSERT`)
        keyword: String,
        text: String,
    },
    /// A bare `;`
    Empty,
}
