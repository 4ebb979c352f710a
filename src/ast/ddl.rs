//! Data definition and security statements

use super::common::{
    CreateMode, DataType, ExecuteAsPrincipal, Ident, ObjectName, RawOption, SortDirection,
};
use super::expr::Expr;
use super::query::Query;
use super::statement::Statement;
use crate::source::SourceSpan;

// ============================================================================
// Tables
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IndexColumn {
    pub name: Ident,
    pub direction: Option<SortDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    PrimaryKey {
        clustered: Option<bool>,
        columns: Vec<IndexColumn>,
        options: Vec<RawOption>,
    },
    Unique {
        clustered: Option<bool>,
        columns: Vec<IndexColumn>,
        options: Vec<RawOption>,
    },
    Check {
        expr: Expr,
        not_for_replication: bool,
    },
    ForeignKey {
        /// Empty for a column-level `REFERENCES`.
        columns: Vec<Ident>,
        references: ObjectName,
        referenced_columns: Vec<Ident>,
        on_delete: Option<ReferentialAction>,
        on_update: Option<ReferentialAction>,
        not_for_replication: bool,
    },
    Default {
        expr: Expr,
        /// Table-level `DEFAULT x FOR column` (ALTER TABLE ADD)
        for_column: Option<Ident>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: Option<Ident>,
    pub kind: ConstraintKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub seed: Option<String>,
    pub increment: Option<String>,
    pub not_for_replication: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: Ident,
    /// `None` for computed columns
    pub data_type: Option<DataType>,
    /// `AS expr [PERSISTED]`
    pub computed: Option<Expr>,
    pub persisted: bool,
    pub collation: Option<Ident>,
    pub nullable: Option<bool>,
    pub identity: Option<Identity>,
    pub rowguidcol: bool,
    pub sparse: bool,
    pub filestream: bool,
    pub constraints: Vec<Constraint>,
    /// `GENERATED ALWAYS ...`, `MASKED WITH (...)`, `ENCRYPTED WITH (...)`
    /// and similar column attributes, as text
    pub attributes: Vec<String>,
    pub span: SourceSpan,
}

/// An index declared inline in CREATE TABLE / table type.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineIndex {
    pub name: Ident,
    pub unique: bool,
    pub clustered: Option<bool>,
    pub columnstore: bool,
    pub columns: Vec<IndexColumn>,
    pub span: SourceSpan,
}

/// Body of a CREATE TABLE, table variable, or table type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableElements {
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<Constraint>,
    pub indexes: Vec<InlineIndex>,
    /// `PERIOD FOR SYSTEM_TIME (start, end)`
    pub period: Option<(Ident, Ident)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphTableKind {
    Node,
    Edge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub name: ObjectName,
    pub elements: TableElements,
    pub graph: Option<GraphTableKind>,
    /// `ON filegroup | partition_scheme(col)` as text
    pub on: Option<String>,
    pub textimage_on: Option<String>,
    pub options: Vec<RawOption>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableAction {
    Add {
        columns: Vec<ColumnDef>,
        constraints: Vec<Constraint>,
    },
    AlterColumn {
        name: Ident,
        data_type: Option<DataType>,
        collation: Option<Ident>,
        nullable: Option<bool>,
        /// `ADD | DROP ROWGUIDCOL | PERSISTED | SPARSE ...`
        property: Option<String>,
    },
    DropColumns {
        if_exists: bool,
        names: Vec<Ident>,
    },
    DropConstraints {
        if_exists: bool,
        names: Vec<Ident>,
    },
    /// `[WITH CHECK|NOCHECK] CHECK|NOCHECK CONSTRAINT {ALL | names}`
    CheckConstraints {
        enable: bool,
        /// Empty means `ALL`
        names: Vec<Ident>,
    },
    /// `ENABLE|DISABLE TRIGGER {ALL | names}`
    Trigger {
        enable: bool,
        names: Vec<Ident>,
    },
    Set(Vec<RawOption>),
    /// `SWITCH`, `REBUILD`, and other actions kept as text
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStatement {
    pub name: ObjectName,
    /// `WITH CHECK` / `WITH NOCHECK` before ADD
    pub with_check: Option<bool>,
    pub action: AlterTableAction,
    pub span: SourceSpan,
}

// ============================================================================
// Modules: procedures, functions, triggers, views
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ModuleOption {
    Recompile,
    Encryption,
    SchemaBinding,
    NativeCompilation,
    ViewMetadata,
    ReturnsNullOnNullInput,
    CalledOnNullInput,
    ExecuteAs(ExecuteAsPrincipal),
    /// Anything else in the WITH list, kept as key/value text
    Other(RawOption),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Includes the leading `@`
    pub name: String,
    pub data_type: DataType,
    pub varying: bool,
    pub default: Option<Expr>,
    pub output: bool,
    pub readonly: bool,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcedureBody {
    Statements(Vec<Statement>),
    /// `AS EXTERNAL NAME assembly.class.method`
    External(ObjectName),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureStatement {
    pub mode: CreateMode,
    pub name: ObjectName,
    /// Legacy numbered procedure `name;N`
    pub number: Option<u32>,
    pub parameters: Vec<Parameter>,
    pub options: Vec<ModuleOption>,
    pub for_replication: bool,
    pub body: ProcedureBody,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionReturns {
    Scalar(DataType),
    /// Inline table-valued: `RETURNS TABLE`
    Table,
    /// Multi-statement: `RETURNS @t TABLE (...)`
    TableVariable {
        variable: String,
        elements: TableElements,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    /// `BEGIN ... END`
    Block(Vec<Statement>),
    /// `RETURN [(] select [)]`
    Return(Box<Query>),
    External(ObjectName),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionStatement {
    pub mode: CreateMode,
    pub name: ObjectName,
    pub parameters: Vec<Parameter>,
    pub returns: FunctionReturns,
    pub options: Vec<ModuleOption>,
    pub body: FunctionBody,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerTarget {
    Object(ObjectName),
    Database,
    AllServer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    For,
    After,
    InsteadOf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerStatement {
    pub mode: CreateMode,
    pub name: ObjectName,
    pub target: TriggerTarget,
    pub options: Vec<ModuleOption>,
    pub timing: TriggerTiming,
    /// `INSERT`, `UPDATE`, `DELETE`, or DDL event names, upper-cased
    pub events: Vec<String>,
    pub with_append: bool,
    pub not_for_replication: bool,
    pub body: ProcedureBody,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewStatement {
    pub mode: CreateMode,
    pub name: ObjectName,
    pub columns: Vec<Ident>,
    pub options: Vec<ModuleOption>,
    pub query: Box<Query>,
    pub with_check_option: bool,
    pub span: SourceSpan,
}

// ============================================================================
// Indexes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Rowstore,
    Columnstore,
    Xml { primary: bool },
    Spatial,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStatement {
    pub unique: bool,
    pub clustered: Option<bool>,
    pub kind: IndexKind,
    pub name: Ident,
    pub table: ObjectName,
    pub columns: Vec<IndexColumn>,
    pub include: Vec<Ident>,
    pub filter: Option<Expr>,
    /// `USING XML INDEX parent FOR PATH` and similar, as text
    pub using: Option<String>,
    pub options: Vec<RawOption>,
    pub on: Option<String>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterIndexStatement {
    /// `None` for `ALTER INDEX ALL`
    pub name: Option<Ident>,
    pub table: ObjectName,
    /// `REBUILD`, `REORGANIZE`, `DISABLE`, `SET`, ... upper-cased
    pub action: String,
    pub options: Vec<RawOption>,
    pub span: SourceSpan,
}

// ============================================================================
// Schemas, synonyms, sequences, types
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSchemaStatement {
    pub name: Option<Ident>,
    pub authorization: Option<Ident>,
    /// Statements nested in the CREATE SCHEMA (tables, views, grants)
    pub elements: Vec<Statement>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterSchemaStatement {
    pub name: Ident,
    /// Securable class before `::` (`OBJECT`, `TYPE`)
    pub class: Option<String>,
    pub transfer: ObjectName,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynonymStatement {
    pub name: ObjectName,
    pub target: ObjectName,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceOption {
    StartWith(Expr),
    IncrementBy(Expr),
    /// `None` for `NO MINVALUE`
    MinValue(Option<Expr>),
    MaxValue(Option<Expr>),
    Cycle(bool),
    /// `None` for `NO CACHE`
    Cache(Option<Expr>),
    /// `RESTART [WITH n]` (ALTER only)
    Restart(Option<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceStatement {
    pub mode: CreateMode,
    pub name: ObjectName,
    pub data_type: Option<DataType>,
    pub options: Vec<SequenceOption>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefinition {
    /// `FROM base_type [NULL | NOT NULL]`
    Alias {
        base: DataType,
        nullable: Option<bool>,
    },
    Table(TableElements),
    External(ObjectName),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTypeStatement {
    pub name: ObjectName,
    pub definition: TypeDefinition,
    pub options: Vec<RawOption>,
    pub span: SourceSpan,
}

// ============================================================================
// Principals and server objects
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LoginStatement {
    pub mode: CreateMode,
    pub name: Ident,
    /// `FROM WINDOWS`, `FROM EXTERNAL PROVIDER`, `FROM CERTIFICATE x`, as text
    pub source: Option<String>,
    /// `PASSWORD = '...' [HASHED] [MUST_CHANGE]`, `DEFAULT_DATABASE = ...`, ...
    pub options: Vec<RawOption>,
    /// `ALTER LOGIN x ENABLE | DISABLE`
    pub enable: Option<bool>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserSource {
    Login(Ident),
    WithoutLogin,
    /// `FROM EXTERNAL PROVIDER`, `FOR CERTIFICATE x`, ...
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserStatement {
    pub mode: CreateMode,
    pub name: Ident,
    pub source: Option<UserSource>,
    pub options: Vec<RawOption>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    Database,
    Server,
    Application,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleMemberChange {
    pub add: bool,
    pub member: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleStatement {
    pub mode: CreateMode,
    pub kind: RoleKind,
    pub name: Ident,
    pub authorization: Option<Ident>,
    pub members: Vec<RoleMemberChange>,
    /// `WITH NAME = ...`, `PASSWORD = ...`, `DEFAULT_SCHEMA = ...`
    pub options: Vec<RawOption>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CredentialStatement {
    pub mode: CreateMode,
    pub database_scoped: bool,
    pub name: Ident,
    pub identity: Option<String>,
    pub secret: Option<String>,
    pub provider: Option<Ident>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueStatement {
    pub mode: CreateMode,
    pub name: ObjectName,
    /// `STATUS = ON`, `RETENTION = OFF`, `ACTIVATION (...)`, ...
    pub options: Vec<RawOption>,
    pub on: Option<String>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceStatement {
    pub mode: CreateMode,
    pub name: Ident,
    pub authorization: Option<Ident>,
    pub queue: Option<ObjectName>,
    /// Contracts; for ALTER, `ADD CONTRACT` entries
    pub contracts: Vec<Ident>,
    pub dropped_contracts: Vec<Ident>,
    pub span: SourceSpan,
}

// ============================================================================
// DROP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    View,
    Procedure,
    Function,
    Trigger,
    Index,
    Schema,
    Synonym,
    Sequence,
    Login,
    User,
    Role,
    ServerRole,
    ApplicationRole,
    Credential,
    DatabaseScopedCredential,
    Queue,
    Service,
    Type,
    Default,
    Rule,
    Statistics,
    /// Any other object class, upper-cased (`ASSEMBLY`, `CONTRACT`)
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropStatement {
    pub kind: ObjectKind,
    pub if_exists: bool,
    pub names: Vec<ObjectName>,
    /// `DROP INDEX ix ON table`, `DROP TRIGGER t ON DATABASE`
    pub on: Option<ObjectName>,
    pub span: SourceSpan,
}

// ============================================================================
// Permissions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAction {
    Grant,
    Deny,
    Revoke,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Permission {
    /// Upper-cased, multi-word permissions joined by a space (`VIEW DEFINITION`)
    pub name: String,
    pub columns: Vec<Ident>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Securable {
    /// `OBJECT`, `SCHEMA`, `TYPE`, `DATABASE`, ... before `::`
    pub class: Option<String>,
    pub name: ObjectName,
    pub columns: Vec<Ident>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PermissionStatement {
    pub action: PermissionAction,
    /// `REVOKE GRANT OPTION FOR`
    pub grant_option_for: bool,
    pub permissions: Vec<Permission>,
    pub on: Option<Securable>,
    pub principals: Vec<Ident>,
    pub with_grant_option: bool,
    pub cascade: bool,
    pub as_principal: Option<Ident>,
    pub span: SourceSpan,
}
