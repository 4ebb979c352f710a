//! Table, query and join hints
//!
//! Hints only need to be recognized structurally. Known hints get their own
//! variant; anything else is kept as text in an `Other` variant.

use super::common::Ident;
use super::expr::Expr;
use crate::source::SourceSpan;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableHint {
    NoLock,
    ReadUncommitted,
    ReadCommitted,
    ReadCommittedLock,
    ReadPast,
    RepeatableRead,
    Serializable,
    Snapshot,
    HoldLock,
    UpdLock,
    XLock,
    TabLock,
    TabLockX,
    PagLock,
    RowLock,
    NoWait,
    NoExpand,
    ForceScan,
    /// `FORCESEEK [(index (columns))]`
    ForceSeek(Option<String>),
    /// `INDEX(a, b)` or `INDEX = a`; values as written (names or ids)
    Index(Vec<String>),
    KeepIdentity,
    KeepDefaults,
    IgnoreConstraints,
    IgnoreTriggers,
    Other(String),
}

impl TableHint {
    /// Map a hint keyword to its variant. Returns `None` for words that are
    /// not table hints (callers use this to tell `t (NOLOCK)` from `fn (x)`).
    pub fn from_word(word: &str) -> Option<TableHint> {
        let hint = match word.to_ascii_uppercase().as_str() {
            "NOLOCK" => TableHint::NoLock,
            "READUNCOMMITTED" => TableHint::ReadUncommitted,
            "READCOMMITTED" => TableHint::ReadCommitted,
            "READCOMMITTEDLOCK" => TableHint::ReadCommittedLock,
            "READPAST" => TableHint::ReadPast,
            "REPEATABLEREAD" => TableHint::RepeatableRead,
            "SERIALIZABLE" => TableHint::Serializable,
            "SNAPSHOT" => TableHint::Snapshot,
            "HOLDLOCK" => TableHint::HoldLock,
            "UPDLOCK" => TableHint::UpdLock,
            "XLOCK" => TableHint::XLock,
            "TABLOCK" => TableHint::TabLock,
            "TABLOCKX" => TableHint::TabLockX,
            "PAGLOCK" => TableHint::PagLock,
            "ROWLOCK" => TableHint::RowLock,
            "NOWAIT" => TableHint::NoWait,
            "NOEXPAND" => TableHint::NoExpand,
            "FORCESCAN" => TableHint::ForceScan,
            "FORCESEEK" => TableHint::ForceSeek(None),
            "INDEX" => TableHint::Index(Vec::new()),
            "KEEPIDENTITY" => TableHint::KeepIdentity,
            "KEEPDEFAULTS" => TableHint::KeepDefaults,
            "IGNORE_CONSTRAINTS" => TableHint::IgnoreConstraints,
            "IGNORE_TRIGGERS" => TableHint::IgnoreTriggers,
            "SPATIAL_WINDOW_MAX_CELLS" => TableHint::Other(word.to_string()),
            _ => return None,
        };
        Some(hint)
    }
}

/// Physical join strategy forced on a single join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinHint {
    Loop,
    Hash,
    Merge,
    Remote,
}

impl JoinHint {
    pub fn from_word(word: &str) -> Option<JoinHint> {
        match word.to_ascii_uppercase().as_str() {
            "LOOP" => Some(JoinHint::Loop),
            "HASH" => Some(JoinHint::Hash),
            "MERGE" => Some(JoinHint::Merge),
            "REMOTE" => Some(JoinHint::Remote),
            _ => None,
        }
    }
}

/// One `@var = value` or `@var UNKNOWN` entry of `OPTIMIZE FOR (...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeForVariable {
    pub variable: String,
    /// `None` means `UNKNOWN`.
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryHintKind {
    MaxDop(String),
    MaxRecursion(String),
    Fast(String),
    Recompile,
    OptimizeForUnknown,
    OptimizeFor(Vec<OptimizeForVariable>),
    ForceOrder,
    /// `LOOP JOIN`, `HASH JOIN`, `MERGE JOIN`
    Join(JoinHint),
    /// `HASH GROUP`, `ORDER GROUP`
    Group(String),
    /// `CONCAT UNION`, `HASH UNION`, `MERGE UNION`
    Union(String),
    KeepPlan,
    KeepFixedPlan,
    ExpandViews,
    RobustPlan,
    /// `USE HINT ('name', ...)`
    UseHint(Vec<String>),
    /// `TABLE HINT (object, hints...)`
    TableHint {
        object: Vec<Ident>,
        hints: Vec<TableHint>,
    },
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryHint {
    pub kind: QueryHintKind,
    pub span: SourceSpan,
}
