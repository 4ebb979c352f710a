//! T-SQL reserved keywords
//!
//! Only the words SQL Server reserves are lexed as [`Keyword`] tokens. Every
//! other word (`PROC` aside, which is reserved) stays an identifier and is
//! matched case-insensitively by the parser, so non-reserved words such as
//! `LOGIN` or `NOLOCK` remain usable as object names.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

macro_rules! define_keywords {
    ($($variant:ident),* $(,)?) => {
        /// A reserved T-SQL keyword.
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub enum Keyword {
            $($variant),*
        }

        impl Keyword {
            pub const VARIANTS: &'static [Keyword] = &[$(Keyword::$variant),*];

            /// Canonical upper-case spelling.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Keyword::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

define_keywords!(
    ADD,
    ALL,
    ALTER,
    AND,
    ANY,
    AS,
    ASC,
    AUTHORIZATION,
    BACKUP,
    BEGIN,
    BETWEEN,
    BREAK,
    BROWSE,
    BULK,
    BY,
    CASCADE,
    CASE,
    CHECK,
    CHECKPOINT,
    CLOSE,
    CLUSTERED,
    COALESCE,
    COLLATE,
    COLUMN,
    COMMIT,
    COMPUTE,
    CONSTRAINT,
    CONTAINS,
    CONTAINSTABLE,
    CONTINUE,
    CONVERT,
    CREATE,
    CROSS,
    CURRENT,
    CURRENT_DATE,
    CURRENT_TIME,
    CURRENT_TIMESTAMP,
    CURRENT_USER,
    CURSOR,
    DATABASE,
    DBCC,
    DEALLOCATE,
    DECLARE,
    DEFAULT,
    DELETE,
    DENY,
    DESC,
    DISK,
    DISTINCT,
    DISTRIBUTED,
    DOUBLE,
    DROP,
    DUMP,
    ELSE,
    END,
    ERRLVL,
    ESCAPE,
    EXCEPT,
    EXEC,
    EXECUTE,
    EXISTS,
    EXIT,
    EXTERNAL,
    FETCH,
    FILE,
    FILLFACTOR,
    FOR,
    FOREIGN,
    FREETEXT,
    FREETEXTTABLE,
    FROM,
    FULL,
    FUNCTION,
    GOTO,
    GRANT,
    GROUP,
    HAVING,
    HOLDLOCK,
    IDENTITY,
    IDENTITY_INSERT,
    IDENTITYCOL,
    IF,
    IN,
    INDEX,
    INNER,
    INSERT,
    INTERSECT,
    INTO,
    IS,
    JOIN,
    KEY,
    KILL,
    LEFT,
    LIKE,
    LINENO,
    LOAD,
    MERGE,
    NATIONAL,
    NOCHECK,
    NONCLUSTERED,
    NOT,
    NULL,
    NULLIF,
    OF,
    OFF,
    OFFSETS,
    ON,
    OPEN,
    OPENDATASOURCE,
    OPENQUERY,
    OPENROWSET,
    OPENXML,
    OPTION,
    OR,
    ORDER,
    OUTER,
    OVER,
    PERCENT,
    PIVOT,
    PLAN,
    PRECISION,
    PRIMARY,
    PRINT,
    PROC,
    PROCEDURE,
    PUBLIC,
    RAISERROR,
    READ,
    READTEXT,
    RECONFIGURE,
    REFERENCES,
    REPLICATION,
    RESTORE,
    RESTRICT,
    RETURN,
    REVERT,
    REVOKE,
    RIGHT,
    ROLLBACK,
    ROWCOUNT,
    ROWGUIDCOL,
    RULE,
    SAVE,
    SCHEMA,
    SECURITYAUDIT,
    SELECT,
    SEMANTICKEYPHRASETABLE,
    SEMANTICSIMILARITYDETAILSTABLE,
    SEMANTICSIMILARITYTABLE,
    SESSION_USER,
    SET,
    SETUSER,
    SHUTDOWN,
    SOME,
    STATISTICS,
    SYSTEM_USER,
    TABLE,
    TABLESAMPLE,
    TEXTSIZE,
    THEN,
    TO,
    TOP,
    TRAN,
    TRANSACTION,
    TRIGGER,
    TRUNCATE,
    TRY_CONVERT,
    TSEQUAL,
    UNION,
    UNIQUE,
    UNPIVOT,
    UPDATE,
    UPDATETEXT,
    USE,
    USER,
    VALUES,
    VARYING,
    VIEW,
    WAITFOR,
    WHEN,
    WHERE,
    WHILE,
    WITH,
    WRITETEXT,
);

static KEYWORD_LOOKUP: Lazy<HashMap<&'static str, Keyword>> =
    Lazy::new(|| Keyword::VARIANTS.iter().map(|kw| (kw.as_str(), *kw)).collect());

/// Longest reserved keyword (`SEMANTICSIMILARITYDETAILSTABLE`).
const MAX_KEYWORD_LEN: usize = 30;

impl Keyword {
    /// Look up a word case-insensitively without allocating.
    pub fn lookup(word: &str) -> Option<Keyword> {
        if word.len() > MAX_KEYWORD_LEN || !word.is_ascii() {
            return None;
        }
        let mut buf = [0u8; MAX_KEYWORD_LEN];
        let upper = &mut buf[..word.len()];
        upper.copy_from_slice(word.as_bytes());
        upper.make_ascii_uppercase();
        let upper = std::str::from_utf8(upper).ok()?;
        KEYWORD_LOOKUP.get(upper).copied()
    }

    /// Keywords that can begin a statement. Used as resynchronization points
    /// after a syntax error and as implicit statement terminators.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            Keyword::ALTER
                | Keyword::BACKUP
                | Keyword::BEGIN
                | Keyword::BREAK
                | Keyword::BULK
                | Keyword::CHECKPOINT
                | Keyword::CLOSE
                | Keyword::COMMIT
                | Keyword::CONTINUE
                | Keyword::CREATE
                | Keyword::DBCC
                | Keyword::DEALLOCATE
                | Keyword::DECLARE
                | Keyword::DELETE
                | Keyword::DENY
                | Keyword::DROP
                | Keyword::EXEC
                | Keyword::EXECUTE
                | Keyword::FETCH
                | Keyword::GOTO
                | Keyword::GRANT
                | Keyword::IF
                | Keyword::INSERT
                | Keyword::KILL
                | Keyword::MERGE
                | Keyword::OPEN
                | Keyword::PRINT
                | Keyword::RAISERROR
                | Keyword::READTEXT
                | Keyword::RECONFIGURE
                | Keyword::RESTORE
                | Keyword::RETURN
                | Keyword::REVERT
                | Keyword::REVOKE
                | Keyword::ROLLBACK
                | Keyword::SAVE
                | Keyword::SELECT
                | Keyword::SET
                | Keyword::SETUSER
                | Keyword::SHUTDOWN
                | Keyword::TRUNCATE
                | Keyword::UPDATE
                | Keyword::UPDATETEXT
                | Keyword::USE
                | Keyword::WAITFOR
                | Keyword::WHILE
                | Keyword::WRITETEXT
        )
    }

    /// Reserved words that are nevertheless called like functions.
    pub fn is_function_name(self) -> bool {
        matches!(
            self,
            Keyword::LEFT
                | Keyword::RIGHT
                | Keyword::COALESCE
                | Keyword::NULLIF
                | Keyword::IDENTITY
                | Keyword::CONTAINS
                | Keyword::FREETEXT
                | Keyword::USER
                | Keyword::OPENQUERY
                | Keyword::OPENROWSET
                | Keyword::OPENDATASOURCE
                | Keyword::OPENXML
                | Keyword::CONTAINSTABLE
                | Keyword::FREETEXTTABLE
                | Keyword::SEMANTICKEYPHRASETABLE
                | Keyword::SEMANTICSIMILARITYDETAILSTABLE
                | Keyword::SEMANTICSIMILARITYTABLE
                | Keyword::UPDATE
        )
    }

    /// Niladic functions written without parentheses.
    pub fn is_niladic_function(self) -> bool {
        matches!(
            self,
            Keyword::CURRENT_TIMESTAMP
                | Keyword::CURRENT_USER
                | Keyword::SESSION_USER
                | Keyword::SYSTEM_USER
                | Keyword::USER
                | Keyword::CURRENT_DATE
                | Keyword::CURRENT_TIME
        )
    }
}
