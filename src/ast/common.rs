//! Names, data types and option bags shared across statement kinds

use std::fmt;

use crate::source::SourceSpan;

/// How an identifier was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentQuote {
    None,
    Bracket,
    DoubleQuote,
}

/// A single identifier with its decoded value.
///
/// `value` has delimiters removed and escapes collapsed, so `[a]]b]` has
/// value `a]b`. Comparisons between identifiers are left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub value: String,
    pub quote: IdentQuote,
    pub span: SourceSpan,
}

impl Ident {
    pub fn new(value: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            value: value.into(),
            quote: IdentQuote::None,
            span,
        }
    }

    /// Case-insensitive comparison against plain text.
    pub fn matches(&self, other: &str) -> bool {
        self.value.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quote {
            IdentQuote::None => f.write_str(&self.value),
            IdentQuote::Bracket => write!(f, "[{}]", self.value.replace(']', "]]")),
            IdentQuote::DoubleQuote => write!(f, "\"{}\"", self.value.replace('"', "\"\"")),
        }
    }
}

/// A possibly qualified name: `server.db.schema.object`.
///
/// Omitted middle parts (`db..object`) are kept as empty identifiers so
/// part positions stay meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    pub parts: Vec<Ident>,
    pub span: SourceSpan,
}

impl ObjectName {
    pub fn from_ident(ident: Ident) -> Self {
        let span = ident.span;
        Self {
            parts: vec![ident],
            span,
        }
    }

    /// The last (object) part.
    pub fn name(&self) -> &Ident {
        // parts is never empty; the parser builds at least one part
        &self.parts[self.parts.len() - 1]
    }

    /// The part before the object name, if present and non-empty.
    pub fn schema(&self) -> Option<&Ident> {
        let len = self.parts.len();
        if len < 2 {
            return None;
        }
        let schema = &self.parts[len - 2];
        (!schema.value.is_empty()).then_some(schema)
    }

    pub fn is_single(&self) -> bool {
        self.parts.len() == 1
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// A name that may also be a variable, as in `OPEN @cursor` or `BEGIN TRAN @name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameOrVariable {
    Name(Ident),
    Variable { name: String, span: SourceSpan },
}

impl NameOrVariable {
    pub fn span(&self) -> SourceSpan {
        match self {
            NameOrVariable::Name(ident) => ident.span,
            NameOrVariable::Variable { span, .. } => *span,
        }
    }
}

/// A parenthesized data type argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArg {
    Number(String),
    Max,
    /// Anything else, kept as source text (`CONTENT dbo.MySchemaCollection`).
    Other(String),
}

/// A data type reference: `INT`, `NVARCHAR(MAX)`, `DECIMAL(18, 2)`, `dbo.MyType`.
///
/// Multi-word system types (`DOUBLE PRECISION`, `NATIONAL CHARACTER VARYING`)
/// are kept as one identifier with single spaces between the words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType {
    pub name: ObjectName,
    pub args: Vec<TypeArg>,
    pub span: SourceSpan,
}

impl DataType {
    /// Upper-cased type name without schema.
    pub fn base_name(&self) -> String {
        self.name.name().value.to_uppercase()
    }
}

/// A `key [= value]` item from an option list that is retained as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOption {
    /// Upper-cased option name (possibly several words: `DATA_COMPRESSION`,
    /// `MUST_CHANGE`, `ALLOW_ROW_LOCKS`).
    pub name: String,
    pub value: Option<String>,
    pub span: SourceSpan,
}

/// CREATE / ALTER / CREATE OR ALTER.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    Create,
    Alter,
    CreateOrAlter,
}

/// Principal named by `EXECUTE AS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteAsPrincipal {
    Caller,
    SelfPrincipal,
    Owner,
    /// `'principal'` in a module option
    Named(String),
    /// `LOGIN = 'name'` in a standalone statement
    Login(String),
    /// `USER = 'name'` in a standalone statement
    User(String),
}

/// Sort direction in ORDER BY and index column lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}
