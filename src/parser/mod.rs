//! T-SQL lexing and parsing
//!
//! The lexer, batch splitter and token cursor live in their own modules;
//! each statement family adds its grammar to [`TokenParser`] from a
//! `*_parser.rs` module.

pub mod batch;
pub mod keywords;
pub mod lexer;
pub mod token;
mod token_parser_base;

mod statement_parser;

// Expressions and queries
mod expression_parser;
mod query_parser;
mod table_parser;
mod dml_parser;

// Tables
mod column_parser;
mod constraint_parser;
mod table_ddl_parser;

// Procedural statements
mod control_flow_parser;
mod cursor_parser;
mod execute_parser;
mod variable_parser;

// Programmable objects and other DDL
mod broker_parser;
mod function_parser;
mod index_parser;
mod procedure_parser;
mod schema_parser;
mod security_parser;
mod sequence_parser;
mod synonym_parser;
mod trigger_parser;
mod type_parser;
mod view_parser;

mod sqlcmd;
mod tsql_parser;

pub use batch::{BatchSplitter, RawBatch};
pub use lexer::{tokenize, Lexer, LexerSettings};
pub use sqlcmd::{expand_includes, expand_includes_with_variables};
pub use token::{Token, TokenKind};
pub use token_parser_base::{ParseError, ParseResult, TokenParser};
pub use tsql_parser::{
    parse_source, parse_sql_file, parse_sql_files, FileOptions, ParseOutput, ParsedFile,
    SessionSettings,
};
