//! rust-tsqlparser: a dialect-accurate T-SQL lexer and parser
//!
//! Turns T-SQL scripts into batches of span-annotated statements plus a list
//! of diagnostics. Parsing never stops at the first problem: lexical and
//! syntax errors are recorded and the parser resynchronizes at the next
//! statement.
//!
//! ```
//! use rust_tsqlparser::parse;
//!
//! let output = parse("SELECT 1 + 2 * 3;\nGO\nSELECT 'done'");
//! assert_eq!(output.batches.len(), 2);
//! assert!(output.diagnostics.is_empty());
//! ```

pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod options;
pub mod parser;
pub mod project;
pub mod source;

use std::path::{Path, PathBuf};

use anyhow::Result;

pub use diagnostics::{has_errors, Diagnostic, DiagnosticKind, DiagnosticSink, Severity};
pub use error::TsqlError;
pub use options::{CancellationFlag, DialectStrictness, ParseOptions, RepeatCountPolicy};
pub use parser::{FileOptions, ParseOutput, ParsedFile};
pub use source::{SourceBuffer, SourceSpan};

/// Parse a script with default options.
pub fn parse(text: &str) -> ParseOutput {
    parse_with_options(text, &ParseOptions::default())
}

/// Parse a script with explicit options.
pub fn parse_with_options(text: &str, options: &ParseOptions) -> ParseOutput {
    parse_source(&SourceBuffer::new(text), options)
}

/// Parse an already loaded source buffer.
pub fn parse_source(source: &SourceBuffer, options: &ParseOptions) -> ParseOutput {
    parser::parse_source(source, options)
}

/// Read, decode and parse one file.
pub fn parse_sql_file(path: &Path, options: &FileOptions) -> Result<ParsedFile> {
    parser::parse_sql_file(path, options)
}

/// Read, decode and parse several files, in parallel for larger sets.
pub fn parse_sql_files(paths: &[PathBuf], options: &FileOptions) -> Result<Vec<ParsedFile>> {
    parser::parse_sql_files(paths, options)
}

/// Parse every script of a .sqlproj project.
///
/// Build items are parsed as plain T-SQL; deployment scripts are parsed in
/// SQLCMD mode with the project's variables. `options` overrides the
/// project's QUOTED_IDENTIFIER default when given.
pub fn parse_project(project_path: &Path, options: Option<ParseOptions>) -> Result<Vec<ParsedFile>> {
    let project = project::parse_sqlproj(project_path)?;
    let parse_options = options.unwrap_or_else(|| project.parse_options());

    let mut parsed = parse_sql_files(&project.sql_files, &FileOptions::from(parse_options.clone()))?;

    let variables = project.sqlcmd_variable_map();
    for script in project.deployment_scripts() {
        let bytes = std::fs::read(script).map_err(|e| TsqlError::SqlFileReadError {
            path: script.clone(),
            source: e,
        })?;
        let text = SourceBuffer::from_bytes(&bytes);
        let expanded = parser::expand_includes_with_variables(text.text(), script, variables.clone())?;
        let source = SourceBuffer::new(expanded).with_path(script);
        let output = parse_source(&source, &parse_options);
        parsed.push(ParsedFile {
            path: script.clone(),
            source,
            output,
        });
    }

    Ok(parsed)
}
