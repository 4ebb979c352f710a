//! Error types for rust-tsqlparser
//!
//! Lexical and syntax problems are reported as [`crate::Diagnostic`] values,
//! not as errors. The variants here cover the surrounding I/O layer only.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading scripts or project files
#[derive(Error, Debug)]
pub enum TsqlError {
    #[error("cannot read project {path}")]
    ProjectReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("project {path} is not well-formed XML")]
    ProjectParseError {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("unexpected project layout: {message}")]
    InvalidProjectFormat { message: String },

    #[error("cannot read script {path}")]
    SqlFileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(":r target {path} does not exist (included from {source_file})")]
    SqlcmdIncludeNotFound { path: PathBuf, source_file: PathBuf },

    #[error(":r cycle through {path}: {chain}")]
    SqlcmdCircularInclude { path: PathBuf, chain: String },
}
