use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use rust_tsqlparser::parser::{tokenize, LexerSettings};
use rust_tsqlparser::{
    has_errors, parse_project, parse_sql_file, parse_sql_files, Diagnostic, DialectStrictness,
    FileOptions, ParseOptions, ParsedFile, RepeatCountPolicy, SourceBuffer, TsqlError,
};

#[derive(Parser)]
#[command(name = "rust-tsqlparser")]
#[command(author, version, about = "Dialect-accurate T-SQL lexer and parser")]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse files and report diagnostics
    Check {
        /// SQL files to parse
        paths: Vec<PathBuf>,

        /// Parse every script of a .sqlproj project
        #[arg(short, long)]
        project: Option<PathBuf>,

        #[command(flatten)]
        parse: ParseArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Dump the token stream of a file
    Tokens {
        file: PathBuf,

        #[command(flatten)]
        parse: ParseArgs,
    },
    /// Pretty-print the AST of a file
    Ast {
        file: PathBuf,

        #[command(flatten)]
        parse: ParseArgs,
    },
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Report legacy constructs (`*=` joins, COMPUTE BY, numbered procedures) as errors
    #[arg(long)]
    strict: bool,

    /// Initial QUOTED_IDENTIFIER setting
    #[arg(long, value_enum)]
    quoted_identifier: Option<Switch>,

    /// Maximum nesting depth of block comments
    #[arg(long)]
    max_comment_depth: Option<u32>,

    /// Report `GO n` repeat counts as errors
    #[arg(long)]
    reject_go_count: bool,

    /// Expand SQLCMD `:r` includes and `$(var)` references
    #[arg(long)]
    sqlcmd: bool,
}

impl ParseArgs {
    /// Parse options, or `None` when no flag changes the defaults.
    fn overrides(&self) -> Option<ParseOptions> {
        let changed = self.strict
            || self.quoted_identifier.is_some()
            || self.max_comment_depth.is_some()
            || self.reject_go_count;
        changed.then(|| self.parse_options())
    }

    fn parse_options(&self) -> ParseOptions {
        let mut options = ParseOptions::default()
            .with_max_nested_comment_depth(self.max_comment_depth);
        if let Some(switch) = self.quoted_identifier {
            options = options.with_quoted_identifier(switch == Switch::On);
        }
        if self.strict {
            options.dialect_strictness = DialectStrictness::Strict;
        }
        if self.reject_go_count {
            options.repeat_count = RepeatCountPolicy::Reject;
        }
        options
    }

    fn file_options(&self) -> FileOptions {
        FileOptions {
            parse: self.parse_options(),
            sqlcmd: self.sqlcmd,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct FileReport<'a> {
    path: &'a Path,
    batches: usize,
    diagnostics: &'a [Diagnostic],
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check {
            paths,
            project,
            parse,
            format,
        } => {
            let mut files = match project {
                Some(project) => parse_project(&project, parse.overrides())?,
                None => Vec::new(),
            };
            files.extend(parse_sql_files(&paths, &parse.file_options())?);
            report(&files, format)?;
            let failed = files.iter().any(|f| has_errors(&f.output.diagnostics));
            Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }
        Commands::Tokens { file, parse } => {
            let bytes = std::fs::read(&file).map_err(|e| TsqlError::SqlFileReadError {
                path: file.clone(),
                source: e,
            })?;
            let source = SourceBuffer::from_bytes(&bytes);
            let options = parse.parse_options();
            let settings = LexerSettings {
                quoted_identifier: options.quoted_identifier,
                max_nested_comment_depth: options.max_nested_comment_depth,
            };
            for token in tokenize(source.text(), settings) {
                println!("{:>5}:{:<4} {:?} {:?}", token.span.line, token.span.column, token.kind, token.text);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Ast { file, parse } => {
            let parsed = parse_sql_file(&file, &parse.file_options())?;
            for batch in &parsed.output.batches {
                println!("{batch:#?}");
            }
            report(std::slice::from_ref(&parsed), Format::Text)?;
            let failed = has_errors(&parsed.output.diagnostics);
            Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }
    }
}

fn report(files: &[ParsedFile], format: Format) -> Result<()> {
    match format {
        Format::Text => {
            for file in files {
                for diagnostic in &file.output.diagnostics {
                    println!(
                        "{}:{}: {}: {}",
                        file.path.display(),
                        diagnostic.span,
                        diagnostic.severity,
                        diagnostic.message
                    );
                }
            }
        }
        Format::Json => {
            let reports: Vec<_> = files
                .iter()
                .map(|f| FileReport {
                    path: &f.path,
                    batches: f.output.batches.len(),
                    diagnostics: &f.output.diagnostics,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }
    Ok(())
}
