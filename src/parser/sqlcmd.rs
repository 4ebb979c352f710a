//! SQLCMD preprocessing
//!
//! Deployment scripts often use `:r file` to pull in other scripts and
//! `:setvar name value` with `$(name)` references. [`expand_includes`]
//! resolves both before the text reaches the lexer. Other SQLCMD lines
//! (`:on error exit`, the `:setvar` lines themselves) are left in place;
//! the lexer turns them into directive tokens the parser skips.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::trace;

use crate::error::TsqlError;
use crate::source::SourceBuffer;

static SETVAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*:setvar\s+(\w+)(?:\s+(?:"([^"]*)"|(\S+)))?\s*$"#)
        .expect("Invalid setvar regex")
});

// Matches: :r path\to\file.sql or :r "path with spaces\file.sql"
static INCLUDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*:r\s+(?:"([^"]+)"|(\S+))\s*$"#).expect("Invalid include regex")
});

static VARIABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\((\w+)\)").expect("Invalid variable regex"));

/// Expand `:r` includes and `$(var)` references in SQLCMD script text.
///
/// Relative include paths resolve against the directory of `source_file`.
/// Variables defined with `:setvar` apply to the lines after the definition,
/// including the contents of files included later. Unknown `$(var)`
/// references are left as written.
///
/// # Errors
/// Returns an error if an included file cannot be read or an include
/// chain loops back on itself.
pub fn expand_includes(content: &str, source_file: &Path) -> Result<String> {
    expand_includes_with_variables(content, source_file, HashMap::new())
}

/// Like [`expand_includes`], starting from predefined variables
/// (for example the `SqlCmdVariables` of a project file).
pub fn expand_includes_with_variables(
    content: &str,
    source_file: &Path,
    variables: HashMap<String, String>,
) -> Result<String> {
    let mut expander = IncludeExpander {
        variables,
        chain: vec![canonical_or_self(source_file)],
    };
    expander.expand(content, source_file)
}

struct IncludeExpander {
    variables: HashMap<String, String>,
    /// Files currently being expanded, outermost first.
    chain: Vec<PathBuf>,
}

impl IncludeExpander {
    fn expand(&mut self, content: &str, source_file: &Path) -> Result<String> {
        let source_dir = source_file.parent().unwrap_or(Path::new("."));
        let mut result = String::with_capacity(content.len());

        for line in content.split_inclusive('\n') {
            let body = line.trim_end_matches(['\r', '\n']);

            if let Some(caps) = SETVAR_RE.captures(body) {
                let name = caps.get(1).map_or("", |m| m.as_str()).to_string();
                let raw = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .map_or("", |m| m.as_str());
                let value = self.substitute(raw);
                trace!(name = %name, value = %value, "sqlcmd variable");
                self.variables.insert(name, value);
                result.push_str(line);
                continue;
            }

            if let Some(caps) = INCLUDE_RE.captures(body) {
                let raw = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map_or("", |m| m.as_str());
                // Windows paths use backslash
                let include = self.substitute(raw).replace('\\', "/");
                let expanded = self.include(&include, source_dir, source_file)?;
                result.push_str(&format!("-- BEGIN :r {include}\n"));
                result.push_str(&expanded);
                if !expanded.ends_with('\n') {
                    result.push('\n');
                }
                result.push_str(&format!("-- END :r {include}\n"));
                continue;
            }

            result.push_str(&self.substitute(line));
        }

        Ok(result)
    }

    fn include(&mut self, include: &str, source_dir: &Path, source_file: &Path) -> Result<String> {
        let include_path = Path::new(include);
        let resolved = if include_path.is_absolute() {
            include_path.to_path_buf()
        } else {
            source_dir.join(include_path)
        };

        let canonical = resolved
            .canonicalize()
            .map_err(|_| TsqlError::SqlcmdIncludeNotFound {
                path: resolved.clone(),
                source_file: source_file.to_path_buf(),
            })?;

        if self.chain.contains(&canonical) {
            let chain = self
                .chain
                .iter()
                .chain(std::iter::once(&canonical))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(TsqlError::SqlcmdCircularInclude {
                path: canonical,
                chain,
            }
            .into());
        }

        let bytes = std::fs::read(&canonical).map_err(|_| TsqlError::SqlcmdIncludeNotFound {
            path: resolved.clone(),
            source_file: source_file.to_path_buf(),
        })?;
        let included = SourceBuffer::from_bytes(&bytes);

        trace!(path = %canonical.display(), depth = self.chain.len(), "expanding include");
        self.chain.push(canonical.clone());
        let expanded = self.expand(included.text(), &canonical);
        // The same file may be included again from a different branch
        self.chain.pop();
        expanded
    }

    fn substitute(&self, text: &str) -> String {
        if !text.contains("$(") {
            return text.to_string();
        }
        VARIABLE_RE
            .replace_all(text, |caps: &Captures| {
                let name = caps.get(1).map_or("", |m| m.as_str());
                self.variables
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

fn canonical_or_self(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
