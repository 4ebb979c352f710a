//! Reader for .sqlproj files
//!
//! Only what the parser needs is extracted: the script files, the
//! deployment scripts, SQLCMD variables and the `QuotedIdentifier` default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use roxmltree::{Document, Node};
use tracing::{debug, warn};

use crate::error::TsqlError;
use crate::options::ParseOptions;

/// A `<SqlCmdVariable>` item. `value` is usually a build-time reference
/// such as `$(SqlCmdVar__1)`; `default_value` is what scripts see when that
/// reference is not supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlCmdVariable {
    pub name: String,
    pub value: String,
    pub default_value: String,
}

/// Parsed SQL project
#[derive(Debug, Clone)]
pub struct SqlProject {
    pub name: String,
    pub project_dir: PathBuf,
    /// Build items, sorted
    pub sql_files: Vec<PathBuf>,
    /// Pre-deployment script (SQLCMD mode, at most one)
    pub pre_deploy_script: Option<PathBuf>,
    /// Post-deployment script (SQLCMD mode, at most one)
    pub post_deploy_script: Option<PathBuf>,
    pub sqlcmd_variables: Vec<SqlCmdVariable>,
    /// Project-level `QuotedIdentifier`, on unless the project says otherwise
    pub quoted_identifier: bool,
}

impl SqlProject {
    /// Parse options seeded from the project's settings.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::default().with_quoted_identifier(self.quoted_identifier)
    }

    /// Variables for `$(name)` substitution. The default value is used when
    /// the value is itself an unresolved `$(...)` reference.
    pub fn sqlcmd_variable_map(&self) -> HashMap<String, String> {
        self.sqlcmd_variables
            .iter()
            .map(|v| {
                let value = if v.value.is_empty() || v.value.starts_with("$(") {
                    v.default_value.clone()
                } else {
                    v.value.clone()
                };
                (v.name.clone(), value)
            })
            .collect()
    }

    /// Pre- and post-deployment scripts that exist.
    pub fn deployment_scripts(&self) -> impl Iterator<Item = &PathBuf> {
        self.pre_deploy_script
            .iter()
            .chain(self.post_deploy_script.iter())
    }
}

/// Parse a .sqlproj file
pub fn parse_sqlproj(path: &Path) -> Result<SqlProject> {
    let content = std::fs::read_to_string(path).map_err(|e| TsqlError::ProjectReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let doc = Document::parse(&content).map_err(|e| TsqlError::ProjectParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "Project" {
        return Err(TsqlError::InvalidProjectFormat {
            message: format!("expected <Project> root element, found <{}>", root.tag_name().name()),
        }
        .into());
    }

    let project_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Database")
        .to_string();

    let quoted_identifier = find_property_value(&root, "QuotedIdentifier")
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(true);

    let sql_files = find_sql_files(&root, &project_dir);
    let (pre_deploy_script, post_deploy_script) = find_deployment_scripts(&root, &project_dir);
    let sqlcmd_variables = find_sqlcmd_variables(&root);

    debug!(
        project = %name,
        files = sql_files.len(),
        quoted_identifier,
        "read project file"
    );

    Ok(SqlProject {
        name,
        project_dir,
        sql_files,
        pre_deploy_script,
        post_deploy_script,
        sqlcmd_variables,
        quoted_identifier,
    })
}

fn find_property_value(root: &Node, property_name: &str) -> Option<String> {
    root.descendants()
        .find(|node| node.tag_name().name() == property_name)
        .and_then(|node| node.text())
        .map(str::to_string)
}

fn is_sql_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
}

fn find_sql_files(root: &Node, project_dir: &Path) -> Vec<PathBuf> {
    let mut sql_files = Vec::new();
    let mut include_patterns: Vec<String> = Vec::new();
    let mut exclude_patterns: Vec<String> = Vec::new();

    for node in root.descendants().filter(|n| n.tag_name().name() == "Build") {
        if let Some(include) = node.attribute("Include") {
            include_patterns.push(include.replace('\\', "/"));
        }
        if let Some(remove) = node.attribute("Remove") {
            exclude_patterns.push(remove.replace('\\', "/"));
        }
    }

    for pattern in &include_patterns {
        if pattern.contains('*') {
            let glob_pattern = project_dir.join(pattern);
            match glob::glob(&glob_pattern.to_string_lossy()) {
                Ok(paths) => sql_files.extend(paths.filter_map(|p| p.ok()).filter(|p| is_sql_file(p))),
                Err(e) => warn!(pattern = %pattern, error = %e, "invalid Build pattern"),
            }
        } else {
            let sql_path = project_dir.join(pattern);
            if is_sql_file(&sql_path) && sql_path.exists() {
                sql_files.push(sql_path);
            }
        }
    }

    if !exclude_patterns.is_empty() {
        sql_files.retain(|file| !exclude_patterns.iter().any(|pattern| excludes(project_dir, pattern, file)));
    }

    // SDK-style projects without Build items include every .sql file
    if include_patterns.is_empty() {
        sql_files.extend(
            walkdir::WalkDir::new(project_dir)
                .into_iter()
                .filter_entry(|e| {
                    let name = e.file_name().to_string_lossy();
                    !(e.depth() > 0 && e.file_type().is_dir() && (name == "bin" || name == "obj"))
                })
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_sql_file(e.path()))
                .map(|e| e.into_path())
                .filter(|p| !exclude_patterns.iter().any(|pattern| excludes(project_dir, pattern, p))),
        );
    }

    sql_files.sort();
    sql_files.dedup();
    sql_files
}

fn excludes(project_dir: &Path, pattern: &str, file: &Path) -> bool {
    let full = project_dir.join(pattern);
    if pattern.contains('*') {
        glob::Pattern::new(&full.to_string_lossy()).is_ok_and(|m| m.matches_path(file))
    } else {
        file == full
    }
}

fn find_sqlcmd_variables(root: &Node) -> Vec<SqlCmdVariable> {
    let child_text = |node: &Node, name: &str| {
        node.children()
            .find(|n| n.tag_name().name() == name)
            .and_then(|n| n.text())
            .map(str::to_string)
            .unwrap_or_default()
    };

    root.descendants()
        .filter(|n| n.tag_name().name() == "SqlCmdVariable")
        .filter_map(|node| {
            let name = node.attribute("Include")?;
            Some(SqlCmdVariable {
                name: name.to_string(),
                value: child_text(&node, "Value"),
                default_value: child_text(&node, "DefaultValue"),
            })
        })
        .collect()
}

fn find_deployment_scripts(root: &Node, project_dir: &Path) -> (Option<PathBuf>, Option<PathBuf>) {
    let mut pre_deploy: Option<PathBuf> = None;
    let mut post_deploy: Option<PathBuf> = None;

    for node in root.descendants() {
        let slot = match node.tag_name().name() {
            "PreDeploy" => &mut pre_deploy,
            "PostDeploy" => &mut post_deploy,
            _ => continue,
        };
        let Some(include) = node.attribute("Include") else {
            continue;
        };
        let script_path = project_dir.join(include.replace('\\', "/"));
        if !script_path.exists() {
            warn!(path = %script_path.display(), "deployment script not found");
        } else if slot.is_some() {
            warn!(kind = node.tag_name().name(), "multiple deployment scripts specified, using first one");
        } else {
            *slot = Some(script_path);
        }
    }

    (pre_deploy, post_deploy)
}
