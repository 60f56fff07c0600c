//! Workflow loader: scans a directory of workflow files and parses them.
//!
//! Selection is a two-step lookup: find the descriptor in the most recent
//! scan, then load and parse the file. Either step failing means "no workflow
//! selected"; a partially parsed workflow is never handed out.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schema::{Stage, Workflow, WorkflowDefinition};
use crate::error::RcNodeError;

const WORKFLOW_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// A workflow file discovered by a directory scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowFile {
    /// File stem, used as the workflow id
    pub id: String,
    /// Declared workflow name (file stem if the file could not be parsed)
    pub name: String,
    pub path: PathBuf,
}

/// Loads workflow definitions from disk.
#[derive(Debug, Default)]
pub struct WorkflowLoader {
    files: Vec<WorkflowFile>,
    expand_env: bool,
}

impl WorkflowLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand `${VAR}` / `${VAR:-default}` references in command params.
    pub fn with_env_expansion(mut self, enabled: bool) -> Self {
        self.expand_env = enabled;
        self
    }

    /// `<config_dir>/rcnode/workflows`, if the platform has a config dir.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rcnode").join("workflows"))
    }

    /// Descriptors from the most recent scan.
    pub fn files(&self) -> &[WorkflowFile] {
        &self.files
    }

    /// Scan a directory for workflow files, replacing the previous scan.
    pub fn scan_directory(&mut self, dir: impl AsRef<Path>) -> Result<&[WorkflowFile], RcNodeError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(RcNodeError::NotFound(format!(
                "Workflow directory '{}' does not exist",
                dir.display()
            )));
        }

        let pattern = format!(
            "{}/*",
            glob::Pattern::escape(&dir.to_string_lossy()).trim_end_matches('/')
        );
        let entries = glob::glob(&pattern).map_err(|e| RcNodeError::Parse {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("[WorkflowLoader] Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !path.is_file() || !has_workflow_extension(&path) {
                continue;
            }

            let id = file_stem(&path);
            let name = match read_definition(&path) {
                Ok(def) => def.name,
                Err(e) => {
                    tracing::warn!("[WorkflowLoader] {}", e);
                    id.clone()
                }
            };
            files.push(WorkflowFile { id, name, path });
        }

        files.sort_by(|a, b| a.id.cmp(&b.id));
        tracing::info!(
            "[WorkflowLoader] Found {} workflow(s) in '{}'",
            files.len(),
            dir.display()
        );
        self.files = files;
        Ok(&self.files)
    }

    /// Load and parse a single workflow file.
    ///
    /// Every call assigns fresh stage ids.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Workflow, RcNodeError> {
        let path = path.as_ref();
        let def = read_definition(path)?;

        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        let stages = def
            .stages
            .into_iter()
            .map(|stage| {
                let mut commands = stage.commands;
                if self.expand_env {
                    for cmd in &mut commands {
                        for param in &mut cmd.params {
                            *param = resolve_env_vars(param);
                        }
                    }
                }
                Stage {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: stage.name,
                    commands,
                    description: stage.description,
                }
            })
            .collect();

        Ok(Workflow {
            id: file_stem(path),
            name: def.name,
            stages,
            created_at: def.created_at.unwrap_or(modified),
            updated_at: def.updated_at.unwrap_or(modified),
        })
    }

    /// Select a workflow by id from the most recent scan.
    ///
    /// Returns `None` when the id is unknown or the file fails to load.
    pub fn select(&self, id: &str) -> Option<Workflow> {
        let Some(file) = self.files.iter().find(|f| f.id == id) else {
            tracing::warn!("[WorkflowLoader] No workflow with id '{}' in last scan", id);
            return None;
        };

        match self.load_file(&file.path) {
            Ok(workflow) => {
                tracing::info!(
                    "[WorkflowLoader] Selected workflow: {} ({})",
                    workflow.id,
                    workflow.name
                );
                Some(workflow)
            }
            Err(e) => {
                tracing::warn!("[WorkflowLoader] Failed to load '{}': {}", id, e);
                None
            }
        }
    }
}

fn has_workflow_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| WORKFLOW_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn read_definition(path: &Path) -> Result<WorkflowDefinition, RcNodeError> {
    let content = std::fs::read_to_string(path).map_err(|source| RcNodeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    WorkflowDefinition::from_yaml(&content).map_err(|message| RcNodeError::Parse {
        path: path.display().to_string(),
        message,
    })
}

/// Resolve environment variable references in a string.
/// Supports `${ENV_VAR}` and `${ENV_VAR:-default}` syntax; unknown variables
/// without a default are left as written.
pub fn resolve_env_vars(input: &str) -> String {
    static ENV_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = ENV_RE.get_or_init(|| {
        regex::Regex::new(r"\$\{([^}]+)\}").expect("env reference pattern is valid")
    });

    re.replace_all(input, |caps: &regex::Captures| {
        let var_expr = &caps[1];
        if let Some(idx) = var_expr.find(":-") {
            let var_name = &var_expr[..idx];
            let default_val = &var_expr[idx + 2..];
            std::env::var(var_name).unwrap_or_else(|_| default_val.to_string())
        } else {
            std::env::var(var_expr).unwrap_or_else(|_| format!("${{{}}}", var_expr))
        }
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECON: &str = r#"
name: "Full Reconstruction"
stages:
  - name: "Alignment"
    commands:
      - command: addFolder
        params: ["${RCNODE_TEST_CAPTURE_DIR:-C:/captures}"]
      - command: align
  - name: "Export"
    commands:
      - command: exportModel
        params: ["C:/out/model.obj"]
"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_scan_directory() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "recon.yaml", RECON);
        write(tmp.path(), "quick.yml", "name: Quick\nstages: []\n");
        write(tmp.path(), "broken.json", "{ not json");
        write(tmp.path(), "notes.txt", "ignored");

        let mut loader = WorkflowLoader::new();
        let files = loader.scan_directory(tmp.path()).unwrap();
        let ids: Vec<_> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["broken", "quick", "recon"]);
        assert_eq!(files[0].name, "broken");
        assert_eq!(files[1].name, "Quick");
        assert_eq!(files[2].name, "Full Reconstruction");
    }

    #[test]
    fn test_scan_missing_directory() {
        let mut loader = WorkflowLoader::new();
        let err = loader.scan_directory("/definitely/not/here").unwrap_err();
        assert!(matches!(err, RcNodeError::NotFound(_)));
    }

    #[test]
    fn test_load_file_assigns_fresh_stage_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "recon.yaml", RECON);
        let loader = WorkflowLoader::new();

        let first = loader.load_file(&path).unwrap();
        let second = loader.load_file(&path).unwrap();
        assert_eq!(first.id, "recon");
        assert_eq!(first.stages.len(), 2);
        assert_eq!(first.total_commands(), Some(3));
        assert_ne!(first.stages[0].id, second.stages[0].id);
        assert_ne!(first.stages[0].id, first.stages[1].id);
        // Params are left verbatim unless expansion is enabled
        assert_eq!(
            first.stages[0].commands[0].params[0],
            "${RCNODE_TEST_CAPTURE_DIR:-C:/captures}"
        );
    }

    #[test]
    fn test_load_file_with_env_expansion() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "recon.yaml", RECON);
        let loader = WorkflowLoader::new().with_env_expansion(true);
        let wf = loader.load_file(&path).unwrap();
        assert_eq!(wf.stages[0].commands[0].params[0], "C:/captures");
    }

    #[test]
    fn test_select() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "recon.yaml", RECON);
        write(tmp.path(), "broken.yaml", "name: [unterminated");

        let mut loader = WorkflowLoader::new();
        loader.scan_directory(tmp.path()).unwrap();

        let wf = loader.select("recon").unwrap();
        assert_eq!(wf.name, "Full Reconstruction");
        assert!(loader.select("broken").is_none());
        assert!(loader.select("missing").is_none());
    }

    #[test]
    fn test_select_after_file_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "recon.yaml", RECON);

        let mut loader = WorkflowLoader::new();
        loader.scan_directory(tmp.path()).unwrap();
        std::fs::remove_file(path).unwrap();
        assert!(loader.select("recon").is_none());
    }

    #[test]
    fn test_resolve_env_vars() {
        std::env::set_var("RCNODE_TEST_EXPORT_DIR", "D:/exports");
        assert_eq!(
            resolve_env_vars("${RCNODE_TEST_EXPORT_DIR}/model.obj"),
            "D:/exports/model.obj"
        );
        assert_eq!(resolve_env_vars("${RCNODE_TEST_UNSET_VAR}"), "${RCNODE_TEST_UNSET_VAR}");
        assert_eq!(resolve_env_vars("${RCNODE_TEST_UNSET_VAR:-fallback}"), "fallback");
        std::env::remove_var("RCNODE_TEST_EXPORT_DIR");
    }
}
