//! Workflow definition types.
//!
//! A workflow file describes ordered stages of RC Node commands:
//!
//! ```yaml
//! name: "Full Reconstruction"
//! createdAt: 2024-05-01T10:00:00Z   # optional
//! stages:
//!   - name: "Alignment"
//!     description: "Register images"
//!     commands:
//!       - command: addFolder
//!         params: ["C:/captures/session-01"]
//!       - command: align
//!         params: ["--high-detail"]
//!   - name: "Export"
//!     commands:
//!       - command: exportModel
//!         params: ["C:/out/model.obj"]
//!         description: "Write the mesh"
//! ```
//!
//! Stage ids are not part of the file; the loader assigns them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single RC Node command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Command name understood by the node (e.g. "align", "exportModel")
    pub command: String,

    /// Ordered positional parameters
    #[serde(default)]
    pub params: Vec<String>,

    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Command {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            params: Vec::new(),
            description: None,
        }
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named, ordered group of commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub name: String,
    pub commands: Vec<Command>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A loaded workflow, read-only during execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub stages: Vec<Stage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Total number of commands across all stages.
    ///
    /// Returns `None` on overflow.
    pub fn total_commands(&self) -> Option<usize> {
        self.stages
            .iter()
            .try_fold(0usize, |acc, stage| acc.checked_add(stage.commands.len()))
    }
}

/// On-disk shape of a workflow file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    /// Workflow display name
    pub name: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Ordered list of stages
    #[serde(default)]
    pub stages: Vec<StageDefinition>,
}

/// On-disk shape of a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDefinition {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub commands: Vec<Command>,
}

impl WorkflowDefinition {
    /// Parse a workflow definition from a YAML (or JSON) string.
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        let def: Self = serde_yaml::from_str(yaml)
            .map_err(|e| format!("Failed to parse workflow YAML: {}", e))?;
        def.validate()?;
        Ok(def)
    }

    fn validate(&self) -> Result<(), String> {
        for stage in &self.stages {
            for (i, cmd) in stage.commands.iter().enumerate() {
                if cmd.command.trim().is_empty() {
                    return Err(format!(
                        "Stage '{}' command #{} has an empty command name",
                        stage.name,
                        i + 1
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_workflow() {
        let yaml = r#"
name: "Quick Align"
stages:
  - name: "Align"
    commands:
      - command: align
"#;
        let def = WorkflowDefinition::from_yaml(yaml).unwrap();
        assert_eq!(def.name, "Quick Align");
        assert_eq!(def.stages.len(), 1);
        assert_eq!(def.stages[0].commands[0].command, "align");
        assert!(def.stages[0].commands[0].params.is_empty());
        assert!(def.created_at.is_none());
    }

    #[test]
    fn test_parse_full_workflow() {
        let yaml = r#"
name: "Full Reconstruction"
createdAt: 2024-05-01T10:00:00Z
updatedAt: 2024-05-02T10:00:00Z
stages:
  - name: "Alignment"
    description: "Register images"
    commands:
      - command: addFolder
        params: ["C:/captures/session-01"]
      - command: align
        params: ["--high-detail"]
        description: "High detail alignment"
  - name: "Export"
    commands:
      - command: exportModel
        params: ["C:/out/model.obj", "obj"]
"#;
        let def = WorkflowDefinition::from_yaml(yaml).unwrap();
        assert_eq!(def.stages.len(), 2);
        assert_eq!(def.stages[0].description.as_deref(), Some("Register images"));
        assert_eq!(def.stages[0].commands[1].params, vec!["--high-detail"]);
        assert_eq!(
            def.stages[0].commands[1].description.as_deref(),
            Some("High detail alignment")
        );
        assert_eq!(def.stages[1].commands[0].params.len(), 2);
        assert!(def.created_at.unwrap() < def.updated_at.unwrap());
    }

    #[test]
    fn test_parse_json_definition() {
        let json = r#"{"name": "Json Flow", "stages": [{"name": "S", "commands": [{"command": "export"}]}]}"#;
        let def = WorkflowDefinition::from_yaml(json).unwrap();
        assert_eq!(def.name, "Json Flow");
    }

    #[test]
    fn test_reject_empty_command_name() {
        let yaml = r#"
name: "Broken"
stages:
  - name: "Align"
    commands:
      - command: "  "
"#;
        let err = WorkflowDefinition::from_yaml(yaml).unwrap_err();
        assert!(err.contains("empty command name"));
    }

    #[test]
    fn test_total_commands() {
        let now = Utc::now();
        let stage = |n: usize| Stage {
            id: "s".to_string(),
            name: "s".to_string(),
            commands: vec![Command::new("noop"); n],
            description: None,
        };
        let wf = Workflow {
            id: "wf".to_string(),
            name: "wf".to_string(),
            stages: vec![stage(2), stage(0), stage(3)],
            created_at: now,
            updated_at: now,
        };
        assert_eq!(wf.total_commands(), Some(5));
    }
}
