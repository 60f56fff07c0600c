//! Integration tests for the rcnode-cli commands.
//!
//! These tests exercise the same code paths as the binary, using a
//! temporary workflow directory and the simulated node for isolation.

use std::path::Path;

use rcnode_cli::commands::workflow::{self, RunOptions};
use rcnode_cli::commands::{node, workflow_dir, NodeContext};
use rcnode_core::{SimulationConfig, WorkflowLoader};

const RECON: &str = r#"
name: "Full Reconstruction"
stages:
  - name: "Alignment"
    commands:
      - command: addFolder
        params: ["C:/captures/session-01"]
      - command: align
        params: ["--high-detail"]
  - name: "Model"
    commands:
      - command: calculateNormalModel
      - command: calculateTexture
  - name: "Export"
    commands:
      - command: exportModel
        params: ["C:/out/model.obj"]
"#;

fn workflow_fixture() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(tmp.path().join("recon.yaml"), RECON).unwrap();
    std::fs::write(tmp.path().join("empty.yml"), "name: Empty\nstages: []\n").unwrap();
    tmp
}

fn simulated(simulation: SimulationConfig) -> NodeContext {
    NodeContext::new(Some("http://sim.invalid"), Some(""), &simulation)
}

#[tokio::test]
async fn test_workflow_list() {
    let tmp = workflow_fixture();
    std::fs::write(tmp.path().join("broken.yaml"), "stages: [").unwrap();
    workflow::list(tmp.path()).await.expect("list should succeed");

    let mut loader = WorkflowLoader::new();
    let files = loader.scan_directory(tmp.path()).expect("scan should succeed");
    let listed: Vec<(&str, &str)> = files
        .iter()
        .map(|f| (f.id.as_str(), f.name.as_str()))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("broken", "broken"),
            ("empty", "Empty"),
            ("recon", "Full Reconstruction"),
        ]
    );
}

#[tokio::test]
async fn test_workflow_list_missing_dir() {
    let err = workflow::list(Path::new("/no/such/workflows")).await.unwrap_err();
    assert!(err.contains("does not exist"));
}

#[tokio::test]
async fn test_workflow_validate() {
    let tmp = workflow_fixture();
    workflow::validate(&tmp.path().join("recon.yaml"))
        .await
        .expect("validate should succeed");

    let wf = WorkflowLoader::new()
        .load_file(&tmp.path().join("recon.yaml"))
        .expect("recon.yaml should load");
    assert_eq!(wf.id, "recon");
    assert_eq!(wf.stages.len(), 3);
    assert_eq!(wf.total_commands(), Some(5));
    assert_eq!(wf.stages[0].commands[1].to_string(), "align --high-detail");

    std::fs::write(tmp.path().join("bad.yaml"), "name: [oops").unwrap();
    let err = workflow::validate(&tmp.path().join("bad.yaml")).await.unwrap_err();
    assert!(err.contains("bad.yaml"));
}

#[tokio::test]
async fn test_workflow_run_simulated() {
    let tmp = workflow_fixture();
    let ctx = simulated(SimulationConfig::enabled().with_remote_progress(50.0));

    workflow::run(&ctx, tmp.path(), "recon", &RunOptions::default())
        .await
        .expect("simulated run should succeed");
}

#[tokio::test]
async fn test_workflow_run_empty() {
    let tmp = workflow_fixture();
    let ctx = simulated(SimulationConfig::enabled());

    workflow::run(&ctx, tmp.path(), "empty", &RunOptions::default())
        .await
        .expect("empty workflow completes immediately");
}

#[tokio::test]
async fn test_workflow_run_reports_failed_commands() {
    let tmp = workflow_fixture();
    let ctx = simulated(SimulationConfig::enabled().with_failing_command("calculateTexture"));

    let err = workflow::run(&ctx, tmp.path(), "recon", &RunOptions::default())
        .await
        .unwrap_err();
    assert!(err.contains("calculateTexture (Model)"));
}

#[tokio::test]
async fn test_workflow_run_unknown_id() {
    let tmp = workflow_fixture();
    let ctx = simulated(SimulationConfig::enabled());

    let err = workflow::run(&ctx, tmp.path(), "missing", &RunOptions::default())
        .await
        .unwrap_err();
    assert!(err.contains("did not complete"));
}

#[tokio::test]
async fn test_workflow_run_unreachable_node() {
    let tmp = workflow_fixture();
    // the getprogress check fails, so the connection is never marked connected
    let ctx = simulated(SimulationConfig::enabled().with_failing_command("getprogress"));

    let err = workflow::run(&ctx, tmp.path(), "recon", &RunOptions::default())
        .await
        .unwrap_err();
    assert!(err.contains("did not complete"));
}

#[tokio::test]
async fn test_send_and_progress() {
    let ctx = simulated(SimulationConfig::enabled().with_remote_progress(10.0));
    node::send(&ctx, "align", &["--high-detail".to_string()])
        .await
        .expect("send should succeed");
    node::progress(&ctx).await.expect("progress should succeed");

    let failing = simulated(SimulationConfig::enabled().with_failing_command("align"));
    let err = node::send(&failing, "align", &[]).await.unwrap_err();
    assert!(err.contains("align"));
}

#[test]
fn test_node_context_flags_override_env() {
    let sim = SimulationConfig::enabled();

    let ctx = NodeContext::new(Some("http://10.0.0.5:8000"), Some("flag-token"), &sim);
    assert_eq!(ctx.config.node_url, "http://10.0.0.5:8000");
    assert_eq!(ctx.config.auth_token, "flag-token");
    assert!(!ctx.config.is_connected);
    assert!(ctx.client.is_simulated());
}

#[test]
fn test_workflow_dir_prefers_flag() {
    assert_eq!(
        workflow_dir(Some("/srv/workflows")).unwrap(),
        Path::new("/srv/workflows")
    );
}

#[tokio::test]
async fn test_shipped_workflows_are_valid() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../workflows");
    workflow::list(&dir).await.expect("shipped workflow dir should scan");
    for id in ["full-reconstruction", "quick-preview"] {
        workflow::validate(&dir.join(format!("{}.yaml", id)))
            .await
            .expect("shipped workflow should validate");
    }
}
