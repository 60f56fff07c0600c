//! `rcnode workflow`: list, validate and run RC Node workflows.

use std::path::Path;

use console::style;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use rcnode_core::transport::query_progress;
use rcnode_core::workflow::{
    format_command, progress_channel, NotificationLevel, ProgressEvent, ProgressReport,
    ProgressStatus,
};
use rcnode_core::{WorkflowExecutor, WorkflowLoader};

use super::NodeContext;

/// Options for `rcnode workflow run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub query_progress: bool,
    pub expand_env: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            query_progress: true,
            expand_env: false,
        }
    }
}

/// List the workflows found in a directory.
pub async fn list(dir: &Path) -> Result<(), String> {
    let mut loader = WorkflowLoader::new();
    let files = loader.scan_directory(dir).map_err(|e| e.to_string())?;

    if files.is_empty() {
        println!("No workflows found in '{}'", dir.display());
        return Ok(());
    }

    println!("┌──────────────────────┬──────────────────────────────┐");
    println!("│ ID                   │ Name                         │");
    println!("├──────────────────────┼──────────────────────────────┤");
    for file in files {
        println!(
            "│ {:<20} │ {:<28} │",
            truncate(&file.id, 20),
            truncate(&file.name, 28)
        );
    }
    println!("└──────────────────────┴──────────────────────────────┘");
    Ok(())
}

/// Validate a workflow file without executing it.
pub async fn validate(file: &Path) -> Result<(), String> {
    let workflow = WorkflowLoader::new()
        .load_file(file)
        .map_err(|e| e.to_string())?;

    println!("✅ Workflow '{}' is valid", workflow.name);
    println!("   ID: {}", workflow.id);
    println!("   Stages: {}", workflow.stages.len());
    println!("   Commands: {}", workflow.total_commands().unwrap_or(0));

    for (i, stage) in workflow.stages.iter().enumerate() {
        println!("   {}. {} ({} command(s))", i + 1, stage.name, stage.commands.len());
        for cmd in &stage.commands {
            match &cmd.description {
                Some(desc) => println!("      $ {}  # {}", format_command(cmd), desc),
                None => println!("      $ {}", format_command(cmd)),
            }
        }
    }

    Ok(())
}

/// Run a workflow by id from `dir` against the node.
pub async fn run(ctx: &NodeContext, dir: &Path, id: &str, options: &RunOptions) -> Result<(), String> {
    let mut loader = WorkflowLoader::new().with_env_expansion(options.expand_env);
    loader.scan_directory(dir).map_err(|e| e.to_string())?;
    let workflow = loader.select(id);

    if let Some(ref wf) = workflow {
        println!("📄 Loaded workflow: {} ({})", wf.name, wf.id);
        println!(
            "   {} stage(s), {} command(s)",
            wf.stages.len(),
            wf.total_commands().unwrap_or(0)
        );
        println!();
    }

    // The caller owns the connection flag; check the node before marking it connected.
    let mut config = ctx.config.clone();
    match query_progress(&ctx.client, &config).await {
        Ok(_) => {
            tracing::info!("[rcnode] Connected to node at {}", config.node_url);
            config.is_connected = true;
        }
        Err(e) => {
            tracing::warn!("[rcnode] Node at {} is unreachable: {}", config.node_url, e);
        }
    }

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("[rcnode] Interrupt received, stopping after current command");
                cancel.cancel();
            }
        })
    };

    let executor = WorkflowExecutor::new(&ctx.client)
        .with_progress_query(options.query_progress)
        .with_cancellation(cancel);

    let (observer, mut events) = progress_channel();
    let execution = async {
        let outcome = executor.run(workflow.as_ref(), &config, &observer).await;
        drop(observer);
        outcome
    };
    let printer = async {
        while let Some(event) = events.next().await {
            print_event(&event);
        }
    };
    let (outcome, ()) = tokio::join!(execution, printer);
    ctrl_c.abort();

    println!();
    if !outcome.completed {
        return Err(format!("Workflow '{}' did not complete", id));
    }
    if !outcome.failures.is_empty() {
        let failed: Vec<_> = outcome
            .failures
            .iter()
            .map(|f| format!("{} ({})", f.command, f.stage))
            .collect();
        return Err(format!(
            "Workflow completed with failures. Failed commands: {}",
            failed.join(", ")
        ));
    }

    println!("🎉 Workflow completed successfully! ({} command(s))", outcome.attempted);
    Ok(())
}

fn print_event(event: &ProgressEvent) {
    match event {
        ProgressEvent::Progress(report) => println!("{}", render_report(report)),
        ProgressEvent::Notification(n) => {
            let title = match n.level {
                NotificationLevel::Error => style(&n.title).red().bold(),
                NotificationLevel::Warning => style(&n.title).yellow().bold(),
                NotificationLevel::Success => style(&n.title).green().bold(),
                NotificationLevel::Info => style(&n.title).cyan(),
            };
            println!("   {}: {}", title, n.message);
        }
    }
}

fn render_report(report: &ProgressReport) -> String {
    let percent = format!("[{:>3}%]", report.percent_complete);
    let percent = match report.status {
        ProgressStatus::Error => style(percent).red(),
        ProgressStatus::Completed => style(percent).green(),
        _ => style(percent).dim(),
    };

    let mut line = format!("{} {}", percent, report.current_stage);
    if let Some(ref cmd) = report.current_command {
        line.push_str(&format!(" › {}", cmd));
    }
    if let Some(ref msg) = report.message {
        line.push_str(&format!(" - {}", msg));
    }
    line
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_report() {
        console::set_colors_enabled(false);
        let report = ProgressReport::running("Alignment", Some("align".to_string()), 37)
            .with_message(Some("Aligning".to_string()));
        assert_eq!(render_report(&report), "[ 37%] Alignment › align - Aligning");
        assert_eq!(render_report(&ProgressReport::completed()), "[100%] Completed");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-workflow-id", 8), "a-very-…");
    }
}
