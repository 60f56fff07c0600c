//! Workflow Executor: drives a workflow through an RC Node, stage by stage.
//!
//! The executor:
//! 1. Checks preconditions (a workflow is selected, the node is connected)
//! 2. Fixes the total command count for the run
//! 3. Sends each command in definition order, never concurrently
//! 4. Blends coarse command-count progress with the node's own `getprogress`
//! 5. Reports every change to a [`ProgressObserver`]
//!
//! A failing command is reported and the run moves on to the next one. Only
//! errors escaping the run loop (counting overflow, cancellation) end a run
//! early.

use tokio_util::sync::CancellationToken;

use super::formatter::format_command;
use super::progress::{
    Notification, NotificationLevel, ProgressObserver, ProgressReport,
};
use super::schema::{Command, Workflow};
use crate::config::ConnectionConfig;
use crate::error::RcNodeError;
use crate::transport::{positional_params, query_progress, RcNodeTransport};

/// A command that failed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub stage: String,
    /// Formatted command line
    pub command: String,
    pub error: String,
}

/// Result of executing a workflow.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    /// The run reached the final `completed` report
    pub completed: bool,
    /// Commands sent to the node, successful or not
    pub attempted: usize,
    pub failures: Vec<CommandFailure>,
}

impl ExecutionOutcome {
    pub fn is_clean(&self) -> bool {
        self.completed && self.failures.is_empty()
    }
}

/// The workflow executor engine.
pub struct WorkflowExecutor<T> {
    transport: T,
    /// Poll `getprogress` after each successful command
    query_progress: bool,
    cancel: Option<CancellationToken>,
}

/// Per-run bookkeeping. Lives for exactly one `run` call.
struct RunState<'a> {
    observer: &'a dyn ProgressObserver,
    total: usize,
    completed: usize,
    last_percent: u8,
    current_stage: String,
    current_command: Option<String>,
    outcome: ExecutionOutcome,
}

impl<'a> RunState<'a> {
    fn new(observer: &'a dyn ProgressObserver) -> Self {
        Self {
            observer,
            total: 0,
            completed: 0,
            last_percent: 0,
            current_stage: String::new(),
            current_command: None,
            outcome: ExecutionOutcome::default(),
        }
    }

    /// `floor(completed / total * 100)`
    fn coarse_percent(&self) -> Result<u8, RcNodeError> {
        if self.total == 0 {
            return Ok(100);
        }
        let scaled = self
            .completed
            .checked_mul(100)
            .ok_or_else(|| RcNodeError::Internal("progress overflow".to_string()))?;
        Ok((scaled / self.total).min(100) as u8)
    }

    /// Coarse progress refined by the node's own progress for the running
    /// command: `min(100, coarse + floor(remote / total))`.
    fn refined_percent(&self, remote: f64) -> Result<u8, RcNodeError> {
        let coarse = self.coarse_percent()?;
        if self.total == 0 {
            return Ok(coarse);
        }
        let remote = if remote.is_finite() { remote.clamp(0.0, 100.0) } else { 0.0 };
        let share = (remote / self.total as f64).floor() as u64;
        Ok((coarse as u64 + share).min(100) as u8)
    }

    fn emit(&mut self, mut report: ProgressReport) {
        report.percent_complete = report.percent_complete.max(self.last_percent);
        self.last_percent = report.percent_complete;
        self.observer.on_progress(report);
    }

    fn notify(&self, level: NotificationLevel, title: &str, message: impl Into<String>) {
        self.observer
            .on_notification(Notification::new(level, title, message));
    }
}

impl<T: RcNodeTransport> WorkflowExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            query_progress: true,
            cancel: None,
        }
    }

    /// Enable or disable the `getprogress` poll after each command.
    pub fn with_progress_query(mut self, enabled: bool) -> Self {
        self.query_progress = enabled;
        self
    }

    /// Stop the run before the next command once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute a workflow, returning whether it ran to completion.
    pub async fn execute(
        &self,
        workflow: Option<&Workflow>,
        config: &ConnectionConfig,
        observer: &dyn ProgressObserver,
    ) -> bool {
        self.run(workflow, config, observer).await.completed
    }

    /// Execute a workflow and return the detailed outcome.
    pub async fn run(
        &self,
        workflow: Option<&Workflow>,
        config: &ConnectionConfig,
        observer: &dyn ProgressObserver,
    ) -> ExecutionOutcome {
        let mut state = RunState::new(observer);

        let Some(workflow) = workflow else {
            precondition_failed(&mut state, "No workflow selected");
            return state.outcome;
        };
        if !config.is_connected {
            precondition_failed(&mut state, "Not connected to RC Node");
            return state.outcome;
        }

        tracing::info!(
            "[WorkflowExecutor] Starting workflow '{}' ({} stage(s))",
            workflow.name,
            workflow.stages.len()
        );
        state.notify(
            NotificationLevel::Info,
            "Workflow started",
            format!("Running '{}'", workflow.name),
        );

        match self.run_stages(workflow, config, &mut state).await {
            Ok(()) => {
                let failed = state.outcome.failures.len();
                let message = (failed > 0)
                    .then(|| format!("Completed with {} failed command(s)", failed));
                state.emit(ProgressReport::completed().with_message(message));
                state.outcome.completed = true;

                if failed == 0 {
                    tracing::info!("[WorkflowExecutor] Workflow '{}' completed", workflow.name);
                    state.notify(
                        NotificationLevel::Success,
                        "Workflow completed",
                        format!("'{}' finished", workflow.name),
                    );
                } else {
                    tracing::warn!(
                        "[WorkflowExecutor] Workflow '{}' completed with {} failed command(s)",
                        workflow.name,
                        failed
                    );
                    state.notify(
                        NotificationLevel::Warning,
                        "Workflow completed with errors",
                        format!("'{}' finished, {} command(s) failed", workflow.name, failed),
                    );
                }
            }
            Err(e) => {
                tracing::error!("[WorkflowExecutor] Workflow '{}' aborted: {}", workflow.name, e);
                let percent = state.coarse_percent().unwrap_or(state.last_percent);
                let stage = state.current_stage.clone();
                let command = state.current_command.clone();
                state.emit(ProgressReport::error(&stage, command, percent, e.to_string()));
                state.notify(NotificationLevel::Error, "Workflow failed", e.to_string());
            }
        }

        state.outcome
    }

    async fn run_stages(
        &self,
        workflow: &Workflow,
        config: &ConnectionConfig,
        state: &mut RunState<'_>,
    ) -> Result<(), RcNodeError> {
        state.total = workflow
            .total_commands()
            .ok_or_else(|| RcNodeError::Internal("command count overflow".to_string()))?;
        if state.total == 0 {
            return Ok(());
        }

        for (i, stage) in workflow.stages.iter().enumerate() {
            tracing::info!(
                "[WorkflowExecutor] Stage {}/{}: {}",
                i + 1,
                workflow.stages.len(),
                stage.name
            );
            state.current_stage = stage.name.clone();
            state.current_command = None;
            let percent = state.coarse_percent()?;
            state.emit(ProgressReport::running(&stage.name, None, percent));

            for command in &stage.commands {
                self.check_cancelled()?;
                self.run_command(&stage.name, command, config, state).await?;
                state.completed += 1;
            }
        }

        Ok(())
    }

    async fn run_command(
        &self,
        stage: &str,
        command: &Command,
        config: &ConnectionConfig,
        state: &mut RunState<'_>,
    ) -> Result<(), RcNodeError> {
        let line = format_command(command);
        tracing::info!("[WorkflowExecutor]   → {}", line);

        state.current_command = Some(command.command.clone());
        state.outcome.attempted += 1;
        let percent = state.coarse_percent()?;
        state.emit(ProgressReport::running(
            stage,
            state.current_command.clone(),
            percent,
        ));

        let params = positional_params(&command.params);
        if let Err(e) = self.transport.send(config, &command.command, &params).await {
            let message = format!("Command '{}' failed: {}", line, e);
            tracing::warn!("[WorkflowExecutor] {}", message);
            state.emit(ProgressReport::error(
                stage,
                state.current_command.clone(),
                percent,
                message.clone(),
            ));
            state.notify(NotificationLevel::Error, "Command failed", message);
            state.outcome.failures.push(CommandFailure {
                stage: stage.to_string(),
                command: line,
                error: e.to_string(),
            });
            return Ok(());
        }

        if !self.query_progress {
            return Ok(());
        }

        match query_progress(&self.transport, config).await {
            Ok(Some(remote)) => {
                let refined = state.refined_percent(remote.progress)?;
                tracing::debug!(
                    "[WorkflowExecutor] Node progress {} → {}%",
                    remote.progress,
                    refined
                );
                state.emit(
                    ProgressReport::running(stage, state.current_command.clone(), refined)
                        .with_message(remote.message),
                );
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!("[WorkflowExecutor] Progress query failed: {}", e);
            }
        }

        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), RcNodeError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(RcNodeError::Cancelled),
            _ => Ok(()),
        }
    }
}

fn precondition_failed(state: &mut RunState<'_>, message: &str) {
    tracing::warn!("[WorkflowExecutor] Cannot start workflow: {}", message);
    state.emit(ProgressReport::error("", None, 0, message));
    state.notify(NotificationLevel::Error, "Cannot start workflow", message);
}
