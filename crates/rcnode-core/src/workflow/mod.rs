//! Workflow engine: YAML-defined stages of RC Node commands.
//!
//! ```text
//! workflows/*.yaml ──► WorkflowLoader ──► Workflow ──► WorkflowExecutor
//!                                                          │
//!                                          format_command ─┤
//!                                         RcNodeTransport ─┤
//!                                        ProgressObserver ◄┘
//! ```

pub mod executor;
pub mod formatter;
pub mod loader;
pub mod progress;
pub mod schema;

pub use executor::{CommandFailure, ExecutionOutcome, WorkflowExecutor};
pub use formatter::format_command;
pub use loader::{WorkflowFile, WorkflowLoader};
pub use progress::{
    progress_channel, ChannelObserver, NoopObserver, Notification, NotificationLevel,
    ProgressEvent, ProgressObserver, ProgressReport, ProgressStatus,
};
pub use schema::{Command, Stage, Workflow, WorkflowDefinition};
