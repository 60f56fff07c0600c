//! RC Node Core: workflow execution against a Reality Capture Node.
//!
//! This crate contains the processing pipeline that sits behind the
//! capture rig's control panel: workflow definitions, the node transport,
//! and the progress-tracking executor. It has **no CLI or UI dependency**,
//! making it suitable for use in:
//!
//! - the `rcnode` command-line tool (via `rcnode-cli`)
//! - desktop or web front ends that observe progress reports
//! - test harnesses that drive a simulated node
//!
//! # Architecture
//!
//! ```text
//! workflows/*.yaml ──► WorkflowLoader ──► Workflow
//!                                            │
//!                                     WorkflowExecutor ──► ProgressObserver
//!                                            │
//!                                   RcNodeTransport (HTTP / simulated)
//!                                            │
//!                                        RC Node
//! ```

pub mod config;
pub mod error;
pub mod transport;
pub mod workflow;

// Convenience re-exports
pub use config::{ConnectionConfig, SimulationConfig};
pub use error::RcNodeError;
pub use transport::{HttpTransport, NodeClient, RcNodeTransport, SimulatedTransport, TransportError};
pub use workflow::{
    ExecutionOutcome, ProgressObserver, ProgressReport, ProgressStatus, Workflow, WorkflowExecutor,
    WorkflowLoader,
};
