//! Core error type for the RC Node pipeline.
//!
//! `RcNodeError` is used by the loader and by the executor's internal run
//! loop. Per-command transport failures are reported through
//! [`TransportError`](crate::transport::TransportError) and never abort a run.

#[derive(Debug, thiserror::Error)]
pub enum RcNodeError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse workflow '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Workflow cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}
