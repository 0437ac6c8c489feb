use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Per-item failure reported by the executor boundary.
///
/// Executors collapse whatever went wrong internally (timeouts, exhausted
/// selector probing, lost sessions) into a single message; none of that
/// detail leaks into the scheduler's contract. The scheduler records the
/// message in a `failed` outcome and moves on.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause for callers that walk error chains;
    /// `Display` stays message-only.
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Arc::new(source));
        self
    }
}
