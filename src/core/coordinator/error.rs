/// Failure taxonomy for coordinator entry points. Preconditions and
/// configuration problems are never retried; stage failures are retried up to
/// the configured cap; timeouts are terminal and kept distinct so front ends
/// can suggest a smaller input instead of a blind retry.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{message}")]
    Precondition { code: &'static str, message: String },

    #[error("stage failed after {attempts} attempt(s): {source}")]
    Stage {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("generation timed out after {elapsed_secs:.1}s (budget {budget_secs}s)")]
    Timeout { elapsed_secs: f64, budget_secs: u64 },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl WorkflowError {
    pub fn precondition(code: &'static str, message: impl Into<String>) -> Self {
        WorkflowError::Precondition {
            code,
            message: message.into(),
        }
    }

    pub fn stage(source: anyhow::Error) -> Self {
        WorkflowError::Stage {
            attempts: 1,
            source,
        }
    }

    /// True for errors the caller can fix by correcting their input.
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            WorkflowError::Precondition { .. } | WorkflowError::Configuration(_)
        )
    }
}
