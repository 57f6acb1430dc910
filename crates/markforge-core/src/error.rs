use crate::mark::MarkId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MppError {
    /// The energy oracle could not score a proposal. The proposal is dropped
    /// and the run carries on.
    #[error("Calculation Error: {0}")]
    Calculation(String),

    /// Shared state (partition or configuration) no longer agrees with itself.
    #[error("Abnormal Failure: {reason}{}", mark_suffix(.mark))]
    Abnormal {
        reason: String,
        mark: Option<MarkId>,
    },

    #[error("Misconfigured Kernel '{kernel}': {reason}")]
    MisconfiguredKernel { kernel: String, reason: String },

    #[error("Run aborted at iteration {iteration} in kernel '{kernel}': {source}")]
    Aborted {
        iteration: usize,
        kernel: String,
        #[source]
        source: Box<MppError>,
    },

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
}

impl MppError {
    pub fn abnormal(reason: impl Into<String>) -> Self {
        MppError::Abnormal {
            reason: reason.into(),
            mark: None,
        }
    }

    pub fn abnormal_mark(reason: impl Into<String>, mark: MarkId) -> Self {
        MppError::Abnormal {
            reason: reason.into(),
            mark: Some(mark),
        }
    }

    pub fn misconfigured(kernel: impl Into<String>, reason: impl Into<String>) -> Self {
        MppError::MisconfiguredKernel {
            kernel: kernel.into(),
            reason: reason.into(),
        }
    }

    /// Recoverable failures are absorbed at the kernel boundary; everything
    /// else stops the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MppError::Calculation(_))
    }

    pub(crate) fn during(self, iteration: usize, kernel: &str) -> Self {
        match self {
            already @ MppError::Aborted { .. } => already,
            other => MppError::Aborted {
                iteration,
                kernel: kernel.to_string(),
                source: Box::new(other),
            },
        }
    }
}

fn mark_suffix(mark: &Option<MarkId>) -> String {
    match mark {
        Some(id) => format!(" (mark {})", id),
        None => String::new(),
    }
}

pub type MppResult<T> = Result<T, MppError>;
