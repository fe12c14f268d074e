use std::error::Error;
use std::fmt;
use std::io;

/// Error taxonomy of a pipeline run. Input inconsistencies and invariant
/// violations are fatal and abort the run without marking the current phase
/// complete, so a later phase can never consume a partially written dataset.
#[derive(Debug)]
pub enum PipelineError {
    /// The input contradicts itself, e.g. a preference referencing an item
    /// that the index pass never saw, or a malformed record. Retrying with
    /// the same input cannot succeed.
    InputInconsistency(String),
    /// An upstream stage produced output that breaks a pipeline invariant.
    /// Signals a defect, never expected on a correct run.
    InvariantViolation(String),
    Io(io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::InputInconsistency(reason) => {
                write!(f, "inconsistent input: {}", reason)
            },
            PipelineError::InvariantViolation(reason) => {
                write!(f, "invariant violated: {}", reason)
            },
            PipelineError::Io(cause) => write!(f, "io error: {}", cause),
            PipelineError::Csv(cause) => write!(f, "csv error: {}", cause),
            PipelineError::Json(cause) => write!(f, "json error: {}", cause),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Io(cause) => Some(cause),
            PipelineError::Csv(cause) => Some(cause),
            PipelineError::Json(cause) => Some(cause),
            _ => None,
        }
    }
}

impl From<io::Error> for PipelineError {
    fn from(cause: io::Error) -> Self {
        PipelineError::Io(cause)
    }
}

impl From<csv::Error> for PipelineError {
    fn from(cause: csv::Error) -> Self {
        PipelineError::Csv(cause)
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(cause: serde_json::Error) -> Self {
        PipelineError::Json(cause)
    }
}
