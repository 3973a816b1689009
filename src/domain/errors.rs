use std::{error::Error, fmt};

/// Fatal pipeline conditions. Both abort the run before any event is processed.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Missing or invalid required field. `row` is the 1-based data row when known.
    MalformedInput { row: Option<usize>, reason: String },
    /// Unusable run parameters (empty margin list, margin outside [0, 1], ...).
    Config(String),
}

impl PipelineError {
    pub(crate) fn malformed(row: usize, reason: impl Into<String>) -> Self {
        PipelineError::MalformedInput {
            row: Some(row),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_file(reason: impl Into<String>) -> Self {
        PipelineError::MalformedInput {
            row: None,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        PipelineError::Config(reason.into())
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::MalformedInput {
                row: Some(row),
                reason,
            } => write!(f, "Malformed input at row {}: {}", row, reason),
            PipelineError::MalformedInput { row: None, reason } => {
                write!(f, "Malformed input: {}", reason)
            }
            PipelineError::Config(reason) => write!(f, "Configuration error: {}", reason),
        }
    }
}

impl Error for PipelineError {}
