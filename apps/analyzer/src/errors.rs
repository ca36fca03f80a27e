use thiserror::Error;

/// Input rejected before submission. Recovered locally: the user edits the draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Resume is too short ({length} characters after trimming)")]
    TooShort { length: usize },

    #[error("Text does not look like a resume ({found} section keywords found)")]
    NotResumeLike { found: usize },
}

impl ValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::TooShort { .. } => format!(
                "Your resume looks too short. Please paste at least {} characters.",
                crate::validation::MIN_RESUME_CHARS
            ),
            ValidationError::NotResumeLike { .. } => {
                "This doesn't look like a resume. Include sections such as Experience, Education or Skills."
                    .to_string()
            }
        }
    }
}

/// Failure of a single call to the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("HTTP error (status {0})")]
    HttpStatus(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RequestError {
    pub fn user_message(&self) -> String {
        match self {
            RequestError::HttpStatus(code) => {
                format!("Failed to get analysis. Please try again. (HTTP error! Status: {code})")
            }
            RequestError::Transport(_) => {
                "Could not reach the analysis service. Check your connection and try again."
                    .to_string()
            }
            RequestError::InvalidResponse(_) => {
                "The analysis service returned an unexpected response. Please try again."
                    .to_string()
            }
        }
    }
}

/// Local persistence is unavailable. Never surfaced to the user; the session
/// store degrades to memory-only operation instead.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a submit action was not started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("An analysis is already in progress")]
    Busy,
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Validation(e) => e.user_message(),
            SubmitError::Busy => "Please wait for the current analysis to finish.".to_string(),
        }
    }
}
