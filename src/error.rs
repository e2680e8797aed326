use thiserror::Error;

/// Failures surfaced by the core. Every variant is recoverable by the caller.
#[derive(Debug, Error)]
pub(crate) enum CoreError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not enough data: {months} month(s) of history, at least {required} required")]
    InsufficientData { months: usize, required: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt stored data: {0}")]
    Corrupt(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}

impl CoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

pub(crate) type CoreResult<T> = std::result::Result<T, CoreError>;
