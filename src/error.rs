//! Error types.
//!
//! - `MortalityError` is the library-level error returned by the core
//!   (aggregation, forecasting, ingest, cache).
//! - `AppError` is what the binary reports: a message plus a process exit code.
//!
//! Exit codes:
//! - 2: bad input (unknown age band, unreadable file, malformed arguments)
//! - 3: no data for the requested selection
//! - 4: computation or collaborator failure

use thiserror::Error;

use crate::domain::Week;

#[derive(Debug, Error)]
pub enum MortalityError {
    #[error("Unknown age band '{label}'. Use `mortality ages` to list valid codes.")]
    UnknownAgeBand { label: String },

    #[error("At least one age band must be selected.")]
    NoAgeBands,

    #[error("Insufficient history for {subject}: {reason}")]
    InsufficientHistory { subject: String, reason: String },

    #[error("No population data for year {year}.")]
    MissingPopulationData { year: i32 },

    #[error("Growth trend for {week} cannot be normalised (non-positive fitted level).")]
    DegenerateTrend { week: Week },

    #[error("Invalid period '{text}'.")]
    InvalidPeriod { text: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl MortalityError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn insufficient_history(subject: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::InsufficientHistory {
            subject: subject.to_string(),
            reason: reason.into(),
        }
    }

    /// Exit code used when this error reaches the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::UnknownAgeBand { .. }
            | Self::NoAgeBands
            | Self::InvalidPeriod { .. }
            | Self::InvalidInput { .. } => 2,
            Self::InsufficientHistory { .. } | Self::MissingPopulationData { .. } => 3,
            Self::DegenerateTrend { .. } | Self::Cache { .. } | Self::Io(_) | Self::Csv(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<MortalityError> for AppError {
    fn from(err: MortalityError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let err: AppError = MortalityError::UnknownAgeBand {
            label: "Y200-204".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("Y200-204"));

        let err: AppError = MortalityError::MissingPopulationData { year: 2021 }.into();
        assert_eq!(err.exit_code(), 3);
    }
}
