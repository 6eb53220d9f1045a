use thiserror::Error;
use valuecast_core::{CoreError, SourceError, SourceErrorKind, ValidationError};
use valuecast_report::ReportError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("command error: {0}")]
    Command(String),

    #[error("strict mode failed: warnings={warning_count}")]
    StrictModeViolation { warning_count: usize },

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::Source(error) => Self::Source(error),
            CoreError::Serialization(error) => Self::Serialization(error),
            CoreError::Csv(error) => Self::Command(format!("historicals csv: {error}")),
            CoreError::Io(error) => Self::Io(error),
        }
    }
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Source(error) if error.kind() == SourceErrorKind::NotFound => 3,
            Self::Source(_) => 4,
            Self::Serialization(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Report(_) => 6,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_errors_split_not_found_from_transport() {
        assert_eq!(CliError::from(SourceError::not_found("AAPL")).exit_code(), 3);
        assert_eq!(CliError::from(SourceError::unavailable("timeout")).exit_code(), 4);
        assert_eq!(CliError::from(SourceError::rate_limited("429")).exit_code(), 4);
    }

    #[test]
    fn core_errors_keep_their_category() {
        let error = CliError::from(CoreError::from(ValidationError::EmptyForecastYears));
        assert!(matches!(error, CliError::Validation(_)));
        assert_eq!(error.exit_code(), 2);
        assert_eq!(CliError::StrictModeViolation { warning_count: 1 }.exit_code(), 5);
        assert_eq!(CliError::Report(ReportError::EmptySheetName).exit_code(), 6);
    }
}
