use thiserror::Error;

/// Process-level error: a message plus the exit code `main` should return.
///
/// Exit codes:
/// - 2: input/config problems (missing file or column, bad flags, write failures)
/// - 3: nothing left to work with (no commodity produced a forecast)
/// - 4: model/computation failure
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

/// Failure while fitting or projecting a single commodity series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("insufficient data: need at least {needed} monthly observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("duplicate observation for month {0}")]
    DuplicatePeriod(String),

    #[error("invalid observation for month {month}: {value}")]
    InvalidObservation { month: String, value: f64 },

    #[error("series spans a single day; cannot scale time")]
    ZeroSpan,

    #[error("least-squares system could not be solved")]
    SingularDesign,

    #[error("model produced a non-finite value")]
    NonFinite,

    #[error("invalid forecast configuration: {0}")]
    InvalidConfig(String),
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::InvalidConfig(_) => AppError::new(2, err.to_string()),
            _ => AppError::new(4, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_errors_map_to_exit_codes() {
        let fit: AppError = ForecastError::SingularDesign.into();
        assert_eq!(fit.exit_code(), 4);

        let cfg: AppError = ForecastError::InvalidConfig("horizon must be > 0".to_string()).into();
        assert_eq!(cfg.exit_code(), 2);
        assert!(cfg.message().contains("horizon"));
    }

    #[test]
    fn insufficient_data_message_names_counts() {
        let err = ForecastError::InsufficientData { needed: 12, got: 11 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 12 monthly observations, got 11"
        );
    }
}
