//! Error types.
//!
//! Two layers:
//!
//! - [`FitError`]: why the calibration fitter could not produce a line. These are
//!   *degraded states*, not failures: downstream steps render explicit markers.
//! - [`AppError`]: shell failures (file IO, CSV schema, terminal) carrying the
//!   process exit code used by `main`.

use serde::Serialize;

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

/// Why a calibration line could not be fitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitError {
    /// Fewer than two points, or fewer than two distinct concentrations, in range.
    InsufficientData { points: usize, distinct: usize },
    /// Range bounds are reversed or not finite.
    InvalidRange { start: f64, end: f64 },
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::InsufficientData { points, distinct } => write!(
                f,
                "insufficient data: {points} point(s) with {distinct} distinct concentration(s) in range (need at least 2 distinct)"
            ),
            FitError::InvalidRange { start, end } => {
                write!(f, "invalid fit range [{start}, {end}]: start must not exceed end")
            }
        }
    }
}

impl std::error::Error for FitError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_error_messages_name_the_blocking_condition() {
        let e = FitError::InsufficientData { points: 1, distinct: 1 };
        assert!(e.to_string().starts_with("insufficient data"));

        let e = FitError::InvalidRange { start: 5.0, end: 1.0 };
        assert!(e.to_string().contains("[5, 1]"));
    }

    #[test]
    fn app_error_keeps_exit_code() {
        let e = AppError::new(3, "no rows");
        assert_eq!(e.exit_code(), 3);
        assert_eq!(e.to_string(), "no rows");
    }
}
