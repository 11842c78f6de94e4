//! Crate-level error type.

use credshare_otp::otp::OtpError;
use thiserror::Error;

/// Convenience alias for fallible operations in this crate.
pub type SessionResult<T> = Result<T, SessionError>;

/// Error raised by the reveal-session engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Rejected session configuration (zero lifetime or tick interval).
    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    /// Failure bubbled up from the one-time code engine.
    #[error(transparent)]
    Otp(#[from] OtpError),
}

impl From<SessionError> for String {
    fn from(e: SessionError) -> String {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_errors_convert() {
        let err: SessionError = OtpError::VerificationMismatch.into();
        assert!(matches!(err, SessionError::Otp(_)));
    }

    #[test]
    fn error_display() {
        let err = SessionError::InvalidConfig("lifetime must be non-zero".into());
        assert!(err.to_string().contains("lifetime must be non-zero"));
    }
}
