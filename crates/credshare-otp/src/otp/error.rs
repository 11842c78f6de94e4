//! Crate-level error type.

use thiserror::Error;

/// Convenience alias for fallible operations in this crate.
pub type OtpResult<T> = Result<T, OtpError>;

/// Error raised by the one-time code engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    /// The supplied secret is not valid base-32.
    #[error("invalid base-32 secret: {0}")]
    InvalidEncoding(String),

    /// Code derivation failed (MAC primitive unavailable or unusable).
    #[error("code generation failed: {0}")]
    Generation(String),

    /// The submitted code matched no step inside the drift window.
    #[error("code does not match any step in the drift window")]
    VerificationMismatch,

    /// A malformed `otpauth://` URI.
    #[error("invalid otpauth URI: {0}")]
    InvalidUri(String),

    /// QR rendering failed.
    #[error("QR encode failed: {0}")]
    Qr(String),

    /// Out-of-range code parameters (digits, period).
    #[error("invalid code parameters: {0}")]
    InvalidParams(String),
}

impl From<OtpError> for String {
    fn from(e: OtpError) -> String {
        e.to_string()
    }
}
