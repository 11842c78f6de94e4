//! Core types for the one-time code engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::otp::error::{OtpError, OtpResult};
use crate::otp::secret;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MAC algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm used for HMAC-based code derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MacAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Default for MacAlgorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for MacAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

impl MacAlgorithm {
    /// Parse from a case-insensitive string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Some(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Some(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// URI-safe name for `otpauth://` parameters.
    pub fn uri_name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Code parameters
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Fixed derivation parameters for one secret.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodeParams {
    /// Number of digits in the generated code (typically 6).
    pub digits: u8,
    /// Time-step length in seconds (typically 30).
    pub period: u32,
    /// HMAC hash algorithm.
    pub algorithm: MacAlgorithm,
}

impl Default for CodeParams {
    fn default() -> Self {
        Self {
            digits: 6,
            period: 30,
            algorithm: MacAlgorithm::Sha1,
        }
    }
}

impl CodeParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set digit count.
    pub fn with_digits(mut self, digits: u8) -> Self {
        self.digits = digits;
        self
    }

    /// Builder: set time-step length.
    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    /// Builder: set hash algorithm.
    pub fn with_algorithm(mut self, algorithm: MacAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Reject parameter combinations the derivation cannot honour.
    pub fn validate(&self) -> OtpResult<()> {
        if self.digits == 0 || self.digits > 9 {
            return Err(OtpError::InvalidParams(format!(
                "digits must be between 1 and 9, got {}",
                self.digits
            )));
        }
        if self.period == 0 {
            return Err(OtpError::InvalidParams("period must be at least 1 second".into()));
        }
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Shared secret
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A base-32 encoded shared secret as handed to an operator or end user.
///
/// Construction trims surrounding whitespace but otherwise keeps the text
/// as-is; the strict alphabet check happens in [`SharedSecret::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharedSecret(String);

impl SharedSecret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_string())
    }

    /// Generate a fresh random secret of `byte_length` raw bytes.
    pub fn random(byte_length: usize) -> Self {
        Self(secret::generate(byte_length))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode to raw key bytes.
    pub fn decode(&self) -> OtpResult<Vec<u8>> {
        secret::decode(&self.0)
    }

    /// Whether the text decodes to a usable key.
    pub fn is_valid(&self) -> bool {
        secret::is_valid(&self.0)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generated code
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A derived code plus timing metadata for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimeCode {
    /// The code digits (e.g. "287082").
    pub value: String,
    /// The time-step counter the code was derived from.
    pub step: u64,
    /// Seconds until the step rolls over.
    pub remaining_seconds: u32,
    /// Step length in seconds.
    pub period: u32,
    /// Fraction of the step already elapsed (0.0 = fresh, 1.0 = rolling over).
    pub progress: f64,
    /// `true` when derived by the non-cryptographic fallback strategy.
    pub degraded: bool,
}

impl OneTimeCode {
    /// Presentation form with a space in the middle (e.g. "287 082").
    pub fn grouped(&self) -> String {
        if self.value.len() <= 4 {
            return self.value.clone();
        }
        let mid = self.value.len() / 2;
        format!("{} {}", &self.value[..mid], &self.value[mid..])
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification match
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which step a submitted code matched during drift-window verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMatch {
    /// The matching time-step counter.
    pub step: u64,
    /// Steps away from the reference step (0 = exact, -1 = previous step).
    pub drift: i64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Enrolment
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Provisioning payload handed to an authenticator app: who the secret is
/// for, the secret itself, and the derivation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrolment {
    /// Issuing service (e.g. "CredShare").
    pub issuer: Option<String>,
    /// Account label (e.g. "alice@example.com").
    pub account: String,
    /// Base-32 secret.
    pub secret: SharedSecret,
    /// Derivation parameters.
    pub params: CodeParams,
}

impl Enrolment {
    /// Create an enrolment with default parameters.
    pub fn new(account: impl Into<String>, secret: SharedSecret) -> Self {
        Self {
            issuer: None,
            account: account.into(),
            secret,
            params: CodeParams::default(),
        }
    }

    /// Builder: set issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Builder: set derivation parameters.
    pub fn with_params(mut self, params: CodeParams) -> Self {
        self.params = params;
        self
    }

    /// Display name: "Issuer (account)" or just "account".
    pub fn display_name(&self) -> String {
        match &self.issuer {
            Some(iss) if !iss.is_empty() => format!("{} ({})", iss, self.account),
            _ => self.account.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── MacAlgorithm ─────────────────────────────────────────────

    #[test]
    fn algorithm_default_is_sha1() {
        assert_eq!(MacAlgorithm::default(), MacAlgorithm::Sha1);
    }

    #[test]
    fn algorithm_display() {
        assert_eq!(MacAlgorithm::Sha1.to_string(), "SHA1");
        assert_eq!(MacAlgorithm::Sha256.to_string(), "SHA256");
        assert_eq!(MacAlgorithm::Sha512.to_string(), "SHA512");
    }

    #[test]
    fn algorithm_from_str_loose() {
        assert_eq!(MacAlgorithm::from_str_loose("sha1"), Some(MacAlgorithm::Sha1));
        assert_eq!(MacAlgorithm::from_str_loose("SHA-256"), Some(MacAlgorithm::Sha256));
        assert_eq!(MacAlgorithm::from_str_loose("HMAC-SHA512"), Some(MacAlgorithm::Sha512));
        assert_eq!(MacAlgorithm::from_str_loose("MD5"), None);
    }

    #[test]
    fn algorithm_serde_roundtrip() {
        let algo = MacAlgorithm::Sha256;
        let json = serde_json::to_string(&algo).unwrap();
        assert_eq!(json, "\"SHA256\"");
        let back: MacAlgorithm = serde_json::from_str(&json).unwrap();
        assert_eq!(back, algo);
    }

    // ── CodeParams ───────────────────────────────────────────────

    #[test]
    fn params_defaults() {
        let p = CodeParams::default();
        assert_eq!(p.digits, 6);
        assert_eq!(p.period, 30);
        assert_eq!(p.algorithm, MacAlgorithm::Sha1);
    }

    #[test]
    fn params_builder() {
        let p = CodeParams::new()
            .with_digits(8)
            .with_period(60)
            .with_algorithm(MacAlgorithm::Sha512);
        assert_eq!(p.digits, 8);
        assert_eq!(p.period, 60);
        assert_eq!(p.algorithm, MacAlgorithm::Sha512);
    }

    #[test]
    fn params_validate_ranges() {
        assert!(CodeParams::default().validate().is_ok());
        assert!(CodeParams::new().with_digits(0).validate().is_err());
        assert!(CodeParams::new().with_digits(10).validate().is_err());
        assert!(CodeParams::new().with_period(0).validate().is_err());
    }

    // ── SharedSecret ─────────────────────────────────────────────

    #[test]
    fn secret_trims_surrounding_whitespace() {
        let s = SharedSecret::new("  GEZDGNBVGY3TQOJQ \n");
        assert_eq!(s.as_str(), "GEZDGNBVGY3TQOJQ");
        assert!(s.is_valid());
    }

    #[test]
    fn secret_decode_delegates() {
        let s = SharedSecret::new("GEZDGNBVGY3TQOJQ");
        assert_eq!(s.decode().unwrap(), b"1234567890");
    }

    #[test]
    fn secret_random_decodes_to_requested_length() {
        let s = SharedSecret::random(20);
        assert_eq!(s.decode().unwrap().len(), 20);
    }

    #[test]
    fn secret_serde_is_transparent() {
        let s = SharedSecret::new("JBSWY3DPEHPK3PXP");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"JBSWY3DPEHPK3PXP\"");
    }

    // ── OneTimeCode ──────────────────────────────────────────────

    fn sample_code(value: &str) -> OneTimeCode {
        OneTimeCode {
            value: value.into(),
            step: 1,
            remaining_seconds: 15,
            period: 30,
            progress: 0.5,
            degraded: false,
        }
    }

    #[test]
    fn code_grouped_splits_in_the_middle() {
        assert_eq!(sample_code("287082").grouped(), "287 082");
        assert_eq!(sample_code("12345678").grouped(), "1234 5678");
        assert_eq!(sample_code("1234").grouped(), "1234");
    }

    #[test]
    fn code_serde_roundtrip() {
        let code = sample_code("123456");
        let json = serde_json::to_string(&code).unwrap();
        let back: OneTimeCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value, "123456");
        assert_eq!(back.remaining_seconds, 15);
        assert!(!back.degraded);
    }

    // ── Enrolment ────────────────────────────────────────────────

    #[test]
    fn enrolment_builder_and_display_name() {
        let e = Enrolment::new("alice@example.com", SharedSecret::new("JBSWY3DPEHPK3PXP"))
            .with_issuer("CredShare")
            .with_params(CodeParams::new().with_digits(8));
        assert_eq!(e.display_name(), "CredShare (alice@example.com)");
        assert_eq!(e.params.digits, 8);

        let plain = Enrolment::new("bob", SharedSecret::new("JBSWY3DPEHPK3PXP"));
        assert_eq!(plain.display_name(), "bob");
    }
}
