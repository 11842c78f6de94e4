//! Code-derivation strategies and the engine façade.
//!
//! An [`OtpEngine`] binds fixed [`CodeParams`] to exactly one derivation
//! strategy, chosen when the engine is constructed: the HMAC path when a
//! one-shot self-check against a known RFC 6238 vector passes, otherwise a
//! clearly-labeled non-cryptographic fallback, and that only when policy
//! permits. Per-call code paths never branch between the two, and every
//! fallback-derived code carries `degraded = true`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::otp::core;
use crate::otp::error::{OtpError, OtpResult};
use crate::otp::types::{CodeMatch, CodeParams, MacAlgorithm, OneTimeCode};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Strategy trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One way of deriving a fixed-length decimal code from key + counter.
pub trait CodeStrategy: Send + Sync {
    /// Short identifier for logs and status output.
    fn name(&self) -> &'static str;

    /// `true` when codes from this strategy carry no cryptographic weight.
    fn degraded(&self) -> bool;

    /// Derive the code for one counter value.
    fn derive(&self, key: &[u8], counter: u64, params: &CodeParams) -> OtpResult<String>;
}

/// RFC 4226/6238 derivation via HMAC.
pub struct HmacStrategy;

impl CodeStrategy for HmacStrategy {
    fn name(&self) -> &'static str {
        "hmac"
    }

    fn degraded(&self) -> bool {
        false
    }

    fn derive(&self, key: &[u8], counter: u64, params: &CodeParams) -> OtpResult<String> {
        core::hotp(key, counter, params.digits, params.algorithm)
    }
}

/// Non-cryptographic stand-in for hosts without working MAC primitives.
///
/// Derives codes from a DJB2-style hash over the key bytes followed by the
/// 8-byte big-endian counter, masked to 31 bits and reduced modulo
/// 10^digits. Codes are deterministic and step-aligned but will not verify
/// against a real TOTP server; [`CodeStrategy::degraded`] reports `true`.
pub struct InsecureFallbackStrategy;

impl CodeStrategy for InsecureFallbackStrategy {
    fn name(&self) -> &'static str {
        "insecure-fallback"
    }

    fn degraded(&self) -> bool {
        true
    }

    fn derive(&self, key: &[u8], counter: u64, params: &CodeParams) -> OtpResult<String> {
        if params.digits == 0 || params.digits > 9 {
            return Err(OtpError::InvalidParams(format!(
                "digits must be between 1 and 9, got {}",
                params.digits
            )));
        }
        let mut h: u32 = 5381;
        for &b in key {
            h = h.wrapping_mul(33) ^ b as u32;
        }
        for b in counter.to_be_bytes() {
            h = h.wrapping_mul(33) ^ b as u32;
        }
        let modulus = 10u32.pow(params.digits as u32);
        Ok(format!(
            "{:0>width$}",
            (h & 0x7fff_ffff) % modulus,
            width = params.digits as usize
        ))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Fallback policy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Whether the engine may fall back to the non-cryptographic strategy when
/// the MAC self-check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Fail engine construction outright.
    Deny,
    /// Select the degraded strategy, with a warning and flagged output.
    Allow,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::Deny
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Fixed parameters plus the derivation strategy selected at construction.
pub struct OtpEngine {
    params: CodeParams,
    strategy: Box<dyn CodeStrategy>,
}

impl fmt::Debug for OtpEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpEngine")
            .field("params", &self.params)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

impl OtpEngine {
    /// Build an engine, running the MAC self-check exactly once.
    pub fn new(params: CodeParams, policy: FallbackPolicy) -> OtpResult<Self> {
        Self::build(params, policy, mac_self_check())
    }

    fn build(params: CodeParams, policy: FallbackPolicy, mac_ok: bool) -> OtpResult<Self> {
        params.validate()?;
        if mac_ok {
            debug!(algorithm = %params.algorithm, "MAC self-check passed, using HMAC derivation");
            return Ok(Self {
                params,
                strategy: Box::new(HmacStrategy),
            });
        }
        match policy {
            FallbackPolicy::Deny => Err(OtpError::Generation(
                "MAC self-check failed and the non-cryptographic fallback is not permitted".into(),
            )),
            FallbackPolicy::Allow => {
                warn!("MAC self-check failed; switching to non-cryptographic fallback, all codes flagged degraded");
                Ok(Self {
                    params,
                    strategy: Box::new(InsecureFallbackStrategy),
                })
            }
        }
    }

    /// Build with an explicit strategy, skipping the self-check.
    pub fn with_strategy(params: CodeParams, strategy: Box<dyn CodeStrategy>) -> OtpResult<Self> {
        params.validate()?;
        Ok(Self { params, strategy })
    }

    pub fn params(&self) -> &CodeParams {
        &self.params
    }

    /// `true` when the engine derives non-cryptographic codes.
    pub fn degraded(&self) -> bool {
        self.strategy.degraded()
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Derive the code and timing metadata for an explicit timestamp.
    pub fn generate_at(&self, key: &[u8], unix_seconds: u64) -> OtpResult<OneTimeCode> {
        let step = core::time_step_at(unix_seconds, self.params.period);
        let value = self.strategy.derive(key, step, &self.params)?;
        Ok(OneTimeCode {
            value,
            step,
            remaining_seconds: core::seconds_remaining_at(unix_seconds, self.params.period),
            period: self.params.period,
            progress: core::progress_fraction_at(unix_seconds, self.params.period),
            degraded: self.strategy.degraded(),
        })
    }

    /// Derive the code for the current wall-clock time.
    pub fn generate_now(&self, key: &[u8]) -> OtpResult<OneTimeCode> {
        self.generate_at(key, core::current_unix_time())
    }

    /// Verify a submitted code at an explicit timestamp, accepting any step
    /// within ±`drift_window` of the reference step.
    pub fn verify_at(
        &self,
        key: &[u8],
        submitted: &str,
        unix_seconds: u64,
        drift_window: u32,
    ) -> OtpResult<CodeMatch> {
        core::verify_with(
            |step| self.strategy.derive(key, step, &self.params),
            submitted,
            unix_seconds,
            drift_window,
            &self.params,
        )
    }

    /// Verify against the current wall-clock time.
    pub fn verify_now(&self, key: &[u8], submitted: &str, drift_window: u32) -> OtpResult<CodeMatch> {
        self.verify_at(key, submitted, core::current_unix_time(), drift_window)
    }
}

/// One-shot MAC availability probe: derive a known RFC 6238 vector and
/// compare against its published value.
fn mac_self_check() -> bool {
    const KEY: &[u8; 20] = b"12345678901234567890";
    matches!(
        core::hotp(KEY, 1, 8, MacAlgorithm::Sha1).as_deref(),
        Ok("94287082")
    )
}
