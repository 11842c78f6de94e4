//! Code derivation per RFC 4226 (HOTP) and RFC 6238 (TOTP).
//!
//! Low-level primitives over raw key bytes: HMAC with SHA-1/256/512, the
//! 8-byte big-endian counter message, dynamic truncation, time-step math,
//! and drift-window verification with constant-time comparison. The
//! strategy layer composes these into the public engine.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::otp::error::{OtpError, OtpResult};
use crate::otp::types::{CodeMatch, CodeParams, MacAlgorithm};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw HMAC-OTP (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute an HOTP code for raw key bytes and a counter value.
///
/// The counter is serialised as 8 bytes big-endian; for TOTP it is the
/// time-step from [`time_step_at`]. `digits` must be 1..=9.
pub fn hotp(key: &[u8], counter: u64, digits: u8, algorithm: MacAlgorithm) -> OtpResult<String> {
    let digest = compute_hmac(key, &counter.to_be_bytes(), algorithm)?;
    truncate(&digest, digits)
}

/// Compute HMAC(key, message) with the requested algorithm.
fn compute_hmac(key: &[u8], data: &[u8], algorithm: MacAlgorithm) -> OtpResult<Vec<u8>> {
    match algorithm {
        MacAlgorithm::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key)
                .map_err(|e| OtpError::Generation(format!("HMAC-SHA1 init: {}", e)))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        MacAlgorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key)
                .map_err(|e| OtpError::Generation(format!("HMAC-SHA256 init: {}", e)))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        MacAlgorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key)
                .map_err(|e| OtpError::Generation(format!("HMAC-SHA512 init: {}", e)))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
    }
}

/// Dynamic truncation per RFC 4226 §5.3: the low nibble of the last digest
/// byte selects a 4-byte window, its top bit is masked off, and the result
/// is reduced modulo 10^digits and left-padded with zeros.
fn truncate(digest: &[u8], digits: u8) -> OtpResult<String> {
    if digits == 0 || digits > 9 {
        return Err(OtpError::InvalidParams(format!(
            "digits must be between 1 and 9, got {}",
            digits
        )));
    }
    let last = digest
        .last()
        .ok_or_else(|| OtpError::Generation("empty MAC digest".into()))?;
    let offset = (last & 0x0f) as usize;
    if offset + 4 > digest.len() {
        return Err(OtpError::Generation(format!(
            "MAC digest too short for truncation ({} bytes)",
            digest.len()
        )));
    }
    let binary = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);
    let modulus = 10u32.pow(digits as u32);
    Ok(format!("{:0>width$}", binary % modulus, width = digits as usize))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Time-step math (RFC 6238)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Time-step counter for a unix timestamp: floor(seconds / period).
pub fn time_step_at(unix_seconds: u64, period: u32) -> u64 {
    unix_seconds / period as u64
}

/// Seconds remaining until the step containing `unix_seconds` rolls over.
pub fn seconds_remaining_at(unix_seconds: u64, period: u32) -> u32 {
    let p = period as u64;
    (p - (unix_seconds % p)) as u32
}

/// Fraction of the current step already elapsed (0.0 = fresh).
pub fn progress_fraction_at(unix_seconds: u64, period: u32) -> f64 {
    let elapsed = (unix_seconds % period as u64) as f64;
    elapsed / period as f64
}

/// Current unix timestamp in seconds.
pub(crate) fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Drift-window verification over an arbitrary derivation function.
///
/// Rejects malformed submissions up front (wrong length or non-digits),
/// then walks steps `base - window ..= base + window` comparing in constant
/// time. A miss is `OtpError::VerificationMismatch`.
pub(crate) fn verify_with<F>(
    derive: F,
    submitted: &str,
    unix_seconds: u64,
    drift_window: u32,
    params: &CodeParams,
) -> OtpResult<CodeMatch>
where
    F: Fn(u64) -> OtpResult<String>,
{
    params.validate()?;
    if submitted.len() != params.digits as usize || !submitted.chars().all(|c| c.is_ascii_digit())
    {
        return Err(OtpError::VerificationMismatch);
    }

    let base = time_step_at(unix_seconds, params.period);
    let start = base.saturating_sub(drift_window as u64);
    let end = base + drift_window as u64;

    for step in start..=end {
        let candidate = derive(step)?;
        if constant_time_eq(candidate.as_bytes(), submitted.as_bytes()) {
            return Ok(CodeMatch {
                step,
                drift: step as i64 - base as i64,
            });
        }
    }
    Err(OtpError::VerificationMismatch)
}

/// Verify a submitted code against the HMAC derivation at a timestamp,
/// accepting the reference step and any step within ±`drift_window`.
pub fn verify_at(
    key: &[u8],
    submitted: &str,
    unix_seconds: u64,
    drift_window: u32,
    params: &CodeParams,
) -> OtpResult<CodeMatch> {
    verify_with(
        |step| hotp(key, step, params.digits, params.algorithm),
        submitted,
        unix_seconds,
        drift_window,
        params,
    )
}

/// Constant-time comparison (timing attacks on code verification).
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
