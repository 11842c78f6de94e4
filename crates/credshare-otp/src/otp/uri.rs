//! `otpauth://` URI parsing and generation per the Google Authenticator
//! key-URI format:
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//!
//! Format: `otpauth://totp/ISSUER:ACCOUNT?secret=BASE32&issuer=ISSUER&algorithm=SHA1&digits=6&period=30`
//!
//! Only the `totp` type is supported; counter-based URIs are rejected.

use crate::otp::error::{OtpError, OtpResult};
use crate::otp::types::{CodeParams, Enrolment, MacAlgorithm, SharedSecret};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse an `otpauth://totp/...` URI into an [`Enrolment`].
///
/// Unknown query parameters are ignored; out-of-range `digits`/`period`
/// values fall back to the defaults rather than failing the parse.
pub fn parse_otpauth(uri: &str) -> OtpResult<Enrolment> {
    let url = url::Url::parse(uri)
        .map_err(|e| OtpError::InvalidUri(format!("not a URI: {}", e)))?;

    if url.scheme() != "otpauth" {
        return Err(OtpError::InvalidUri(format!(
            "expected scheme 'otpauth', got '{}'",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some("totp") => {}
        other => {
            return Err(OtpError::InvalidUri(format!(
                "unsupported OTP type {:?}, only 'totp' is handled",
                other
            )))
        }
    }

    // Path is "/ACCOUNT" or "/ISSUER:ACCOUNT", percent-encoded.
    let path = url.path();
    let path = percent_decode(path.strip_prefix('/').unwrap_or(path));

    let (path_issuer, account) = match path.find(':') {
        Some(pos) => (
            Some(path[..pos].trim().to_string()),
            path[pos + 1..].trim().to_string(),
        ),
        None => (None, path.trim().to_string()),
    };

    let mut secret = None;
    let mut param_issuer = None;
    let mut params = CodeParams::default();

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "secret" => secret = Some(value.to_string()),
            "issuer" => param_issuer = Some(value.to_string()),
            "algorithm" => {
                if let Some(algo) = MacAlgorithm::from_str_loose(&value) {
                    params.algorithm = algo;
                }
            }
            "digits" => {
                if let Ok(d) = value.parse::<u8>() {
                    if (6..=8).contains(&d) {
                        params.digits = d;
                    }
                }
            }
            "period" => {
                if let Ok(p) = value.parse::<u32>() {
                    if p > 0 {
                        params.period = p;
                    }
                }
            }
            _ => {} // ignore unknown params
        }
    }

    let secret = secret
        .ok_or_else(|| OtpError::InvalidUri("missing 'secret' parameter".into()))?;

    // Prefer issuer from the query param, then from the path prefix.
    let mut enrolment =
        Enrolment::new(account, SharedSecret::new(secret)).with_params(params);
    if let Some(iss) = param_issuer.or(path_issuer) {
        enrolment = enrolment.with_issuer(iss);
    }
    Ok(enrolment)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build an `otpauth://totp/...` URI from an [`Enrolment`].
///
/// Parameters that match the authenticator defaults (SHA1, 6 digits, 30 s
/// period) are omitted.
pub fn build_otpauth(enrolment: &Enrolment) -> String {
    let account = percent_encode(&enrolment.account);
    let path = match &enrolment.issuer {
        Some(iss) if !iss.is_empty() => format!("{}:{}", percent_encode(iss), account),
        _ => account,
    };

    let mut query = vec![format!("secret={}", enrolment.secret.as_str())];
    if let Some(ref iss) = enrolment.issuer {
        query.push(format!("issuer={}", percent_encode(iss)));
    }
    if enrolment.params.algorithm != MacAlgorithm::Sha1 {
        query.push(format!("algorithm={}", enrolment.params.algorithm.uri_name()));
    }
    if enrolment.params.digits != 6 {
        query.push(format!("digits={}", enrolment.params.digits));
    }
    if enrolment.params.period != 30 {
        query.push(format!("period={}", enrolment.params.period));
    }

    format!("otpauth://totp/{}?{}", path, query.join("&"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Percent-encoding helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn percent_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut iter = s.bytes();
    while let Some(b) = iter.next() {
        match b {
            b'%' => {
                let hi = iter.next();
                let lo = iter.next();
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        let hex = [hi, lo];
                        match u8::from_str_radix(std::str::from_utf8(&hex).unwrap_or(""), 16) {
                            Ok(v) => bytes.push(v),
                            Err(_) => {
                                bytes.push(b'%');
                                bytes.extend_from_slice(&hex);
                            }
                        }
                    }
                    _ => bytes.push(b'%'),
                }
            }
            b'+' => bytes.push(b' '),
            other => bytes.push(other),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
