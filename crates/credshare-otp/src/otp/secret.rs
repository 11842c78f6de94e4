//! Base-32 secret codec.
//!
//! Decoding tolerates how secrets circulate in practice: lower-case input is
//! accepted and `=` padding may be present, absent, or misplaced. Padding is
//! stripped, the remaining characters are mapped through the RFC 4648
//! alphabet (`A-Z`, `2-7`) and their 5-bit values are regrouped MSB-first
//! into bytes; a trailing partial byte is discarded. Any character outside
//! the alphabet fails the whole decode with `InvalidEncoding`; there is no
//! best-effort skipping.

use crate::otp::error::{OtpError, OtpResult};

/// Decode a base-32 secret into raw key bytes.
pub fn decode(b32: &str) -> OtpResult<Vec<u8>> {
    let cleaned = b32.to_uppercase();

    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(cleaned.len() * 5 / 8);

    for ch in cleaned.chars() {
        if ch == '=' {
            continue;
        }
        let value = match ch {
            'A'..='Z' => ch as u32 - 'A' as u32,
            '2'..='7' => ch as u32 - '2' as u32 + 26,
            _ => {
                return Err(OtpError::InvalidEncoding(format!(
                    "character {:?} is outside the base-32 alphabet",
                    ch
                )))
            }
        };
        acc = (acc << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
    }

    if out.is_empty() {
        return Err(OtpError::InvalidEncoding(
            "secret decodes to zero bytes".into(),
        ));
    }
    Ok(out)
}

/// Encode raw bytes as base-32 (uppercase, no padding).
pub fn encode(bytes: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, bytes)
}

/// Generate a cryptographically-random base-32 secret of `byte_length` bytes.
pub fn generate(byte_length: usize) -> String {
    use rand::RngCore;
    let mut buf = vec![0u8; byte_length];
    rand::thread_rng().fill_bytes(&mut buf);
    encode(&buf)
}

/// Whether a string decodes to a usable key.
pub fn is_valid(s: &str) -> bool {
    decode(s).is_ok()
}
