//! # credshare – one-time code engine
//!
//! Time-based one-time code derivation for credential reveal flows:
//!
//! - **Secret decoding** – tolerant base-32 (RFC 4648 alphabet, optional
//!   padding, case-insensitive) with precise rejection of anything else
//! - **RFC 4226 / 6238** – HOTP & TOTP with SHA-1 (default), SHA-256, SHA-512
//! - **Verification** – constant-time comparison across a ±N step drift window
//! - **Generation strategies** – the HMAC path is self-checked once at engine
//!   construction; an explicitly-labeled non-cryptographic fallback exists
//!   behind an opt-in policy and flags every code it produces
//! - **Provisioning** – random secrets, `otpauth://` URIs, enrolment QR codes

pub mod otp;
