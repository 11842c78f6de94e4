//! # credshare – reveal sessions
//!
//! Client-side countdown synchronisation for revealed one-time codes:
//!
//! - **Immediate display** – a code is derived and published at session start
//! - **Boundary-aligned rotation** – the next code appears exactly when the
//!   TOTP step rolls over, not a fixed interval after start
//! - **Bounded reveal** – a one-shot expiry conceals the code after the
//!   session lifetime, independent of step alignment
//! - **Cosmetic ticks** – sub-second countdown refresh that never touches
//!   the rotation schedule
//!
//! All timers are owned by the [`session::RevealSession`] object and die with
//! it; consumers observe the session through a `tokio::sync::watch` channel
//! of [`session::SessionSnapshot`] values.

pub mod session;
