//! Shared-credential one-time code tool.
//!
//! Functionality is split across two library crates plus this shell:
//! [`credshare_otp`] covers secret decoding, HOTP/TOTP derivation,
//! drift-window verification and provisioning, while
//! [`credshare_session`] drives bounded reveal sessions on tokio timers.
//! The shell adds the YAML configuration layer, terminal rendering and
//! the command-line front end.

pub mod config;
pub mod render;

pub use credshare_otp::otp;
pub use credshare_session::session;
