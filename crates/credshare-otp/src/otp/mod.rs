//! One-time code engine: sub-modules.

pub mod types;
pub mod error;
pub mod secret;
pub mod core;
pub mod strategy;
pub mod uri;
pub mod qr;

// Re-export top-level items for convenience.
pub use error::{OtpError, OtpResult};
pub use strategy::{CodeStrategy, FallbackPolicy, OtpEngine};
pub use types::*;
