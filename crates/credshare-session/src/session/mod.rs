//! Reveal session: sub-modules.

pub mod types;
pub mod error;
pub mod engine;

// Re-export top-level items for convenience.
pub use engine::RevealSession;
pub use error::{SessionError, SessionResult};
pub use types::*;
