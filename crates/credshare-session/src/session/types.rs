//! Core types for reveal sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Duration;
use uuid::Uuid;

use crate::session::error::{SessionError, SessionResult};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Session configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Timing knobs for one reveal session.
///
/// The code rotation period itself comes from the engine's `CodeParams`;
/// this only covers how long the reveal lasts and how often the cosmetic
/// countdown refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Total seconds the code may stay revealed.
    pub lifetime_secs: u64,
    /// Cosmetic countdown refresh interval in milliseconds.
    pub tick_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: 60,
            tick_ms: 250,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the reveal lifetime in seconds.
    pub fn with_lifetime_secs(mut self, secs: u64) -> Self {
        self.lifetime_secs = secs;
        self
    }

    /// Builder: set the cosmetic tick interval in milliseconds.
    pub fn with_tick_ms(mut self, ms: u64) -> Self {
        self.tick_ms = ms;
        self
    }

    /// Reject configurations the timers cannot run with.
    pub fn validate(&self) -> SessionResult<()> {
        if self.lifetime_secs == 0 {
            return Err(SessionError::InvalidConfig(
                "lifetime must be at least 1 second".into(),
            ));
        }
        if self.tick_ms == 0 {
            return Err(SessionError::InvalidConfig(
                "tick interval must be at least 1 millisecond".into(),
            ));
        }
        Ok(())
    }

    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Session phase
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Lifecycle phase of a reveal session.
///
/// `Expired` and `Stopped` are terminal; rotation callbacks become no-ops
/// the moment either is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Codes are on display and rotating.
    Active,
    /// The session lifetime elapsed; the code has been concealed.
    Expired,
    /// The session was cancelled by its owner.
    Stopped,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

impl SessionPhase {
    /// Whether the phase allows further code rotation.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Session snapshot
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything a presentation layer needs to draw one frame of the reveal.
///
/// Published through the session's watch channel on every rotation, cosmetic
/// tick and phase change. On a generation error `code` is `None`, the
/// per-step countdown fields read zero, and `error` carries the message;
/// the next rotation retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Owning session.
    pub session_id: Uuid,
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Grouped display form of the current code (e.g. "287 082").
    pub code: Option<String>,
    /// Time-step counter behind the current code.
    pub step: Option<u64>,
    /// Seconds until the current code rotates (0–period).
    pub step_remaining_secs: u32,
    /// Seconds until the session conceals the code (0–lifetime).
    pub session_remaining_secs: u64,
    /// Fraction of the current step elapsed (0.0 = fresh code).
    pub step_progress: f64,
    /// `true` when codes come from the non-cryptographic fallback.
    pub degraded: bool,
    /// Last generation failure, if the current step has no code.
    pub error: Option<String>,
    /// Wall-clock session start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock concealment deadline.
    pub expires_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Channel seed value used before the first code is published.
    pub(crate) fn initial(
        session_id: Uuid,
        degraded: bool,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        lifetime_secs: u64,
    ) -> Self {
        Self {
            session_id,
            phase: SessionPhase::Active,
            code: None,
            step: None,
            step_remaining_secs: 0,
            session_remaining_secs: lifetime_secs,
            step_progress: 0.0,
            degraded,
            error: None,
            started_at,
            expires_at,
        }
    }
}
