//! The reveal-session engine.
//!
//! A [`RevealSession`] keeps one code on display for a bounded window.
//! Rotation runs on a timer aligned to step boundaries, and a one-shot
//! expiry timer conceals the code when the session lifetime elapses. A
//! third task republishes cosmetic countdown fields between rotations.
//! Every timer callback checks the shared phase first, so an expired or
//! stopped session never revives its code.
//!
//! Code derivation uses an anchored clock: the unix time captured at start
//! plus monotonic elapsed time since. Wall-clock adjustments made while a
//! session is open do not shift its step boundaries.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, sleep_until, Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use credshare_otp::otp::{core, OneTimeCode, OtpEngine, SharedSecret};

use crate::session::error::SessionResult;
use crate::session::types::{SessionConfig, SessionPhase, SessionSnapshot};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Shared state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Mutable session state behind the phase guard.
#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    current: Option<OneTimeCode>,
    last_error: Option<String>,
}

/// Everything the timer tasks share with the session handle.
struct SessionShared {
    id: Uuid,
    engine: OtpEngine,
    key: Vec<u8>,
    config: SessionConfig,
    /// Unix milliseconds captured when the session started.
    anchor_unix_ms: u64,
    /// Monotonic instant paired with the anchor.
    started_at: Instant,
    started_wall: DateTime<Utc>,
    expires_wall: DateTime<Utc>,
    state: Mutex<SessionState>,
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionShared {
    /// Anchored unix milliseconds: start time plus monotonic elapsed.
    fn now_unix_ms(&self) -> u64 {
        self.anchor_unix_ms + self.started_at.elapsed().as_millis() as u64
    }

    /// Derive the code for the current step and publish it.
    ///
    /// Returns `false` once the session is in a terminal phase; callers in
    /// timer loops use that to exit.
    async fn regenerate(&self) -> bool {
        let mut state = self.state.lock().await;
        if !state.phase.is_active() {
            return false;
        }
        let now_secs = self.now_unix_ms() / 1000;
        match self.engine.generate_at(&self.key, now_secs) {
            Ok(code) => {
                debug!(session = %self.id, step = code.step, "rotated one-time code");
                state.current = Some(code);
                state.last_error = None;
            }
            Err(err) => {
                warn!(
                    session = %self.id,
                    error = %err,
                    "code generation failed, will retry at the next step boundary"
                );
                state.current = None;
                state.last_error = Some(err.to_string());
            }
        }
        self.publish(&state);
        true
    }

    /// One-shot lifetime expiry: conceal the code and freeze the session.
    async fn expire(&self) {
        let mut state = self.state.lock().await;
        if !state.phase.is_active() {
            return;
        }
        state.phase = SessionPhase::Expired;
        state.current = None;
        state.last_error = None;
        info!(session = %self.id, "reveal session expired, code concealed");
        self.publish(&state);
    }

    /// Republish countdown fields without touching the code.
    ///
    /// Returns `false` once the session is in a terminal phase.
    async fn refresh_countdown(&self) -> bool {
        let state = self.state.lock().await;
        if !state.phase.is_active() {
            return false;
        }
        self.publish(&state);
        true
    }

    fn publish(&self, state: &SessionState) {
        self.tx.send_replace(self.snapshot_from(state));
    }

    fn snapshot_from(&self, state: &SessionState) -> SessionSnapshot {
        let now_secs = self.now_unix_ms() / 1000;
        let period = self.engine.params().period;
        let (code, step, step_remaining_secs, step_progress) = match (state.phase, &state.current) {
            (SessionPhase::Active, Some(code)) => (
                Some(code.grouped()),
                Some(code.step),
                core::seconds_remaining_at(now_secs, period),
                core::progress_fraction_at(now_secs, period),
            ),
            _ => (None, None, 0, 0.0),
        };
        let session_remaining_secs = if state.phase.is_active() {
            self.config
                .lifetime()
                .checked_sub(self.started_at.elapsed())
                .unwrap_or_default()
                .as_secs()
        } else {
            0
        };
        SessionSnapshot {
            session_id: self.id,
            phase: state.phase,
            code,
            step,
            step_remaining_secs,
            session_remaining_secs,
            step_progress,
            degraded: self.engine.degraded(),
            error: state.last_error.clone(),
            started_at: self.started_wall,
            expires_at: self.expires_wall,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Session handle
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A running reveal session and the timer tasks that drive it.
///
/// Dropping the handle aborts all timers. Call [`RevealSession::stop`] to
/// also conceal the code and publish the terminal snapshot.
pub struct RevealSession {
    shared: Arc<SessionShared>,
    rx: watch::Receiver<SessionSnapshot>,
    regen_task: Option<JoinHandle<()>>,
    expiry_task: Option<JoinHandle<()>>,
    tick_task: Option<JoinHandle<()>>,
}

impl fmt::Debug for RevealSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevealSession")
            .field("id", &self.shared.id)
            .field("config", &self.shared.config)
            .finish()
    }
}

impl RevealSession {
    /// Start a session anchored at the current wall clock.
    ///
    /// The first code is generated and published before this returns.
    pub async fn start(
        engine: OtpEngine,
        secret: &SharedSecret,
        config: SessionConfig,
    ) -> SessionResult<Self> {
        let anchor_unix_ms = Utc::now().timestamp_millis().max(0) as u64;
        Self::start_anchored(engine, secret, config, anchor_unix_ms).await
    }

    /// Start a session anchored at an explicit unix-millisecond timestamp.
    ///
    /// Step boundaries and the displayed code derive from the anchor plus
    /// monotonic elapsed time, never from later wall-clock reads.
    pub async fn start_anchored(
        engine: OtpEngine,
        secret: &SharedSecret,
        config: SessionConfig,
        anchor_unix_ms: u64,
    ) -> SessionResult<Self> {
        config.validate()?;
        let key = secret.decode()?;

        let id = Uuid::new_v4();
        let started_at = Instant::now();
        let started_wall =
            DateTime::from_timestamp_millis(anchor_unix_ms as i64).unwrap_or_else(Utc::now);
        let expires_ms = anchor_unix_ms.saturating_add(config.lifetime_secs.saturating_mul(1000));
        let expires_wall =
            DateTime::from_timestamp_millis(expires_ms as i64).unwrap_or(started_wall);

        let (tx, rx) = watch::channel(SessionSnapshot::initial(
            id,
            engine.degraded(),
            started_wall,
            expires_wall,
            config.lifetime_secs,
        ));

        let shared = Arc::new(SessionShared {
            id,
            engine,
            key,
            config,
            anchor_unix_ms,
            started_at,
            started_wall,
            expires_wall,
            state: Mutex::new(SessionState {
                phase: SessionPhase::Active,
                current: None,
                last_error: None,
            }),
            tx,
        });

        info!(
            session = %shared.id,
            lifetime_secs = shared.config.lifetime_secs,
            period = shared.engine.params().period,
            strategy = shared.engine.strategy_name(),
            "reveal session started"
        );

        // First code goes out before any timer exists.
        shared.regenerate().await;

        let regen_task = {
            let shared = Arc::clone(&shared);
            let period_ms = u64::from(shared.engine.params().period) * 1000;
            let first_delay = Duration::from_millis(period_ms - anchor_unix_ms % period_ms);
            tokio::spawn(async move {
                let mut boundary =
                    interval_at(shared.started_at + first_delay, Duration::from_millis(period_ms));
                loop {
                    boundary.tick().await;
                    if !shared.regenerate().await {
                        break;
                    }
                }
            })
        };

        let expiry_task = {
            let shared = Arc::clone(&shared);
            let deadline = shared.started_at + shared.config.lifetime();
            tokio::spawn(async move {
                sleep_until(deadline).await;
                shared.expire().await;
            })
        };

        let tick_task = {
            let shared = Arc::clone(&shared);
            let every = shared.config.tick_interval();
            tokio::spawn(async move {
                let mut ticker = interval(every);
                // The first tick of `interval` resolves immediately.
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if !shared.refresh_countdown().await {
                        break;
                    }
                }
            })
        };

        Ok(Self {
            shared,
            rx,
            regen_task: Some(regen_task),
            expiry_task: Some(expiry_task),
            tick_task: Some(tick_task),
        })
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// `true` when the session's engine derives non-cryptographic codes.
    pub fn degraded(&self) -> bool {
        self.shared.engine.degraded()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.rx.borrow().clone()
    }

    /// Current lifecycle phase, as last published.
    pub fn phase(&self) -> SessionPhase {
        self.rx.borrow().phase
    }

    /// New receiver for snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.tx.subscribe()
    }

    /// Cancel the session: abort every timer, conceal the code and publish
    /// the terminal snapshot. An already-expired session keeps its phase.
    pub async fn stop(&mut self) {
        for handle in [
            self.regen_task.take(),
            self.expiry_task.take(),
            self.tick_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
        let mut state = self.shared.state.lock().await;
        if state.phase.is_active() {
            state.phase = SessionPhase::Stopped;
        }
        state.current = None;
        state.last_error = None;
        info!(session = %self.shared.id, phase = %state.phase, "reveal session stopped");
        self.shared.publish(&state);
    }
}

impl Drop for RevealSession {
    fn drop(&mut self) {
        for handle in [&self.regen_task, &self.expiry_task, &self.tick_task]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}
