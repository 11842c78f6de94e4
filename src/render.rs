//! Terminal rendering for codes and reveal-session frames.

use crate::otp::OneTimeCode;
use crate::session::{SessionPhase, SessionSnapshot};

const BAR_WIDTH: usize = 10;

/// One-shot code line: grouped digits plus step timing.
pub fn format_code(code: &OneTimeCode) -> String {
    let mut line = format!(
        "{}  (step {}, {}s left)",
        code.grouped(),
        code.step,
        code.remaining_seconds
    );
    if code.degraded {
        line.push_str("  [INSECURE FALLBACK]");
    }
    line
}

/// Single status line for one reveal frame.
pub fn format_snapshot(snap: &SessionSnapshot) -> String {
    match snap.phase {
        SessionPhase::Active => match &snap.code {
            Some(code) => {
                let mut line = format!(
                    "{}  [{}] {:>2}s | session {}s",
                    code,
                    countdown_bar(snap.step_progress),
                    snap.step_remaining_secs,
                    snap.session_remaining_secs
                );
                if snap.degraded {
                    line.push_str("  [INSECURE FALLBACK]");
                }
                line
            }
            None => format!(
                "------  {}",
                snap.error.as_deref().unwrap_or("waiting for code")
            ),
        },
        SessionPhase::Expired => "session expired, code concealed".into(),
        SessionPhase::Stopped => "session stopped".into(),
    }
}

/// Bar draining from full to empty as the step progresses.
fn countdown_bar(progress: f64) -> String {
    let remaining = (1.0 - progress).clamp(0.0, 1.0);
    let filled = (remaining * BAR_WIDTH as f64).round() as usize;
    let mut bar = String::with_capacity(BAR_WIDTH);
    for i in 0..BAR_WIDTH {
        bar.push(if i < filled { '#' } else { '-' });
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_snapshot() -> SessionSnapshot {
        let now = Utc::now();
        SessionSnapshot {
            session_id: Uuid::new_v4(),
            phase: SessionPhase::Active,
            code: Some("287 082".into()),
            step: Some(1),
            step_remaining_secs: 15,
            session_remaining_secs: 42,
            step_progress: 0.5,
            degraded: false,
            error: None,
            started_at: now,
            expires_at: now,
        }
    }

    #[test]
    fn active_frame_shows_code_bar_and_countdowns() {
        let line = format_snapshot(&sample_snapshot());
        assert_eq!(line, "287 082  [#####-----] 15s | session 42s");
    }

    #[test]
    fn degraded_frame_is_labelled() {
        let mut snap = sample_snapshot();
        snap.degraded = true;
        assert!(format_snapshot(&snap).ends_with("[INSECURE FALLBACK]"));
    }

    #[test]
    fn error_frame_shows_the_message() {
        let mut snap = sample_snapshot();
        snap.code = None;
        snap.error = Some("code generation failed: no mac".into());
        assert_eq!(
            format_snapshot(&snap),
            "------  code generation failed: no mac"
        );
    }

    #[test]
    fn terminal_frames_conceal_the_code() {
        let mut snap = sample_snapshot();
        snap.phase = SessionPhase::Expired;
        snap.code = None;
        assert_eq!(format_snapshot(&snap), "session expired, code concealed");

        snap.phase = SessionPhase::Stopped;
        assert_eq!(format_snapshot(&snap), "session stopped");
    }

    #[test]
    fn bar_extremes() {
        assert_eq!(countdown_bar(0.0), "##########");
        assert_eq!(countdown_bar(1.0), "----------");
        assert_eq!(countdown_bar(2.0), "----------");
    }

    #[test]
    fn one_shot_code_line() {
        let code = OneTimeCode {
            value: "287082".into(),
            step: 1,
            remaining_seconds: 15,
            period: 30,
            progress: 0.5,
            degraded: false,
        };
        assert_eq!(format_code(&code), "287 082  (step 1, 15s left)");

        let degraded = OneTimeCode { degraded: true, ..code };
        assert!(format_code(&degraded).ends_with("[INSECURE FALLBACK]"));
    }
}
