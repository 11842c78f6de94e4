use credshare::config::ShellConfig;
use credshare::otp::{FallbackPolicy, OtpEngine, OtpError, SharedSecret};
use credshare::render;
use credshare::session::{RevealSession, SessionConfig, SessionPhase};
use tempfile::NamedTempFile;

// Base32 of the 20-byte RFC 4226 test key "12345678901234567890".
const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

// ── Code path ────────────────────────────────────────────────────────

#[test]
fn test_rfc_vector_through_the_public_api() {
    let config = ShellConfig::default();
    let engine = OtpEngine::new(config.code_params(), config.fallback_policy()).unwrap();
    let key = SharedSecret::new(RFC_SECRET).decode().unwrap();

    let code = engine.generate_at(&key, 59).unwrap();
    assert_eq!(code.value, "287082");
    assert_eq!(code.step, 1);

    let matched = engine
        .verify_at(&key, "287082", 59, config.drift_window)
        .unwrap();
    assert_eq!(matched.step, 1);
    assert_eq!(matched.drift, 0);
}

#[test]
fn test_bad_secret_is_rejected_before_derivation() {
    let err = SharedSecret::new("GEZD1GNB").decode().unwrap_err();
    assert!(matches!(err, OtpError::InvalidEncoding(_)));
}

#[test]
fn test_sha256_profile_from_config() {
    let config: ShellConfig =
        serde_yaml::from_str("algorithm: SHA256\ndigits: 8\n").unwrap();
    let engine = OtpEngine::new(config.code_params(), config.fallback_policy()).unwrap();
    // Base32 of the 32-byte RFC 6238 SHA-256 key.
    let key = SharedSecret::new("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZA")
        .decode()
        .unwrap();
    // RFC 6238 appendix B, SHA-256 column at time 59.
    let code = engine.generate_at(&key, 59).unwrap();
    assert_eq!(code.value, "46119246");
}

// ── Config file ──────────────────────────────────────────────────────

#[test]
fn test_config_file_roundtrip() {
    let file = NamedTempFile::new().unwrap();
    let config = ShellConfig {
        digits: 8,
        drift_window: 2,
        session_lifetime_secs: 30,
        ..ShellConfig::default()
    };
    config.save(file.path()).unwrap();
    let loaded = ShellConfig::load(file.path()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credshare.yaml");
    let config = ShellConfig::load_or_default(&path).unwrap();
    assert_eq!(config, ShellConfig::default());
}

// ── Reveal session ───────────────────────────────────────────────────

#[tokio::test]
async fn test_reveal_session_publishes_then_stops() {
    let config = ShellConfig::default();
    let engine = OtpEngine::new(config.code_params(), config.fallback_policy()).unwrap();
    let session_config = SessionConfig::new().with_lifetime_secs(30).with_tick_ms(50);
    let mut session =
        RevealSession::start(engine, &SharedSecret::new(RFC_SECRET), session_config)
            .await
            .unwrap();

    let snap = session.snapshot();
    assert_eq!(snap.phase, SessionPhase::Active);
    assert!(snap.code.is_some());
    assert!(!snap.degraded);

    session.stop().await;
    assert_eq!(session.phase(), SessionPhase::Stopped);
    assert!(session.snapshot().code.is_none());
}

#[test]
fn test_snapshot_renders_as_a_status_line() {
    let snap = tokio_test::block_on(async {
        let engine = OtpEngine::new(
            ShellConfig::default().code_params(),
            FallbackPolicy::Deny,
        )
        .unwrap();
        let session = RevealSession::start_anchored(
            engine,
            &SharedSecret::new(RFC_SECRET),
            SessionConfig::default(),
            17_000,
        )
        .await
        .unwrap();
        session.snapshot()
    });

    let line = render::format_snapshot(&snap);
    assert!(line.contains("755 224"));
    assert!(line.contains("13s"));
}
