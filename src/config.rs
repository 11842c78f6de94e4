//! Shell configuration.
//!
//! Code parameters, the verification drift window and reveal-session
//! timing, loaded from an optional YAML file. Every field has a default,
//! so a partial file or no file at all is fine.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::otp::{CodeParams, FallbackPolicy, MacAlgorithm};
use crate::session::SessionConfig;

/// On-disk shell settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Digits per code.
    pub digits: u8,
    /// Step length in seconds.
    pub period: u32,
    /// HMAC hash algorithm.
    pub algorithm: MacAlgorithm,
    /// Accepted drift steps either side of now when verifying.
    pub drift_window: u32,
    /// Reveal session lifetime in seconds.
    pub session_lifetime_secs: u64,
    /// Countdown refresh interval in milliseconds.
    pub tick_ms: u64,
    /// Permit the non-cryptographic fallback when the MAC self-check fails.
    pub allow_insecure_fallback: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            digits: 6,
            period: 30,
            algorithm: MacAlgorithm::Sha1,
            drift_window: 1,
            session_lifetime_secs: 60,
            tick_ms: 250,
            allow_insecure_fallback: false,
        }
    }
}

impl ShellConfig {
    /// Load from a YAML file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
        let config: Self = serde_yaml::from_str(&text).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file, falling back to defaults when it is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write as YAML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let yaml = serde_yaml::to_string(self).map_err(|e| e.to_string())?;
        fs::write(path, yaml).map_err(|e| e.to_string())
    }

    /// Reject values the engines would refuse later.
    pub fn validate(&self) -> Result<(), String> {
        self.code_params().validate()?;
        self.session_config().validate()?;
        Ok(())
    }

    pub fn code_params(&self) -> CodeParams {
        CodeParams::new()
            .with_digits(self.digits)
            .with_period(self.period)
            .with_algorithm(self.algorithm)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new()
            .with_lifetime_secs(self.session_lifetime_secs)
            .with_tick_ms(self.tick_ms)
    }

    pub fn fallback_policy(&self) -> FallbackPolicy {
        if self.allow_insecure_fallback {
            FallbackPolicy::Allow
        } else {
            FallbackPolicy::Deny
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_line_up_with_the_engines() {
        let config = ShellConfig::default();
        assert_eq!(config.code_params(), CodeParams::default());
        assert_eq!(config.session_config(), SessionConfig::default());
        assert_eq!(config.drift_window, 1);
        assert_eq!(config.fallback_policy(), FallbackPolicy::Deny);
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_the_rest() {
        let config: ShellConfig = serde_yaml::from_str("digits: 8\n").unwrap();
        assert_eq!(config.digits, 8);
        assert_eq!(config.period, 30);
        assert_eq!(config.session_lifetime_secs, 60);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        let config = ShellConfig {
            digits: 8,
            drift_window: 2,
            allow_insecure_fallback: true,
            ..ShellConfig::default()
        };
        config.save(file.path()).unwrap();
        let loaded = ShellConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.fallback_policy(), FallbackPolicy::Allow);
    }

    #[test]
    fn load_rejects_out_of_range_values() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "digits: 12\n").unwrap();
        assert!(ShellConfig::load(file.path()).is_err());

        std::fs::write(file.path(), "session_lifetime_secs: 0\n").unwrap();
        assert!(ShellConfig::load(file.path()).is_err());
    }

    #[test]
    fn load_rejects_malformed_yaml() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "digits: [not a number\n").unwrap();
        assert!(ShellConfig::load(file.path()).is_err());
    }

    #[test]
    fn load_or_default_without_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credshare.yaml");
        let config = ShellConfig::load_or_default(&path).unwrap();
        assert_eq!(config, ShellConfig::default());
    }

    #[test]
    fn algorithm_parses_from_yaml() {
        let config: ShellConfig = serde_yaml::from_str("algorithm: SHA256\n").unwrap();
        assert_eq!(config.algorithm, MacAlgorithm::Sha256);
    }
}
