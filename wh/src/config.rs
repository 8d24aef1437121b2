//! WinHello configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::launcher::WindowSpec;

/// Main WinHello configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Handshake deadlines and labels
    pub handshake: HandshakeConfig,

    /// Window rig defaults
    pub rig: RigConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.handshake.hello_timeout_ms == 0 {
            return Err(eyre::eyre!("handshake.hello-timeout-ms must be greater than zero"));
        }

        let mut seen = HashSet::new();
        for spec in &self.rig.windows {
            if spec.name.trim().is_empty() {
                return Err(eyre::eyre!("rig.windows entries must have non-empty names"));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(eyre::eyre!("duplicate window name in rig.windows: {}", spec.name));
            }
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .winhello.yml
        let local_config = PathBuf::from(".winhello.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/winhello/winhello.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("winhello").join("winhello.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Handshake configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Default wait deadline in milliseconds
    #[serde(rename = "hello-timeout-ms")]
    pub hello_timeout_ms: u64,

    /// Label used in wait failures when the caller supplies none
    #[serde(rename = "default-label")]
    pub default_label: String,
}

impl HandshakeConfig {
    /// The default wait deadline as a Duration
    pub fn hello_timeout(&self) -> Duration {
        Duration::from_millis(self.hello_timeout_ms)
    }
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            hello_timeout_ms: 5000,
            default_label: "Window".to_string(),
        }
    }
}

/// Window rig configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Contexts the rig creates before the suite proceeds
    pub windows: Vec<WindowSpec>,

    /// Simulated bootstrap delay in milliseconds
    #[serde(rename = "sim-delay-ms")]
    pub sim_delay_ms: u64,

    /// Domain simulated contexts announce
    #[serde(rename = "sim-domain")]
    pub sim_domain: String,
}

impl RigConfig {
    /// The simulated bootstrap delay as a Duration
    pub fn sim_delay(&self) -> Duration {
        Duration::from_millis(self.sim_delay_ms)
    }
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            windows: vec![
                WindowSpec::popup("child-window"),
                WindowSpec::frame("child-frame"),
                WindowSpec::frame("other-child-frame"),
            ],
            sim_delay_ms: 50,
            sim_domain: "mock://test-winhello-child.com".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::WindowKind;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.handshake.hello_timeout_ms, 5000);
        assert_eq!(config.handshake.default_label, "Window");
        assert_eq!(config.rig.windows.len(), 3);
        assert_eq!(config.rig.windows[0].kind, WindowKind::Popup);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hello_timeout_duration() {
        let config = HandshakeConfig {
            hello_timeout_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.hello_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.handshake.hello_timeout_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("hello-timeout-ms"));
    }

    #[test]
    fn test_validate_rejects_duplicate_window_names() {
        let mut config = Config::default();
        config.rig.windows.push(WindowSpec::frame("child-frame"));

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("child-frame"));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("winhello.yml");
        fs::write(
            &path,
            "handshake:\n  hello-timeout-ms: 1234\nrig:\n  sim-domain: mock://elsewhere.com\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.handshake.hello_timeout_ms, 1234);
        assert_eq!(config.rig.sim_domain, "mock://elsewhere.com");
        // Unspecified sections keep their defaults.
        assert_eq!(config.rig.windows.len(), 3);
    }

    #[test]
    fn test_load_missing_explicit_file_errors() {
        let path = PathBuf::from("/nonexistent/winhello.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_config_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("hello-timeout-ms"));
        assert!(yaml.contains("child-window"));

        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.handshake.hello_timeout_ms, config.handshake.hello_timeout_ms);
        assert_eq!(parsed.rig.windows.len(), config.rig.windows.len());
    }
}
