//! Process configuration with defaults, loaded from
//! `~/.fleetwire/config.toml`.
//!
//! The envelope layer reads identity, the direct-addressing switches,
//! and the default TTL; the collective names ride along for the
//! discovery and transport collaborators.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default admission window in seconds.
pub const DEFAULT_TTL: i64 = 60;

/// Process-wide settings read by the message layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity of this node, embedded in outbound requests.
    pub identity: String,
    /// Collective targeted when a message names none.
    pub main_collective: String,
    /// All collectives this node participates in.
    pub collectives: Vec<String>,
    /// Whether requests may be addressed at explicit host lists.
    pub direct_addressing: bool,
    /// Largest discovered-host list that is still sent directly.
    pub direct_addressing_threshold: usize,
    /// Default time-to-live for outbound requests, seconds.
    pub ttl: i64,
}

impl Default for Config {
    fn default() -> Self {
        let identity = std::env::var("HOSTNAME")
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "fleetwire".to_string());
        Self {
            identity,
            main_collective: "fleet".to_string(),
            collectives: vec!["fleet".to_string()],
            direct_addressing: false,
            direct_addressing_threshold: 10,
            ttl: DEFAULT_TTL,
        }
    }
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fleetwire")
        .join("config.toml")
}

/// Load configuration from a TOML file, with defaults.
///
/// A missing, unreadable, or malformed file falls back to
/// [`Config::default`] with a logged warning rather than failing the
/// process.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        return Config::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(config) => {
                info!(path = %config_path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to parse config, using defaults"
                );
                Config::default()
            }
        },
        Err(e) => {
            warn!(
                error = %e,
                path = %config_path.display(),
                "Failed to read config file, using defaults"
            );
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.main_collective, "fleet");
        assert!(!config.direct_addressing);
        assert_eq!(config.direct_addressing_threshold, 10);
        assert_eq!(config.ttl, DEFAULT_TTL);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = load_config(Some(Path::new("/nonexistent/fleetwire.toml")));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "identity = \"ctl-1\"\ndirect_addressing = true\ndirect_addressing_threshold = 3\nttl = 120"
        )
        .unwrap();

        let config = load_config(Some(file.path()));
        assert_eq!(config.identity, "ctl-1");
        assert!(config.direct_addressing);
        assert_eq!(config.direct_addressing_threshold, 3);
        assert_eq!(config.ttl, 120);
        // Unspecified fields keep their defaults
        assert_eq!(config.main_collective, "fleet");
    }

    #[test]
    fn test_load_malformed_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "identity = [this is not toml").unwrap();

        let config = load_config(Some(file.path()));
        assert_eq!(config, Config::default());
    }
}
