//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries
//! sub-configs for the HTTP server, authentication, and media signing.
//! Every section defaults sensibly so a completely empty `{}` file is
//! valid, with the exception that a real deployment must set
//! `media.signing_secret` (see [`Config::validate`]).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.media.signing_secret.is_empty() {
            warnings.push(
                "media.signing_secret is empty; signed playback URLs will not survive \
                 a restart (an ephemeral secret is generated)"
                    .into(),
            );
        }

        if self.media.session_ttl_secs < 60 {
            warnings.push(format!(
                "media.session_ttl_secs is {}; sessions shorter than a minute force \
                 constant re-issuance",
                self.media.session_ttl_secs
            ));
        }

        if self.auth.enabled
            && self.auth.admin_username.is_some()
            && self.auth.admin_password_hash.is_none()
        {
            warnings.push("auth.admin_username is set but admin_password_hash is missing".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            static_dir: None,
            db_path: PathBuf::from("./data/aula.db"),
        }
    }
}

/// Authentication settings.
///
/// When `enabled` is false every request acts as the seeded anonymous admin
/// user; enrollment gating still applies to playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    /// Optional static API key accepted as a bearer token (acts as admin).
    pub api_key: Option<String>,
    /// Bootstrap admin account created at startup if no admin exists.
    pub admin_username: Option<String>,
    /// Bcrypt hash of the bootstrap admin password
    /// (generate with `aula hash-password`).
    pub admin_password_hash: Option<String>,
    #[serde(default = "default_session_timeout")]
    pub session_timeout_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            admin_username: None,
            admin_password_hash: None,
            session_timeout_hours: default_session_timeout(),
        }
    }
}

fn default_session_timeout() -> u64 {
    24
}

/// Media protection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// HMAC secret for signing playback tokens. Empty means an ephemeral
    /// secret is generated at startup.
    pub signing_secret: String,
    /// Lifetime of a signed playback session in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Base URL clients use to reach this server (embedded in signed URLs).
    pub public_base_url: String,
    /// Directory holding lecture video files; `Lecture.media_path` is
    /// resolved relative to this.
    pub storage_dir: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            session_ttl_secs: default_session_ttl(),
            public_base_url: "http://localhost:8080".into(),
            storage_dir: PathBuf::from("./data/media"),
        }
    }
}

fn default_session_ttl() -> u64 {
    900
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
        assert!(cfg.auth.enabled);
        assert_eq!(cfg.media.session_ttl_secs, 900);
        assert_eq!(cfg.media.public_base_url, "http://localhost:8080");
    }

    #[test]
    fn empty_secret_warns() {
        let cfg = Config::default();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("signing_secret")));
    }

    #[test]
    fn short_ttl_warns() {
        let mut cfg = Config::default();
        cfg.media.signing_secret = "s".repeat(32);
        cfg.media.session_ttl_secs = 10;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("session_ttl_secs")));
    }

    #[test]
    fn admin_username_without_hash_warns() {
        let mut cfg = Config::default();
        cfg.media.signing_secret = "s".repeat(32);
        cfg.auth.admin_username = Some("admin".into());
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("admin_password_hash")));
    }

    #[test]
    fn parse_json_config() {
        let json = r#"{"server": {"port": 9090}, "media": {"session_ttl_secs": 300}}"#;
        let cfg = Config::from_json(json).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.media.session_ttl_secs, 300);
    }

    #[test]
    fn parse_empty_json_uses_defaults() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn load_or_default_with_none() {
        let cfg = Config::load_or_default(None);
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let cfg = Config::load_or_default(Some(Path::new("/nonexistent/config.json")));
        assert_eq!(cfg.server.port, 8080);
    }
}
