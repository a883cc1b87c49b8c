//! Runtime settings, read from the environment with defaults.

use crate::models::SessionError;
use crate::persistence::{HttpSyncApi, StorageError};
use crate::scale::{HttpScale, ScaleError};
use crate::session::HttpSessionApi;
use std::path::PathBuf;
use std::time::Duration;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_secs(key: &str, default: u64) -> Duration {
    parse_secs(std::env::var(key).ok().as_deref(), default)
}

/// Zero and unparsable values fall back to `default`; timers need a non-zero period.
fn parse_secs(raw: Option<&str>, default: u64) -> Duration {
    let secs = raw
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

/// Session server settings.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Where `/sync` and `/storage` files live.
    pub data_dir: PathBuf,
    /// Sessions not updated for this long are removed.
    pub session_ttl: Duration,
    pub cleanup_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            session_ttl: Duration::from_secs(6 * 3600),
            cleanup_interval: Duration::from_secs(30 * 60),
        }
    }
}

impl ServerConfig {
    /// `HOST`, `PORT`, `DATA_DIR`, `SESSION_TTL_SECS`, `CLEANUP_INTERVAL_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("HOST", &defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            session_ttl: env_secs("SESSION_TTL_SECS", defaults.session_ttl.as_secs()),
            cleanup_interval: env_secs("CLEANUP_INTERVAL_SECS", defaults.cleanup_interval.as_secs()),
        }
    }
}

/// Settings for clients of the session server and the scale.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub scale_base_url: String,
    /// How often observers poll a session.
    pub poll_interval: Duration,
    /// Minimum time between automatic backups.
    pub sync_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            scale_base_url: "http://localhost:5000".to_string(),
            poll_interval: Duration::from_secs(2),
            sync_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// `API_BASE_URL` and `SCALE_BASE_URL`; intervals keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env_or("API_BASE_URL", &defaults.api_base_url),
            scale_base_url: env_or("SCALE_BASE_URL", &defaults.scale_base_url),
            ..defaults
        }
    }

    pub fn session_api(&self) -> Result<HttpSessionApi, SessionError> {
        HttpSessionApi::new(&self.api_base_url, self.request_timeout)
    }

    pub fn sync_api(&self) -> Result<HttpSyncApi, StorageError> {
        HttpSyncApi::new(&self.api_base_url, self.request_timeout)
    }

    pub fn scale(&self) -> Result<HttpScale, ScaleError> {
        HttpScale::new(&self.scale_base_url, self.request_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let server = ServerConfig::default();
        assert_eq!(server.port, 8080);
        assert_eq!(server.session_ttl, Duration::from_secs(21_600));
        assert_eq!(server.cleanup_interval, Duration::from_secs(1_800));

        let client = ClientConfig::default();
        assert_eq!(client.poll_interval, Duration::from_secs(2));
        assert_eq!(client.sync_interval, Duration::from_secs(5));
        assert!(client.session_api().is_ok());
        assert!(client.scale().is_ok());
    }

    #[test]
    fn zero_or_garbage_seconds_use_the_default() {
        assert_eq!(parse_secs(Some("0"), 1_800), Duration::from_secs(1_800));
        assert_eq!(parse_secs(Some("soon"), 60), Duration::from_secs(60));
        assert_eq!(parse_secs(None, 60), Duration::from_secs(60));
        assert_eq!(parse_secs(Some(" 90 "), 60), Duration::from_secs(90));
    }
}
