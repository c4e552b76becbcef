use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CONNECT_DELAY_MS, DEFAULT_EXPIRY_SWEEP_INTERVAL_MS, DEFAULT_MATCH_CLOSE_DELAY_MS,
    REQUEST_EXPIRY_SECS,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Local store
    pub database_url: String,
    pub database_max_connections: u32,

    // Timers
    pub connect_delay_ms: u64,
    pub request_expiry_secs: i64,
    pub match_close_delay_ms: u64,
    pub expiry_sweep_interval_ms: u64,

    // CORS
    pub cors_allowed_origins: String,

    // Remote database (configured, not used by any chat or game flow)
    pub remote_database_url: Option<String>,
    pub remote_project_id: Option<String>,
    pub remote_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            database_url: "sqlite://zion.db".to_string(),
            database_max_connections: 5,
            connect_delay_ms: DEFAULT_CONNECT_DELAY_MS,
            request_expiry_secs: REQUEST_EXPIRY_SECS,
            match_close_delay_ms: DEFAULT_MATCH_CLOSE_DELAY_MS,
            expiry_sweep_interval_ms: DEFAULT_EXPIRY_SWEEP_INTERVAL_MS,
            cors_allowed_origins: "*".to_string(),
            remote_database_url: None,
            remote_project_id: None,
            remote_api_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        Ok(Config {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),

            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| defaults.database_max_connections.to_string())
                .parse()?,

            connect_delay_ms: env::var("CONNECT_DELAY_MS")
                .unwrap_or_else(|_| defaults.connect_delay_ms.to_string())
                .parse()?,
            request_expiry_secs: env::var("REQUEST_EXPIRY_SECS")
                .unwrap_or_else(|_| defaults.request_expiry_secs.to_string())
                .parse()?,
            match_close_delay_ms: env::var("MATCH_CLOSE_DELAY_MS")
                .unwrap_or_else(|_| defaults.match_close_delay_ms.to_string())
                .parse()?,
            expiry_sweep_interval_ms: env::var("EXPIRY_SWEEP_INTERVAL_MS")
                .unwrap_or_else(|_| defaults.expiry_sweep_interval_ms.to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or(defaults.cors_allowed_origins),

            remote_database_url: non_empty_var("REMOTE_DATABASE_URL"),
            remote_project_id: non_empty_var("REMOTE_PROJECT_ID"),
            remote_api_key: non_empty_var("REMOTE_API_KEY"),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.database_max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be > 0");
        }
        if self.request_expiry_secs <= 0 {
            anyhow::bail!("REQUEST_EXPIRY_SECS must be > 0");
        }
        if self.expiry_sweep_interval_ms == 0 {
            anyhow::bail!("EXPIRY_SWEEP_INTERVAL_MS must be > 0");
        }

        if let Some(raw) = self.remote_database_url.as_deref() {
            url::Url::parse(raw)
                .map_err(|e| anyhow::anyhow!("REMOTE_DATABASE_URL is not a valid URL: {e}"))?;
        }
        if self.remote_is_configured() {
            tracing::warn!(
                "Remote database configured (project {}); chat and game state stay local",
                self.remote_project_id.as_deref().unwrap_or("unknown")
            );
        }
        if self.remote_api_key.is_some() && self.remote_database_url.is_none() {
            tracing::warn!("REMOTE_API_KEY set without REMOTE_DATABASE_URL");
        }

        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn remote_is_configured(&self) -> bool {
        self.remote_database_url.is_some()
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }

    pub fn match_close_delay(&self) -> Duration {
        Duration::from_millis(self.match_close_delay_ms)
    }

    pub fn expiry_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.expiry_sweep_interval_ms)
    }

    pub fn request_expiry_ms(&self) -> i64 {
        self.request_expiry_secs.saturating_mul(1000)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_expiry() {
        let config = Config {
            request_expiry_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_malformed_remote_url() {
        let config = Config {
            remote_database_url: Some("not a url".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn remote_database_is_optional() {
        let config = Config {
            remote_database_url: Some("https://zion-messenger.example.app".to_string()),
            remote_project_id: Some("zion-messenger".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.remote_is_configured());
        assert!(!Config::default().remote_is_configured());
    }

    #[test]
    fn expiry_window_is_in_millis() {
        assert_eq!(Config::default().request_expiry_ms(), 300_000);
    }

    #[test]
    fn huge_expiry_saturates() {
        let config = Config {
            request_expiry_secs: i64::MAX / 10,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.request_expiry_ms(), i64::MAX);
    }
}
