use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Timeout for a single paste-service request.
    pub timeout_secs: u64,
    /// Largest log body the portal will accept from a paste service.
    pub max_bytes: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl PortalConfig {
    /// Load configuration from portal.toml and environment variables
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        // Compile-time defaults are the foundation; files and env layer
        // on top, so a missing key always has a value.
        let defaults = config::Config::try_from(&PortalConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        // Config file locations, first match wins per key:
        // 1. /etc/obs-portal/portal.toml (Docker/production)
        // 2. config/portal.toml (local development)
        // 3. crates/portal/config/portal.toml (workspace root)
        let config_paths = vec![
            "/etc/obs-portal/portal",
            "config/portal",
            "crates/portal/config/portal",
        ];
        for path in config_paths {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Environment variables override everything. Double underscore for
        // nested keys: PORTAL_SERVER__BIND_ADDRESS
        builder = builder.add_source(
            config::Environment::with_prefix("PORTAL")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        self.server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .context("Invalid bind_address")?;
        if self.fetch.timeout_secs == 0 {
            anyhow::bail!("fetch.timeout_secs must be greater than zero");
        }
        if self.fetch.max_bytes == 0 {
            anyhow::bail!("fetch.max_bytes must be greater than zero");
        }
        Ok(())
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:8080".to_string(),
                request_timeout_secs: 30,
                max_body_bytes: 2 * 1024 * 1024,
            },
            fetch: FetchConfig {
                timeout_secs: 10,
                max_bytes: 8 * 1024 * 1024,
                user_agent: format!("obs-log-portal/{}", env!("CARGO_PKG_VERSION")),
            },
            logging: LoggingConfig {
                level: "info,portal=debug".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PortalConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_bind_address_fails_validation() {
        let mut config = PortalConfig::default();
        config.server.bind_address = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_fetch_limit_fails_validation() {
        let mut config = PortalConfig::default();
        config.fetch.max_bytes = 0;
        assert!(config.validate().is_err());
    }
}
