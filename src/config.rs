use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub email: EmailConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/percept.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for bearer token signing. Overridden by
    /// `PERCEPT_SECRET_KEY`; the default is only acceptable for local
    /// development and tests.
    #[serde(skip_serializing)]
    pub secret_key: String,

    /// Bearer token lifetime in days.
    pub token_ttl_days: i64,

    /// Password reset token lifetime in minutes.
    pub reset_token_ttl_minutes: i64,

    /// Public base URL of the frontend, used to build reset links.
    /// Overridden by `PERCEPT_FRONTEND_URL`.
    pub frontend_url: String,

    /// When true, forgot-password returns the same 200 body for unknown
    /// emails instead of 404, hiding account existence.
    pub conceal_unknown_emails: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: "percept_dev_secret_change_me".to_string(),
            token_ttl_days: 7,
            reset_token_ttl_minutes: 60,
            frontend_url: "http://localhost:3000".to_string(),
            conceal_unknown_emails: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// When false, reset emails are written to the log instead of sent.
    pub smtp_enabled: bool,

    pub smtp_host: String,

    pub smtp_port: u16,

    /// Overridden by `PERCEPT_SMTP_USERNAME`.
    pub smtp_username: String,

    /// Overridden by `PERCEPT_SMTP_PASSWORD`.
    #[serde(skip_serializing)]
    pub smtp_password: String,

    pub from_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "noreply@percept.local".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            email: EmailConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets and deployment-specific URLs come from the environment
    /// when present, so they never have to live in the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("PERCEPT_SECRET_KEY") {
            self.auth.secret_key = secret;
        }
        if let Ok(url) = std::env::var("PERCEPT_FRONTEND_URL") {
            self.auth.frontend_url = url;
        }
        if let Ok(user) = std::env::var("PERCEPT_SMTP_USERNAME") {
            self.email.smtp_username = user;
        }
        if let Ok(pass) = std::env::var("PERCEPT_SMTP_PASSWORD") {
            self.email.smtp_password = pass;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.general.database_path = url;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("percept").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".percept").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.secret_key.is_empty() {
            anyhow::bail!("Auth secret key cannot be empty");
        }

        if self.auth.token_ttl_days <= 0 {
            anyhow::bail!("Token TTL must be positive");
        }

        if self.auth.reset_token_ttl_minutes <= 0 {
            anyhow::bail!("Reset token TTL must be positive");
        }

        if self.email.smtp_enabled && self.email.smtp_host.is_empty() {
            anyhow::bail!("SMTP host cannot be empty when SMTP is enabled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.token_ttl_days, 7);
        assert_eq!(config.auth.reset_token_ttl_minutes, 60);
        assert!(!config.auth.conceal_unknown_emails);
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000

            [auth]
            frontend_url = "https://percept.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.frontend_url, "https://percept.example.com");
        assert_eq!(config.general.max_db_connections, 5);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
    }
}
