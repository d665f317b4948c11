use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Connection settings forwarded to the backend via `/set_db_connection`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "synthetic".to_string(),
        }
    }
}

/// Optional colour overrides, as `#RRGGBB` or `#RGB`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendships: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the simulation API, including the `/api` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Interest score shown as 100%
    #[serde(default = "default_max_interest_score")]
    pub max_interest_score: f64,

    /// How long status messages stay on the info line
    #[serde(default = "default_status_timeout")]
    pub status_timeout_secs: u64,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub theme: ThemeOverrides,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_max_interest_score() -> f64 {
    15.0
}

fn default_status_timeout() -> u64 {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_interest_score: default_max_interest_score(),
            status_timeout_secs: default_status_timeout(),
            database: DatabaseConfig::default(),
            theme: ThemeOverrides::default(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("synthdash");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match Self::parse(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
            // Keep a broken file around for the user to fix
            return Ok(AppConfig::default());
        }

        let config = AppConfig::default();
        let _ = config.save();
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config.normalized())
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(&self.clone().normalized())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Trim the base URL and keep timeouts usable
    pub fn normalized(mut self) -> Self {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        self.base_url = if trimmed.is_empty() {
            default_base_url()
        } else {
            trimmed.to_string()
        };
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        self.connect_timeout_secs = self.connect_timeout_secs.max(1);
        self.status_timeout_secs = self.status_timeout_secs.max(1);
        if !(self.max_interest_score.is_finite() && self.max_interest_score > 0.0) {
            self.max_interest_score = default_max_interest_score();
        }
        self
    }

    /// Apply a base URL coming from the command line or environment
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self.normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            base_url: "http://sim.local:9000/api".to_string(),
            request_timeout_secs: 20,
            connect_timeout_secs: 2,
            max_interest_score: 10.0,
            status_timeout_secs: 5,
            database: DatabaseConfig {
                host: "db.local".to_string(),
                port: 6543,
                user: "sim".to_string(),
                password: "secret".to_string(),
                database: "graph".to_string(),
            },
            theme: ThemeOverrides {
                users: Some("#10b981".to_string()),
                ..Default::default()
            },
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config.base_url, deserialized.base_url);
        assert_eq!(config.database, deserialized.database);
        assert_eq!(deserialized.theme.users.as_deref(), Some("#10b981"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = AppConfig::parse("base_url = \"http://example.com/api/\"\n").unwrap();

        assert_eq!(config.base_url, "http://example.com/api");
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.max_interest_score, 15.0);
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn test_normalized_fixes_unusable_values() {
        let config = AppConfig {
            base_url: "  ".to_string(),
            request_timeout_secs: 0,
            max_interest_score: 0.0,
            ..Default::default()
        }
        .normalized();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout_secs, 1);
        assert_eq!(config.max_interest_score, 15.0);
    }

    #[test]
    fn test_base_url_override() {
        let config = AppConfig::default().with_base_url(Some("http://127.0.0.1:1/api/".to_string()));
        assert_eq!(config.base_url, "http://127.0.0.1:1/api");

        let config = AppConfig::default().with_base_url(None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_partial_database_table_keeps_other_settings() {
        let config = AppConfig::parse(
            "base_url = \"http://sim.example:9000/api\"\n\n[database]\nhost = \"db.example\"\n",
        )
        .unwrap();

        assert_eq!(config.base_url, "http://sim.example:9000/api");
        assert_eq!(config.database.host, "db.example");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.database, "synthetic");
    }
}
