// 🔧 Configuration - TOML file with environment overrides

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "CERTIFICATES_CONFIG";
pub const TIMEZONE_ENV: &str = "CERTIFICATES_TIMEZONE";
pub const DATABASE_ENV: &str = "CERTIFICATES_DATABASE";
pub const BIND_ENV: &str = "CERTIFICATES_BIND";

const DEFAULT_CONFIG_FILE: &str = "certificates.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unknown time zone {0:?} (expected an IANA name such as \"Europe/Vilnius\")")]
    UnknownTimeZone(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// IANA zone whose local midnight ends certificate validity
    pub timezone: String,

    /// Replace stored certificates with the demo certificate on server start
    pub seed_demo_data: bool,

    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; in-memory when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            timezone: "UTC".to_string(),
            seed_demo_data: false,
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: Some(PathBuf::from("certificates.db")),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Config file (explicit path, `CERTIFICATES_CONFIG`, or `certificates.toml`
    /// when present), then environment overrides, then validation.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);

        let mut config = match explicit_path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.zone()?;

        tracing::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Applies overrides from `lookup` (environment variables in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(timezone) = lookup(TIMEZONE_ENV) {
            self.timezone = timezone;
        }
        if let Some(database) = lookup(DATABASE_ENV) {
            self.database.path = match database.as_str() {
                "" | ":memory:" => None,
                path => Some(PathBuf::from(path)),
            };
        }
        if let Some(bind) = lookup(BIND_ENV) {
            self.server.bind = bind;
        }
    }

    /// Issuer time zone
    pub fn zone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimeZone(self.timezone.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.zone().unwrap(), Tz::UTC);
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            timezone = "Europe/Vilnius"
            seed_demo_data = true

            [database]
            path = "/tmp/certs.db"
            "#,
            Path::new("inline.toml"),
        )
        .unwrap();

        assert_eq!(config.zone().unwrap(), Tz::Europe__Vilnius);
        assert!(config.seed_demo_data);
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/certs.db")));
        assert_eq!(config.server.bind, "0.0.0.0:3000");
    }

    #[test]
    fn test_unknown_zone_is_rejected() {
        let config = AppConfig {
            timezone: "Mars/Olympus".to_string(),
            ..AppConfig::default()
        };

        let err = config.zone().unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (TIMEZONE_ENV, "America/New_York"),
            (DATABASE_ENV, ":memory:"),
            (BIND_ENV, "127.0.0.1:8080"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.timezone, "America/New_York");
        assert_eq!(config.database.path, None);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("certificates.toml");
        std::fs::write(&path, "[server]\nbind = \"127.0.0.1:9000\"\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");

        assert!(matches!(
            AppConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
