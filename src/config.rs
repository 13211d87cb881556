//! Deployment environment profiles.
//!
//! A [`DatabaseConfig`] maps an environment name (`development`, `test`,
//! `production`, ...) to the [`ConnectionConfig`] the connection handle is
//! opened from. The table is either the built-in default or a JSON file:
//!
//! ```json
//! {
//!   "development": { "client": "sqlite3", "database": "dev.sqlite3" },
//!   "production":  {
//!     "client": "sqlite3",
//!     "user": "app",
//!     "password": "secret",
//!     "database": "/var/lib/app.sqlite3"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Environment variable selecting the active profile.
pub const ENVIRONMENT_VAR: &str = "APP_ENV";
/// Environment variable pointing at a JSON profile file.
pub const CONFIG_PATH_VAR: &str = "DATABASE_CONFIG";
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Database client a profile is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientKind {
    #[serde(rename = "sqlite3", alias = "sqlite", alias = "better-sqlite3")]
    Sqlite3,
    #[serde(rename = "postgres", alias = "pg", alias = "postgresql")]
    Postgres,
    #[serde(rename = "mysql", alias = "mysql2")]
    Mysql,
}

impl ClientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::Sqlite3 => "sqlite3",
            ClientKind::Postgres => "postgres",
            ClientKind::Mysql => "mysql",
        }
    }
}

/// Connection descriptor for one database endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub client: ClientKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Database name; a file path or `:memory:` for sqlite3.
    pub database: String,
}

impl ConnectionConfig {
    pub fn sqlite(database: impl Into<String>) -> Self {
        Self {
            client: ClientKind::Sqlite3,
            user: None,
            password: None,
            database: database.into(),
        }
    }
}

/// Environment name to connection descriptor table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseConfig {
    pub environments: BTreeMap<String, ConnectionConfig>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let environments = BTreeMap::from([
            (
                "development".to_string(),
                ConnectionConfig::sqlite("dev.sqlite3"),
            ),
            ("test".to_string(), ConnectionConfig::sqlite(":memory:")),
            (
                "production".to_string(),
                ConnectionConfig::sqlite("app.sqlite3"),
            ),
        ]);
        Self { environments }
    }
}

impl DatabaseConfig {
    /// Parse a profile table from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a profile table from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading database config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Resolve the profile table.
    ///
    /// Priority: explicit path > `DATABASE_CONFIG` > built-in defaults.
    /// An empty `DATABASE_CONFIG` counts as unset.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match config_path(path, std::env::var(CONFIG_PATH_VAR).ok()) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Look up the descriptor for an environment name.
    pub fn environment(&self, name: &str) -> Result<&ConnectionConfig> {
        self.environments
            .get(name)
            .ok_or_else(|| Error::UnknownEnvironment(name.to_string()))
    }
}

/// Active environment name from `APP_ENV`, defaulting to `development`.
pub fn resolve_environment() -> String {
    environment_or_default(std::env::var(ENVIRONMENT_VAR).ok())
}

fn environment_or_default(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

fn config_path(explicit: Option<&Path>, from_env: Option<String>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| non_blank(from_env).map(PathBuf::from))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_table_has_development_profile() {
        let config = DatabaseConfig::default();
        let dev = config.environment("development").unwrap();
        assert_eq!(dev.client, ClientKind::Sqlite3);
        assert_eq!(dev.database, "dev.sqlite3");
        assert_eq!(config.environment("test").unwrap().database, ":memory:");
    }

    #[test]
    fn unknown_environment_is_an_error() {
        let config = DatabaseConfig::default();
        match config.environment("staging") {
            Err(Error::UnknownEnvironment(name)) => assert_eq!(name, "staging"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn environment_defaults_to_development() {
        assert_eq!(environment_or_default(None), "development");
        assert_eq!(environment_or_default(Some("  ".into())), "development");
        assert_eq!(
            environment_or_default(Some("production".into())),
            "production"
        );
    }

    #[test]
    fn blank_config_path_falls_back_to_defaults() {
        assert_eq!(config_path(None, None), None);
        assert_eq!(config_path(None, Some(String::new())), None);
        assert_eq!(config_path(None, Some("   ".into())), None);
        assert_eq!(
            config_path(None, Some(" profiles.json ".into())),
            Some(PathBuf::from("profiles.json"))
        );
        assert_eq!(
            config_path(Some(Path::new("cli.json")), Some("env.json".into())),
            Some(PathBuf::from("cli.json"))
        );
    }

    #[test]
    fn parses_profiles_with_client_aliases() {
        let config = DatabaseConfig::from_json(
            r#"{
                "development": { "client": "sqlite3", "database": "dev.db" },
                "production": {
                    "client": "pg", "user": "app", "password": "pw", "database": "shop"
                }
            }"#,
        )
        .unwrap();

        let prod = config.environment("production").unwrap();
        assert_eq!(prod.client, ClientKind::Postgres);
        assert_eq!(prod.user.as_deref(), Some("app"));
        assert_eq!(prod.password.as_deref(), Some("pw"));
        assert_eq!(prod.database, "shop");
        assert_eq!(config.environment("development").unwrap().user, None);
    }

    #[test]
    fn rejects_unknown_client() {
        let result = DatabaseConfig::from_json(
            r#"{ "development": { "client": "oracle", "database": "x" } }"#,
        );
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn loads_profiles_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "test": {{ "client": "sqlite3", "database": ":memory:" }} }}"#
        )
        .unwrap();

        let config = DatabaseConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.environments.len(), 1);
        assert_eq!(
            config.environment("test").unwrap(),
            &ConnectionConfig::sqlite(":memory:")
        );
    }
}
