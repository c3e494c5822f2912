use crate::core::{DbError, Result};
use crate::transaction::IsolationLevel;
use serde::{Deserialize, Serialize};

const URL_SCHEME: &str = "rustmemokv://";

/// Database configuration
///
/// The isolation level is the default handed to connections created after
/// the database is built; `Database::set_isolation_level` changes it later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database name, used in log events
    pub database: String,

    /// Isolation level for new connections
    pub isolation_level: IsolationLevel,
}

impl DatabaseConfig {
    pub fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            isolation_level: IsolationLevel::default(),
        }
    }

    /// Set the database name
    pub fn database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    /// Set the isolation level for new connections
    pub fn isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = level;
        self
    }

    /// Parse from connection string
    ///
    /// Format: "rustmemokv://database[?isolation=<level>]"
    ///
    /// # Examples
    ///
    /// ```
    /// # use rustmemokv::{DatabaseConfig, IsolationLevel};
    /// let config = DatabaseConfig::from_url("rustmemokv://orders?isolation=serializable").unwrap();
    /// assert_eq!(config.database, "orders");
    /// assert_eq!(config.isolation_level, IsolationLevel::Serializable);
    /// ```
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url.strip_prefix(URL_SCHEME).ok_or_else(|| {
            DbError::ConfigError(format!("URL must start with '{}'", URL_SCHEME))
        })?;

        let (database, query) = match rest.split_once('?') {
            Some((database, query)) => (database, Some(query)),
            None => (rest, None),
        };

        let mut config = Self::new(database);
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            match pair.split_once('=') {
                Some(("isolation", level)) => {
                    config.isolation_level = level.replace("%20", " ").parse()?;
                }
                _ => {
                    return Err(DbError::ConfigError(format!(
                        "Unsupported URL parameter '{}'",
                        pair
                    )));
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Convert to connection string
    pub fn to_url(&self) -> String {
        let level = serde_json::to_value(self.isolation_level)
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| self.isolation_level.to_string());
        format!("{}{}?isolation={}", URL_SCHEME, self.database, level)
    }

    /// Parse from a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(DbError::ConfigError(
                "Database name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("rustmemokv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatabaseConfig::default();
        assert_eq!(config.database, "rustmemokv");
        assert_eq!(config.isolation_level, IsolationLevel::SnapshotIsolation);
    }

    #[test]
    fn test_builder_pattern() {
        let config = DatabaseConfig::default()
            .database("inventory")
            .isolation_level(IsolationLevel::ReadCommitted);

        assert_eq!(config.database, "inventory");
        assert_eq!(config.isolation_level, IsolationLevel::ReadCommitted);
    }

    #[test]
    fn test_from_url() {
        let config =
            DatabaseConfig::from_url("rustmemokv://ledger?isolation=repeatable_read").unwrap();

        assert_eq!(config.database, "ledger");
        assert_eq!(config.isolation_level, IsolationLevel::RepeatableRead);
    }

    #[test]
    fn test_from_url_sql_spelling() {
        let config =
            DatabaseConfig::from_url("rustmemokv://ledger?isolation=READ%20COMMITTED").unwrap();
        assert_eq!(config.isolation_level, IsolationLevel::ReadCommitted);
    }

    #[test]
    fn test_from_url_default_isolation() {
        let config = DatabaseConfig::from_url("rustmemokv://ledger").unwrap();
        assert_eq!(config.isolation_level, IsolationLevel::SnapshotIsolation);
    }

    #[test]
    fn test_invalid_url() {
        assert!(DatabaseConfig::from_url("invalid://url").is_err());
        assert!(DatabaseConfig::from_url("rustmemokv://").is_err());
        assert!(DatabaseConfig::from_url("rustmemokv://db?isolation=chaos").is_err());
        assert!(DatabaseConfig::from_url("rustmemokv://db?pool=5").is_err());
    }

    #[test]
    fn test_url_round_trip() {
        let config = DatabaseConfig::new("ledger").isolation_level(IsolationLevel::Serializable);
        assert_eq!(config.to_url(), "rustmemokv://ledger?isolation=serializable");
        assert_eq!(DatabaseConfig::from_url(&config.to_url()).unwrap(), config);
    }

    #[test]
    fn test_from_json() {
        let config =
            DatabaseConfig::from_json(r#"{"database": "orders", "isolation_level": "read_committed"}"#)
                .unwrap();
        assert_eq!(config.database, "orders");
        assert_eq!(config.isolation_level, IsolationLevel::ReadCommitted);

        let defaults = DatabaseConfig::from_json("{}").unwrap();
        assert_eq!(defaults, DatabaseConfig::default());
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(
            DatabaseConfig::from_json(r#"{"isolation_level": "chaos"}"#),
            Err(DbError::ConfigError(_))
        ));
        assert!(DatabaseConfig::from_json(r#"{"database": ""}"#).is_err());
    }
}
