//! MongoDB connection configuration.

use std::time::Duration;

use mongodb::options::ClientOptions;

use crate::error::{MongoError, MongoResult};

/// Default host used by [`connect`](crate::connection::connect).
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port used by [`connect`](crate::connection::connect).
pub const DEFAULT_PORT: u16 = 27017;

/// MongoDB connection configuration.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Full connection URI; overrides `host` and `port` when set.
    pub uri: Option<String>,
    /// Database name.
    pub database: String,
    /// Application name (shown in server logs).
    pub app_name: Option<String>,
    /// Minimum connection pool size.
    pub min_pool_size: Option<u32>,
    /// Maximum connection pool size.
    pub max_pool_size: Option<u32>,
    /// Connection timeout.
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout.
    pub server_selection_timeout: Option<Duration>,
    /// Write concern.
    pub write_concern: Option<WriteConcern>,
    /// Direct connection (bypass replica set discovery).
    pub direct_connection: Option<bool>,
}

/// MongoDB write concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteConcern {
    /// Acknowledge writes from the specified number of nodes. `W(0)` is unacknowledged.
    W(u32),
    /// Acknowledge writes from majority of nodes.
    Majority,
}

impl WriteConcern {
    /// Check if writes under this concern are unacknowledged.
    pub fn is_unacknowledged(&self) -> bool {
        matches!(self, Self::W(0))
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            uri: None,
            database: String::new(),
            app_name: Some("ferrodoc".to_string()),
            min_pool_size: None,
            max_pool_size: Some(10),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            write_concern: None,
            direct_connection: None,
        }
    }
}

impl MongoConfig {
    /// Create a configuration from a MongoDB URI.
    pub fn from_uri(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> MongoConfigBuilder {
        MongoConfigBuilder::new()
    }

    /// The URI the client connects to.
    pub fn connection_uri(&self) -> String {
        match &self.uri {
            Some(uri) => uri.clone(),
            None => format!("mongodb://{}:{}", self.host, self.port),
        }
    }

    /// Check if the configured write concern is unacknowledged.
    pub fn unacknowledged_writes(&self) -> bool {
        self.write_concern
            .as_ref()
            .is_some_and(WriteConcern::is_unacknowledged)
    }

    /// Convert to MongoDB ClientOptions.
    pub async fn to_client_options(&self) -> MongoResult<ClientOptions> {
        let mut options = ClientOptions::parse(self.connection_uri())
            .await
            .map_err(|e| MongoError::config(format!("failed to parse URI: {}", e)))?;

        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }

        if let Some(min_pool) = self.min_pool_size {
            options.min_pool_size = Some(min_pool);
        }

        if let Some(max_pool) = self.max_pool_size {
            options.max_pool_size = Some(max_pool);
        }

        if let Some(connect_timeout) = self.connect_timeout {
            options.connect_timeout = Some(connect_timeout);
        }

        if let Some(selection_timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(selection_timeout);
        }

        if let Some(ref wc) = self.write_concern {
            options.write_concern = Some(match wc {
                WriteConcern::W(n) => mongodb::options::WriteConcern::builder()
                    .w(mongodb::options::Acknowledgment::Nodes(*n))
                    .build(),
                WriteConcern::Majority => mongodb::options::WriteConcern::builder()
                    .w(mongodb::options::Acknowledgment::Majority)
                    .build(),
            });
        }

        if let Some(direct) = self.direct_connection {
            options.direct_connection = Some(direct);
        }

        Ok(options)
    }
}

/// Builder for MongoDB configuration.
#[derive(Debug, Default)]
pub struct MongoConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    uri: Option<String>,
    database: Option<String>,
    app_name: Option<String>,
    min_pool_size: Option<u32>,
    max_pool_size: Option<u32>,
    connect_timeout: Option<Duration>,
    server_selection_timeout: Option<Duration>,
    write_concern: Option<WriteConcern>,
    direct_connection: Option<bool>,
}

impl MongoConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the server port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set a full MongoDB URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the minimum pool size.
    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.min_pool_size = Some(size);
        self
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.max_pool_size = Some(size);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Set the server selection timeout.
    pub fn server_selection_timeout(mut self, duration: Duration) -> Self {
        self.server_selection_timeout = Some(duration);
        self
    }

    /// Set the write concern.
    pub fn write_concern(mut self, wc: WriteConcern) -> Self {
        self.write_concern = Some(wc);
        self
    }

    /// Enable direct connection (bypass replica set discovery).
    pub fn direct_connection(mut self, enabled: bool) -> Self {
        self.direct_connection = Some(enabled);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> MongoResult<MongoConfig> {
        let database = self
            .database
            .filter(|name| !name.is_empty())
            .ok_or_else(|| MongoError::config("database name is required"))?;

        Ok(MongoConfig {
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            uri: self.uri,
            database,
            app_name: self.app_name.or(Some("ferrodoc".to_string())),
            min_pool_size: self.min_pool_size,
            max_pool_size: self.max_pool_size.or(Some(10)),
            connect_timeout: self.connect_timeout.or(Some(Duration::from_secs(10))),
            server_selection_timeout: self
                .server_selection_timeout
                .or(Some(Duration::from_secs(30))),
            write_concern: self.write_concern,
            direct_connection: self.direct_connection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MongoConfig::builder().database("mydb").build().unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 27017);
        assert_eq!(config.connection_uri(), "mongodb://127.0.0.1:27017");
        assert_eq!(config.app_name, Some("ferrodoc".to_string()));
        assert!(!config.unacknowledged_writes());
    }

    #[test]
    fn test_config_from_uri() {
        let config = MongoConfig::from_uri("mongodb://db.internal:27018", "mydb");
        assert_eq!(config.connection_uri(), "mongodb://db.internal:27018");
        assert_eq!(config.database, "mydb");
    }

    #[test]
    fn test_config_builder() {
        let config = MongoConfig::builder()
            .host("10.0.0.5")
            .port(27020)
            .database("mydb")
            .app_name("test-app")
            .max_pool_size(20)
            .write_concern(WriteConcern::W(0))
            .build()
            .unwrap();

        assert_eq!(config.connection_uri(), "mongodb://10.0.0.5:27020");
        assert_eq!(config.app_name, Some("test-app".to_string()));
        assert_eq!(config.max_pool_size, Some(20));
        assert!(config.unacknowledged_writes());
    }

    #[test]
    fn test_config_builder_missing_database() {
        assert!(MongoConfig::builder().host("localhost").build().is_err());
        assert!(MongoConfig::builder().database("").build().is_err());
    }

    #[test]
    fn test_write_concern_acknowledgement() {
        assert!(WriteConcern::W(0).is_unacknowledged());
        assert!(!WriteConcern::W(1).is_unacknowledged());
        assert!(!WriteConcern::Majority.is_unacknowledged());
    }
}
