//! MongoDB client wrapper.

use std::sync::Arc;

use bson::Document;
use mongodb::{Client, Collection, Database};
use tracing::info;

use crate::config::MongoConfig;
use crate::error::{MongoError, MongoResult};

/// A MongoDB client bound to one database.
///
/// The driver pools connections internally; clones share the pool.
#[derive(Clone)]
pub struct MongoClient {
    database: Database,
    config: Arc<MongoConfig>,
}

impl MongoClient {
    /// Create a client from configuration.
    ///
    /// The driver connects lazily, so this succeeds without a reachable server.
    pub async fn new(config: MongoConfig) -> MongoResult<Self> {
        let options = config.to_client_options().await?;

        let client = Client::with_options(options)
            .map_err(|e| MongoError::connection(format!("failed to create client: {}", e)))?;

        info!(
            uri = %config.connection_uri(),
            database = %config.database,
            "MongoDB client created"
        );

        Ok(Self {
            database: client.database(&config.database),
            config: Arc::new(config),
        })
    }

    /// Get a collection of raw BSON documents.
    pub fn collection_doc(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Get the configuration.
    pub fn config(&self) -> &MongoConfig {
        &self.config
    }

    /// Run a database command.
    pub async fn run_command(&self, command: Document) -> MongoResult<Document> {
        Ok(self.database.run_command(command, None).await?)
    }
}
