//! Connection lifecycle.
//!
//! ```rust,no_run
//! use ferrodoc_mongodb::connection::{self, ConnectOptions};
//!
//! # async fn example() -> ferrodoc_mongodb::MongoResult<()> {
//! let conn = connection::connect("mydb", ConnectOptions::default()).await?;
//! let users = conn.collection("users");
//! # let _ = users;
//! connection::close(conn);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bson::Document;
use mongodb::Collection;
use tokio::runtime::Handle;
use tracing::info;

use crate::client::MongoClient;
use crate::config::{DEFAULT_HOST, DEFAULT_PORT, MongoConfig};
use crate::driver::DocumentDriver;
use crate::error::{MongoError, MongoResult};

/// Where [`connect`] should reach the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ConnectOptions {
    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Open a connection to `database`.
pub async fn connect(database: &str, options: ConnectOptions) -> MongoResult<Connection> {
    let config = MongoConfig::builder()
        .host(options.host)
        .port(options.port)
        .database(database)
        .build()?;
    connect_with_config(config).await
}

/// Open a connection from a full configuration.
pub async fn connect_with_config(config: MongoConfig) -> MongoResult<Connection> {
    let client = MongoClient::new(config).await?;
    Connection::new(client)
}

/// Close a connection, releasing the underlying client.
///
/// Clones of the connection that are still alive keep the client open.
pub fn close<D: DocumentDriver>(connection: Connection<D>) {
    info!(
        shared = Arc::strong_count(&connection.driver) > 1,
        "Closing connection"
    );
    drop(connection);
}

/// A ready connection: the driver plus the runtime its operations run on.
///
/// Immutable once created and cheap to clone; clones share the driver.
pub struct Connection<D = MongoClient> {
    pub(crate) driver: Arc<D>,
    pub(crate) runtime: Handle,
}

impl<D: DocumentDriver> Connection<D> {
    /// Wrap a driver, running operations on the current Tokio runtime.
    pub fn new(driver: D) -> MongoResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| MongoError::connection(format!("no async runtime available: {}", e)))?;
        Ok(Self::with_runtime(driver, runtime))
    }

    /// Wrap a driver, running operations on `runtime`.
    pub fn with_runtime(driver: D, runtime: Handle) -> Self {
        Self {
            driver: Arc::new(driver),
            runtime,
        }
    }

    /// Get the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run `operation` on the connection's runtime and pass its outcome to
    /// `completion`, exactly once, on a runtime worker.
    ///
    /// Returns immediately; never blocks the calling thread.
    pub fn run_async<T, F, C>(&self, operation: F, completion: C)
    where
        T: Send + 'static,
        F: Future<Output = MongoResult<T>> + Send + 'static,
        C: FnOnce(MongoResult<T>) + Send + 'static,
    {
        self.runtime.spawn(async move {
            completion(operation.await);
        });
    }
}

impl Connection<MongoClient> {
    /// Look up a collection of raw documents.
    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.driver.collection_doc(name)
    }

    /// Get the configuration the connection was opened with.
    pub fn config(&self) -> &MongoConfig {
        self.driver.config()
    }
}

impl<D> Clone for Connection<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            runtime: self.runtime.clone(),
        }
    }
}

impl<D> fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &std::any::type_name::<D>())
            .finish_non_exhaustive()
    }
}
