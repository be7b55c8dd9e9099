//! # ferrodoc-mongodb
//!
//! Non-blocking MongoDB commands over native values.
//!
//! This crate provides:
//! - Connection management with the official MongoDB driver
//! - Coercion between [`Value`](ferrodoc_core::Value) and BSON documents
//! - Projection and sort building with synchronous validation
//! - A dispatcher that delivers each result to a callback or a completion handle
//!
//! ## Example
//!
//! ```rust,no_run
//! use ferrodoc_mongodb::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let conn = connect("mydb", ConnectOptions::default()).await?;
//!
//!     let alice = Value::map().with("name", "Alice").with("age", 30);
//!     let inserted = conn
//!         .insert("users", alice, InsertOptions::default(), None)?
//!         .into_handle()
//!         .ok_or("callback given")?
//!         .await?;
//!     println!("{inserted:?}");
//!
//!     close(conn);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod document;
pub mod driver;
pub mod error;
pub mod query;
pub mod status;

pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, doc};
pub use client::MongoClient;
pub use config::{MongoConfig, MongoConfigBuilder, WriteConcern};
pub use connection::{ConnectOptions, Connection, close, connect, connect_with_config};
pub use dispatch::{Callback, Dispatched, Reply, ReplyHandle, Stage, callback};
pub use driver::DocumentDriver;
pub use error::{MongoError, MongoResult};
pub use query::FindSpec;
pub use status::WriteStatus;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::MongoClient;
    pub use crate::config::{MongoConfig, MongoConfigBuilder, WriteConcern};
    pub use crate::connection::{ConnectOptions, Connection, close, connect, connect_with_config};
    pub use crate::dispatch::{Callback, Dispatched, Reply, ReplyHandle, callback};
    pub use crate::driver::DocumentDriver;
    pub use crate::error::{MongoError, MongoResult};
    pub use crate::status::WriteStatus;
    pub use bson::oid::ObjectId;
    pub use bson::{Bson, Document, doc};
    pub use ferrodoc_core::prelude::*;
}
