//! # ferrodoc
//!
//! Non-blocking document-database commands for Rust.
//!
//! ferrodoc provides:
//! - A native value model of ordered maps, sequences and scalars
//! - Commands whose trailing arguments are option pairs and an optional callback
//! - Dual-mode completion: a callback, or a handle that can be awaited, polled
//!   or waited on from a plain thread
//! - Synchronous validation, so malformed input never reaches the server
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferrodoc::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let conn = connect("mydb", ConnectOptions::default()).await?;
//!
//!     let adults = Value::map().with("age", Value::map().with("$gte", 18));
//!     let names = conn
//!         .fetch("users", adults, FetchOptions::new().only(["name"]).sort("name", "asc"), None)?
//!         .into_handle()
//!         .ok_or("callback given")?
//!         .await?;
//!     println!("{names:?}");
//!
//!     conn.remove_one(
//!         "users",
//!         Value::map().with("name", "John"),
//!         Some(callback(|removed| println!("removed: {removed:?}"))),
//!     )?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Driver-independent building blocks.
pub mod model {
    pub use ferrodoc_core::*;
}

/// MongoDB connections and command dispatch.
pub mod mongodb {
    pub use ferrodoc_mongodb::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use ferrodoc_mongodb::prelude::*;
}

// Re-export key types at the crate root
pub use ferrodoc_core::{Command, FetchOptions, ValidationError, Value};
pub use ferrodoc_mongodb::{Connection, MongoError, Reply, connect};
