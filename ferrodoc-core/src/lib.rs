//! # ferrodoc-core
//!
//! Driver-independent building blocks for issuing document-database commands
//! without blocking:
//!
//! - [`Value`]: ordered maps, sequences, scalars and null as the application
//!   sees them, with a pass-through arm for driver-native scalars
//! - [`signature`]: per-command parameter declarations and the binder that
//!   splits a call into positionals, defaulted options and a callback
//! - [`options`]: typed option structs for each command
//! - [`completion`]: the one-shot handle returned when no callback is given
//! - [`ValidationError`]: everything that can go wrong before dispatch
//!
//! ## Binding a call
//!
//! ```rust
//! use ferrodoc_core::options::FetchOptions;
//! use ferrodoc_core::signature::{Arg, Command};
//! use ferrodoc_core::Value;
//!
//! let bound = Command::Fetch
//!     .signature()
//!     .bind::<()>(
//!         vec![Value::map().with("age", Value::map().with("$gte", 10))],
//!         vec![Arg::value("limit"), Arg::value(2)],
//!     )
//!     .unwrap();
//!
//! let options = FetchOptions::from_bound(&bound).unwrap();
//! assert_eq!(options.limit, 2);
//! assert!(!options.one);
//! ```

pub mod completion;
pub mod error;
pub mod logging;
pub mod options;
pub mod signature;
pub mod value;

pub use completion::{Completer, CompletionHandle, Slot};
pub use error::{Abandoned, ValidationError, ValidationResult};
pub use options::{Direction, FetchOptions, InsertOptions, RemoveOptions, ReplaceOptions};
pub use signature::{Arg, Bound, Command, Signature};
pub use value::{Map, Native, Value};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::completion::{Completer, CompletionHandle, Slot};
    pub use crate::error::{Abandoned, ValidationError, ValidationResult};
    pub use crate::options::{
        Direction, FetchOptions, InsertOptions, RemoveOptions, ReplaceOptions,
    };
    pub use crate::signature::{Arg, Bound, Command, Signature};
    pub use crate::value::{Map, Native, Value};
}
