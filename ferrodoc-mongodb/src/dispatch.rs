//! Command dispatch.
//!
//! Every command runs through the same stages:
//!
//! 1. **Bound** - arguments are resolved (typed options, or the binder for
//!    [`Connection::invoke`]).
//! 2. **Validated** - native filters and documents are coerced, projection and
//!    sort documents are built. Failures return [`ValidationError`] right
//!    here and nothing is scheduled.
//! 3. **Dispatched** - exactly one driver operation is started. With a
//!    callback, the callback receives the decoded result; without one a
//!    [`CompletionHandle`] is returned immediately and receives it instead.
//! 4. **Completed** - the operation finishes and its single result or error
//!    is delivered.
//!
//! ```rust,no_run
//! use ferrodoc_core::{FetchOptions, Value};
//! use ferrodoc_mongodb::connection::{self, ConnectOptions};
//! use ferrodoc_mongodb::dispatch::{Reply, callback};
//!
//! # async fn example() -> ferrodoc_mongodb::MongoResult<()> {
//! let conn = connection::connect("mydb", ConnectOptions::default()).await?;
//! let adults = Value::map().with("age", Value::map().with("$gte", 18));
//!
//! // Completion handle.
//! let handle = conn
//!     .fetch("users", adults.clone(), FetchOptions::new().only(["name"]), None)?
//!     .into_handle()
//!     .expect("no callback was given");
//! let users = handle.await?;
//!
//! // Callback.
//! conn.fetch_one(
//!     "users",
//!     adults,
//!     FetchOptions::new(),
//!     Some(callback(|result| match result {
//!         Ok(Reply::NotFound) => println!("nobody"),
//!         Ok(reply) => println!("{reply:?}"),
//!         Err(e) => eprintln!("{e}"),
//!     })),
//! )?;
//! # let _ = users;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use bson::Document;
use ferrodoc_core::completion::{self, CompletionHandle};
use ferrodoc_core::{
    Abandoned, Arg, Command, FetchOptions, InsertOptions, RemoveOptions, ReplaceOptions, ValidationError,
    ValidationResult, Value,
};
use tracing::{debug, trace, warn};

use crate::connection::Connection;
use crate::document::{from_document, to_document, to_filter};
use crate::driver::DocumentDriver;
use crate::error::{MongoError, MongoResult};
use crate::query::FindSpec;
use crate::status::WriteStatus;

/// A completion callback.
pub type Callback = Box<dyn FnOnce(MongoResult<Reply>) + Send + 'static>;

/// Box a closure as a [`Callback`].
pub fn callback<F>(f: F) -> Callback
where
    F: FnOnce(MongoResult<Reply>) + Send + 'static,
{
    Box::new(f)
}

/// Hands a command's result to its callback exactly once.
///
/// Dropped undelivered, when the operation panics or its task is cancelled,
/// the callback receives [`MongoError::Abandoned`] instead.
struct Delivery {
    command: Command,
    callback: Option<Callback>,
}

impl Delivery {
    fn new(command: Command, callback: Callback) -> Self {
        Self {
            command,
            callback: Some(callback),
        }
    }

    fn deliver(mut self, result: MongoResult<Reply>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            warn!(command = self.command.name(), "Command abandoned before completion");
            callback(Err(MongoError::from(Abandoned)));
        }
    }
}

/// The handle returned for commands issued without a callback.
pub type ReplyHandle = CompletionHandle<Reply, MongoError>;

/// A command's successful result.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Decoded document(s), explain output, or a dropped collection's name.
    Value(Value),
    /// A single-document fetch matched nothing.
    NotFound,
    /// A match count or a removed-document count.
    Count(u64),
    /// Outcome of a replace.
    Status(WriteStatus),
}

impl Reply {
    /// Check if this is the not-found sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Borrow the decoded value.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Take the decoded value.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Get the count.
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow the write status.
    pub fn status(&self) -> Option<&WriteStatus> {
        match self {
            Self::Status(status) => Some(status),
            _ => None,
        }
    }
}

/// How a dispatched command will deliver its result.
#[must_use = "without a callback the result only arrives through the handle"]
pub enum Dispatched {
    /// The caller's callback will be invoked.
    Callback,
    /// The result will be written into this handle.
    Handle(ReplyHandle),
}

impl Dispatched {
    /// Take the completion handle, if no callback was given.
    pub fn into_handle(self) -> Option<ReplyHandle> {
        match self {
            Self::Handle(handle) => Some(handle),
            Self::Callback => None,
        }
    }

    /// Check if the result goes to a callback.
    pub fn is_callback(&self) -> bool {
        matches!(self, Self::Callback)
    }
}

impl fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback => f.write_str("Callback"),
            Self::Handle(_) => f.write_str("Handle(..)"),
        }
    }
}

/// Stage of a command invocation, as logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Arguments resolved.
    Bound,
    /// Wire documents built.
    Validated,
    /// Driver operation started.
    Dispatched,
    /// Result delivered.
    Completed,
    /// Rejected before dispatch.
    Failed,
}

/// A validated driver operation.
#[derive(Debug, Clone, PartialEq)]
enum Operation {
    InsertOne(Document),
    InsertMany(Vec<Document>),
    Count(Document),
    Explain(Document, FindSpec),
    FindOne(Document, FindSpec),
    Find(Document, FindSpec),
    Delete { filter: Document, one: bool },
    Replace { filter: Document, replacement: Document, upsert: bool },
    Drop,
}

impl Operation {
    fn insert(data: &Value, options: InsertOptions) -> ValidationResult<Self> {
        if !options.batch {
            return to_document(data, "data").map(Self::InsertOne);
        }
        match data {
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| to_document(item, "data"))
                .collect::<ValidationResult<Vec<_>>>()
                .map(Self::InsertMany),
            other => Err(ValidationError::invalid_document(
                "data",
                "non-empty array of maps",
                other,
            )),
        }
    }

    fn fetch(filter: &Value, options: &FetchOptions) -> ValidationResult<Self> {
        let filter = to_filter(filter)?;
        if options.count {
            return Ok(Self::Count(filter));
        }
        let spec = FindSpec::build(options)?;
        Ok(if options.explain {
            Self::Explain(filter, spec)
        } else if options.one {
            Self::FindOne(filter, spec)
        } else {
            Self::Find(filter, spec)
        })
    }

    fn remove(filter: &Value, options: RemoveOptions) -> ValidationResult<Self> {
        Ok(Self::Delete {
            filter: to_filter(filter)?,
            one: options.one,
        })
    }

    fn replace(
        filter: &Value,
        replacement: &Value,
        options: ReplaceOptions,
    ) -> ValidationResult<Self> {
        Ok(Self::Replace {
            filter: to_filter(filter)?,
            replacement: to_document(replacement, "replacement")?,
            upsert: options.upsert,
        })
    }

    async fn execute<D>(self, driver: &D, collection: &str) -> MongoResult<Reply>
    where
        D: DocumentDriver + ?Sized,
    {
        let reply = match self {
            Self::InsertOne(doc) => {
                Reply::Value(from_document(driver.insert_one(collection, doc).await?))
            }
            Self::InsertMany(docs) => Reply::Value(Value::Array(
                driver
                    .insert_many(collection, docs)
                    .await?
                    .into_iter()
                    .map(from_document)
                    .collect(),
            )),
            Self::Count(filter) => Reply::Count(driver.count(collection, filter).await?),
            Self::Explain(filter, spec) => {
                Reply::Value(from_document(driver.explain(collection, filter, spec).await?))
            }
            Self::FindOne(filter, spec) => match driver.find_one(collection, filter, spec).await? {
                Some(doc) => Reply::Value(from_document(doc)),
                None => Reply::NotFound,
            },
            Self::Find(filter, spec) => Reply::Value(Value::Array(
                driver
                    .find(collection, filter, spec)
                    .await?
                    .into_iter()
                    .map(from_document)
                    .collect(),
            )),
            Self::Delete { filter, one } => {
                Reply::Count(driver.delete(collection, filter, one).await?)
            }
            Self::Replace {
                filter,
                replacement,
                upsert,
            } => {
                let status = driver.replace(collection, filter, replacement, upsert).await?;
                Reply::Status(WriteStatus::from_document(&status))
            }
            Self::Drop => {
                driver.drop_collection(collection).await?;
                Reply::Value(Value::String(collection.to_string()))
            }
        };
        Ok(reply)
    }
}

impl<D: DocumentDriver> Connection<D> {
    /// Insert a document, or an array of documents when `options.batch` is set.
    ///
    /// Resolves to the inserted document(s) with their `_id`.
    pub fn insert(
        &self,
        collection: &str,
        data: Value,
        options: InsertOptions,
        callback: Option<Callback>,
    ) -> ValidationResult<Dispatched> {
        let operation = validated(Command::Insert, Operation::insert(&data, options))?;
        Ok(self.dispatch(Command::Insert, collection, operation, callback))
    }

    /// Insert several documents at once.
    pub fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Value>,
        callback: Option<Callback>,
    ) -> ValidationResult<Dispatched> {
        self.insert(
            collection,
            Value::Array(documents),
            InsertOptions::batch(),
            callback,
        )
    }

    /// Query a collection.
    ///
    /// With `count` set, resolves to [`Reply::Count`] and ignores every other
    /// option. Otherwise `explain` resolves to the query plan, `one` to the
    /// first match or [`Reply::NotFound`], and the default to an array of
    /// every match.
    pub fn fetch(
        &self,
        collection: &str,
        filter: Value,
        options: FetchOptions,
        callback: Option<Callback>,
    ) -> ValidationResult<Dispatched> {
        self.fetch_as(Command::Fetch, collection, filter, options, callback)
    }

    /// Fetch the first match, or [`Reply::NotFound`].
    pub fn fetch_one(
        &self,
        collection: &str,
        filter: Value,
        options: FetchOptions,
        callback: Option<Callback>,
    ) -> ValidationResult<Dispatched> {
        let options = options.count(false).one(true);
        self.fetch_as(Command::FetchOne, collection, filter, options, callback)
    }

    /// Count matches.
    pub fn fetch_count(
        &self,
        collection: &str,
        filter: Value,
        callback: Option<Callback>,
    ) -> ValidationResult<Dispatched> {
        let options = FetchOptions::new().count(true);
        self.fetch_as(Command::FetchCount, collection, filter, options, callback)
    }

    /// Remove matches; resolves to the number removed.
    pub fn remove(
        &self,
        collection: &str,
        filter: Value,
        options: RemoveOptions,
        callback: Option<Callback>,
    ) -> ValidationResult<Dispatched> {
        self.remove_as(Command::Remove, collection, filter, options, callback)
    }

    /// Remove the first match.
    pub fn remove_one(
        &self,
        collection: &str,
        filter: Value,
        callback: Option<Callback>,
    ) -> ValidationResult<Dispatched> {
        self.remove_as(Command::RemoveOne, collection, filter, RemoveOptions::one(), callback)
    }

    /// Replace the first match; resolves to a [`Reply::Status`].
    pub fn replace(
        &self,
        collection: &str,
        filter: Value,
        replacement: Value,
        options: ReplaceOptions,
        callback: Option<Callback>,
    ) -> ValidationResult<Dispatched> {
        let operation = validated(
            Command::Replace,
            Operation::replace(&filter, &replacement, options),
        )?;
        Ok(self.dispatch(Command::Replace, collection, operation, callback))
    }

    /// Drop a collection; resolves to its name.
    pub fn drop_collection(
        &self,
        collection: &str,
        callback: Option<Callback>,
    ) -> ValidationResult<Dispatched> {
        Ok(self.dispatch(Command::Drop, collection, Operation::Drop, callback))
    }

    /// Invoke a command from positional values and a free-form tail of
    /// option name/value pairs and at most one callback.
    ///
    /// ```rust,no_run
    /// use ferrodoc_core::{Arg, Command, Value};
    /// use ferrodoc_mongodb::dispatch::callback;
    ///
    /// # use ferrodoc_core::ValidationError;
    /// # fn example(conn: &ferrodoc_mongodb::Connection) -> Result<(), ValidationError> {
    /// conn.invoke(
    ///     Command::Remove,
    ///     "users",
    ///     vec![Value::map().with("name", "John")],
    ///     vec![
    ///         Arg::Callback(callback(|removed| println!("{removed:?}"))),
    ///         Arg::value("one"),
    ///         Arg::value(true),
    ///     ],
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn invoke(
        &self,
        command: Command,
        collection: &str,
        positionals: Vec<Value>,
        tail: Vec<Arg<Callback>>,
    ) -> ValidationResult<Dispatched> {
        let mut bound = failed_on_err(command, command.signature().bind(positionals, tail))?;
        trace!(command = command.name(), stage = ?Stage::Bound, "Arguments bound");
        let callback = bound.callback.take();

        match command {
            Command::Insert => {
                let options = failed_on_err(command, InsertOptions::from_bound(&bound))?;
                let data = bound.take_positional("data");
                self.insert(collection, data, options, callback)
            }
            Command::Fetch => {
                let options = failed_on_err(command, FetchOptions::from_bound(&bound))?;
                let filter = bound.take_positional("where");
                self.fetch(collection, filter, options, callback)
            }
            Command::FetchOne => {
                let options = failed_on_err(command, FetchOptions::from_bound(&bound))?;
                let filter = bound.take_positional("where");
                self.fetch_one(collection, filter, options, callback)
            }
            Command::FetchCount => {
                let filter = bound.take_positional("where");
                self.fetch_count(collection, filter, callback)
            }
            Command::Remove => {
                let options = failed_on_err(command, RemoveOptions::from_bound(&bound))?;
                let filter = bound.take_positional("where");
                self.remove(collection, filter, options, callback)
            }
            Command::RemoveOne => {
                let filter = bound.take_positional("where");
                self.remove_one(collection, filter, callback)
            }
            Command::Replace => {
                let options = failed_on_err(command, ReplaceOptions::from_bound(&bound))?;
                let filter = bound.take_positional("where");
                let replacement = bound.take_positional("replacement");
                self.replace(collection, filter, replacement, options, callback)
            }
            Command::Drop => self.drop_collection(collection, callback),
        }
    }

    fn fetch_as(
        &self,
        command: Command,
        collection: &str,
        filter: Value,
        options: FetchOptions,
        callback: Option<Callback>,
    ) -> ValidationResult<Dispatched> {
        let operation = validated(command, Operation::fetch(&filter, &options))?;
        Ok(self.dispatch(command, collection, operation, callback))
    }

    fn remove_as(
        &self,
        command: Command,
        collection: &str,
        filter: Value,
        options: RemoveOptions,
        callback: Option<Callback>,
    ) -> ValidationResult<Dispatched> {
        let operation = validated(command, Operation::remove(&filter, options))?;
        Ok(self.dispatch(command, collection, operation, callback))
    }

    fn dispatch(
        &self,
        command: Command,
        collection: &str,
        operation: Operation,
        callback: Option<Callback>,
    ) -> Dispatched {
        let (deliver, dispatched) = match callback {
            Some(callback) => (callback, Dispatched::Callback),
            None => {
                let (completer, handle) = completion::channel();
                let deliver: Callback = Box::new(move |result| completer.complete(result));
                (deliver, Dispatched::Handle(handle))
            }
        };

        debug!(
            command = command.name(),
            collection = %collection,
            callback = dispatched.is_callback(),
            stage = ?Stage::Dispatched,
            "Command dispatched"
        );

        let delivery = Delivery::new(command, deliver);
        let driver = Arc::clone(&self.driver);
        let collection = collection.to_string();
        self.run_async(
            async move { operation.execute(driver.as_ref(), &collection).await },
            move |result| {
                trace!(
                    command = command.name(),
                    ok = result.is_ok(),
                    stage = ?Stage::Completed,
                    "Command completed"
                );
                delivery.deliver(result);
            },
        );

        dispatched
    }
}

fn validated(command: Command, operation: ValidationResult<Operation>) -> ValidationResult<Operation> {
    let operation = failed_on_err(command, operation)?;
    trace!(command = command.name(), stage = ?Stage::Validated, "Command validated");
    Ok(operation)
}

fn failed_on_err<T>(command: Command, result: ValidationResult<T>) -> ValidationResult<T> {
    result.inspect_err(|e| {
        debug!(command = command.name(), error = %e, stage = ?Stage::Failed, "Command rejected");
    })
}
