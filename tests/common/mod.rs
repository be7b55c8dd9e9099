//! Shared test fixtures: an in-memory document driver.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document, doc};
use ferrodoc::mongodb::document::with_id;
use ferrodoc::mongodb::driver::explain_command;
use ferrodoc::mongodb::{
    Callback, Connection, DocumentDriver, Dispatched, FindSpec, MongoError, MongoResult, Reply,
    WriteStatus, callback,
};
use ferrodoc::model::ValidationResult;
use tokio::sync::{Notify, oneshot};

/// Collections held in memory, answering the subset of the query language
/// the tests use.
#[derive(Default)]
pub struct MemoryDriver {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    unacknowledged: bool,
    gate: Option<Arc<Notify>>,
    fail_with: Option<String>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes report nothing back, as under `w: 0`.
    pub fn unacknowledged() -> Self {
        Self {
            unacknowledged: true,
            ..Self::default()
        }
    }

    /// Every operation waits for a permit on `gate` before running.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Every operation fails with a query error.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Snapshot a collection.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_collection(&self, collection: &str) -> bool {
        self.collections.lock().unwrap().contains_key(collection)
    }

    async fn enter(&self) -> MongoResult<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.fail_with {
            Some(message) => Err(MongoError::query(message.clone())),
            None => Ok(()),
        }
    }

    fn matching(&self, collection: &str, filter: &Document) -> Vec<Document> {
        self.documents(collection)
            .into_iter()
            .filter(|doc| matches(doc, filter))
            .collect()
    }
}

#[async_trait]
impl DocumentDriver for MemoryDriver {
    async fn insert_one(&self, collection: &str, document: Document) -> MongoResult<Document> {
        self.enter().await?;
        let stored = with_id(document, Bson::ObjectId(ObjectId::new()));
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> MongoResult<Vec<Document>> {
        self.enter().await?;
        let stored: Vec<Document> = documents
            .into_iter()
            .map(|doc| with_id(doc, Bson::ObjectId(ObjectId::new())))
            .collect();
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> MongoResult<Vec<Document>> {
        self.enter().await?;
        let mut found = self.matching(collection, &filter);
        if let Some(sort) = &spec.sort {
            found.sort_by(|a, b| sort_order(a, b, sort));
        }
        let skip = usize::try_from(spec.skip).unwrap_or(usize::MAX);
        let limit = spec
            .effective_limit()
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
        Ok(found
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| project(doc, spec.projection.as_ref()))
            .collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> MongoResult<Option<Document>> {
        let spec = FindSpec { one: true, ..spec };
        Ok(self.find(collection, filter, spec).await?.into_iter().next())
    }

    async fn explain(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> MongoResult<Document> {
        self.enter().await?;
        let command = explain_command(collection, filter.clone(), &spec);
        Ok(doc! {
            "queryPlanner": {
                "namespace": format!("test.{collection}"),
                "parsedQuery": filter,
                "winningPlan": { "stage": "COLLSCAN" },
            },
            "command": command,
        })
    }

    async fn count(&self, collection: &str, filter: Document) -> MongoResult<u64> {
        self.enter().await?;
        Ok(self.matching(collection, &filter).len() as u64)
    }

    async fn delete(&self, collection: &str, filter: Document, one: bool) -> MongoResult<u64> {
        self.enter().await?;
        let mut collections = self.collections.lock().unwrap();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let mut removed = 0;
        docs.retain(|doc| {
            if (one && removed == 1) || !matches(doc, &filter) {
                return true;
            }
            removed += 1;
            false
        });
        Ok(removed)
    }

    async fn replace(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> MongoResult<Document> {
        self.enter().await?;
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();

        let status = match docs.iter().position(|doc| matches(doc, &filter)) {
            Some(index) => {
                let id = docs[index].get("_id").cloned().unwrap_or(Bson::Null);
                let replaced = with_id(replacement, id);
                let modified = u64::from(docs[index] != replaced);
                docs[index] = replaced;
                WriteStatus {
                    acknowledged: true,
                    matched_count: Some(1),
                    modified_count: Some(modified),
                    upserted_id: None,
                }
            }
            None if upsert => {
                let id = ObjectId::new();
                docs.push(with_id(replacement, Bson::ObjectId(id)));
                WriteStatus {
                    acknowledged: true,
                    matched_count: Some(0),
                    modified_count: Some(0),
                    upserted_id: Some(id.into()),
                }
            }
            None => WriteStatus {
                acknowledged: true,
                matched_count: Some(0),
                modified_count: Some(0),
                upserted_id: None,
            },
        };

        if self.unacknowledged {
            return Ok(Document::new());
        }
        Ok(status.to_document())
    }

    async fn drop_collection(&self, collection: &str) -> MongoResult<()> {
        self.enter().await?;
        self.collections.lock().unwrap().remove(collection);
        Ok(())
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(field, condition)| {
        let value = doc.get(field);
        match condition {
            Bson::Document(ops) if ops.keys().all(|k| k.starts_with('$')) => {
                ops.iter().all(|(op, operand)| apply(op, value, operand))
            }
            expected => value.is_some_and(|v| compare(v, expected) == Some(Ordering::Equal)),
        }
    })
}

fn apply(op: &str, value: Option<&Bson>, operand: &Bson) -> bool {
    let ordering = value.and_then(|v| compare(v, operand));
    match op {
        "$gt" => ordering == Some(Ordering::Greater),
        "$gte" => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        "$lt" => ordering == Some(Ordering::Less),
        "$lte" => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        "$ne" => ordering != Some(Ordering::Equal),
        "$in" => match operand {
            Bson::Array(choices) => value.is_some_and(|v| {
                choices
                    .iter()
                    .any(|choice| compare(v, choice) == Some(Ordering::Equal))
            }),
            _ => false,
        },
        other => panic!("unsupported operator {other}"),
    }
}

fn number(bson: &Bson) -> Option<f64> {
    match bson {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
    match (number(a), number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => match (a, b) {
            (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
            (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
            (x, y) if x == y => Some(Ordering::Equal),
            _ => None,
        },
    }
}

fn sort_order(a: &Document, b: &Document, sort: &Document) -> Ordering {
    for (field, direction) in sort {
        let ordering = match (a.get(field), b.get(field)) {
            (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = if number(direction) == Some(-1.0) {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn project(doc: Document, projection: Option<&Document>) -> Document {
    let Some(projection) = projection else {
        return doc;
    };
    doc.into_iter()
        .filter(|(field, _)| match projection.get(field) {
            Some(flag) => number(flag) != Some(0.0),
            None => field == "_id",
        })
        .collect()
}

/// A connection over a fresh in-memory driver on the current runtime.
pub fn connection() -> Connection<MemoryDriver> {
    Connection::new(MemoryDriver::new()).unwrap()
}

/// Await the handle of a command issued without a callback.
pub async fn by_handle(dispatched: ValidationResult<Dispatched>) -> MongoResult<Reply> {
    dispatched
        .unwrap()
        .into_handle()
        .expect("command was issued without a callback")
        .await
}

/// Issue a command with a callback and await what the callback receives.
pub async fn by_callback<F>(issue: F) -> MongoResult<Reply>
where
    F: FnOnce(Callback) -> ValidationResult<Dispatched>,
{
    let (tx, rx) = oneshot::channel();
    let dispatched = issue(callback(move |result| {
        let _ = tx.send(result);
    }))
    .unwrap();
    assert!(dispatched.is_callback());
    rx.await.expect("callback was never invoked")
}
