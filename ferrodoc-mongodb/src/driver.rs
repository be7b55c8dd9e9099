//! The driver seam.
//!
//! [`DocumentDriver`] is everything the dispatcher needs from a database
//! driver: collection-level operations that take and return wire documents.
//! [`MongoClient`] implements it over the official MongoDB driver; tests can
//! supply an in-memory implementation.

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::options::{
    FindOneOptions, FindOptions, ReplaceOptions as DriverReplaceOptions,
};
use tracing::debug;

use crate::client::MongoClient;
use crate::document::{from_wire, with_id};
use crate::error::MongoResult;
use crate::query::FindSpec;
use crate::status::WriteStatus;

/// Collection-level operations over already-built wire documents.
#[async_trait]
pub trait DocumentDriver: Send + Sync + 'static {
    /// Insert one document; returns it as stored, `_id` included.
    async fn insert_one(&self, collection: &str, document: Document) -> MongoResult<Document>;

    /// Insert documents in order; returns them as stored, `_id` included.
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> MongoResult<Vec<Document>>;

    /// Find every match.
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> MongoResult<Vec<Document>>;

    /// Find the first match.
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> MongoResult<Option<Document>>;

    /// Explain the query plan of a find.
    async fn explain(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> MongoResult<Document>;

    /// Count matches.
    async fn count(&self, collection: &str, filter: Document) -> MongoResult<u64>;

    /// Delete matches, or only the first when `one` is set. Returns the number removed.
    async fn delete(&self, collection: &str, filter: Document, one: bool) -> MongoResult<u64>;

    /// Replace the first match; returns a wire status document
    /// (see [`WriteStatus::from_document`]).
    async fn replace(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> MongoResult<Document>;

    /// Drop a collection.
    async fn drop_collection(&self, collection: &str) -> MongoResult<()>;
}

/// Build the `explain` command for a find.
pub fn explain_command(collection: &str, filter: Document, spec: &FindSpec) -> Document {
    let mut find = doc! { "find": collection, "filter": filter };
    if let Some(ref projection) = spec.projection {
        find.insert("projection", projection.clone());
    }
    if let Some(ref sort) = spec.sort {
        find.insert("sort", sort.clone());
    }
    if spec.skip > 0 {
        find.insert("skip", i64::try_from(spec.skip).unwrap_or(i64::MAX));
    }
    if let Some(limit) = spec.effective_limit() {
        find.insert("limit", limit);
    }
    if spec.one {
        find.insert("singleBatch", true);
    }
    doc! { "explain": find, "verbosity": "queryPlanner" }
}

#[async_trait]
impl DocumentDriver for MongoClient {
    async fn insert_one(&self, collection: &str, document: Document) -> MongoResult<Document> {
        debug!(collection = %collection, "Executing insert_one");
        let result = self
            .collection_doc(collection)
            .insert_one(&document, None)
            .await?;
        Ok(with_id(document, result.inserted_id))
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> MongoResult<Vec<Document>> {
        debug!(collection = %collection, count = documents.len(), "Executing insert_many");
        let mut result = self
            .collection_doc(collection)
            .insert_many(documents.iter(), None)
            .await?;
        Ok(documents
            .into_iter()
            .enumerate()
            .map(|(index, document)| {
                let id = result.inserted_ids.remove(&index).unwrap_or(Bson::Null);
                with_id(document, id)
            })
            .collect())
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> MongoResult<Vec<Document>> {
        debug!(collection = %collection, filter = %filter, "Executing find");
        let mut options = FindOptions::default();
        options.limit = spec.effective_limit();
        options.projection = spec.projection;
        options.sort = spec.sort;
        if spec.skip > 0 {
            options.skip = Some(spec.skip);
        }

        let cursor = self.collection_doc(collection).find(filter, options).await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> MongoResult<Option<Document>> {
        debug!(collection = %collection, filter = %filter, "Executing find_one");
        let mut options = FindOneOptions::default();
        options.projection = spec.projection;
        options.sort = spec.sort;
        if spec.skip > 0 {
            options.skip = Some(spec.skip);
        }

        let doc = self
            .collection_doc(collection)
            .find_one(filter, options)
            .await?;
        Ok(doc)
    }

    async fn explain(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> MongoResult<Document> {
        debug!(collection = %collection, "Executing explain");
        self.run_command(explain_command(collection, filter, &spec))
            .await
    }

    async fn count(&self, collection: &str, filter: Document) -> MongoResult<u64> {
        debug!(collection = %collection, filter = %filter, "Executing count");
        let count = self
            .collection_doc(collection)
            .count_documents(filter, None)
            .await?;
        Ok(count)
    }

    async fn delete(&self, collection: &str, filter: Document, one: bool) -> MongoResult<u64> {
        debug!(collection = %collection, filter = %filter, one, "Executing delete");
        let collection = self.collection_doc(collection);
        let result = if one {
            collection.delete_one(filter, None).await?
        } else {
            collection.delete_many(filter, None).await?
        };
        Ok(result.deleted_count)
    }

    async fn replace(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> MongoResult<Document> {
        debug!(collection = %collection, filter = %filter, upsert, "Executing replace");
        let mut options = DriverReplaceOptions::default();
        options.upsert = Some(upsert);

        let result = self
            .collection_doc(collection)
            .replace_one(filter, &replacement, options)
            .await?;

        if self.config().unacknowledged_writes() {
            return Ok(Document::new());
        }

        Ok(WriteStatus {
            acknowledged: true,
            matched_count: Some(result.matched_count),
            modified_count: Some(result.modified_count),
            upserted_id: result.upserted_id.map(from_wire),
        }
        .to_document())
    }

    async fn drop_collection(&self, collection: &str) -> MongoResult<()> {
        debug!(collection = %collection, "Dropping collection");
        self.collection_doc(collection).drop(None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FindSpec;
    use ferrodoc_core::FetchOptions;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_explain_command_many() {
        let spec = FindSpec::build(
            &FetchOptions::new()
                .only(["name"])
                .sort("age", "desc")
                .skip(1)
                .limit(2),
        )
        .unwrap();
        let command = explain_command("users", doc! { "age": { "$gte": 10 } }, &spec);
        assert_eq!(
            command,
            doc! {
                "explain": {
                    "find": "users",
                    "filter": { "age": { "$gte": 10 } },
                    "projection": { "_id": 0, "name": 1 },
                    "sort": { "age": -1 },
                    "skip": 1_i64,
                    "limit": 2_i64
                },
                "verbosity": "queryPlanner"
            }
        );
    }

    #[test]
    fn test_explain_command_one() {
        let spec = FindSpec::build(&FetchOptions::new().one(true)).unwrap();
        let command = explain_command("users", doc! {}, &spec);
        let find = command.get_document("explain").unwrap();
        assert_eq!(find.get_i64("limit").unwrap(), 1);
        assert!(find.get_bool("singleBatch").unwrap());
        assert!(!find.contains_key("projection"));
        assert!(!find.contains_key("sort"));
    }
}
