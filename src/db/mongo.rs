//! MongoDB client and typed collection wrapper

use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument, UpdateModifications},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::db::schemas::Metadata;
use crate::types::ConnectorError;

/// MongoDB server error code for unique index violations
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the server answers a ping
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, ConnectorError> {
        info!("Connecting to MongoDB at {}", uri);

        // Fail fast on an unreachable server instead of hanging at startup
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| ConnectorError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        let mongo = Self {
            client,
            db_name: db_name.to_string(),
        };
        mongo.ping().await?;

        info!("Connected to MongoDB database '{}'", db_name);
        Ok(mongo)
    }

    /// Round-trip a ping command
    pub async fn ping(&self) -> Result<(), ConnectorError> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| ConnectorError::Database(format!("MongoDB ping failed: {}", e)))
    }

    /// Get a typed collection with its indexes applied
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, ConnectorError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Create a new collection handle and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, ConnectorError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), ConnectorError> {
        let indices: Vec<IndexModel> = T::into_indices()
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        if indices.is_empty() {
            return Ok(());
        }

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| ConnectorError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, stamping metadata timestamps.
    ///
    /// Unique index violations surface as `Conflict`.
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, ConnectorError> {
        let now = DateTime::now();
        let metadata = item.mut_metadata();
        metadata.created_at.get_or_insert(now);
        metadata.updated_at = Some(now);

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| write_error(e, "Insert failed"))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ConnectorError::Database("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, ConnectorError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| ConnectorError::Database(format!("Find failed: {}", e)))
    }

    /// Find all documents matching `filter`, optionally sorted
    pub async fn find_many(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<T>, ConnectorError> {
        let cursor = match sort {
            Some(sort) => self.inner.find(filter).sort(sort).await,
            None => self.inner.find(filter).await,
        }
        .map_err(|e| ConnectorError::Database(format!("Find failed: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| ConnectorError::Database(format!("Cursor read failed: {}", e)))
    }

    /// Atomically update one document and return it as it is after the update.
    ///
    /// `None` means the filter matched nothing (and `upsert` was false). An
    /// upsert that loses a race on a unique index surfaces as `Conflict`.
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
        upsert: bool,
    ) -> Result<Option<T>, ConnectorError> {
        self.inner
            .find_one_and_update(filter, update)
            .upsert(upsert)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| write_error(e, "Update failed"))
    }

    /// Delete one document; true if something was removed
    pub async fn delete_one(&self, filter: Document) -> Result<bool, ConnectorError> {
        self.inner
            .delete_one(filter)
            .await
            .map(|result| result.deleted_count > 0)
            .map_err(|e| ConnectorError::Database(format!("Delete failed: {}", e)))
    }

    /// Delete every matching document; returns the count removed
    pub async fn delete_many(&self, filter: Document) -> Result<u64, ConnectorError> {
        self.inner
            .delete_many(filter)
            .await
            .map(|result| result.deleted_count)
            .map_err(|e| ConnectorError::Database(format!("Delete failed: {}", e)))
    }
}

/// Whether a driver error is a unique index violation.
///
/// Inserts report it as a write error; `findAndModify` upserts report it as a
/// command error.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// Map a failed write onto `Conflict` for unique index violations, `Database` otherwise
fn write_error(err: mongodb::error::Error, context: &str) -> ConnectorError {
    if is_duplicate_key(&err) {
        ConnectorError::Conflict("Document already exists".into())
    } else {
        ConnectorError::Database(format!("{}: {}", context, err))
    }
}
