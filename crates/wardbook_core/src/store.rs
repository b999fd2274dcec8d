//! Asynchronous object store handle.
//!
//! # Responsibility
//! - Expose the create/get/list/update/delete surface to collaborators.
//! - Run blocking SQLite work off the caller's task.
//!
//! # Invariants
//! - One handle owns one connection; clones share it.
//! - Every operation is one unit of work against one collection. There is no
//!   cross-operation locking: a `get` followed by `update` from two callers is
//!   last-writer-wins.
//! - Failures are returned, never retried here.

use crate::config::StoreConfig;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::error::{StoreError, StoreResult};
use crate::model::collection::CollectionName;
use crate::model::stored_object::{ObjectId, Payload, StoredObject};
use crate::repo::object_repo::{ListOptions, ObjectRepository, SqliteObjectRepository};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::OnceCell;

/// Cloneable handle to an opened store.
#[derive(Clone)]
pub struct ObjectStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore").finish_non_exhaustive()
    }
}

impl ObjectStore {
    /// Opens the database described by `config` and applies migrations.
    pub async fn open(config: &StoreConfig) -> StoreResult<Self> {
        let db_path = config.db_path.clone();
        let busy_timeout = config.busy_timeout();

        let conn = tokio::task::spawn_blocking(move || match db_path {
            Some(path) => open_db(path, busy_timeout),
            None => open_db_in_memory(),
        })
        .await
        .map_err(|err| DbError::TaskAborted(err.to_string()))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an isolated in-memory store.
    pub async fn open_in_memory() -> StoreResult<Self> {
        Self::open(&StoreConfig::default()).await
    }

    /// Whether both handles share the same underlying connection.
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.conn, &other.conn)
    }

    /// Creates a record with a generated id; both timestamps are set to now.
    ///
    /// Fails with `StorageFailure` if `collection` is not registered.
    pub async fn create(
        &self,
        collection: &CollectionName,
        payload: Payload,
    ) -> StoreResult<StoredObject> {
        let target = collection.clone();
        self.run("create", collection, move |repo| {
            repo.create_object(&target, payload)
        })
        .await
    }

    /// Fetches one record, or `NotFound`.
    pub async fn get(&self, collection: &CollectionName, id: ObjectId) -> StoreResult<StoredObject> {
        let target = collection.clone();
        self.run("get", collection, move |repo| {
            repo.get_object(&target, id)?
                .ok_or(StoreError::NotFound {
                    collection: target,
                    object_id: id,
                })
        })
        .await
    }

    /// Lists records in insertion order, capped at `limit` when given.
    pub async fn list(
        &self,
        collection: &CollectionName,
        limit: Option<u32>,
    ) -> StoreResult<Vec<StoredObject>> {
        self.list_with(
            collection,
            ListOptions {
                limit,
                ..ListOptions::default()
            },
        )
        .await
    }

    pub async fn list_with(
        &self,
        collection: &CollectionName,
        options: ListOptions,
    ) -> StoreResult<Vec<StoredObject>> {
        let target = collection.clone();
        self.run("list", collection, move |repo| {
            repo.list_objects(&target, options)
        })
        .await
    }

    /// Shallow-merges `partial` into an existing record's payload.
    ///
    /// Returns `NotFound` without creating anything when `id` is absent.
    pub async fn update(
        &self,
        collection: &CollectionName,
        id: ObjectId,
        partial: Payload,
    ) -> StoreResult<StoredObject> {
        let target = collection.clone();
        self.run("update", collection, move |repo| {
            repo.update_object(&target, id, partial)
        })
        .await
    }

    pub async fn delete(&self, collection: &CollectionName, id: ObjectId) -> StoreResult<()> {
        let target = collection.clone();
        self.run("delete", collection, move |repo| {
            repo.delete_object(&target, id)
        })
        .await
    }

    /// Registers a collection namespace. Returns `true` if it was new.
    pub async fn ensure_collection(&self, collection: &CollectionName) -> StoreResult<bool> {
        let target = collection.clone();
        self.run("ensure_collection", collection, move |repo| {
            repo.ensure_collection(&target)
        })
        .await
    }

    pub async fn collection_exists(&self, collection: &CollectionName) -> StoreResult<bool> {
        let target = collection.clone();
        self.run("collection_exists", collection, move |repo| {
            repo.collection_exists(&target)
        })
        .await
    }

    pub async fn list_collections(&self) -> StoreResult<Vec<CollectionName>> {
        let conn = Arc::clone(&self.conn);
        blocking(conn, |repo| repo.list_collections()).await
    }

    async fn run<T, F>(&self, op: &'static str, collection: &CollectionName, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteObjectRepository<'_>) -> StoreResult<T> + Send + 'static,
    {
        let started_at = Instant::now();
        let result = blocking(Arc::clone(&self.conn), f).await;
        let duration_ms = started_at.elapsed().as_millis();

        match &result {
            Ok(_) => debug!(
                "event=object_{op} module=store status=ok collection={collection} duration_ms={duration_ms}"
            ),
            Err(err @ StoreError::NotFound { .. }) => info!(
                "event=object_{op} module=store status=not_found collection={collection} duration_ms={duration_ms} error_code={}",
                err.code()
            ),
            Err(err @ StoreError::InvalidArgument(_)) => warn!(
                "event=object_{op} module=store status=error collection={collection} duration_ms={duration_ms} error_code={} error={err}",
                err.code()
            ),
            Err(err) => error!(
                "event=object_{op} module=store status=error collection={collection} duration_ms={duration_ms} error_code={} error={err}",
                err.code()
            ),
        }

        result
    }
}

async fn blocking<T, F>(conn: Arc<Mutex<Connection>>, f: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce(&SqliteObjectRepository<'_>) -> StoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let guard = conn
            .lock()
            .map_err(|_| DbError::TaskAborted("connection lock poisoned".to_string()))?;
        f(&SqliteObjectRepository::new(&guard))
    })
    .await
    .map_err(|err| StoreError::StorageFailure(DbError::TaskAborted(err.to_string())))?
}

/// Parses a caller-supplied identifier, rejecting blank or malformed input.
pub fn parse_object_id(raw: &str) -> StoreResult<ObjectId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidArgument(
            "object id must not be empty".to_string(),
        ));
    }
    trimmed
        .parse()
        .map_err(|_| StoreError::InvalidArgument(format!("malformed object id `{trimmed}`")))
}

/// Store handle opened on first use and cached for the life of this value.
///
/// Concurrent first callers await one shared open. A failed open is not
/// cached, so a later call retries it.
pub struct LazyObjectStore {
    config: StoreConfig,
    cell: OnceCell<ObjectStore>,
}

impl LazyObjectStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> StoreResult<&ObjectStore> {
        self.cell
            .get_or_try_init(|| ObjectStore::open(&self.config))
            .await
    }

    pub fn is_open(&self) -> bool {
        self.cell.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_object_id, LazyObjectStore, ObjectStore};
    use crate::config::StoreConfig;
    use crate::model::collection::CollectionName;
    use crate::model::stored_object::Payload;

    #[test]
    fn parse_object_id_rejects_blank_and_malformed_input() {
        assert!(parse_object_id("  ").unwrap_err().is_invalid_argument());
        assert!(parse_object_id("abc").unwrap_err().is_invalid_argument());
        assert!(parse_object_id("00000000-0000-4000-8000-000000000001").is_ok());
    }

    #[tokio::test]
    async fn separate_opens_are_isolated() {
        let first = ObjectStore::open_in_memory().await.unwrap();
        let second = ObjectStore::open_in_memory().await.unwrap();
        assert!(!first.same_instance(&second));
        assert!(first.same_instance(&first.clone()));

        first
            .create(&CollectionName::patient(), Payload::new())
            .await
            .unwrap();
        let listed = second.list(&CollectionName::patient(), None).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn lazy_store_opens_once_for_concurrent_callers() {
        let lazy = LazyObjectStore::new(StoreConfig::default());
        assert!(!lazy.is_open());

        let (a, b, c) = tokio::join!(lazy.get(), lazy.get(), lazy.get());
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(a.same_instance(b));
        assert!(b.same_instance(c));
        assert!(lazy.is_open());

        a.create(&CollectionName::nurse(), Payload::new())
            .await
            .unwrap();
        let seen = c.list(&CollectionName::nurse(), None).await.unwrap();
        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn lazy_store_does_not_cache_failed_open() {
        let dir = tempfile::tempdir().unwrap();
        let lazy = LazyObjectStore::new(StoreConfig::with_db_path(
            dir.path().join("missing").join("store.sqlite3"),
        ));

        let err = lazy.get().await.unwrap_err();
        assert!(err.is_storage_failure());
        assert!(!lazy.is_open());
    }
}
