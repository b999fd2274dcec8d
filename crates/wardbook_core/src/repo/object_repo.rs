//! Object repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/get/list/update/delete over the `objects` table.
//! - Register and probe collection namespaces.
//!
//! # Invariants
//! - `update` reads, merges and writes inside one transaction and never
//!   inserts a missing record.
//! - Read paths reject undecodable persisted payloads instead of masking them.

use crate::db::DbError;
use crate::error::{StoreError, StoreResult};
use crate::model::collection::CollectionName;
use crate::model::stored_object::{now_epoch_ms, ObjectId, Payload, StoredObject};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const OBJECT_SELECT_SQL: &str = "SELECT
    collection,
    object_id,
    object_data,
    created_at,
    updated_at
FROM objects";

/// Options for listing one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Cap on returned records; `None` returns every record.
    pub limit: Option<u32>,
    /// Reverse the insertion order, newest record first.
    pub newest_first: bool,
}

impl ListOptions {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

/// Repository interface for collection-scoped object CRUD.
pub trait ObjectRepository {
    fn create_object(&self, collection: &CollectionName, payload: Payload)
        -> StoreResult<StoredObject>;
    fn get_object(&self, collection: &CollectionName, id: ObjectId)
        -> StoreResult<Option<StoredObject>>;
    fn list_objects(
        &self,
        collection: &CollectionName,
        options: ListOptions,
    ) -> StoreResult<Vec<StoredObject>>;
    fn update_object(
        &self,
        collection: &CollectionName,
        id: ObjectId,
        partial: Payload,
    ) -> StoreResult<StoredObject>;
    /// Hard-deletes one record. Returns `NotFound` when nothing was removed.
    fn delete_object(&self, collection: &CollectionName, id: ObjectId) -> StoreResult<()>;
    /// Registers a namespace. Returns `true` when it did not exist before.
    fn ensure_collection(&self, collection: &CollectionName) -> StoreResult<bool>;
    fn collection_exists(&self, collection: &CollectionName) -> StoreResult<bool>;
    fn list_collections(&self) -> StoreResult<Vec<CollectionName>>;
}

/// SQLite-backed object repository borrowing a migrated connection.
pub struct SqliteObjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteObjectRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ObjectRepository for SqliteObjectRepository<'_> {
    fn create_object(
        &self,
        collection: &CollectionName,
        payload: Payload,
    ) -> StoreResult<StoredObject> {
        let object = StoredObject::new(collection.clone(), payload, now_epoch_ms());
        let data = serde_json::to_string(&object.object_data)?;

        self.conn.execute(
            "INSERT INTO objects (
                collection,
                object_id,
                object_data,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                collection.as_str(),
                object.object_id.to_string(),
                data,
                object.created_at,
                object.updated_at,
            ],
        )?;

        Ok(object)
    }

    fn get_object(
        &self,
        collection: &CollectionName,
        id: ObjectId,
    ) -> StoreResult<Option<StoredObject>> {
        select_one(self.conn, collection, id)
    }

    fn list_objects(
        &self,
        collection: &CollectionName,
        options: ListOptions,
    ) -> StoreResult<Vec<StoredObject>> {
        let mut sql = format!("{OBJECT_SELECT_SQL} WHERE collection = ?");
        let mut bind_values = vec![SqlValue::Text(collection.as_str().to_string())];

        if options.newest_first {
            sql.push_str(" ORDER BY created_at DESC, rowid DESC");
        } else {
            sql.push_str(" ORDER BY created_at ASC, rowid ASC");
        }

        if let Some(limit) = options.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(SqlValue::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut objects = Vec::new();

        while let Some(row) = rows.next()? {
            objects.push(parse_object_row(row)?);
        }

        Ok(objects)
    }

    fn update_object(
        &self,
        collection: &CollectionName,
        id: ObjectId,
        partial: Payload,
    ) -> StoreResult<StoredObject> {
        let tx = self.conn.unchecked_transaction()?;

        let mut object = select_one(&tx, collection, id)?.ok_or_else(|| StoreError::NotFound {
            collection: collection.clone(),
            object_id: id,
        })?;
        object.apply_update(partial, now_epoch_ms());
        let data = serde_json::to_string(&object.object_data)?;

        tx.execute(
            "UPDATE objects
             SET
                object_data = ?1,
                updated_at = ?2
             WHERE collection = ?3
               AND object_id = ?4;",
            params![
                data,
                object.updated_at,
                collection.as_str(),
                id.to_string()
            ],
        )?;
        tx.commit()?;

        Ok(object)
    }

    fn delete_object(&self, collection: &CollectionName, id: ObjectId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM objects WHERE collection = ?1 AND object_id = ?2;",
            params![collection.as_str(), id.to_string()],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                collection: collection.clone(),
                object_id: id,
            });
        }

        Ok(())
    }

    fn ensure_collection(&self, collection: &CollectionName) -> StoreResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO collections (name) VALUES (?1);",
            [collection.as_str()],
        )?;
        Ok(inserted > 0)
    }

    fn collection_exists(&self, collection: &CollectionName) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM collections WHERE name = ?1);",
            [collection.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_collections(&self) -> StoreResult<Vec<CollectionName>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM collections ORDER BY name ASC;")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        names
            .into_iter()
            .map(|name| {
                CollectionName::new(name.clone()).map_err(|_| {
                    corrupt(format!("invalid collection name `{name}` in collections.name"))
                })
            })
            .collect()
    }
}

fn select_one(
    conn: &Connection,
    collection: &CollectionName,
    id: ObjectId,
) -> StoreResult<Option<StoredObject>> {
    let mut stmt = conn.prepare(&format!(
        "{OBJECT_SELECT_SQL}
         WHERE collection = ?1
           AND object_id = ?2;"
    ))?;

    let row = stmt
        .query_row(params![collection.as_str(), id.to_string()], |row| {
            Ok(parse_object_row(row))
        })
        .optional()?;

    row.transpose()
}

fn parse_object_row(row: &Row<'_>) -> StoreResult<StoredObject> {
    let collection_text: String = row.get("collection")?;
    let object_type = CollectionName::new(collection_text.clone()).map_err(|_| {
        corrupt(format!(
            "invalid collection `{collection_text}` in objects.collection"
        ))
    })?;

    let id_text: String = row.get("object_id")?;
    let object_id = id_text
        .parse::<ObjectId>()
        .map_err(|_| corrupt(format!("invalid object id `{id_text}` in objects.object_id")))?;

    let data_text: String = row.get("object_data")?;
    let object_data = match serde_json::from_str::<serde_json::Value>(&data_text) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(_) => {
            return Err(corrupt(format!(
                "object {object_id} payload is not a JSON object"
            )))
        }
        Err(err) => {
            return Err(corrupt(format!(
                "object {object_id} payload is not valid JSON: {err}"
            )))
        }
    };

    Ok(StoredObject {
        object_id,
        object_type,
        object_data,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn corrupt(message: String) -> StoreError {
    StoreError::StorageFailure(DbError::CorruptRecord(message))
}
