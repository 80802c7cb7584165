//! Embedded document store on SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections and create the documents
//!   table on first use.
//! - Persist documents as JSON bodies keyed by collection and `_id`.
//! - Serve `DocumentStore` calls by evaluating operators in process.
//!
//! # Invariants
//! - `(collection, _id)` is unique.
//! - `find` returns documents in insertion order.
//! - Every operation holds the connection lock for its whole
//!   read-modify-write cycle.

use super::pipeline::run_pipeline;
use super::query::matches;
use super::update::apply_update;
use super::{
    document_id, DocumentStore, InsertOutcome, StoreError, StoreResult, UpdateOutcome,
};
use crate::model::object_id::{self, ObjectId};
use crate::record::{Mapping, ID_FIELD};
use log::{error, info};
use rusqlite::{params, Connection, ErrorCode};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Schema revision recorded in `PRAGMA user_version` of every store file.
pub const SCHEMA_VERSION: u32 = 1;

const DOCUMENTS_TABLE_SQL: &str = include_str!("documents.sql");

/// Document store persisted in one SQLite table.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDocumentStore").finish_non_exhaustive()
    }
}

struct StoredDocument {
    seq: i64,
    body: Mapping,
}

impl SqliteDocumentStore {
    /// Opens a store file, creating it when absent.
    ///
    /// # Side effects
    /// - Creates the documents table in a fresh file.
    /// - Emits `store_open` logging events with duration and status.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with("file", || Connection::open(path))
    }

    /// Opens a private in-memory store.
    ///
    /// # Side effects
    /// - Emits `store_open` logging events with duration and status.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_with("memory", Connection::open_in_memory)
    }

    fn open_with(
        mode: &str,
        connect: impl FnOnce() -> rusqlite::Result<Connection>,
    ) -> StoreResult<Self> {
        let started_at = Instant::now();
        info!("event=store_open module=store status=start mode={mode}");

        let mut conn = match connect() {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=store_open module=store status=error mode={mode} duration_ms={} error_code=store_open_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        match bootstrap_connection(&mut conn) {
            Ok(()) => {
                info!(
                    "event=store_open module=store status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    conn: Mutex::new(conn),
                })
            }
            Err(err) => {
                error!(
                    "event=store_open module=store status=error mode={mode} duration_ms={} error_code=store_bootstrap_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn insert_one(&self, collection: &str, mut document: Mapping) -> StoreResult<InsertOutcome> {
        let id = match document.get(ID_FIELD) {
            None => {
                let id = ObjectId::new();
                document.insert(ID_FIELD.to_string(), object_id::to_value(&id));
                id
            }
            Some(value) => object_id::from_value(value).ok_or_else(|| {
                StoreError::InvalidDocument(format!("`{ID_FIELD}` must be an ObjectId"))
            })?,
        };
        let body = encode_body(&document)?;

        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3);",
            params![collection, id.to_hex(), body],
        );
        match inserted {
            Ok(_) => Ok(InsertOutcome {
                acknowledged: true,
                inserted_id: id,
            }),
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    id,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find(&self, collection: &str, filter: &Mapping) -> StoreResult<Vec<Mapping>> {
        let conn = self.lock()?;
        let found = matching(&conn, collection, filter)?;
        Ok(found.into_iter().map(|stored| stored.body).collect())
    }

    fn delete_one(&self, collection: &str, filter: &Mapping) -> StoreResult<u64> {
        let conn = self.lock()?;
        let Some(first) = matching(&conn, collection, filter)?.into_iter().next() else {
            return Ok(0);
        };
        let deleted = conn.execute("DELETE FROM documents WHERE seq = ?1;", [first.seq])?;
        Ok(deleted as u64)
    }

    fn delete_many(&self, collection: &str, filter: &Mapping) -> StoreResult<u64> {
        let mut conn = self.lock()?;
        let found = matching(&conn, collection, filter)?;
        let tx = conn.transaction()?;
        let mut deleted = 0_u64;
        for stored in found {
            deleted += tx.execute("DELETE FROM documents WHERE seq = ?1;", [stored.seq])? as u64;
        }
        tx.commit()?;
        Ok(deleted)
    }

    fn update_one(
        &self,
        collection: &str,
        filter: &Mapping,
        update: &Mapping,
    ) -> StoreResult<UpdateOutcome> {
        let conn = self.lock()?;
        let Some(mut stored) = matching(&conn, collection, filter)?.into_iter().next() else {
            return Ok(UpdateOutcome::default());
        };

        let original_id = document_id(&stored.body);
        if !apply_update(&mut stored.body, filter, update)? {
            return Ok(UpdateOutcome {
                matched_count: 1,
                modified_count: 0,
            });
        }
        if document_id(&stored.body) != original_id {
            return Err(StoreError::InvalidQuery(format!(
                "`{ID_FIELD}` cannot be modified by an update"
            )));
        }

        conn.execute(
            "UPDATE documents SET body = ?1 WHERE seq = ?2;",
            params![encode_body(&stored.body)?, stored.seq],
        )?;
        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: 1,
        })
    }

    fn aggregate(&self, collection: &str, pipeline: &[Mapping]) -> StoreResult<Vec<Mapping>> {
        let conn = self.lock()?;
        let documents = bodies(load(&conn, collection, None)?);
        run_pipeline(documents, pipeline, &mut |foreign| {
            Ok(bodies(load(&conn, foreign, None)?))
        })
    }
}

fn bootstrap_connection(conn: &mut Connection) -> StoreResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    ensure_documents_table(conn)
}

/// Creates the documents table in a fresh file; files stamped by a newer
/// schema are refused untouched.
fn ensure_documents_table(conn: &mut Connection) -> StoreResult<()> {
    let stamped: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if stamped > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchemaVersion {
            db_version: stamped,
            latest_supported: SCHEMA_VERSION,
        });
    }
    if stamped == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(DOCUMENTS_TABLE_SQL)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}

/// Matching documents in insertion order; a native `_id` equality narrows
/// the scan to one row.
fn matching(conn: &Connection, collection: &str, filter: &Mapping) -> StoreResult<Vec<StoredDocument>> {
    let narrowed = filter.get(ID_FIELD).and_then(object_id::from_value);
    let mut found = Vec::new();
    for stored in load(conn, collection, narrowed)? {
        if matches(&stored.body, filter)? {
            found.push(stored);
        }
    }
    Ok(found)
}

fn load(conn: &Connection, collection: &str, id: Option<ObjectId>) -> StoreResult<Vec<StoredDocument>> {
    let mut rows = Vec::new();
    match id {
        Some(id) => {
            let mut stmt = conn.prepare(
                "SELECT seq, body FROM documents WHERE collection = ?1 AND doc_id = ?2 ORDER BY seq;",
            )?;
            let mapped = stmt.query_map(params![collection, id.to_hex()], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in mapped {
                rows.push(row?);
            }
        }
        None => {
            let mut stmt = conn
                .prepare("SELECT seq, body FROM documents WHERE collection = ?1 ORDER BY seq;")?;
            let mapped = stmt.query_map([collection], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in mapped {
                rows.push(row?);
            }
        }
    }

    rows.into_iter()
        .map(|(seq, body)| {
            let body = serde_json::from_str::<Mapping>(&body)
                .map_err(|err| StoreError::InvalidDocument(format!("row {seq}: {err}")))?;
            Ok(StoredDocument { seq, body })
        })
        .collect()
}

fn bodies(stored: Vec<StoredDocument>) -> Vec<Mapping> {
    stored.into_iter().map(|stored| stored.body).collect()
}

fn encode_body(document: &Mapping) -> StoreResult<String> {
    serde_json::to_string(document).map_err(|err| StoreError::InvalidDocument(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{ensure_documents_table, SqliteDocumentStore, SCHEMA_VERSION};
    use rusqlite::Connection;
    use crate::record::Mapping;
    use crate::store::{document_id, DocumentStore, StoreError};
    use serde_json::{json, Value};

    fn mapping(value: Value) -> Mapping {
        value.as_object().cloned().expect("fixture must be a mapping")
    }

    #[test]
    fn insert_assigns_id_and_find_preserves_order() {
        let store = SqliteDocumentStore::open_in_memory().unwrap();
        let first = store.insert_one("c", mapping(json!({ "n": 1 }))).unwrap();
        store.insert_one("c", mapping(json!({ "n": 2 }))).unwrap();
        store.insert_one("other", mapping(json!({ "n": 3 }))).unwrap();

        let found = store.find("c", &Mapping::new()).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0]["n"], json!(1));
        assert_eq!(document_id(&found[0]), Some(first.inserted_id));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let store = SqliteDocumentStore::open_in_memory().unwrap();
        let outcome = store.insert_one("c", Mapping::new()).unwrap();
        let again = mapping(json!({ "_id": outcome.inserted_id }));
        assert!(matches!(
            store.insert_one("c", again),
            Err(StoreError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn update_one_touches_first_match_only() {
        let store = SqliteDocumentStore::open_in_memory().unwrap();
        store.insert_one("c", mapping(json!({ "k": "x", "v": 0 }))).unwrap();
        store.insert_one("c", mapping(json!({ "k": "x", "v": 0 }))).unwrap();

        let outcome = store
            .update_one(
                "c",
                &mapping(json!({ "k": "x" })),
                &mapping(json!({ "$set": { "v": 1 } })),
            )
            .unwrap();
        assert_eq!((outcome.matched_count, outcome.modified_count), (1, 1));

        let values = store
            .find("c", &Mapping::new())
            .unwrap()
            .into_iter()
            .map(|doc| doc["v"].clone())
            .collect::<Vec<_>>();
        assert_eq!(values, vec![json!(1), json!(0)]);
    }

    #[test]
    fn delete_many_counts_removed_documents() {
        let store = SqliteDocumentStore::open_in_memory().unwrap();
        for n in 0..3 {
            store.insert_one("c", mapping(json!({ "n": n }))).unwrap();
        }
        let removed = store
            .delete_many("c", &mapping(json!({ "n": { "$gte": 1 } })))
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.find("c", &Mapping::new()).unwrap().len(), 1);
    }

    #[test]
    fn documents_table_is_created_once_and_stamped() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_documents_table(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO documents (collection, doc_id, body) VALUES ('c', 'x', '{}')",
            [],
        )
        .unwrap();
        ensure_documents_table(&mut conn).unwrap();

        let stamped: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stamped, SCHEMA_VERSION);
        assert_eq!(rows, 1);
    }
}
