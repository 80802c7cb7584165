//! Typed repository operations.
//!
//! # Responsibility
//! - Open the store on first use and reuse the handle afterwards.
//! - Provide CRUD, list-field mutation, join and aggregation calls per
//!   collection, returning raw mappings or materialized records.
//!
//! # Invariants
//! - `insert` never sends a client identifier; the store assigns `_id`.
//! - `update` never rewrites `_id`.
//! - `push`/`push_list` keep set semantics; `pull` removes every match.
//! - `cleanup_relations` is not atomic across documents.

use super::config::{ConnectionConfig, EmbeddedConnector, StoreConnector};
use super::{Collection, Query, RepoError, RepoResult};
use crate::model::object_id::{self, ObjectId};
use crate::record::{Document, Mapping, Record, RecordError, ID_FIELD};
use crate::store::{document_id, DocumentStore};
use log::{debug, error, info};
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

static GLOBAL: OnceCell<Repository> = OnceCell::new();

/// Data-access façade bound to one connection configuration.
pub struct Repository {
    config: ConnectionConfig,
    connector: Box<dyn StoreConnector>,
    store: OnceCell<Arc<dyn DocumentStore>>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("config", &self.config)
            .field("connected", &self.store.get().is_some())
            .finish()
    }
}

/// Parameters of a left-outer join from a local to a foreign collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub local: Collection,
    pub local_field: String,
    pub foreign: Collection,
    pub foreign_field: String,
    /// Field receiving the matched foreign documents.
    pub to_field: String,
    /// Emit one row per matched foreign document; rows without matches are
    /// dropped.
    pub unwind: bool,
}

impl Join {
    pub fn new(
        local: Collection,
        local_field: impl Into<String>,
        foreign: Collection,
        foreign_field: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self {
            local,
            local_field: local_field.into(),
            foreign,
            foreign_field: foreign_field.into(),
            to_field: to_field.into(),
            unwind: false,
        }
    }

    pub fn unwind(mut self, unwind: bool) -> Self {
        self.unwind = unwind;
        self
    }

    /// `[$match] $lookup [$unwind]` stages; `$match` only for a non-empty
    /// filter.
    pub fn pipeline(&self, filter: Mapping) -> Vec<Mapping> {
        let mut pipeline = Vec::with_capacity(3);
        if !filter.is_empty() {
            pipeline.push(single("$match", Value::Object(filter)));
        }
        pipeline.push(single(
            "$lookup",
            json!({
                "from": self.foreign.as_str(),
                "localField": self.local_field,
                "foreignField": self.foreign_field,
                "as": self.to_field,
            }),
        ));
        if self.unwind {
            pipeline.push(single("$unwind", Value::String(format!("${}", self.to_field))));
        }
        pipeline
    }
}

impl Repository {
    /// Repository served by the embedded connector.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_connector(config, EmbeddedConnector)
    }

    pub fn with_connector(config: ConnectionConfig, connector: impl StoreConnector + 'static) -> Self {
        Self {
            config,
            connector: Box::new(connector),
            store: OnceCell::new(),
        }
    }

    /// Repository bound to an already open store.
    pub fn with_store(config: ConnectionConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config,
            connector: Box::new(EmbeddedConnector),
            store: OnceCell::with_value(store),
        }
    }

    /// Installs the process-wide repository.
    ///
    /// # Errors
    /// - `RepoError::AlreadyInitialized` when one is already installed.
    pub fn init_global(repository: Repository) -> RepoResult<&'static Repository> {
        let mut installed = false;
        let global = GLOBAL.get_or_init(|| {
            installed = true;
            repository
        });
        if installed {
            Ok(global)
        } else {
            Err(RepoError::AlreadyInitialized)
        }
    }

    /// Process-wide repository, if installed.
    pub fn global() -> Option<&'static Repository> {
        GLOBAL.get()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn store(&self) -> RepoResult<&Arc<dyn DocumentStore>> {
        self.store
            .get_or_try_init(|| {
                let started_at = Instant::now();
                info!(
                    "event=repo_connect module=repo status=start uri={}",
                    self.config.redacted_uri()
                );
                match self.connector.connect(&self.config) {
                    Ok(store) => {
                        info!(
                            "event=repo_connect module=repo status=ok duration_ms={}",
                            started_at.elapsed().as_millis()
                        );
                        Ok(store)
                    }
                    Err(err) => {
                        error!(
                            "event=repo_connect module=repo status=error duration_ms={} error={}",
                            started_at.elapsed().as_millis(),
                            err
                        );
                        Err(RepoError::Store(err))
                    }
                }
            })
    }

    /// Writes `item` without its identifier and returns the stored document.
    ///
    /// Returns `Ok(None)` when the store does not acknowledge the write.
    pub fn insert(&self, collection: Collection, item: &impl Record) -> RepoResult<Option<Mapping>> {
        let mut document = item.as_mapping()?;
        document.remove(ID_FIELD);

        let outcome = self.store()?.insert_one(collection.as_str(), document)?;
        debug!(
            "event=repo_insert module=repo status=ok collection={collection} acknowledged={}",
            outcome.acknowledged
        );
        if !outcome.acknowledged {
            return Ok(None);
        }
        self.find_one(collection, Query::by_id(outcome.inserted_id))
    }

    pub fn insert_as<T: Record>(
        &self,
        collection: Collection,
        item: &impl Record,
    ) -> RepoResult<Option<T>> {
        materialize_one(self.insert(collection, item)?)
    }

    /// Every document matching `query`.
    pub fn find(&self, collection: Collection, query: Query) -> RepoResult<Vec<Mapping>> {
        let filter = query.into_filter()?;
        let found = self.store()?.find(collection.as_str(), &filter)?;
        debug!(
            "event=repo_find module=repo status=ok collection={collection} count={}",
            found.len()
        );
        Ok(found)
    }

    pub fn find_as<T: Record>(&self, collection: Collection, query: Query) -> RepoResult<Vec<T>> {
        Ok(T::from_mapping_list(&self.find(collection, query)?)?)
    }

    pub fn find_one(&self, collection: Collection, query: Query) -> RepoResult<Option<Mapping>> {
        let filter = query.into_filter()?;
        let found = self.store()?.find_one(collection.as_str(), &filter)?;
        debug!(
            "event=repo_find_one module=repo status=ok collection={collection} found={}",
            found.is_some()
        );
        Ok(found)
    }

    pub fn find_one_as<T: Record>(&self, collection: Collection, query: Query) -> RepoResult<Option<T>> {
        materialize_one(self.find_one(collection, query)?)
    }

    /// Deletes the first match; returns whether a document was removed.
    pub fn delete(&self, collection: Collection, query: Query) -> RepoResult<bool> {
        let filter = query.into_filter()?;
        let deleted = self.store()?.delete_one(collection.as_str(), &filter)?;
        debug!("event=repo_delete module=repo status=ok collection={collection} deleted={deleted}");
        Ok(deleted > 0)
    }

    /// Deletes every document of `collection`. Meant for test fixtures.
    pub fn purge(&self, collection: Collection) -> RepoResult<u64> {
        let deleted = self
            .store()?
            .delete_many(collection.as_str(), &Mapping::new())?;
        debug!("event=repo_purge module=repo status=ok collection={collection} deleted={deleted}");
        Ok(deleted)
    }

    /// Sets every field of `item` except `_id` on the document with the
    /// item's identifier, then returns the stored document.
    ///
    /// An item without identifier matches nothing and yields `Ok(None)`.
    pub fn update(&self, collection: Collection, item: &impl Document) -> RepoResult<Option<Mapping>> {
        let Some(id) = item.id() else {
            debug!("event=repo_update module=repo status=skip collection={collection} reason=no_id");
            return Ok(None);
        };
        let mut values = item.as_mapping()?;
        values.remove(ID_FIELD);

        let outcome = self.store()?.update_one(
            collection.as_str(),
            &id_filter(id),
            &single("$set", Value::Object(values)),
        )?;
        debug!(
            "event=repo_update module=repo status=ok collection={collection} matched={} modified={}",
            outcome.matched_count, outcome.modified_count
        );
        self.find_one(collection, Query::by_id(id))
    }

    pub fn update_as<T: Record>(
        &self,
        collection: Collection,
        item: &impl Document,
    ) -> RepoResult<Option<T>> {
        materialize_one(self.update(collection, item)?)
    }

    /// Replaces the first element of `field_name` matched by `field_query`
    /// on the document `document_id`.
    ///
    /// `field_query` addresses elements by dotted path, e.g.
    /// `{"items.id": "1"}`.
    pub fn update_list_item(
        &self,
        collection: Collection,
        document_id: ObjectId,
        field_name: &str,
        field_query: Mapping,
        item: &impl Serialize,
    ) -> RepoResult<bool> {
        let mut filter = field_query;
        filter.insert(ID_FIELD.to_string(), object_id::to_value(&document_id));
        let update = single(
            "$set",
            Value::Object(single(&format!("{field_name}.$"), to_value(item)?)),
        );
        self.modify(collection, "update_list_item", &filter, &update)
    }

    /// Adds `item` to the set-like array `field_name`.
    pub fn push(
        &self,
        collection: Collection,
        document_id: ObjectId,
        field_name: &str,
        item: &impl Serialize,
    ) -> RepoResult<bool> {
        let update = single("$addToSet", Value::Object(single(field_name, to_value(item)?)));
        self.modify(collection, "push", &id_filter(document_id), &update)
    }

    /// Adds every item to the set-like array `field_name`.
    ///
    /// Returns `Ok(None)` without contacting the store when `items` is empty.
    pub fn push_list<I: Serialize>(
        &self,
        collection: Collection,
        document_id: ObjectId,
        field_name: &str,
        items: &[I],
    ) -> RepoResult<Option<bool>> {
        if items.is_empty() {
            return Ok(None);
        }
        let values = items.iter().map(to_value).collect::<RepoResult<Vec<_>>>()?;
        let update = single(
            "$addToSet",
            Value::Object(single(field_name, json!({ "$each": values }))),
        );
        self.modify(collection, "push_list", &id_filter(document_id), &update)
            .map(Some)
    }

    /// Removes every element of `field_name` matching `item`.
    pub fn pull(
        &self,
        collection: Collection,
        document_id: ObjectId,
        field_name: &str,
        item: &impl Serialize,
    ) -> RepoResult<bool> {
        let update = single("$pull", Value::Object(single(field_name, to_value(item)?)));
        self.modify(collection, "pull", &id_filter(document_id), &update)
    }

    /// Local documents matching `matching`, each enriched with its foreign
    /// matches under `join.to_field`.
    pub fn join(&self, join: &Join, matching: Query) -> RepoResult<Vec<Mapping>> {
        let pipeline = join.pipeline(matching.into_filter()?);
        let joined = self.store()?.aggregate(join.local.as_str(), &pipeline)?;
        debug!(
            "event=repo_join module=repo status=ok local={} foreign={} unwind={} count={}",
            join.local,
            join.foreign,
            join.unwind,
            joined.len()
        );
        Ok(joined)
    }

    pub fn join_as<T: Record>(&self, join: &Join, matching: Query) -> RepoResult<Vec<T>> {
        Ok(T::from_mapping_list(&self.join(join, matching)?)?)
    }

    /// Runs caller-supplied aggregation stages.
    pub fn aggregate(&self, collection: Collection, pipeline: &[Mapping]) -> RepoResult<Vec<Mapping>> {
        let result = self.store()?.aggregate(collection.as_str(), pipeline)?;
        debug!(
            "event=repo_aggregate module=repo status=ok collection={collection} stages={} count={}",
            pipeline.len(),
            result.len()
        );
        Ok(result)
    }

    pub fn aggregate_as<T: Record>(
        &self,
        collection: Collection,
        pipeline: &[Mapping],
    ) -> RepoResult<Vec<T>> {
        Ok(T::from_mapping_list(&self.aggregate(collection, pipeline)?)?)
    }

    /// Pulls elements matching `matching` out of `field_name` in every
    /// document that holds one; returns how many documents changed.
    ///
    /// Documents are found first and pulled one by one, so a concurrent
    /// write between the two steps is not covered.
    pub fn cleanup_relations(
        &self,
        collection: Collection,
        field_name: &str,
        matching: Mapping,
    ) -> RepoResult<u64> {
        let affected = self.find(
            collection,
            Query::new().with(field_name, json!({ "$elemMatch": matching.clone() })),
        )?;

        let mut modified = 0;
        for document in &affected {
            let Some(id) = document_id(document) else {
                continue;
            };
            if self.pull(collection, id, field_name, &matching)? {
                modified += 1;
            }
        }
        debug!(
            "event=repo_cleanup_relations module=repo status=ok collection={collection} field={field_name} found={} modified={modified}",
            affected.len()
        );
        Ok(modified)
    }

    fn modify(
        &self,
        collection: Collection,
        operation: &str,
        filter: &Mapping,
        update: &Mapping,
    ) -> RepoResult<bool> {
        let outcome = self
            .store()?
            .update_one(collection.as_str(), filter, update)?;
        debug!(
            "event=repo_{operation} module=repo status=ok collection={collection} matched={} modified={}",
            outcome.matched_count, outcome.modified_count
        );
        Ok(outcome.modified_count > 0)
    }
}

fn materialize_one<T: Record>(document: Option<Mapping>) -> RepoResult<Option<T>> {
    document
        .map(|document| T::from_mapping(&document, false))
        .transpose()
        .map_err(RepoError::from)
}

fn to_value(item: &impl Serialize) -> RepoResult<Value> {
    serde_json::to_value(item).map_err(|err| {
        RepoError::Record(RecordError::TypeConversion {
            record: "list item",
            message: err.to_string(),
        })
    })
}

fn id_filter(id: ObjectId) -> Mapping {
    single(ID_FIELD, object_id::to_value(&id))
}

fn single(key: &str, value: Value) -> Mapping {
    let mut mapping = Mapping::new();
    mapping.insert(key.to_string(), value);
    mapping
}
