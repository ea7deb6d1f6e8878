//! In-memory [`DocumentStore`] with realtime subscriptions.
//!
//! Collections are created on first write. Documents within a collection
//! are kept in id order, which is also the default listing order.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use banner_core::error::CoreError;
use banner_core::persistence::{
    BatchOp, CollectionCallback, DocumentCallback, DocumentStore, Page, QueryOptions,
    StoredDocument, Subscription,
};
use banner_core::types::EntityId;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;

use crate::bus::{ChangeBus, ChangeEvent, ChangeKind};
use crate::error::StoreError;
use crate::query;

type Collections = HashMap<String, BTreeMap<EntityId, StoredDocument>>;

struct Inner {
    collections: RwLock<Collections>,
    bus: ChangeBus,
}

/// Shared-state document store. Clones share the same data.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    inner: Arc<Inner>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                collections: RwLock::new(HashMap::new()),
                bus: ChangeBus::default(),
            }),
        }
    }

    /// The bus every committed write is published on.
    pub fn changes(&self) -> &ChangeBus {
        &self.inner.bus
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        let collections = self.inner.collections.read().await;
        collections.get(collection).map_or(0, BTreeMap::len)
    }

    async fn snapshot(&self, collection: &str) -> Vec<StoredDocument> {
        let collections = self.inner.collections.read().await;
        collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    fn publish_all(&self, events: Vec<ChangeEvent>) {
        for event in events {
            tracing::debug!(
                collection = %event.collection,
                document_id = %event.document_id,
                kind = ?event.kind,
                "Document changed",
            );
            self.inner.bus.publish(event);
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Write primitives
// ---------------------------------------------------------------------------

fn into_object(data: Value) -> Result<Map<String, Value>, StoreError> {
    match data {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}

/// Create or overwrite. Overwriting resets `createdAt`.
fn apply_create(
    collections: &mut Collections,
    collection: &str,
    id: Option<&str>,
    data: Value,
) -> Result<ChangeEvent, StoreError> {
    let data = Value::Object(into_object(data)?);
    let id = match id {
        Some(id) if id.trim().is_empty() => {
            return Err(StoreError::InvalidPath(format!("{collection}/{id}")))
        }
        Some(id) => id.to_string(),
        None => uuid::Uuid::new_v4().to_string(),
    };
    let now = Utc::now();
    let docs = collections.entry(collection.to_string()).or_default();
    let kind = if docs.contains_key(&id) {
        ChangeKind::Updated
    } else {
        ChangeKind::Created
    };
    docs.insert(
        id.clone(),
        StoredDocument {
            id: id.clone(),
            data,
            created_at: now,
            updated_at: now,
        },
    );
    Ok(ChangeEvent::new(collection, id, kind))
}

/// Merge top-level fields into an existing document.
fn apply_update(
    collections: &mut Collections,
    collection: &str,
    id: &str,
    data: Value,
) -> Result<ChangeEvent, StoreError> {
    let fields = into_object(data)?;
    let doc = collections
        .get_mut(collection)
        .and_then(|docs| docs.get_mut(id))
        .ok_or_else(|| StoreError::DocumentNotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
    if let Value::Object(existing) = &mut doc.data {
        existing.extend(fields);
    } else {
        doc.data = Value::Object(fields);
    }
    doc.updated_at = Utc::now();
    Ok(ChangeEvent::new(collection, id, ChangeKind::Updated))
}

/// Deleting a missing document succeeds without an event.
fn apply_delete(collections: &mut Collections, collection: &str, id: &str) -> Option<ChangeEvent> {
    collections
        .get_mut(collection)?
        .remove(id)
        .map(|_| ChangeEvent::new(collection, id, ChangeKind::Deleted))
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, collection: &str, id: Option<&str>, data: Value) -> Result<EntityId, CoreError> {
        let event = {
            let mut collections = self.inner.collections.write().await;
            apply_create(&mut collections, collection, id, data)?
        };
        let id = event.document_id.clone();
        self.publish_all(vec![event]);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, CoreError> {
        let collections = self.inner.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), CoreError> {
        let event = {
            let mut collections = self.inner.collections.write().await;
            apply_update(&mut collections, collection, id, data)?
        };
        self.publish_all(vec![event]);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), CoreError> {
        let event = {
            let mut collections = self.inner.collections.write().await;
            apply_delete(&mut collections, collection, id)
        };
        self.publish_all(event.into_iter().collect());
        Ok(())
    }

    async fn list(&self, collection: &str, options: &QueryOptions) -> Result<Page, CoreError> {
        let docs = self.snapshot(collection).await;
        Ok(query::run_query(docs, options)?)
    }

    async fn batch_write(&self, ops: Vec<BatchOp>) -> Result<(), CoreError> {
        let op_count = ops.len();
        let events = {
            let mut collections = self.inner.collections.write().await;
            // Stage on a copy; commit only if every operation succeeds.
            let mut staged = collections.clone();
            let mut events = Vec::with_capacity(op_count);
            for op in ops {
                match op {
                    BatchOp::Create { collection, id, data } => {
                        events.push(apply_create(&mut staged, &collection, id.as_deref(), data)?);
                    }
                    BatchOp::Update { collection, id, data } => {
                        events.push(apply_update(&mut staged, &collection, &id, data)?);
                    }
                    BatchOp::Delete { collection, id } => {
                        events.extend(apply_delete(&mut staged, &collection, &id));
                    }
                }
            }
            *collections = staged;
            events
        };
        tracing::debug!(op_count, "Batch committed");
        self.publish_all(events);
        Ok(())
    }

    /// Must be called from within a Tokio runtime.
    fn subscribe_document(&self, collection: &str, id: &str, callback: DocumentCallback) -> Subscription {
        let store = self.clone();
        let collection = collection.to_string();
        let id = id.to_string();
        let mut rx = self.inner.bus.subscribe();

        let task = tokio::spawn(async move {
            let current = store.get(&collection, &id).await.ok().flatten();
            callback(current);
            loop {
                match rx.recv().await {
                    Ok(event) if event.touches(&collection, &id) => {
                        let current = store.get(&collection, &id).await.ok().flatten();
                        callback(current);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, %collection, %id, "Document subscription lagged, resyncing");
                        let current = store.get(&collection, &id).await.ok().flatten();
                        callback(current);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Subscription::new(move || task.abort())
    }

    /// Must be called from within a Tokio runtime.
    fn subscribe_collection(
        &self,
        collection: &str,
        options: QueryOptions,
        callback: CollectionCallback,
    ) -> Subscription {
        let store = self.clone();
        let collection = collection.to_string();
        let mut rx = self.inner.bus.subscribe();

        let task = tokio::spawn(async move {
            let emit = |page: Result<Page, CoreError>| match page {
                Ok(page) => callback(page.documents),
                Err(e) => tracing::warn!(error = %e, %collection, "Collection subscription query failed"),
            };
            emit(store.list(&collection, &options).await);
            loop {
                match rx.recv().await {
                    Ok(event) if event.collection == collection => {
                        emit(store.list(&collection, &options).await);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(_)) => emit(store.list(&collection, &options).await),
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Subscription::new(move || task.abort())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[tokio::test]
    async fn create_assigns_id_and_timestamps() {
        let store = InMemoryDocumentStore::new();
        let id = store.create("banners", None, json!({"columns": 2})).await.unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());

        let doc = store.get("banners", &id).await.unwrap().unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.data["columns"], 2);
        assert_eq!(doc.created_at, doc.updated_at);
    }

    #[tokio::test]
    async fn create_with_explicit_id_overwrites() {
        let store = InMemoryDocumentStore::new();
        store.create("banners", Some("b1"), json!({"columns": 1, "extra": true})).await.unwrap();
        store.create("banners", Some("b1"), json!({"columns": 3})).await.unwrap();

        let doc = store.get("banners", "b1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"columns": 3}));
        assert_eq!(store.count("banners").await, 1);
    }

    #[tokio::test]
    async fn create_rejects_non_object_data() {
        let store = InMemoryDocumentStore::new();
        assert_matches!(
            store.create("banners", None, json!([1, 2])).await,
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            store.create("banners", Some(" "), json!({})).await,
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn update_merges_top_level_fields() {
        let store = InMemoryDocumentStore::new();
        store
            .create("banners", Some("b1"), json!({"columns": 1, "backgroundValue": "#fff"}))
            .await
            .unwrap();
        store.update("banners", "b1", json!({"columns": 2})).await.unwrap();

        let doc = store.get("banners", "b1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"columns": 2, "backgroundValue": "#fff"}));
        assert!(doc.updated_at >= doc.created_at);
    }

    #[tokio::test]
    async fn update_missing_document_is_not_found() {
        let store = InMemoryDocumentStore::new();
        assert_matches!(
            store.update("banners", "nope", json!({"columns": 2})).await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        store.create("banners", Some("b1"), json!({})).await.unwrap();
        store.delete("banners", "b1").await.unwrap();
        store.delete("banners", "b1").await.unwrap();
        assert!(store.get("banners", "b1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_batch_changes_nothing() {
        let store = InMemoryDocumentStore::new();
        store.create("banners", Some("b1"), json!({"columns": 1})).await.unwrap();

        let result = store
            .batch_write(vec![
                BatchOp::Update {
                    collection: "banners".to_string(),
                    id: "b1".to_string(),
                    data: json!({"columns": 3}),
                },
                BatchOp::Update {
                    collection: "banners".to_string(),
                    id: "missing".to_string(),
                    data: json!({"columns": 2}),
                },
            ])
            .await;

        assert_matches!(result, Err(CoreError::NotFound { .. }));
        let doc = store.get("banners", "b1").await.unwrap().unwrap();
        assert_eq!(doc.data["columns"], 1);
    }

    #[tokio::test]
    async fn successful_batch_applies_all_and_publishes() {
        let store = InMemoryDocumentStore::new();
        store.create("banners", Some("old"), json!({})).await.unwrap();
        let mut rx = store.changes().subscribe();

        store
            .batch_write(vec![
                BatchOp::Create {
                    collection: "banners".to_string(),
                    id: Some("new".to_string()),
                    data: json!({"columns": 2}),
                },
                BatchOp::Delete {
                    collection: "banners".to_string(),
                    id: "old".to_string(),
                },
            ])
            .await
            .unwrap();

        assert_eq!(store.count("banners").await, 1);
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Created);
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Deleted);
    }

    #[tokio::test]
    async fn list_unknown_collection_is_empty() {
        let store = InMemoryDocumentStore::new();
        let page = store.list("nothing", &QueryOptions::default()).await.unwrap();
        assert!(page.documents.is_empty());
        assert!(!page.has_more);
    }
}
