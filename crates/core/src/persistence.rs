//! Persistence boundary contracts: document store and file storage.
//!
//! The editor is generic over [`DocumentStore`] and [`FileStorage`]; concrete
//! backends are injected by the surrounding application. A `BannerConfig` is
//! stored as a whole JSON document.

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::ids::random_suffix;
use crate::types::{EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A document as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub id: EntityId,
    /// JSON object payload.
    pub data: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Field value is one of the values in the filter's array.
    In,
    /// Field is an array containing the filter value.
    ArrayContains,
}

/// `field <op> value` on a top-level field of the document payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Options for [`DocumentStore::list`] and collection subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order_by: Option<OrderBy>,
    /// Page size. `None` returns every match.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Cursor from a previous [`Page`]: resume after this document id.
    #[serde(default)]
    pub start_after: Option<EntityId>,
}

impl QueryOptions {
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, cursor: impl Into<EntityId>) -> Self {
        self.start_after = Some(cursor.into());
        self
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub documents: Vec<StoredDocument>,
    pub has_more: bool,
    /// Pass to [`QueryOptions::start_after`] for the next page.
    pub cursor: Option<EntityId>,
}

/// One operation of an atomic batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchOp {
    Create {
        collection: String,
        id: Option<EntityId>,
        data: Value,
    },
    Update {
        collection: String,
        id: EntityId,
        data: Value,
    },
    Delete {
        collection: String,
        id: EntityId,
    },
}

/// Receives the document (or `None` once deleted) on every change.
pub type DocumentCallback = Box<dyn Fn(Option<StoredDocument>) + Send + Sync>;

/// Receives the full matching document list on every change.
pub type CollectionCallback = Box<dyn Fn(Vec<StoredDocument>) + Send + Sync>;

/// Handle for a realtime subscription. Unsubscribes when dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop receiving updates.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Collection-oriented document store.
///
/// `create` and `update` stamp `createdAt`/`updatedAt`; `update` merges the
/// top-level fields of `data` into the stored payload.
pub trait DocumentStore: Send + Sync {
    /// Create a document, with `id` or a store-assigned one. Returns the id.
    fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Value,
    ) -> impl Future<Output = Result<EntityId, CoreError>> + Send;

    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<StoredDocument>, CoreError>> + Send;

    fn update(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn delete(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn list(
        &self,
        collection: &str,
        options: &QueryOptions,
    ) -> impl Future<Output = Result<Page, CoreError>> + Send;

    /// Apply every operation or none of them.
    fn batch_write(&self, ops: Vec<BatchOp>) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Watch a single document. The callback fires once with the current value.
    fn subscribe_document(
        &self,
        collection: &str,
        id: &str,
        callback: DocumentCallback,
    ) -> Subscription;

    /// Watch a query. The callback fires once with the current result set.
    fn subscribe_collection(
        &self,
        collection: &str,
        options: QueryOptions,
        callback: CollectionCallback,
    ) -> Subscription;
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Caller-settable metadata on upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, String>,
}

/// Metadata of a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub time_created: Timestamp,
    pub updated: Timestamp,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    #[serde(default)]
    pub custom: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    pub metadata: FileMetadata,
    pub path: String,
}

/// Upload progress snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
    pub percentage: f64,
}

impl UploadProgress {
    /// An empty upload counts as complete.
    pub fn new(bytes_transferred: u64, total_bytes: u64) -> Self {
        let percentage = if total_bytes == 0 {
            100.0
        } else {
            (bytes_transferred as f64 / total_bytes as f64) * 100.0
        };
        Self {
            bytes_transferred,
            total_bytes,
            percentage,
        }
    }
}

/// Receives progress snapshots during an upload.
pub type ProgressCallback = Box<dyn FnMut(UploadProgress) + Send>;

/// Path-addressed blob storage.
pub trait FileStorage: Send + Sync {
    fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        metadata: Option<UploadMetadata>,
    ) -> impl Future<Output = Result<UploadResult, CoreError>> + Send;

    /// Like [`upload`](Self::upload), reporting progress along the way.
    fn upload_with_progress(
        &self,
        path: &str,
        bytes: Vec<u8>,
        metadata: Option<UploadMetadata>,
        on_progress: ProgressCallback,
    ) -> impl Future<Output = Result<UploadResult, CoreError>> + Send;

    fn metadata(&self, path: &str) -> impl Future<Output = Result<FileMetadata, CoreError>> + Send;

    fn update_metadata(
        &self,
        path: &str,
        metadata: UploadMetadata,
    ) -> impl Future<Output = Result<FileMetadata, CoreError>> + Send;

    fn delete(&self, path: &str) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Paths stored under `prefix`, sorted.
    fn list(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>, CoreError>> + Send;
}

/// `<unix millis>_<random>.<ext>` for an uploaded file name.
///
/// Names without an extension keep the whole name as the extension, matching
/// how browsers split on the last dot.
pub fn unique_file_name(original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let extension = original_name.rsplit('.').next().unwrap_or(original_name);
    format!("{millis}_{}.{extension}", random_suffix(13))
}

/// Join a storage prefix and a file name with exactly one `/`.
pub fn join_path(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
