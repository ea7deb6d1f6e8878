//! In-memory persistence backends for the banner editor.
//!
//! - [`InMemoryDocumentStore`]: collection/document store with filters,
//!   cursor pagination, atomic batches and realtime subscriptions driven by
//!   the [`ChangeBus`].
//! - [`InMemoryFileStorage`]: path-addressed blob storage with upload
//!   progress reporting.
//! - [`repositories`]: typed access to banner documents.

pub mod bus;
pub mod documents;
pub mod error;
pub mod files;
pub mod query;
pub mod repositories;

pub use bus::{ChangeBus, ChangeEvent, ChangeKind};
pub use documents::InMemoryDocumentStore;
pub use error::StoreError;
pub use files::InMemoryFileStorage;
pub use repositories::{BannerPage, BannerRepo};
