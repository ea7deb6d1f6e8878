//! Banner editor application layer.
//!
//! Ties the pure core (`banner-core`) to injected AI, document and file
//! services through [`EditorSession`], and carries the editor's
//! environment configuration.

pub mod config;
pub mod session;

pub use config::EditorConfig;
pub use session::{EditorSession, PendingUpload};
