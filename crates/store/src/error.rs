use banner_core::error::CoreError;

/// Failures raised by the in-memory backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Document data must be a JSON object")]
    NotAnObject,

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Unknown pagination cursor: {0}")]
    UnknownCursor(String),

    #[error("Invalid document {id}: {reason}")]
    InvalidDocument { id: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DocumentNotFound { collection, id } => CoreError::NotFound {
                entity: "document",
                id: format!("{collection}/{id}"),
            },
            StoreError::FileNotFound(path) => CoreError::NotFound {
                entity: "file",
                id: path,
            },
            StoreError::NotAnObject
            | StoreError::InvalidPath(_)
            | StoreError::UnknownCursor(_)
            | StoreError::InvalidDocument { .. } => CoreError::Validation(err.to_string()),
            StoreError::Serialization(e) => CoreError::Internal(e.to_string()),
        }
    }
}
