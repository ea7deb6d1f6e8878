//! Repository for banner documents.
//!
//! A [`BannerConfig`] is stored whole as one document. The document id is
//! the banner id and is not duplicated inside the payload.

use banner_core::config::{validate_columns, BannerConfig};
use banner_core::error::CoreError;
use banner_core::persistence::{DocumentStore, QueryOptions, StoredDocument, Subscription};
use banner_core::types::EntityId;
use serde_json::Value;

use crate::error::StoreError;

/// One page of banners.
#[derive(Debug, Clone, PartialEq)]
pub struct BannerPage {
    pub banners: Vec<BannerConfig>,
    pub has_more: bool,
    pub cursor: Option<EntityId>,
}

/// Provides data access for banners.
pub struct BannerRepo;

impl BannerRepo {
    /// Insert or replace a banner.
    ///
    /// Unpersisted banners receive a store-assigned id; the returned config
    /// carries it.
    pub async fn save<S: DocumentStore>(
        store: &S,
        collection: &str,
        config: &BannerConfig,
    ) -> Result<BannerConfig, CoreError> {
        validate_columns(config.columns)?;
        let payload = to_document(config)?;

        if !config.is_persisted() {
            let id = store.create(collection, None, payload).await?;
            tracing::info!(banner_id = %id, "Banner created");
            return Ok(BannerConfig {
                id,
                ..config.clone()
            });
        }

        if store.get(collection, &config.id).await?.is_some() {
            // Every field is present in the payload, so the merge replaces.
            store.update(collection, &config.id, payload).await?;
            tracing::debug!(banner_id = %config.id, "Banner updated");
        } else {
            store.create(collection, Some(&config.id), payload).await?;
            tracing::info!(banner_id = %config.id, "Banner created");
        }
        Ok(config.clone())
    }

    /// Find a banner by id. Returns `None` if it does not exist.
    pub async fn find_by_id<S: DocumentStore>(
        store: &S,
        collection: &str,
        id: &str,
    ) -> Result<Option<BannerConfig>, CoreError> {
        match store.get(collection, id).await? {
            Some(doc) => Ok(Some(from_document(&doc)?)),
            None => Ok(None),
        }
    }

    pub async fn delete<S: DocumentStore>(store: &S, collection: &str, id: &str) -> Result<(), CoreError> {
        store.delete(collection, id).await?;
        tracing::info!(banner_id = %id, "Banner deleted");
        Ok(())
    }

    pub async fn list<S: DocumentStore>(
        store: &S,
        collection: &str,
        options: &QueryOptions,
    ) -> Result<BannerPage, CoreError> {
        let page = store.list(collection, options).await?;
        let banners = page
            .documents
            .iter()
            .map(from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BannerPage {
            banners,
            has_more: page.has_more,
            cursor: page.cursor,
        })
    }

    /// Watch one banner. Documents that fail to decode are skipped.
    pub fn subscribe<S, F>(store: &S, collection: &str, id: &str, on_change: F) -> Subscription
    where
        S: DocumentStore,
        F: Fn(Option<BannerConfig>) + Send + Sync + 'static,
    {
        store.subscribe_document(
            collection,
            id,
            Box::new(move |doc| match doc.as_ref().map(from_document).transpose() {
                Ok(config) => on_change(config),
                Err(e) => tracing::warn!(error = %e, "Skipping undecodable banner document"),
            }),
        )
    }
}

fn to_document(config: &BannerConfig) -> Result<Value, StoreError> {
    let mut payload = serde_json::to_value(config)?;
    if let Value::Object(fields) = &mut payload {
        fields.remove("id");
    }
    Ok(payload)
}

fn from_document(doc: &StoredDocument) -> Result<BannerConfig, StoreError> {
    let mut payload = doc.data.clone();
    let Value::Object(fields) = &mut payload else {
        return Err(StoreError::NotAnObject);
    };
    fields.insert("id".to_string(), Value::String(doc.id.clone()));
    let config: BannerConfig = serde_json::from_value(payload)?;
    validate_columns(config.columns).map_err(|e| StoreError::InvalidDocument {
        id: doc.id.clone(),
        reason: e.to_string(),
    })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use banner_core::config::{BackgroundType, ConfigPatch};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn id_is_kept_out_of_the_payload() {
        let config = BannerConfig::seeded(ConfigPatch::id("b1"));
        let payload = to_document(&config).unwrap();
        assert!(payload.get("id").is_none());
        assert_eq!(payload["backgroundType"], "solid");
    }

    #[test]
    fn document_decodes_with_its_id() {
        let config = BannerConfig::seeded(ConfigPatch::background(BackgroundType::Gradient, "linear-gradient(red, blue)"));
        let now = Utc::now();
        let doc = StoredDocument {
            id: "b9".to_string(),
            data: to_document(&config).unwrap(),
            created_at: now,
            updated_at: now,
        };
        let decoded = from_document(&doc).unwrap();
        assert_eq!(decoded.id, "b9");
        assert_eq!(decoded.background_value, "linear-gradient(red, blue)");
    }

    #[test]
    fn malformed_document_fails_to_decode() {
        let now = Utc::now();
        let doc = StoredDocument {
            id: "b1".to_string(),
            data: json!({"columns": "three"}),
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(from_document(&doc), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn out_of_range_column_count_is_rejected_on_decode() {
        let mut data = to_document(&BannerConfig::seeded(ConfigPatch::default())).unwrap();
        data["columns"] = json!(4_000_000_000u32);
        let now = Utc::now();
        let doc = StoredDocument {
            id: "b1".to_string(),
            data,
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(
            from_document(&doc),
            Err(StoreError::InvalidDocument { id, .. }) if id == "b1"
        ));
    }
}
