//! Export formats and the export boundary.
//!
//! The core only supplies the [`RenderTree`]; rasterization happens behind
//! an [`ExportService`].

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::config::BannerConfig;
use crate::error::CoreError;
use crate::preview::{self, RenderTree};
use crate::types::EntityId;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpg,
    Svg,
}

impl ExportFormat {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "svg" => Ok(Self::Svg),
            _ => Err(CoreError::Validation(format!(
                "Invalid export format '{s}'. Must be one of: png, jpg, svg"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Svg => "image/svg+xml",
        }
    }
}

/// Everything an exporter needs to produce a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub banner_id: EntityId,
    pub format: ExportFormat,
    pub tree: RenderTree,
}

impl ExportRequest {
    /// Render `config` for export.
    pub fn for_config(config: &BannerConfig, format: ExportFormat) -> Self {
        Self {
            banner_id: config.id.clone(),
            format,
            tree: preview::render(config),
        }
    }
}

/// Response from the export backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub download_url: String,
}

/// Turns a render tree into a downloadable file.
pub trait ExportService: Send + Sync {
    fn export(
        &self,
        request: &ExportRequest,
    ) -> impl Future<Output = Result<ExportResult, CoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigPatch;
    use assert_matches::assert_matches;

    #[test]
    fn format_parsing() {
        assert_eq!(ExportFormat::from_str_value("png").unwrap(), ExportFormat::Png);
        assert_eq!(ExportFormat::from_str_value("JPEG").unwrap(), ExportFormat::Jpg);
        assert_eq!(ExportFormat::from_str_value("svg").unwrap(), ExportFormat::Svg);
        assert_matches!(
            ExportFormat::from_str_value("gif"),
            Err(CoreError::Validation(msg)) if msg.contains("gif")
        );
    }

    #[test]
    fn format_as_str_roundtrip() {
        for format in [ExportFormat::Png, ExportFormat::Jpg, ExportFormat::Svg] {
            assert_eq!(ExportFormat::from_str_value(format.as_str()).unwrap(), format);
            assert!(format.mime_type().starts_with("image/"));
        }
    }

    #[test]
    fn request_carries_rendered_tree() {
        let config = BannerConfig::seeded(ConfigPatch {
            id: Some("banner-7".to_string()),
            columns: Some(2),
            ..Default::default()
        });
        let request = ExportRequest::for_config(&config, ExportFormat::Svg);
        assert_eq!(request.banner_id, "banner-7");
        assert_eq!(request.tree, preview::render(&config));
        assert_eq!(request.tree.columns.len(), 2);
    }
}
