//! AI text/image boundary contracts.
//!
//! Request/response payloads for the AI backend, the [`AiService`] trait the
//! editor is generic over, and helpers that fold a successful response into
//! the content list. A failed call never touches the config.

use std::future::Future;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{ContentItem, ContentType};
use crate::error::CoreError;
use crate::ids::IdGenerator;
use crate::layout::{self, ContentPatch};

/// Default edge length (px) of generated product images.
pub const DEFAULT_IMAGE_EDGE_PX: u32 = 512;

/// Default `maxLength` offered for text optimization.
pub const DEFAULT_MAX_TEXT_LENGTH: u32 = 100;

// ---------------------------------------------------------------------------
// Text optimization
// ---------------------------------------------------------------------------

/// Tone requested for optimized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTone {
    Professional,
    Casual,
    Marketing,
    Technical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AiTextRequest {
    #[validate(length(min = 1, max = 5000))]
    pub original_text: String,
    #[validate(length(max = 500))]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextTone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 1000))]
    pub max_length: Option<u32>,
}

impl AiTextRequest {
    pub fn new(original_text: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
            context: context.into(),
            style: Some(TextTone::Marketing),
            max_length: Some(DEFAULT_MAX_TEXT_LENGTH),
        }
    }

    /// Field validation plus a whitespace check on the source text.
    pub fn validate_request(&self) -> Result<(), CoreError> {
        self.validate()?;
        if self.original_text.trim().is_empty() {
            return Err(CoreError::Validation(
                "Text to optimize must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiTextResponse {
    pub optimized_text: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Image generation
// ---------------------------------------------------------------------------

/// Visual style requested for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStyle {
    Realistic,
    Artistic,
    Minimal,
    Corporate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ImageDimensions {
    #[validate(range(min = 64, max = 2048))]
    pub width: u32,
    #[validate(range(min = 64, max = 2048))]
    pub height: u32,
}

impl Default for ImageDimensions {
    fn default() -> Self {
        Self {
            width: DEFAULT_IMAGE_EDGE_PX,
            height: DEFAULT_IMAGE_EDGE_PX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AiImageRequest {
    #[validate(length(min = 1, max = 1000))]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ImageStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<ImageDimensions>,
}

impl AiImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into().trim().to_string(),
            style: Some(ImageStyle::Realistic),
            dimensions: Some(ImageDimensions::default()),
        }
    }

    pub fn validate_request(&self) -> Result<(), CoreError> {
        self.validate()?;
        if self.prompt.trim().is_empty() {
            return Err(CoreError::Validation("Image prompt must not be blank".to_string()));
        }
        if let Some(dimensions) = &self.dimensions {
            dimensions.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiImageResponse {
    pub image_url: String,
    pub prompt: String,
}

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

/// The AI backend. Non-success responses surface as [`CoreError::Service`].
pub trait AiService: Send + Sync {
    fn optimize_text(
        &self,
        request: &AiTextRequest,
    ) -> impl Future<Output = Result<AiTextResponse, CoreError>> + Send;

    fn generate_image(
        &self,
        request: &AiImageRequest,
    ) -> impl Future<Output = Result<AiImageResponse, CoreError>> + Send;
}

// ---------------------------------------------------------------------------
// Folding results into content
// ---------------------------------------------------------------------------

/// Replace the text of `item_id` with the optimized text and flag it.
///
/// The item must exist and be a text item.
pub fn apply_optimized_text(
    content: &[ContentItem],
    item_id: &str,
    response: &AiTextResponse,
) -> Result<Vec<ContentItem>, CoreError> {
    let item = layout::find_item(content, item_id).ok_or_else(|| CoreError::NotFound {
        entity: "content item",
        id: item_id.to_string(),
    })?;
    if item.content_type != ContentType::Text {
        return Err(CoreError::Validation(format!(
            "Content item '{item_id}' is not a text item"
        )));
    }

    let patch = ContentPatch {
        content: Some(response.optimized_text.clone()),
        is_ai_generated: Some(true),
        is_optimized: Some(true),
        ..Default::default()
    };
    Ok(layout::update_item(content, item_id, patch))
}

/// A product image item for a generated image, flagged as AI-generated.
pub fn generated_image_item(
    ids: &dyn IdGenerator,
    column: u32,
    response: &AiImageResponse,
) -> ContentItem {
    let mut item = layout::new_product_image_item(ids, column, response.image_url.clone());
    item.is_ai_generated = true;
    item
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIdGenerator;
    use crate::layout::{new_image_item, new_text_item};
    use assert_matches::assert_matches;

    #[test]
    fn text_request_serializes_camel_case() {
        let request = AiTextRequest::new("Big sale", "Summer campaign");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["originalText"], "Big sale");
        assert_eq!(json["context"], "Summer campaign");
        assert_eq!(json["style"], "marketing");
        assert_eq!(json["maxLength"], 100);
    }

    #[test]
    fn text_request_validation() {
        assert!(AiTextRequest::new("Big sale", "").validate_request().is_ok());
        assert_matches!(
            AiTextRequest::new("", "ctx").validate_request(),
            Err(CoreError::Validation(_))
        );
        assert!(AiTextRequest::new("   ", "ctx").validate_request().is_err());

        let mut request = AiTextRequest::new("Big sale", "");
        request.max_length = Some(0);
        assert!(request.validate_request().is_err());
        request.max_length = None;
        assert!(request.validate_request().is_ok());
    }

    #[test]
    fn image_request_defaults() {
        let request = AiImageRequest::new("  red running shoe  ");
        assert_eq!(request.prompt, "red running shoe");
        assert_eq!(request.dimensions, Some(ImageDimensions { width: 512, height: 512 }));
        assert!(request.validate_request().is_ok());
    }

    #[test]
    fn image_request_validation() {
        assert!(AiImageRequest::new("").validate_request().is_err());
        let mut request = AiImageRequest::new("shoe");
        request.dimensions = Some(ImageDimensions { width: 10, height: 512 });
        assert!(request.validate_request().is_err());
    }

    #[test]
    fn responses_deserialize_from_backend_json() {
        let text: AiTextResponse = serde_json::from_value(serde_json::json!({
            "optimizedText": "Huge summer sale!",
            "suggestions": ["Add a deadline"]
        }))
        .unwrap();
        assert_eq!(text.optimized_text, "Huge summer sale!");
        assert_eq!(text.suggestions.len(), 1);

        let image: AiImageResponse = serde_json::from_value(serde_json::json!({
            "imageUrl": "https://cdn.test/gen.png",
            "prompt": "shoe"
        }))
        .unwrap();
        assert_eq!(image.image_url, "https://cdn.test/gen.png");
    }

    #[test]
    fn optimized_text_replaces_content_and_sets_flags() {
        let ids = SequentialIdGenerator::new();
        let content = vec![new_text_item(&ids, 0), new_text_item(&ids, 0)];
        let response = AiTextResponse {
            optimized_text: "Shop the sale".to_string(),
            suggestions: vec![],
        };

        let next = apply_optimized_text(&content, "text-2", &response).unwrap();

        assert_eq!(next[1].content, "Shop the sale");
        assert!(next[1].is_optimized);
        assert!(next[1].is_ai_generated);
        assert_eq!(next[1].style, content[1].style);
        assert_eq!(next[0], content[0]);
    }

    #[test]
    fn optimized_text_requires_existing_text_item() {
        let ids = SequentialIdGenerator::new();
        let content = vec![new_image_item(&ids, 0)];
        let response = AiTextResponse {
            optimized_text: "x".to_string(),
            suggestions: vec![],
        };
        assert_matches!(
            apply_optimized_text(&content, "missing", &response),
            Err(CoreError::NotFound { .. })
        );
        assert_matches!(
            apply_optimized_text(&content, "image-1", &response),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn generated_image_is_flagged_product_image() {
        let ids = SequentialIdGenerator::new();
        let item = generated_image_item(
            &ids,
            1,
            &AiImageResponse {
                image_url: "https://cdn.test/gen.png".to_string(),
                prompt: "shoe".to_string(),
            },
        );
        assert_eq!(item.content_type, ContentType::ProductImage);
        assert_eq!(item.position.column, 1);
        assert_eq!(item.content, "https://cdn.test/gen.png");
        assert!(item.is_ai_generated);
        assert!(!item.is_optimized);
    }
}
