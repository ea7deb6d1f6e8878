//! Column layout of content items.
//!
//! Items are partitioned by `position.column` with a stable filter: the engine
//! never reorders items. Items whose column is out of range are kept in the
//! underlying array but belong to no bucket, so they are hidden from the
//! preview until the column count grows back.

use serde::{Deserialize, Serialize};

use crate::config::{ContentItem, ContentPosition, ContentStyle, ContentType, TextAlign};
use crate::ids::IdGenerator;

// ---------------------------------------------------------------------------
// Item defaults
// ---------------------------------------------------------------------------

/// Placeholder text of a newly added text item.
pub const NEW_TEXT_CONTENT: &str = "New text";

/// Width (percent) of newly added items.
pub const NEW_ITEM_WIDTH: f32 = 100.0;

/// Height (px) of a newly added text item.
pub const NEW_TEXT_HEIGHT: u32 = 40;

/// Height (px) of a newly added image item.
pub const NEW_IMAGE_HEIGHT: u32 = 100;

/// Padding of a newly added image item.
pub const NEW_IMAGE_PADDING: &str = "4px";

/// Style applied to text items when they are created.
pub fn default_text_style() -> ContentStyle {
    ContentStyle {
        font_size: Some("16px".to_string()),
        font_family: Some("Inter, sans-serif".to_string()),
        color: Some("#27005D".to_string()),
        text_align: Some(TextAlign::Left),
        padding: Some("8px".to_string()),
        ..Default::default()
    }
}

/// A placeholder text item for `column`.
pub fn new_text_item(ids: &dyn IdGenerator, column: u32) -> ContentItem {
    ContentItem {
        id: ids.next_id(ContentType::Text.id_tag()),
        content_type: ContentType::Text,
        position: ContentPosition::in_column(column, NEW_ITEM_WIDTH, NEW_TEXT_HEIGHT),
        content: NEW_TEXT_CONTENT.to_string(),
        style: default_text_style(),
        is_ai_generated: false,
        is_optimized: false,
    }
}

/// An empty image slot for `column`.
pub fn new_image_item(ids: &dyn IdGenerator, column: u32) -> ContentItem {
    ContentItem {
        id: ids.next_id(ContentType::Image.id_tag()),
        content_type: ContentType::Image,
        position: ContentPosition::in_column(column, NEW_ITEM_WIDTH, NEW_IMAGE_HEIGHT),
        content: String::new(),
        style: ContentStyle {
            padding: Some(NEW_IMAGE_PADDING.to_string()),
            ..Default::default()
        },
        is_ai_generated: false,
        is_optimized: false,
    }
}

/// A product image pointing at `url`.
pub fn new_product_image_item(
    ids: &dyn IdGenerator,
    column: u32,
    url: impl Into<String>,
) -> ContentItem {
    ContentItem {
        id: ids.next_id(ContentType::ProductImage.id_tag()),
        content_type: ContentType::ProductImage,
        position: ContentPosition::in_column(column, NEW_ITEM_WIDTH, NEW_IMAGE_HEIGHT),
        content: url.into(),
        style: ContentStyle {
            padding: Some(NEW_IMAGE_PADDING.to_string()),
            ..Default::default()
        },
        is_ai_generated: false,
        is_optimized: false,
    }
}

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

/// Split `content` into `columns` buckets, preserving relative order.
///
/// Allocates one bucket per column; callers bound `columns` first.
pub fn partition(content: &[ContentItem], columns: u32) -> Vec<Vec<&ContentItem>> {
    let mut buckets: Vec<Vec<&ContentItem>> = (0..columns).map(|_| Vec::new()).collect();
    for item in content {
        if let Some(bucket) = buckets.get_mut(item.position.column as usize) {
            bucket.push(item);
        }
    }
    buckets
}

/// The items assigned to `column`, in display order.
pub fn column_items(content: &[ContentItem], column: u32) -> Vec<&ContentItem> {
    content
        .iter()
        .filter(|item| item.position.column == column)
        .collect()
}

/// Items whose column no longer exists. They stay stored but are not rendered.
pub fn orphaned_items(content: &[ContentItem], columns: u32) -> Vec<&ContentItem> {
    content
        .iter()
        .filter(|item| item.position.column >= columns)
        .collect()
}

pub fn find_item<'a>(content: &'a [ContentItem], item_id: &str) -> Option<&'a ContentItem> {
    content.iter().find(|item| item.id == item_id)
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

/// Shallow patch for a single item.
///
/// `position` and `style` replace the whole substructure when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatch {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<ContentPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ContentStyle>,
    #[serde(default, rename = "isAIGenerated", skip_serializing_if = "Option::is_none")]
    pub is_ai_generated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_optimized: Option<bool>,
}

impl ContentPatch {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn style(style: ContentStyle) -> Self {
        Self {
            style: Some(style),
            ..Default::default()
        }
    }

    pub fn position(position: ContentPosition) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    fn apply_to(self, item: &mut ContentItem) {
        if let Some(content_type) = self.content_type {
            item.content_type = content_type;
        }
        if let Some(position) = self.position {
            item.position = position;
        }
        if let Some(content) = self.content {
            item.content = content;
        }
        if let Some(style) = self.style {
            item.style = style;
        }
        if let Some(flag) = self.is_ai_generated {
            item.is_ai_generated = flag;
        }
        if let Some(flag) = self.is_optimized {
            item.is_optimized = flag;
        }
    }
}

/// `content` with `item` appended. The column is not range-checked.
pub fn add_item(content: &[ContentItem], item: ContentItem) -> Vec<ContentItem> {
    let mut next = content.to_vec();
    next.push(item);
    next
}

/// `content` without the item whose id is `item_id`. No-op if absent.
pub fn remove_item(content: &[ContentItem], item_id: &str) -> Vec<ContentItem> {
    content
        .iter()
        .filter(|item| item.id != item_id)
        .cloned()
        .collect()
}

/// `content` with `patch` merged into the item whose id is `item_id`.
pub fn update_item(content: &[ContentItem], item_id: &str, patch: ContentPatch) -> Vec<ContentItem> {
    let mut next = content.to_vec();
    if let Some(item) = next.iter_mut().find(|item| item.id == item_id) {
        patch.apply_to(item);
    }
    next
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
