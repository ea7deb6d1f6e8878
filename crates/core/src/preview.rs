//! Preview rendering: [`BannerConfig`] to a serializable [`RenderTree`].
//!
//! [`render`] is pure. The same config always yields an identical tree, so the
//! UI layer can diff trees and export can reuse them verbatim.

use serde::Serialize;

use crate::config::{BackgroundType, BannerConfig, ContentItem, ContentType, TextAlign};
use crate::layout;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Canvas width in pixels.
pub const CANVAS_WIDTH_PX: u32 = 800;

/// Canvas height in pixels.
pub const CANVAS_HEIGHT_PX: u32 = 400;

pub const DEFAULT_FONT_SIZE: &str = "16px";
pub const DEFAULT_FONT_FAMILY: &str = "Inter, sans-serif";
/// Brand primary dark.
pub const DEFAULT_TEXT_COLOR: &str = "#27005D";
pub const DEFAULT_TEXT_ALIGN: TextAlign = TextAlign::Left;
pub const DEFAULT_PADDING: &str = "8px";

/// Tile size applied to `pattern` backgrounds.
pub const PATTERN_TILE_SIZE: &str = "40px 40px";

/// Minimum block heights (px) so empty items stay clickable.
pub const MIN_TEXT_HEIGHT_PX: u32 = 40;
pub const MIN_IMAGE_HEIGHT_PX: u32 = 100;

/// Label of the provenance badge on AI-generated items.
pub const AI_BADGE_LABEL: &str = "AI";

/// Label shown in place of an image with no source.
pub const NO_IMAGE_LABEL: &str = "No image";

/// Upper bound on rendered columns. Items beyond it count as hidden.
pub const MAX_RENDER_COLUMNS: u32 = 12;

// ---------------------------------------------------------------------------
// Render tree
// ---------------------------------------------------------------------------

/// Visual description of a banner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderTree {
    pub width_px: u32,
    pub height_px: u32,
    pub background: BackgroundFill,
    pub columns: Vec<RenderColumn>,
    /// Total stored items, including hidden ones.
    pub item_count: usize,
    /// Items whose column is out of range.
    pub hidden_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackgroundFill {
    /// Flat fill.
    Color { color: String },
    /// CSS-like background expression used verbatim.
    Css {
        expression: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        tile_size: Option<String>,
    },
    /// Image reference, cover-fit and centered.
    Image {
        src: String,
        fit: ImageFit,
        position: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFit {
    Cover,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderColumn {
    pub index: u32,
    /// Share of the canvas width.
    pub width_percent: f32,
    pub blocks: Vec<RenderBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderBlock {
    pub item_id: String,
    /// Percentage of the column width.
    pub width_percent: f32,
    pub height_px: u32,
    pub min_height_px: u32,
    pub body: BlockBody,
    /// Provenance badge label, set for AI-generated items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockBody {
    Text {
        text: String,
        style: ResolvedTextStyle,
    },
    Image {
        src: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        padding: Option<String>,
    },
    Placeholder {
        label: String,
    },
}

/// Text style with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTextStyle {
    pub font_size: String,
    pub font_family: String,
    pub color: String,
    pub text_align: TextAlign,
    pub padding: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Build the render tree for `config`.
pub fn render(config: &BannerConfig) -> RenderTree {
    let columns = config.columns.min(MAX_RENDER_COLUMNS);
    let width_percent = if columns == 0 {
        0.0
    } else {
        100.0 / columns as f32
    };

    let rendered: Vec<RenderColumn> = layout::partition(&config.content, columns)
        .into_iter()
        .enumerate()
        .map(|(index, items)| RenderColumn {
            index: index as u32,
            width_percent,
            blocks: items.into_iter().map(render_item).collect(),
        })
        .collect();

    RenderTree {
        width_px: CANVAS_WIDTH_PX,
        height_px: CANVAS_HEIGHT_PX,
        background: resolve_background(config.background_type, &config.background_value),
        columns: rendered,
        item_count: config.content.len(),
        hidden_count: layout::orphaned_items(&config.content, columns).len(),
    }
}

/// Map a background descriptor to a fill.
pub fn resolve_background(background_type: BackgroundType, value: &str) -> BackgroundFill {
    match background_type {
        BackgroundType::Solid => BackgroundFill::Color {
            color: value.to_string(),
        },
        BackgroundType::Gradient => BackgroundFill::Css {
            expression: value.to_string(),
            tile_size: None,
        },
        BackgroundType::Pattern => BackgroundFill::Css {
            expression: value.to_string(),
            tile_size: Some(PATTERN_TILE_SIZE.to_string()),
        },
        BackgroundType::Image => BackgroundFill::Image {
            src: value.to_string(),
            fit: ImageFit::Cover,
            position: "center".to_string(),
        },
    }
}

/// Fill every missing text style field with its default.
pub fn resolve_text_style(item: &ContentItem) -> ResolvedTextStyle {
    let style = &item.style;
    ResolvedTextStyle {
        font_size: style
            .font_size
            .clone()
            .unwrap_or_else(|| DEFAULT_FONT_SIZE.to_string()),
        font_family: style
            .font_family
            .clone()
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
        color: style
            .color
            .clone()
            .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
        text_align: style.text_align.unwrap_or(DEFAULT_TEXT_ALIGN),
        padding: style
            .padding
            .clone()
            .unwrap_or_else(|| DEFAULT_PADDING.to_string()),
        background_color: style.background_color.clone(),
    }
}

fn render_item(item: &ContentItem) -> RenderBlock {
    let (body, min_height_px) = match item.content_type {
        ContentType::Text => (
            BlockBody::Text {
                text: item.content.clone(),
                style: resolve_text_style(item),
            },
            MIN_TEXT_HEIGHT_PX,
        ),
        ContentType::Image | ContentType::ProductImage => {
            let body = if item.content.is_empty() {
                BlockBody::Placeholder {
                    label: NO_IMAGE_LABEL.to_string(),
                }
            } else {
                BlockBody::Image {
                    src: item.content.clone(),
                    padding: item.style.padding.clone(),
                }
            };
            (body, MIN_IMAGE_HEIGHT_PX)
        }
    };

    RenderBlock {
        item_id: item.id.clone(),
        width_percent: item.position.width,
        height_px: item.position.height,
        min_height_px,
        body,
        badge: item.is_ai_generated.then(|| AI_BADGE_LABEL.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
