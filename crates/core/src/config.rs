//! Banner configuration value object.
//!
//! [`BannerConfig`] is an immutable-update value: [`BannerConfig::update_config`]
//! returns a new config with the fields of a [`ConfigPatch`] overwritten and
//! `updated_at` refreshed. No invariants are enforced here; callers use the
//! `validate_*` helpers at the point of assignment.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Column count of a freshly seeded banner.
pub const DEFAULT_COLUMNS: u32 = 1;

/// Smallest column count the editor accepts.
pub const MIN_COLUMNS: u32 = 1;

/// Largest column count the editor offers.
pub const MAX_COLUMNS: u32 = 3;

/// Background fill of a freshly seeded banner.
pub const DEFAULT_BACKGROUND_VALUE: &str = "#ffffff";

static HEX_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid regex")
});

/// URL schemes accepted for `image` backgrounds and image content.
const IMAGE_REFERENCE_PREFIXES: &[&str] = &["https://", "http://", "data:image/", "blob:"];

// ---------------------------------------------------------------------------
// Background
// ---------------------------------------------------------------------------

/// How `background_value` is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    /// Hex color.
    #[default]
    Solid,
    /// CSS gradient expression.
    Gradient,
    /// URL or data-URI.
    Image,
    /// CSS pattern expression.
    Pattern,
}

impl BackgroundType {
    /// Parse the wire name (`"solid"`, `"gradient"`, ...).
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "solid" => Ok(Self::Solid),
            "gradient" => Ok(Self::Gradient),
            "image" => Ok(Self::Image),
            "pattern" => Ok(Self::Pattern),
            _ => Err(CoreError::Validation(format!(
                "Invalid background type '{s}'. Must be one of: solid, gradient, image, pattern"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Gradient => "gradient",
            Self::Image => "image",
            Self::Pattern => "pattern",
        }
    }
}

// ---------------------------------------------------------------------------
// Content items
// ---------------------------------------------------------------------------

/// Kind of element placed in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    Text,
    Image,
    ProductImage,
}

impl ContentType {
    /// Prefix used when generating ids for items of this type.
    pub fn id_tag(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::ProductImage => "product",
        }
    }

    /// `true` for both plain and product images.
    pub fn is_image(self) -> bool {
        matches!(self, Self::Image | Self::ProductImage)
    }
}

/// Where an item sits inside the banner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentPosition {
    /// Zero-based column index.
    pub column: u32,
    pub row: u32,
    /// Percentage of the column width (0–100).
    pub width: f32,
    /// Pixels.
    pub height: u32,
}

impl ContentPosition {
    pub fn in_column(column: u32, width: f32, height: u32) -> Self {
        Self {
            column,
            row: 0,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Presentation attributes. Opaque to the layout engine; read by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,
}

/// A single text or image element placed within a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub position: ContentPosition,
    /// Literal text, or an image URL / data-URI.
    pub content: String,
    #[serde(default)]
    pub style: ContentStyle,
    #[serde(default, rename = "isAIGenerated")]
    pub is_ai_generated: bool,
    #[serde(default)]
    pub is_optimized: bool,
}

// ---------------------------------------------------------------------------
// BannerConfig
// ---------------------------------------------------------------------------

/// The banner being composed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerConfig {
    /// Empty until the banner has been persisted.
    #[serde(default)]
    pub id: EntityId,
    pub columns: u32,
    pub background_type: BackgroundType,
    pub background_value: String,
    /// Insertion order is display order within a column.
    #[serde(default)]
    pub content: Vec<ContentItem>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Partial update for [`BannerConfig`]. `None` leaves a field untouched.
///
/// `content` is replaced wholesale: callers build the full next array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_type: Option<BackgroundType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentItem>>,
}

impl ConfigPatch {
    pub fn columns(columns: u32) -> Self {
        Self {
            columns: Some(columns),
            ..Default::default()
        }
    }

    pub fn background(background_type: BackgroundType, value: impl Into<String>) -> Self {
        Self {
            background_type: Some(background_type),
            background_value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn content(content: Vec<ContentItem>) -> Self {
        Self {
            content: Some(content),
            ..Default::default()
        }
    }

    pub fn id(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl BannerConfig {
    /// A blank banner: one column, white solid background, no content.
    pub fn blank_at(now: Timestamp) -> Self {
        Self {
            id: String::new(),
            columns: DEFAULT_COLUMNS,
            background_type: BackgroundType::Solid,
            background_value: DEFAULT_BACKGROUND_VALUE.to_string(),
            content: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The blank banner with `initial` laid over it.
    pub fn seeded(initial: ConfigPatch) -> Self {
        let now = chrono::Utc::now();
        Self::blank_at(now).apply_patch(initial, now)
    }

    /// Overwrite the fields present in `patch` and set `updated_at = now`.
    pub fn apply_patch(&self, patch: ConfigPatch, now: Timestamp) -> Self {
        let mut next = self.clone();
        if let Some(id) = patch.id {
            next.id = id;
        }
        if let Some(columns) = patch.columns {
            next.columns = columns;
        }
        if let Some(background_type) = patch.background_type {
            next.background_type = background_type;
        }
        if let Some(background_value) = patch.background_value {
            next.background_value = background_value;
        }
        if let Some(content) = patch.content {
            next.content = content;
        }
        next.updated_at = now;
        next
    }

    /// [`apply_patch`](Self::apply_patch) stamped with the current time.
    pub fn update_config(&self, patch: ConfigPatch) -> Self {
        self.apply_patch(patch, chrono::Utc::now())
    }

    /// `true` once the banner has been assigned a persistence id.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a column count chosen by the user.
pub fn validate_columns(columns: u32) -> Result<(), CoreError> {
    if !(MIN_COLUMNS..=MAX_COLUMNS).contains(&columns) {
        return Err(CoreError::Validation(format!(
            "Invalid column count {columns}. Must be between {MIN_COLUMNS} and {MAX_COLUMNS}"
        )));
    }
    Ok(())
}

/// Validate that `value` makes sense for `background_type`.
///
/// - `solid`: `#rgb`, `#rrggbb` or `#rrggbbaa`
/// - `gradient`: a CSS `*-gradient(...)` expression
/// - `image`: an http(s), data-URI or blob reference
/// - `pattern`: any non-empty expression
pub fn validate_background(background_type: BackgroundType, value: &str) -> Result<(), CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::Validation(format!(
            "Background value for type '{}' must not be empty",
            background_type.as_str()
        )));
    }

    match background_type {
        BackgroundType::Solid => {
            if !HEX_COLOR_RE.is_match(value) {
                return Err(CoreError::Validation(format!(
                    "Solid background '{value}' is not a hex color"
                )));
            }
        }
        BackgroundType::Gradient => {
            if !value.contains("gradient(") {
                return Err(CoreError::Validation(format!(
                    "Gradient background '{value}' is not a CSS gradient expression"
                )));
            }
        }
        BackgroundType::Image => {
            if !is_image_reference(value) {
                return Err(CoreError::Validation(format!(
                    "Image background must be a URL or data-URI, got '{value}'"
                )));
            }
        }
        BackgroundType::Pattern => {}
    }

    Ok(())
}

/// `true` if `value` looks like something an `<img>` can load.
pub fn is_image_reference(value: &str) -> bool {
    IMAGE_REFERENCE_PREFIXES
        .iter()
        .any(|prefix| value.starts_with(prefix))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
