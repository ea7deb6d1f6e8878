/// Default document collection for banners.
pub const DEFAULT_BANNER_COLLECTION: &str = "banners";

/// Default storage prefix for uploaded media.
pub const DEFAULT_MEDIA_PREFIX: &str = "banners/media";

/// Editor settings loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Collection banners are saved in.
    pub banner_collection: String,
    /// Storage prefix uploaded images are placed under.
    pub media_prefix: String,
}

impl EditorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var             | Default         |
    /// |---------------------|-----------------|
    /// | `BANNER_COLLECTION` | `banners`       |
    /// | `MEDIA_PREFIX`      | `banners/media` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    /// Blank values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            banner_collection: read("BANNER_COLLECTION", DEFAULT_BANNER_COLLECTION),
            media_prefix: read("MEDIA_PREFIX", DEFAULT_MEDIA_PREFIX),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            banner_collection: DEFAULT_BANNER_COLLECTION.to_string(),
            media_prefix: DEFAULT_MEDIA_PREFIX.to_string(),
        }
    }
}
