//! Content item id generation.
//!
//! Ids are `<tag>-<...>` strings where the tag is the item type prefix
//! (`text`, `image`, `product`). Generators must never hand out the same id
//! twice for the lifetime of one editing session.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

/// Length of the random suffix appended by [`SessionIdGenerator`].
pub const RANDOM_SUFFIX_LENGTH: usize = 9;

/// Source of unique content item ids.
pub trait IdGenerator: Send + Sync {
    /// Produce the next id for an item tagged `tag`.
    fn next_id(&self, tag: &str) -> String;
}

/// `<tag>-<unix millis>-<random suffix>`.
///
/// Practically unique within an editing session; not cryptographically so.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionIdGenerator;

impl IdGenerator for SessionIdGenerator {
    fn next_id(&self, tag: &str) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        format!("{tag}-{millis}-{}", random_suffix(RANDOM_SUFFIX_LENGTH))
    }
}

/// `<tag>-<n>` with a process-local monotonic counter starting at 1.
///
/// Deterministic; used by tests and by callers that need reproducible ids.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting after `last` (the next id uses `last + 1`).
    pub fn starting_after(last: u64) -> Self {
        Self {
            counter: AtomicU64::new(last),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self, tag: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{tag}-{n}")
    }
}

/// Lowercase alphanumeric string of `len` characters.
pub fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
