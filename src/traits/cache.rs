// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use crate::cache::CacheKey;
use crate::metadata::CacheMetadata;

#[derive(Debug, Error, PartialEq)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Backend(String),
}

/// Storage backend for one cache tier.
///
/// Both tiers share this interface: the process-local tier which amortizes work within one
/// request and the persistent tier which amortizes it across requests. Keys arrive fully
/// resolved, see [`CacheKey`](crate::cache::CacheKey), so a backend never needs to understand
/// cache contexts; the metadata passed to [`set`](CacheBackend::set) is the final metadata
/// accumulated during calculation and carries the tags the entry must be invalidated by.
pub trait CacheBackend<T> {
    /// Look up an entry. `Ok(None)` is a miss, `Err` a backend failure.
    fn get(&self, key: &CacheKey) -> Result<Option<T>, CacheError>;

    /// Store an entry together with its invalidation metadata.
    fn set(&self, key: CacheKey, value: T, metadata: &CacheMetadata) -> Result<(), CacheError>;

    /// Drop every entry carrying at least one of the given tags.
    fn invalidate_tags(&self, tags: &[String]) -> Result<(), CacheError>;

    /// Drop all entries.
    fn clear(&self) -> Result<(), CacheError>;
}
