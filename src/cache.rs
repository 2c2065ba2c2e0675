// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory, tag-indexed cache backend used for the process tier and as a reference
//! implementation of [`CacheBackend`] for the persistent tier.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::metadata::{CacheMetadata, MaxAge};
use crate::scope::Scope;
use crate::traits::{CacheBackend, CacheError};

/// A fully resolved cache key.
///
/// Keys are built from the scope token plus the resolved value of every persistent cache
/// context, in context order. Two lookups for accounts whose context values differ therefore
/// address different entries; the resolution step is what makes cached permission sets safe to
/// share across requests and processes.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a calculated permission set.
    ///
    /// `resolved` pairs each context token with its resolved value.
    pub fn calculated_permissions(scope: &Scope, resolved: &[(String, String)]) -> Self {
        let mut key = format!("calculated_permissions/{}", scope);
        for (context, value) in resolved {
            key.push_str(&format!("/{}={}", context, value));
        }

        CacheKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug)]
struct Entry<T> {
    value: T,
    tags: BTreeSet<String>,
    expires: Option<Instant>,
}

/// Hash-map backed cache with a secondary tag index and max-age expiry.
///
/// Interior mutability keeps the backend usable behind a shared reference; the engine is
/// synchronous and single-threaded per request, so no locking is involved.
#[derive(Debug, Default)]
pub struct MemoryCache<T> {
    entries: RefCell<HashMap<CacheKey, Entry<T>>>,
}

impl<T> MemoryCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Number of live entries, expired ones included until their next lookup.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> CacheBackend<T> for MemoryCache<T>
where
    T: Clone,
{
    fn get(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        let mut entries = self.entries.borrow_mut();
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };

        if let Some(expires) = entry.expires {
            if Instant::now() >= expires {
                trace!(%key, "cache entry expired");
                entries.remove(key);
                return Ok(None);
            }
        }

        Ok(Some(entry.value.clone()))
    }

    fn set(&self, key: CacheKey, value: T, metadata: &CacheMetadata) -> Result<(), CacheError> {
        let expires = match metadata.max_age() {
            MaxAge::Permanent => None,
            // An age too large to represent as an instant never expires within the process
            // lifetime, which makes it equivalent to a permanent entry.
            MaxAge::Finite(seconds) => Instant::now().checked_add(Duration::from_secs(seconds)),
        };

        self.entries.borrow_mut().insert(
            key,
            Entry {
                value,
                tags: metadata.tags().clone(),
                expires,
            },
        );

        Ok(())
    }

    fn invalidate_tags(&self, tags: &[String]) -> Result<(), CacheError> {
        self.entries
            .borrow_mut()
            .retain(|_, entry| !tags.iter().any(|tag| entry.tags.contains(tag)));

        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.entries.borrow_mut().clear();

        Ok(())
    }
}
