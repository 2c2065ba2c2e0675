// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::context::CacheContext;

/// How long a cache entry stays valid without being invalidated through a tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MaxAge {
    /// Valid until a carried tag is invalidated.
    Permanent,

    /// Valid for at most the given number of seconds.
    Finite(u64),
}

impl MaxAge {
    /// Combine two max-ages, keeping the stricter one. `Permanent` is the identity.
    pub fn min(self, other: MaxAge) -> MaxAge {
        match (self, other) {
            (MaxAge::Permanent, other) => other,
            (this, MaxAge::Permanent) => this,
            (MaxAge::Finite(a), MaxAge::Finite(b)) => MaxAge::Finite(a.min(b)),
        }
    }
}

impl Default for MaxAge {
    fn default() -> Self {
        MaxAge::Permanent
    }
}

/// Invalidation metadata accumulated while a permission set is calculated.
///
/// Contexts address the persistent cache, tags invalidate entries after the underlying data
/// changed and the max-age bounds entry lifetime. Contexts are stripped when a result is frozen
/// for consumers, see [`CalculatedPermissions`](crate::CalculatedPermissions).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CacheMetadata {
    contexts: BTreeSet<CacheContext>,
    tags: BTreeSet<String>,
    max_age: MaxAge,
}

impl CacheMetadata {
    pub fn contexts(&self) -> &BTreeSet<CacheContext> {
        &self.contexts
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn max_age(&self) -> MaxAge {
        self.max_age
    }

    pub fn add_contexts(&mut self, contexts: impl IntoIterator<Item = CacheContext>) {
        self.contexts.extend(contexts);
    }

    pub fn add_tags(&mut self, tags: impl IntoIterator<Item = impl Into<String>>) {
        self.tags.extend(tags.into_iter().map(Into::into));
    }

    /// Bound the max-age from above.
    ///
    /// The stricter of the current and the given age wins; an already-finite age can never be
    /// raised back towards `Permanent`.
    pub fn restrict_max_age(&mut self, max_age: MaxAge) {
        self.max_age = self.max_age.min(max_age);
    }

    /// Union another metadata set into this one.
    ///
    /// Contexts and tags are unioned, the max-age becomes the minimum of both.
    pub fn merge(&mut self, other: &CacheMetadata) {
        self.contexts.extend(other.contexts.iter().cloned());
        self.tags.extend(other.tags.iter().cloned());
        self.max_age = self.max_age.min(other.max_age);
    }

    /// Drop all contexts, keeping tags and max-age.
    pub(crate) fn strip_contexts(&mut self) {
        self.contexts.clear();
    }
}
