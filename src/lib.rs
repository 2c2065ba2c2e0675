// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoped group permission calculation with a tag-invalidated, two-tier cache.
//!
//! Pluggable [calculators](traits::PermissionCalculator) each contribute permissions for one
//! `(account, scope)` pair; the [`ChainCalculator`] merges their contributions
//! deterministically, tags the result with precise invalidation metadata and serves it from a
//! process-local and a persistent cache tier, keyed by resolved cache contexts so no account
//! ever reads another account's entry. The [`PermissionChecker`] sits on top and answers
//! "does this account hold this permission in this group".

pub mod cache;
mod chain;
mod checker;
mod context;
mod group;
mod identity;
mod item;
mod metadata;
mod permissions;
mod scope;
mod synced;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod traits;

#[cfg(test)]
mod tests;

pub use cache::{CacheKey, MemoryCache};
pub use chain::{CALCULATED_PERMISSIONS_TAG, ChainCalculator, ChainError};
pub use checker::{CheckerError, PermissionChecker};
pub use context::{AccountContextResolver, CacheContext, ContextError};
pub use group::{Group, Membership};
pub use identity::{Account, IdentityGuard, IdentityStack};
pub use item::PermissionItem;
pub use metadata::{CacheMetadata, MaxAge};
pub use permissions::{CalculatedPermissions, RefinablePermissions};
pub use scope::Scope;
pub use synced::SyncedRoleCalculator;
