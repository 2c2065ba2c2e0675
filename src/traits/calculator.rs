// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;
use std::error::Error;

use thiserror::Error;

use crate::context::CacheContext;
use crate::identity::Account;
use crate::permissions::RefinablePermissions;
use crate::scope::Scope;

/// A permission calculator failed while contributing to a calculation.
///
/// This aborts the whole calculation: a partial permission set must never be cached or served,
/// since it could silently grant or withhold access based on incomplete data.
#[derive(Debug, Error)]
#[error("permission calculator failed: {source}")]
pub struct CalculatorError {
    #[from]
    source: Box<dyn Error + Send + Sync>,
}

impl CalculatorError {
    pub fn new(source: impl Error + Send + Sync + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }
}

/// A pluggable unit contributing permissions for one `(account, scope)` pair.
///
/// Calculators are registered with the [`ChainCalculator`](crate::ChainCalculator) and invoked
/// in registration order; their contributions are merged left to right.
pub trait PermissionCalculator {
    /// Calculate this calculator's contribution only.
    ///
    /// The result must carry, as cache contexts, every context the contribution can vary on,
    /// including the ones already implied by
    /// [`persistent_cache_contexts`](PermissionCalculator::persistent_cache_contexts). A
    /// contribution must never depend on a context which is itself resolved through the
    /// permission system, as resolving such a context would recurse into the calculation it is
    /// part of.
    fn calculate_permissions(
        &self,
        account: &Account,
        scope: &Scope,
    ) -> Result<RefinablePermissions, CalculatorError>;

    /// Contexts which are relevant for *every* calculation in the given scope.
    ///
    /// This set is used to build the persistent-cache key before any calculation runs, so it
    /// may depend on nothing but `scope`. Making it conditional on anything else under-declares
    /// the key and can serve one account's cached permissions to another.
    fn persistent_cache_contexts(&self, scope: &Scope) -> BTreeSet<CacheContext> {
        let _ = scope;
        BTreeSet::new()
    }

    /// An empty contribution pre-seeded with the declared persistent contexts.
    ///
    /// Starting from this keeps the cache dependency correct even when a calculator ends up
    /// contributing no items at all.
    fn base_permissions(&self, scope: &Scope) -> RefinablePermissions {
        let mut permissions = RefinablePermissions::new();
        permissions.add_cache_contexts(self.persistent_cache_contexts(scope));
        permissions
    }
}
