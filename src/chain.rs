// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chain-of-calculators orchestrator driving the two-tier permission cache.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{CacheKey, MemoryCache};
use crate::context::{CacheContext, ContextError};
use crate::identity::{Account, IdentityStack};
use crate::permissions::{CalculatedPermissions, RefinablePermissions};
use crate::scope::Scope;
use crate::traits::{
    CacheBackend, CacheError, CalculatorError, PermissionCalculator, ResolveContext,
};

/// Tag carried by every calculated permission set.
///
/// Invalidating this tag flushes every cached entry, regardless of scope or account.
pub const CALCULATED_PERMISSIONS_TAG: &str = "calculated_group_permissions";

#[derive(Debug, Error)]
pub enum ChainError {
    #[error(transparent)]
    Calculator(#[from] CalculatorError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Orchestrator merging the contributions of all registered permission calculators, backed by a
/// two-tier cache.
///
/// The process tier holds frozen results for the lifetime of one request and avoids repeated
/// freeze and persistent-tier round-trips; it must be reset at the request boundary, see
/// [`reset_process_cache`](ChainCalculator::reset_process_cache). The persistent tier `B`
/// amortizes calculation cost across requests and processes: its entries are keyed by resolved
/// context values and invalidated through tags, which makes them safe to share.
///
/// Calculators are invoked in registration order and merged left to right. A failing calculator
/// fails the whole calculation; nothing partial is ever cached or returned.
pub struct ChainCalculator<B> {
    calculators: Vec<Box<dyn PermissionCalculator>>,
    resolver: Box<dyn ResolveContext>,
    identities: IdentityStack,
    process_cache: MemoryCache<CalculatedPermissions>,
    persistent_cache: B,
    // Persistent contexts per scope only change when calculators are (re)registered, so the
    // union is memoized and dropped again on registration.
    persistent_contexts: RefCell<HashMap<Scope, BTreeSet<CacheContext>>>,
}

impl<B> ChainCalculator<B>
where
    B: CacheBackend<RefinablePermissions>,
{
    pub fn new(persistent_cache: B, resolver: impl ResolveContext + 'static) -> Self {
        Self {
            calculators: Vec::new(),
            resolver: Box::new(resolver),
            identities: IdentityStack::new(),
            process_cache: MemoryCache::new(),
            persistent_cache,
            persistent_contexts: RefCell::new(HashMap::new()),
        }
    }

    /// Append a calculator to the chain.
    ///
    /// Registration order is an observable contract: contributions are merged left to right and
    /// overwrite semantics inside a later calculator can depend on what earlier ones added.
    pub fn register(&mut self, calculator: impl PermissionCalculator + 'static) {
        self.calculators.push(Box::new(calculator));
        self.persistent_contexts.borrow_mut().clear();
    }

    /// The identity stack contexts resolve against.
    ///
    /// Exposed so custom [`ResolveContext`](crate::traits::ResolveContext) implementations and
    /// hosts embedding the engine can observe the current calculation identity.
    pub fn identities(&self) -> &IdentityStack {
        &self.identities
    }

    /// Calculate the permissions of `account` within the given scope.
    ///
    /// Served from the process tier when possible, then from the persistent tier, and only
    /// calculated from scratch on a full miss. The account may differ from the identity driving
    /// the current request; cache contexts resolve against the ambient identity, so the
    /// identity is switched to `account` for the duration of key resolution whenever any
    /// persistent context depends on it, and restored afterwards even on failure.
    pub fn calculate_permissions(
        &self,
        account: &Account,
        scope: &Scope,
    ) -> Result<CalculatedPermissions, ChainError> {
        let persistent_contexts = self.persistent_contexts(scope);

        let needs_switch = persistent_contexts
            .iter()
            .any(CacheContext::depends_on_identity);
        let _guard = needs_switch.then(|| self.identities.switch_to(account.clone()));

        let resolution_account = self.identities.current().unwrap_or_else(|| account.clone());
        let key = self.resolve_key(scope, &persistent_contexts, &resolution_account)?;

        // The process tier is best-effort: it only holds re-derivable data, so a failure here
        // falls through to the slower paths.
        match self.process_cache.get(&key) {
            Ok(Some(calculated)) => {
                debug!(%key, "process cache hit");
                return Ok(calculated);
            }
            Ok(None) => (),
            Err(error) => warn!(%key, %error, "process cache lookup failed"),
        }

        let (refinable, from_persistent) = match self.persistent_cache.get(&key)? {
            Some(refinable) => {
                debug!(%key, "persistent cache hit");
                (refinable, true)
            }
            None => {
                debug!(%key, "cache miss, running calculator chain");
                let mut refinable = RefinablePermissions::new();
                refinable.add_cache_contexts(persistent_contexts.iter().cloned());

                for calculator in &self.calculators {
                    refinable.merge(calculator.calculate_permissions(account, scope)?);
                }

                refinable.add_cache_tags([CALCULATED_PERMISSIONS_TAG]);
                (refinable, false)
            }
        };

        if !from_persistent {
            // The persistent tier keeps the contexts: they are its addressing mechanism and a
            // later request with different context values must not read this entry.
            self.persistent_cache
                .set(key.clone(), refinable.clone(), refinable.cache_metadata())?;
        }

        let calculated = CalculatedPermissions::from(refinable);
        if let Err(error) =
            self.process_cache
                .set(key, calculated.clone(), calculated.cache_metadata())
        {
            warn!(%error, "process cache store failed");
        }

        Ok(calculated)
    }

    /// Calculate the full permission set of `account`: the union of all built-in scopes.
    pub fn calculate_full_permissions(
        &self,
        account: &Account,
    ) -> Result<CalculatedPermissions, ChainError> {
        let mut full = RefinablePermissions::new();
        for scope in Scope::builtin() {
            let calculated = self.calculate_permissions(account, &scope)?;
            full.merge(RefinablePermissions::from(calculated));
        }

        Ok(CalculatedPermissions::from(full))
    }

    /// Invalidate every cached entry carrying at least one of the given tags, in both tiers.
    pub fn invalidate_tags(&self, tags: &[String]) -> Result<(), ChainError> {
        debug!(?tags, "invalidating cache tags");
        self.persistent_cache.invalidate_tags(tags)?;
        if let Err(error) = self.process_cache.invalidate_tags(tags) {
            warn!(%error, "process cache invalidation failed, resetting it");
            let _ = self.process_cache.clear();
        }

        Ok(())
    }

    /// Drop the process tier.
    ///
    /// Must be called at the request boundary: process-tier entries were computed against
    /// ambient identity-dependent context resolution and are not safe to keep across requests.
    pub fn reset_process_cache(&self) {
        let _ = self.process_cache.clear();
    }

    /// Union of the persistent cache contexts declared by all calculators for `scope`.
    fn persistent_contexts(&self, scope: &Scope) -> BTreeSet<CacheContext> {
        if let Some(contexts) = self.persistent_contexts.borrow().get(scope) {
            return contexts.clone();
        }

        let contexts: BTreeSet<CacheContext> = self
            .calculators
            .iter()
            .flat_map(|calculator| calculator.persistent_cache_contexts(scope))
            .collect();

        self.persistent_contexts
            .borrow_mut()
            .insert(scope.clone(), contexts.clone());

        contexts
    }

    fn resolve_key(
        &self,
        scope: &Scope,
        contexts: &BTreeSet<CacheContext>,
        account: &Account,
    ) -> Result<CacheKey, ContextError> {
        let mut resolved = Vec::with_capacity(contexts.len());
        for context in contexts {
            let value = self.resolver.resolve(context, account)?;
            resolved.push((context.to_string(), value));
        }

        Ok(CacheKey::calculated_permissions(scope, &resolved))
    }
}
