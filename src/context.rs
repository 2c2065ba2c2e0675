// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use thiserror::Error;

use crate::identity::Account;
use crate::traits::ResolveContext;

#[derive(Debug, Error, PartialEq)]
pub enum ContextError {
    #[error("cache context cannot be resolved: {0}")]
    Unresolvable(CacheContext),
}

/// A dimension of variation a calculated permission set depends on.
///
/// Contexts are resolved to concrete string values when a cache key is constructed, so that two
/// accounts whose context values differ never read each other's cache entries. The two built-in
/// kinds cover the account identity itself and the account's site-wide role list; external
/// calculators can register further kinds through `Custom` together with a
/// [`ResolveContext`](crate::traits::ResolveContext) implementation which understands them.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CacheContext {
    /// The identity of the account permissions are calculated for.
    AccountIdentity,

    /// The site-wide roles held by the account.
    AccountRoles,

    /// Context kind registered by external code.
    Custom(String),
}

impl CacheContext {
    /// Return `true` if resolving this context reads the ambient account identity.
    ///
    /// The chain calculator switches the ambient identity to the target account before
    /// resolving any identity-dependent context, since the account under calculation may
    /// differ from the account driving the current request.
    pub fn depends_on_identity(&self) -> bool {
        match self {
            CacheContext::AccountIdentity | CacheContext::AccountRoles => true,
            // Custom contexts resolve through an external resolver which receives the current
            // account, so they are treated as identity-dependent as well. Declaring too many
            // contexts identity-dependent costs an unnecessary switch; declaring too few risks
            // resolving against the wrong account.
            CacheContext::Custom(_) => true,
        }
    }
}

impl Display for CacheContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CacheContext::AccountIdentity => "account.identity",
            CacheContext::AccountRoles => "account.roles",
            CacheContext::Custom(name) => name,
        };

        write!(f, "{}", s)
    }
}

/// Resolver for the built-in account contexts.
///
/// `AccountRoles` resolves to the sorted role list so that the resolved value, and with it the
/// cache key, does not depend on the order roles were loaded in.
#[derive(Clone, Debug, Default)]
pub struct AccountContextResolver;

impl ResolveContext for AccountContextResolver {
    fn resolve(&self, context: &CacheContext, account: &Account) -> Result<String, ContextError> {
        match context {
            CacheContext::AccountIdentity => Ok(account.id().to_string()),
            CacheContext::AccountRoles => {
                let roles: Vec<_> = account.roles().iter().map(String::as_str).collect();
                Ok(roles.join(","))
            }
            CacheContext::Custom(_) => Err(ContextError::Unresolvable(context.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::identity::Account;
    use crate::traits::ResolveContext;

    use super::{AccountContextResolver, CacheContext, ContextError};

    #[test]
    fn resolves_account_contexts() {
        let account = Account::new("account_1", ["member", "authenticated"]);
        let resolver = AccountContextResolver;

        assert_eq!(
            resolver.resolve(&CacheContext::AccountIdentity, &account),
            Ok("account_1".to_string())
        );

        // Roles resolve in sorted order, independent of insertion order.
        assert_eq!(
            resolver.resolve(&CacheContext::AccountRoles, &account),
            Ok("authenticated,member".to_string())
        );
    }

    #[test]
    fn unknown_context_is_fatal() {
        let account = Account::new("account_1", ["authenticated"]);
        let resolver = AccountContextResolver;
        let context = CacheContext::Custom("moon.phase".to_string());

        assert_eq!(
            resolver.resolve(&context, &account),
            Err(ContextError::Unresolvable(context))
        );
    }
}
