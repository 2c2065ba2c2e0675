// SPDX-License-Identifier: MIT OR Apache-2.0

use std::cell::RefCell;
use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tracing::trace;

/// The account permissions are calculated for.
///
/// This is the full view the engine has of an identity: an opaque id used as a cache-key input
/// and the site-wide role list the built-in synchronized calculator matches role grants
/// against. Roles are kept sorted so resolved cache-context values are deterministic.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Account {
    id: String,
    roles: BTreeSet<String>,
}

impl Account {
    pub fn new(
        id: impl Into<String>,
        roles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Explicit stack of switched identities.
///
/// Cache contexts resolve against the identity which is current at resolution time, not against
/// an explicit parameter. When permissions are calculated for an account other than the one
/// driving the request, the calculator pushes that account here for the duration of key
/// resolution and pops it afterwards.
///
/// Switches nest: a calculation already running under a switched identity restores the previous
/// switched identity, not the ambient one. The returned [`IdentityGuard`] pops on drop, which
/// also covers unwinding, so a failing calculator can never leave a foreign identity active.
#[derive(Debug, Default)]
pub struct IdentityStack {
    stack: RefCell<Vec<Account>>,
}

impl IdentityStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `account` the current identity until the returned guard is dropped.
    #[must_use = "the switched identity is restored when the guard is dropped"]
    pub fn switch_to(&self, account: Account) -> IdentityGuard<'_> {
        trace!(account = %account.id(), "switching identity");
        self.stack.borrow_mut().push(account);
        IdentityGuard { stack: self }
    }

    /// The identity currently on top of the stack, if any switch is active.
    pub fn current(&self) -> Option<Account> {
        self.stack.borrow().last().cloned()
    }

    /// Number of active switches. Zero means the ambient identity applies.
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }
}

/// Scoped handle for an active identity switch, see [`IdentityStack::switch_to`].
#[derive(Debug)]
pub struct IdentityGuard<'a> {
    stack: &'a IdentityStack,
}

impl Drop for IdentityGuard<'_> {
    fn drop(&mut self) {
        let popped = self.stack.stack.borrow_mut().pop();
        if let Some(account) = popped {
            trace!(account = %account.id(), "restored previous identity");
        }
    }
}
