// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the pluggable seams of the engine.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::convert::Infallible;
use std::rc::Rc;

use thiserror::Error;

use crate::context::CacheContext;
use crate::group::{Group, Membership};
use crate::identity::Account;
use crate::item::PermissionItem;
use crate::permissions::RefinablePermissions;
use crate::scope::Scope;
use crate::traits::{CalculatorError, Memberships, PermissionCalculator, RoleGrant, RoleGrants};

/// Role-grant registry backed by a shared map.
///
/// Clones share the underlying storage, so a test can keep a handle and add grants after the
/// registry was handed to a calculator.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRoleGrants {
    grants: Rc<RefCell<HashMap<(String, Scope), Vec<RoleGrant>>>>,
}

impl InMemoryRoleGrants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, role: impl Into<String>, scope: Scope, grant: RoleGrant) {
        self.grants
            .borrow_mut()
            .entry((role.into(), scope))
            .or_default()
            .push(grant);
    }
}

impl RoleGrants for InMemoryRoleGrants {
    type Error = Infallible;

    fn grants(&self, role: &str, scope: &Scope) -> Result<Vec<RoleGrant>, Self::Error> {
        Ok(self
            .grants
            .borrow()
            .get(&(role.to_string(), scope.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Membership store backed by a shared map.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMemberships {
    memberships: Rc<RefCell<HashMap<(String, String), Membership>>>,
}

impl InMemoryMemberships {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, membership: Membership) {
        self.memberships.borrow_mut().insert(
            (
                membership.group_id().to_string(),
                membership.account_id().to_string(),
            ),
            membership,
        );
    }
}

impl Memberships for InMemoryMemberships {
    type Error = Infallible;

    fn load(&self, group: &Group, account: &Account) -> Result<Option<Membership>, Self::Error> {
        Ok(self
            .memberships
            .borrow()
            .get(&(group.id().to_string(), account.id().to_string()))
            .cloned())
    }
}

/// Calculator contributing one fixed item for one account, in the item's scope.
///
/// Useful for modelling individual grants without a full membership-role storage behind them.
#[derive(Clone, Debug)]
pub struct StaticCalculator {
    account_id: String,
    item: PermissionItem,
}

impl StaticCalculator {
    pub fn new(account_id: impl Into<String>, item: PermissionItem) -> Self {
        Self {
            account_id: account_id.into(),
            item,
        }
    }
}

impl PermissionCalculator for StaticCalculator {
    fn calculate_permissions(
        &self,
        account: &Account,
        scope: &Scope,
    ) -> Result<RefinablePermissions, CalculatorError> {
        let mut permissions = self.base_permissions(scope);
        if account.id() == self.account_id && scope == self.item.scope() {
            permissions.add_item(self.item.clone(), false);
        }

        Ok(permissions)
    }

    fn persistent_cache_contexts(&self, scope: &Scope) -> BTreeSet<CacheContext> {
        if scope == self.item.scope() {
            BTreeSet::from([CacheContext::AccountIdentity])
        } else {
            BTreeSet::new()
        }
    }
}

/// Calculator counting how often the chain invokes it.
#[derive(Clone, Debug)]
pub struct CountingCalculator {
    scope: Scope,
    calls: Rc<Cell<usize>>,
}

impl CountingCalculator {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Handle on the invocation counter, valid after the calculator moved into a chain.
    pub fn calls(&self) -> Rc<Cell<usize>> {
        self.calls.clone()
    }
}

impl PermissionCalculator for CountingCalculator {
    fn calculate_permissions(
        &self,
        _account: &Account,
        scope: &Scope,
    ) -> Result<RefinablePermissions, CalculatorError> {
        self.calls.set(self.calls.get() + 1);

        let mut permissions = self.base_permissions(scope);
        if scope == &self.scope {
            permissions.add_item(
                PermissionItem::new(scope.clone(), "default", ["view group"], false),
                false,
            );
        }

        Ok(permissions)
    }

    fn persistent_cache_contexts(&self, scope: &Scope) -> BTreeSet<CacheContext> {
        if scope == &self.scope {
            BTreeSet::from([CacheContext::AccountIdentity])
        } else {
            BTreeSet::new()
        }
    }
}

#[derive(Debug, Error)]
#[error("calculator failure for testing")]
pub struct TestCalculatorFailure;

/// Calculator failing on every invocation.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingCalculator;

impl PermissionCalculator for FailingCalculator {
    fn calculate_permissions(
        &self,
        _account: &Account,
        _scope: &Scope,
    ) -> Result<RefinablePermissions, CalculatorError> {
        Err(CalculatorError::new(TestCalculatorFailure))
    }
}
