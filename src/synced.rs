// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;

use tracing::trace;

use crate::context::CacheContext;
use crate::identity::Account;
use crate::item::PermissionItem;
use crate::permissions::RefinablePermissions;
use crate::scope::Scope;
use crate::traits::{CalculatorError, PermissionCalculator, RoleGrants};

/// Built-in calculator for role-synchronized permissions.
///
/// Outsider- and insider-scope permissions are not assigned per account but synchronized from
/// the account's site-wide roles: a role-grant record maps one site-wide role to a permission
/// set for one group type. This calculator contributes one item per grant record matching any
/// of the account's roles and tags the result with each contributing record, so that editing a
/// record invalidates exactly the permission sets it took part in.
#[derive(Clone, Debug)]
pub struct SyncedRoleCalculator<R> {
    grants: R,
}

impl<R> SyncedRoleCalculator<R>
where
    R: RoleGrants,
{
    pub fn new(grants: R) -> Self {
        Self { grants }
    }

    fn is_synced_scope(scope: &Scope) -> bool {
        matches!(scope, Scope::Outsider | Scope::Insider)
    }
}

impl<R> PermissionCalculator for SyncedRoleCalculator<R>
where
    R: RoleGrants,
{
    fn calculate_permissions(
        &self,
        account: &Account,
        scope: &Scope,
    ) -> Result<RefinablePermissions, CalculatorError> {
        let mut permissions = self.base_permissions(scope);
        if !Self::is_synced_scope(scope) {
            return Ok(permissions);
        }

        for role in account.roles() {
            let grants = self
                .grants
                .grants(role, scope)
                .map_err(CalculatorError::new)?;

            for grant in grants {
                trace!(role = %role, grant = %grant.id(), "synchronizing role grant");
                permissions.add_cache_tags([grant.cache_tag()]);
                permissions.add_item(
                    PermissionItem::new(
                        scope.clone(),
                        grant.group_type(),
                        grant.permissions().iter().cloned(),
                        grant.is_admin(),
                    ),
                    false,
                );
            }
        }

        Ok(permissions)
    }

    fn persistent_cache_contexts(&self, scope: &Scope) -> BTreeSet<CacheContext> {
        if Self::is_synced_scope(scope) {
            BTreeSet::from([CacheContext::AccountRoles])
        } else {
            BTreeSet::new()
        }
    }
}
