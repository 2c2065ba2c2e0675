// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::scope::Scope;

/// One scope's permission grant for one identifier.
///
/// The identifier names the entity the grant applies to: a group-type id for the outsider and
/// insider scopes, a group id for the individual scope. Items are immutable once constructed;
/// combination of two grants for the same `(scope, identifier)` pair happens while a
/// [`RefinablePermissions`](crate::RefinablePermissions) is being built.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PermissionItem {
    scope: Scope,
    identifier: String,
    permissions: BTreeSet<String>,
    is_admin: bool,
}

impl PermissionItem {
    /// Construct a new permission item.
    ///
    /// An admin grant makes the enumerated permission set moot, so it is dropped on
    /// construction. This keeps equality checks and the combine rule honest: two admin items
    /// for the same identifier are equal regardless of which permission strings they were
    /// handed.
    pub fn new(
        scope: Scope,
        identifier: impl Into<String>,
        permissions: impl IntoIterator<Item = impl Into<String>>,
        is_admin: bool,
    ) -> Self {
        let permissions = if is_admin {
            BTreeSet::new()
        } else {
            permissions.into_iter().map(Into::into).collect()
        };

        Self {
            scope,
            identifier: identifier.into(),
            permissions,
            is_admin,
        }
    }

    /// Construct an admin item carrying every permission for the given identifier.
    pub fn admin(scope: Scope, identifier: impl Into<String>) -> Self {
        Self {
            scope,
            identifier: identifier.into(),
            permissions: BTreeSet::new(),
            is_admin: true,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The explicitly enumerated permissions. Empty for admin items.
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Return `true` if this item grants the given permission.
    ///
    /// Admin items grant every permission, whatever their enumerated set contains.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin || self.permissions.contains(permission)
    }

    /// Combine another grant for the same `(scope, identifier)` pair into this one.
    ///
    /// The admin flags are OR'd; if the combined item is admin its permission set becomes
    /// empty, otherwise the permission sets are unioned.
    ///
    /// # Panics
    ///
    /// Panics if `other` carries a different scope or identifier. Callers are responsible for
    /// keying items correctly before combining; getting this wrong is a bug in a calculator,
    /// not a runtime condition.
    pub(crate) fn combine(&mut self, other: PermissionItem) {
        assert_eq!(
            self.scope, other.scope,
            "combined permission items must share a scope"
        );
        assert_eq!(
            self.identifier, other.identifier,
            "combined permission items must share an identifier"
        );

        self.is_admin = self.is_admin || other.is_admin;
        if self.is_admin {
            self.permissions.clear();
        } else {
            self.permissions.extend(other.permissions);
        }
    }
}
