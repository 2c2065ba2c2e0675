// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;
use std::error::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::scope::Scope;

/// A record granting group permissions to every holder of one site-wide role.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoleGrant {
    id: String,
    group_type: String,
    permissions: BTreeSet<String>,
    is_admin: bool,
}

impl RoleGrant {
    pub fn new(
        id: impl Into<String>,
        group_type: impl Into<String>,
        permissions: impl IntoIterator<Item = impl Into<String>>,
        is_admin: bool,
    ) -> Self {
        Self {
            id: id.into(),
            group_type: group_type.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
            is_admin,
        }
    }

    /// Stable identifier of this record.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The group type the permissions apply to.
    pub fn group_type(&self) -> &str {
        &self.group_type
    }

    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Cache tag invalidating every calculated set this record contributed to.
    pub fn cache_tag(&self) -> String {
        format!("role_grant:{}", self.id)
    }
}

/// Registry of role-grant records, queried by the built-in synchronized calculator.
pub trait RoleGrants {
    type Error: Error + Send + Sync + 'static;

    /// All grant records matching the given site-wide role and scope.
    fn grants(&self, role: &str, scope: &Scope) -> Result<Vec<RoleGrant>, Self::Error>;
}
