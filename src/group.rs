// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The group an access check runs against.
///
/// This is the engine's view of the group entity: the group id keys individual-scope items, the
/// group-type id keys outsider- and insider-scope items.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Group {
    id: String,
    group_type: String,
}

impl Group {
    pub fn new(id: impl Into<String>, group_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group_type: group_type.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn group_type(&self) -> &str {
        &self.group_type
    }
}

/// An individual membership of one account in one group.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Membership {
    account_id: String,
    group_id: String,
    roles: BTreeSet<String>,
}

impl Membership {
    pub fn new(
        account_id: impl Into<String>,
        group_id: impl Into<String>,
        roles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            group_id: group_id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// The group roles assigned to this member individually.
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }
}
