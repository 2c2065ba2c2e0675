// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use thiserror::Error;
use tracing::trace;

use crate::chain::{ChainCalculator, ChainError};
use crate::group::Group;
use crate::identity::Account;
use crate::permissions::RefinablePermissions;
use crate::scope::Scope;
use crate::traits::{CacheBackend, Memberships};

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("membership lookup failed: {0}")]
    Membership(Box<dyn Error + Send + Sync>),
}

/// Façade answering "does this account hold this permission in this group".
///
/// The checker derives the correct scope and identifier from the account's membership
/// situation and delegates the calculation itself to the [`ChainCalculator`].
pub struct PermissionChecker<'a, B, M> {
    chain: &'a ChainCalculator<B>,
    memberships: M,
}

impl<'a, B, M> PermissionChecker<'a, B, M>
where
    B: CacheBackend<RefinablePermissions>,
    M: Memberships,
{
    pub fn new(chain: &'a ChainCalculator<B>, memberships: M) -> Self {
        Self { chain, memberships }
    }

    /// Return `true` if `account` holds `permission` in `group`.
    ///
    /// Members are checked against the individual-scope item for the group first. An
    /// individual grant is additive on top of the insider grants rather than a replacement, so
    /// a member lacking an individual permission falls through to the insider-scope item for
    /// the group's type. Non-members are checked against the outsider-scope item only. A
    /// missing item means "no opinion" and answers `false`.
    pub fn has_permission_in_group(
        &self,
        permission: &str,
        account: &Account,
        group: &Group,
    ) -> Result<bool, CheckerError> {
        let full = self.chain.calculate_full_permissions(account)?;

        let membership = self
            .memberships
            .load(group, account)
            .map_err(|error| CheckerError::Membership(Box::new(error)))?;

        let item = if membership.is_some() {
            if let Some(individual) = full.item(&Scope::Individual, group.id()) {
                if individual.has_permission(permission) {
                    return Ok(true);
                }
            }

            trace!(group = %group.id(), "falling through to insider permissions");
            full.item(&Scope::Insider, group.group_type())
        } else {
            full.item(&Scope::Outsider, group.group_type())
        };

        Ok(item.is_some_and(|item| item.has_permission(permission)))
    }
}
