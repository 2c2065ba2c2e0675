// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use crate::group::{Group, Membership};
use crate::identity::Account;

/// Lookup of individual membership records.
///
/// The permission checker uses this to decide whether an account is checked against the
/// individual/insider scopes or against the outsider scope.
pub trait Memberships {
    type Error: Error + Send + Sync + 'static;

    /// Load the membership of `account` in `group`, if one exists.
    fn load(&self, group: &Group, account: &Account) -> Result<Option<Membership>, Self::Error>;
}
