// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::context::{CacheContext, ContextError};
use crate::identity::Account;

/// Maps a cache context to the concrete string value used in cache-key construction.
///
/// The resolver is only ever invoked while the correct identity is current; `account` is the
/// identity on top of the [`IdentityStack`](crate::IdentityStack) at resolution time. An
/// unresolvable context is fatal for the calculation, there is no neutral fallback value.
pub trait ResolveContext {
    fn resolve(&self, context: &CacheContext, account: &Account) -> Result<String, ContextError>;
}
