// SPDX-License-Identifier: MIT OR Apache-2.0

mod cache;
mod calculator;
mod memberships;
mod resolver;
mod role_grants;

pub use cache::{CacheBackend, CacheError};
pub use calculator::{CalculatorError, PermissionCalculator};
pub use memberships::Memberships;
pub use resolver::ResolveContext;
pub use role_grants::{RoleGrant, RoleGrants};
