// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A partition of the permission space for which permissions are calculated and cached
/// independently.
///
/// The three built-in scopes cover the common membership situations: an account which is not a
/// member of a group (`Outsider`), an account whose permissions are synchronized from their
/// site-wide roles (`Insider`) and an account with an individual membership in one specific group
/// (`Individual`). Third-party calculators can introduce their own partitions through the
/// `Custom` variant.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Scope {
    /// Permissions of accounts without a membership, keyed by group-type id.
    Outsider,

    /// Role-synchronized permissions of members, keyed by group-type id.
    Insider,

    /// Individually assigned permissions of members, keyed by group id.
    Individual,

    /// Scope registered by external code.
    Custom(String),
}

impl Scope {
    /// The built-in scopes in the order they are combined during full permission calculation.
    pub fn builtin() -> [Scope; 3] {
        [Scope::Outsider, Scope::Insider, Scope::Individual]
    }

    /// Canonical token used when constructing cache keys.
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Outsider => "outsider",
            Scope::Insider => "insider",
            Scope::Individual => "individual",
            Scope::Custom(name) => name,
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Scope;

    #[test]
    fn canonical_tokens() {
        assert_eq!(Scope::Outsider.to_string(), "outsider");
        assert_eq!(Scope::Insider.to_string(), "insider");
        assert_eq!(Scope::Individual.to_string(), "individual");
        assert_eq!(Scope::Custom("federated".to_string()).to_string(), "federated");
    }

    #[test]
    fn builtin_order() {
        assert_eq!(
            Scope::builtin(),
            [Scope::Outsider, Scope::Insider, Scope::Individual]
        );
    }
}
