// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calculated permission sets: the mutable builder used during calculation and the frozen
//! aggregate served to consumers.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::context::CacheContext;
use crate::item::PermissionItem;
use crate::metadata::{CacheMetadata, MaxAge};
use crate::scope::Scope;

/// Mutable permission set under construction.
///
/// Every calculator produces one of these per calculation pass and the chain calculator merges
/// them in registration order. Once complete, the set is frozen into a
/// [`CalculatedPermissions`] and the builder is discarded; `merge` consumes its argument for
/// the same reason, a builder never aliases state that is already considered safe to cache.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RefinablePermissions {
    items: BTreeMap<(Scope, String), PermissionItem>,
    metadata: CacheMetadata,
}

impl RefinablePermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item to the set.
    ///
    /// When an item for the same `(scope, identifier)` pair already exists and `overwrite` is
    /// `false`, both items are combined: the admin flags are OR'd and the permission sets
    /// unioned (an admin result drops the enumerated permissions). With `overwrite` the
    /// existing item is replaced outright.
    pub fn add_item(&mut self, item: PermissionItem, overwrite: bool) {
        let key = (item.scope().clone(), item.identifier().to_string());
        if overwrite {
            self.items.insert(key, item);
            return;
        }

        match self.items.get_mut(&key) {
            Some(existing) => existing.combine(item),
            None => {
                self.items.insert(key, item);
            }
        }
    }

    /// Remove the item for the given scope and identifier, if present.
    pub fn remove_item(&mut self, scope: &Scope, identifier: &str) -> Option<PermissionItem> {
        self.items
            .remove(&(scope.clone(), identifier.to_string()))
    }

    /// Remove all items belonging to the given scope.
    pub fn remove_items_by_scope(&mut self, scope: &Scope) {
        self.items.retain(|(item_scope, _), _| item_scope != scope);
    }

    /// Remove all items.
    pub fn remove_items(&mut self) {
        self.items.clear();
    }

    /// Merge another refinable set into this one.
    ///
    /// Items are added through [`Self::add_item`] without overwrite, so conflicting items
    /// follow the combine rule. Cache metadata is unioned, with the max-age dropping to the
    /// minimum of both sides.
    pub fn merge(&mut self, other: RefinablePermissions) {
        self.metadata.merge(&other.metadata);
        for (_, item) in other.items {
            self.add_item(item, false);
        }
    }

    pub fn item(&self, scope: &Scope, identifier: &str) -> Option<&PermissionItem> {
        self.items.get(&(scope.clone(), identifier.to_string()))
    }

    pub fn items(&self) -> impl Iterator<Item = &PermissionItem> {
        self.items.values()
    }

    pub fn cache_contexts(&self) -> &BTreeSet<CacheContext> {
        self.metadata.contexts()
    }

    pub fn cache_tags(&self) -> &BTreeSet<String> {
        self.metadata.tags()
    }

    pub fn max_age(&self) -> MaxAge {
        self.metadata.max_age()
    }

    pub fn cache_metadata(&self) -> &CacheMetadata {
        &self.metadata
    }

    pub fn add_cache_contexts(&mut self, contexts: impl IntoIterator<Item = CacheContext>) {
        self.metadata.add_contexts(contexts);
    }

    pub fn add_cache_tags(&mut self, tags: impl IntoIterator<Item = impl Into<String>>) {
        self.metadata.add_tags(tags);
    }

    /// Bound the result's max-age from above; a finite age can never be raised back.
    pub fn restrict_max_age(&mut self, max_age: MaxAge) {
        self.metadata.restrict_max_age(max_age);
    }
}

impl From<CalculatedPermissions> for RefinablePermissions {
    fn from(calculated: CalculatedPermissions) -> Self {
        Self {
            items: calculated.items,
            metadata: calculated.metadata,
        }
    }
}

/// Frozen, cacheable permission set.
///
/// Constructed only by freezing a [`RefinablePermissions`]. Freezing strips the cache contexts:
/// contexts are the persistent cache's addressing mechanism and must never leak into a
/// consumer's own cache metadata, where they would fragment the consumer's cache or, if left
/// unresolved, let one account's entry serve another account.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalculatedPermissions {
    items: BTreeMap<(Scope, String), PermissionItem>,
    metadata: CacheMetadata,
}

impl CalculatedPermissions {
    pub fn item(&self, scope: &Scope, identifier: &str) -> Option<&PermissionItem> {
        self.items.get(&(scope.clone(), identifier.to_string()))
    }

    pub fn items(&self) -> impl Iterator<Item = &PermissionItem> {
        self.items.values()
    }

    /// Always empty: contexts are stripped when freezing.
    pub fn cache_contexts(&self) -> &BTreeSet<CacheContext> {
        self.metadata.contexts()
    }

    pub fn cache_tags(&self) -> &BTreeSet<String> {
        self.metadata.tags()
    }

    pub fn max_age(&self) -> MaxAge {
        self.metadata.max_age()
    }

    pub fn cache_metadata(&self) -> &CacheMetadata {
        &self.metadata
    }
}

impl From<RefinablePermissions> for CalculatedPermissions {
    fn from(refinable: RefinablePermissions) -> Self {
        let mut metadata = refinable.metadata;
        metadata.strip_contexts();

        Self {
            items: refinable.items,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::context::CacheContext;
    use crate::item::PermissionItem;
    use crate::metadata::MaxAge;
    use crate::scope::Scope;

    use super::{CalculatedPermissions, RefinablePermissions};

    fn outsider_item(permissions: &[&str]) -> PermissionItem {
        PermissionItem::new(Scope::Outsider, "default", permissions.iter().copied(), false)
    }

    #[test]
    fn add_item_combines_on_conflict() {
        let mut permissions = RefinablePermissions::new();
        permissions.add_item(outsider_item(&["view group"]), false);
        permissions.add_item(outsider_item(&["join group"]), false);

        let item = permissions.item(&Scope::Outsider, "default").unwrap();
        assert!(item.has_permission("view group"));
        assert!(item.has_permission("join group"));
    }

    #[test]
    fn add_item_with_overwrite_replaces() {
        let mut permissions = RefinablePermissions::new();
        permissions.add_item(outsider_item(&["view group"]), false);
        permissions.add_item(outsider_item(&["join group"]), true);

        let item = permissions.item(&Scope::Outsider, "default").unwrap();
        assert!(!item.has_permission("view group"));
        assert!(item.has_permission("join group"));
    }

    #[test]
    fn remove_operations() {
        let mut permissions = RefinablePermissions::new();
        permissions.add_item(outsider_item(&["view group"]), false);
        permissions.add_item(
            PermissionItem::new(Scope::Individual, "group_1", ["edit group"], false),
            false,
        );
        permissions.add_item(
            PermissionItem::new(Scope::Individual, "group_2", ["edit group"], false),
            false,
        );

        assert!(permissions.remove_item(&Scope::Outsider, "default").is_some());
        assert!(permissions.remove_item(&Scope::Outsider, "default").is_none());

        permissions.remove_items_by_scope(&Scope::Individual);
        assert_eq!(permissions.items().count(), 0);

        permissions.add_item(outsider_item(&["view group"]), false);
        permissions.remove_items();
        assert_eq!(permissions.items().count(), 0);
    }

    #[test]
    fn merge_is_order_independent() {
        let mut a = RefinablePermissions::new();
        a.add_item(outsider_item(&["view group"]), false);
        a.add_cache_contexts([CacheContext::AccountRoles]);
        a.add_cache_tags(["role_grant:1"]);

        let mut b = RefinablePermissions::new();
        b.add_item(outsider_item(&["join group"]), false);
        b.add_item(
            PermissionItem::new(Scope::Insider, "default", ["edit group"], false),
            false,
        );
        b.add_cache_tags(["role_grant:2"]);
        b.restrict_max_age(MaxAge::Finite(60));

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);

        assert_eq!(ab, ba);
        assert_eq!(ab.max_age(), MaxAge::Finite(60));
        assert_eq!(ab.cache_tags().len(), 2);
        assert_eq!(ab.cache_contexts().len(), 1);
    }

    #[test]
    fn merge_unions_metadata() {
        let mut a = RefinablePermissions::new();
        a.add_cache_contexts([CacheContext::AccountIdentity]);
        a.add_cache_tags(["t1"]);

        let mut b = RefinablePermissions::new();
        b.add_cache_contexts([CacheContext::AccountRoles]);
        b.add_cache_tags(["t2"]);
        b.restrict_max_age(MaxAge::Finite(10));

        a.merge(b);

        assert_eq!(a.cache_contexts().len(), 2);
        assert_eq!(a.cache_tags().len(), 2);
        assert_eq!(a.max_age(), MaxAge::Finite(10));
    }

    #[test]
    fn freezing_strips_contexts() {
        let mut refinable = RefinablePermissions::new();
        refinable.add_item(outsider_item(&["view group"]), false);
        refinable.add_cache_contexts([CacheContext::AccountIdentity, CacheContext::AccountRoles]);
        refinable.add_cache_tags(["role_grant:1"]);
        refinable.restrict_max_age(MaxAge::Finite(300));

        let calculated = CalculatedPermissions::from(refinable);

        assert!(calculated.cache_contexts().is_empty());
        assert_eq!(calculated.cache_tags().len(), 1);
        assert_eq!(calculated.max_age(), MaxAge::Finite(300));
        assert!(
            calculated
                .item(&Scope::Outsider, "default")
                .unwrap()
                .has_permission("view group")
        );
    }

    #[test]
    fn thaw_round_trip_keeps_items_and_tags() {
        let mut refinable = RefinablePermissions::new();
        refinable.add_item(outsider_item(&["view group"]), false);
        refinable.add_cache_tags(["role_grant:1"]);

        let calculated = CalculatedPermissions::from(refinable.clone());
        let thawed = RefinablePermissions::from(calculated);

        assert_eq!(thawed.item(&Scope::Outsider, "default"), refinable.item(&Scope::Outsider, "default"));
        assert_eq!(thawed.cache_tags(), refinable.cache_tags());
    }
}
