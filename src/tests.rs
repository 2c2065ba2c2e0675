// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios across checker, chain and caches.

use crate::cache::MemoryCache;
use crate::context::AccountContextResolver;
use crate::group::{Group, Membership};
use crate::identity::Account;
use crate::item::PermissionItem;
use crate::permissions::RefinablePermissions;
use crate::scope::Scope;
use crate::synced::SyncedRoleCalculator;
use crate::test_utils::{InMemoryMemberships, InMemoryRoleGrants, StaticCalculator};
use crate::traits::RoleGrant;
use crate::{ChainCalculator, PermissionChecker};

fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

fn chain_with_grants(
    grants: InMemoryRoleGrants,
) -> ChainCalculator<MemoryCache<RefinablePermissions>> {
    let mut chain = ChainCalculator::new(MemoryCache::new(), AccountContextResolver);
    chain.register(SyncedRoleCalculator::new(grants));
    chain
}

#[test]
fn authenticated_outsider_can_view_but_not_edit() {
    setup_logging();

    // Group type "default" grants outsiders the "view group" permission.
    let grants = InMemoryRoleGrants::new();
    grants.add(
        "authenticated",
        Scope::Outsider,
        RoleGrant::new("1", "default", ["view group"], false),
    );
    let chain = chain_with_grants(grants);

    // An account with no role beyond "authenticated" and no membership.
    let account = Account::new("account_1", ["authenticated"]);
    let group = Group::new("group_1", "default");

    let calculated = chain
        .calculate_permissions(&account, &Scope::Outsider)
        .unwrap();
    let item = calculated.item(&Scope::Outsider, "default").unwrap();
    assert!(!item.is_admin());
    assert_eq!(item.permissions().iter().collect::<Vec<_>>(), vec!["view group"]);

    let checker = PermissionChecker::new(&chain, InMemoryMemberships::new());
    assert!(
        checker
            .has_permission_in_group("view group", &account, &group)
            .unwrap()
    );
    assert!(
        !checker
            .has_permission_in_group("edit group", &account, &group)
            .unwrap()
    );
}

#[test]
fn individual_admin_holds_every_permission() {
    let account = Account::new("account_1", ["authenticated"]);
    let group = Group::new("group_1", "default");

    let mut chain = chain_with_grants(InMemoryRoleGrants::new());
    // The account's individual membership role grants admin in this group.
    chain.register(StaticCalculator::new(
        account.id(),
        PermissionItem::admin(Scope::Individual, group.id()),
    ));

    let memberships = InMemoryMemberships::new();
    memberships.add(Membership::new(account.id(), group.id(), ["group_admin"]));
    let checker = PermissionChecker::new(&chain, memberships);

    // Never explicitly granted anywhere, still held through the admin flag.
    assert!(
        checker
            .has_permission_in_group("anything at all", &account, &group)
            .unwrap()
    );
}

#[test]
fn full_permissions_equal_the_merge_of_all_scopes() {
    let grants = InMemoryRoleGrants::new();
    grants.add(
        "authenticated",
        Scope::Outsider,
        RoleGrant::new("1", "default", ["view group"], false),
    );
    grants.add(
        "authenticated",
        Scope::Insider,
        RoleGrant::new("2", "default", ["post in group"], false),
    );

    let account = Account::new("account_1", ["authenticated"]);
    let mut chain = chain_with_grants(grants);
    chain.register(StaticCalculator::new(
        account.id(),
        PermissionItem::new(Scope::Individual, "group_1", ["edit group"], false),
    ));

    let full = chain.calculate_full_permissions(&account).unwrap();

    let mut merged = RefinablePermissions::new();
    for scope in Scope::builtin() {
        let calculated = chain.calculate_permissions(&account, &scope).unwrap();
        merged.merge(RefinablePermissions::from(calculated));
    }

    assert_eq!(full, crate::CalculatedPermissions::from(merged));

    // Scopes never collide on items, so the union holds one item per contribution.
    assert!(full.item(&Scope::Outsider, "default").is_some());
    assert!(full.item(&Scope::Insider, "default").is_some());
    assert!(full.item(&Scope::Individual, "group_1").is_some());
}

#[test]
fn new_role_grant_applies_after_its_tag_is_flushed() {
    setup_logging();

    let grants = InMemoryRoleGrants::new();
    grants.add(
        "authenticated",
        Scope::Outsider,
        RoleGrant::new("1", "default", ["view group"], false),
    );
    let chain = chain_with_grants(grants.clone());

    let account = Account::new("account_1", ["authenticated"]);
    let group = Group::new("group_1", "default");
    let checker = PermissionChecker::new(&chain, InMemoryMemberships::new());

    assert!(
        !checker
            .has_permission_in_group("join group", &account, &group)
            .unwrap()
    );

    // A new outsider grant for the same group type appears. The cached result stays stale
    // until the tag of the already-contributing record is flushed.
    grants.add(
        "authenticated",
        Scope::Outsider,
        RoleGrant::new("2", "default", ["join group"], false),
    );
    assert!(
        !checker
            .has_permission_in_group("join group", &account, &group)
            .unwrap()
    );

    chain
        .invalidate_tags(&["role_grant:1".to_string()])
        .unwrap();
    assert!(
        checker
            .has_permission_in_group("join group", &account, &group)
            .unwrap()
    );
}

#[test]
fn permissions_for_another_account_leave_the_identity_stack_balanced() {
    let grants = InMemoryRoleGrants::new();
    grants.add(
        "authenticated",
        Scope::Outsider,
        RoleGrant::new("1", "default", ["view group"], false),
    );
    let chain = chain_with_grants(grants);

    // An administrative lookup for two different accounts back to back: each calculation
    // switches to its target account and restores the previous identity afterwards.
    let alice = Account::new("alice", ["authenticated"]);
    let bob = Account::new("bob", ["authenticated", "editor"]);

    chain.calculate_full_permissions(&alice).unwrap();
    chain.calculate_full_permissions(&bob).unwrap();

    assert_eq!(chain.identities().depth(), 0);
}
