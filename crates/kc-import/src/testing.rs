//! Fixtures shared by unit tests.

use std::collections::BTreeMap;

use kc_model::Realm;
use kc_storage::{MemoryStore, Store};

use crate::rebuild::{RealmRebuilder, StoreRealmRebuilder};
use crate::representation::{
    ClientRepresentation, ClientScopeRepresentation, CompositesRepresentation,
    GroupRepresentation, RealmRepresentation, RoleRepresentation, ScopeMappingRepresentation,
    UserRepresentation,
};

/// Realm `acme`: roles `viewer`, `admin` (composite of `viewer` and
/// `web.edit`), client `web` with a service account and role `edit`,
/// scope `profile`, groups `/staff` and `/staff/admins`, and user `alice`.
pub fn sample_realm() -> RealmRepresentation {
    let mut rep = RealmRepresentation::new("acme");

    rep.client_scopes.push(ClientScopeRepresentation {
        name: "profile".to_string(),
        ..ClientScopeRepresentation::default()
    });
    rep.default_default_client_scopes = vec!["profile".to_string()];
    rep.scope_mappings.push(ScopeMappingRepresentation {
        client_scope: "profile".to_string(),
        roles: vec!["viewer".to_string()],
    });

    let mut admin = RoleRepresentation::new("admin");
    admin.composite = true;
    admin.composites = Some(CompositesRepresentation {
        realm: vec!["viewer".to_string()],
        client: BTreeMap::from([("web".to_string(), vec!["edit".to_string()])]),
    });
    rep.roles.realm = vec![RoleRepresentation::new("viewer"), admin];
    rep.roles
        .client
        .insert("web".to_string(), vec![RoleRepresentation::new("edit")]);

    let mut web = ClientRepresentation::new("web");
    web.service_accounts_enabled = true;
    web.default_client_scopes = vec!["profile".to_string()];
    rep.clients.push(web);

    let mut staff = GroupRepresentation::new("staff");
    staff.realm_roles = vec!["viewer".to_string()];
    staff.sub_groups.push(GroupRepresentation::new("admins"));
    rep.groups.push(staff);
    rep.default_groups = vec!["/staff".to_string()];

    let mut alice = UserRepresentation::new("alice");
    alice.realm_roles = vec!["viewer".to_string()];
    alice
        .client_roles
        .insert("web".to_string(), vec!["edit".to_string()]);
    alice.groups = vec!["/staff/admins".to_string()];
    rep.users.push(alice);

    rep
}

/// Creates `rep` in `store` and commits.
pub async fn seed_realm(store: &MemoryStore, rep: &RealmRepresentation) -> Realm {
    let mut tx = store.begin().await.unwrap();
    let realm = StoreRealmRebuilder::new()
        .rebuild(tx.as_mut(), rep, None)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    realm
}
