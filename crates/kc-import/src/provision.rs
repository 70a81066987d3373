//! User creation from representations.

use kc_model::group::path_segments;
use kc_model::{Group, User};
use kc_storage::StoreTransaction;
use uuid::Uuid;

use crate::error::{ImportError, ImportResult};
use crate::representation::UserRepresentation;

/// Creates a user with its role grants and group memberships.
///
/// The representation id is kept when it is a valid UUID.
///
/// ## Errors
///
/// Returns `ImportError::UnknownReference` if a role, client or group it
/// names does not exist, and storage errors such as a duplicate username.
pub async fn provision_user(
    tx: &mut dyn StoreTransaction,
    realm_id: Uuid,
    rep: &UserRepresentation,
) -> ImportResult<User> {
    let mut user = User::new(realm_id, rep.username.clone());
    if let Some(id) = rep.parsed_id() {
        user = user.with_id(id);
    }
    user.enabled = rep.is_enabled();
    user.first_name.clone_from(&rep.first_name);
    user.last_name.clone_from(&rep.last_name);
    user.email.clone_from(&rep.email);
    user.email_verified = rep.email_verified;
    user.attributes.clone_from(&rep.attributes);

    if let Some(client_id) = &rep.service_account_client_id {
        let client = tx
            .find_client_by_client_id(realm_id, client_id)
            .await?
            .ok_or_else(|| ImportError::unknown("client", client_id))?;
        user = user.with_service_account_link(client.id);
    }

    tx.create_user(&user).await?;

    for name in &rep.realm_roles {
        let role = tx
            .find_realm_role_by_name(realm_id, name)
            .await?
            .ok_or_else(|| ImportError::unknown("realm role", name))?;
        tx.grant_role(user.id, role.id).await?;
    }

    for (client_id, names) in &rep.client_roles {
        let client = tx
            .find_client_by_client_id(realm_id, client_id)
            .await?
            .ok_or_else(|| ImportError::unknown("client", client_id))?;
        for name in names {
            let role = tx
                .find_client_role_by_name(client.id, name)
                .await?
                .ok_or_else(|| ImportError::unknown("client role", format!("{client_id}.{name}")))?;
            tx.grant_role(user.id, role.id).await?;
        }
    }

    for path in &rep.groups {
        let group = resolve_group_path(tx, realm_id, path)
            .await?
            .ok_or_else(|| ImportError::unknown("group", path))?;
        tx.join_group(user.id, group.id).await?;
    }

    Ok(user)
}

/// Finds a group by its `/parent/child` path.
///
/// ## Errors
///
/// Returns storage errors.
pub async fn resolve_group_path(
    tx: &mut dyn StoreTransaction,
    realm_id: Uuid,
    path: &str,
) -> ImportResult<Option<Group>> {
    let mut current: Option<Group> = None;
    for segment in path_segments(path) {
        let parent = current.as_ref().map(|g| g.id);
        match tx.find_group_by_name(realm_id, parent, segment).await? {
            Some(group) => current = Some(group),
            None => return Ok(None),
        }
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use kc_model::Realm;
    use kc_storage::{MemoryStore, Store};

    use super::*;
    use crate::testing::{sample_realm, seed_realm};

    #[tokio::test]
    async fn grants_roles_and_groups() {
        let store = MemoryStore::new();
        let realm = seed_realm(&store, &sample_realm()).await;
        let mut tx = store.begin().await.unwrap();

        let mut rep = UserRepresentation::new("carol");
        rep.realm_roles = vec!["viewer".to_string()];
        rep.client_roles
            .insert("web".to_string(), vec!["edit".to_string()]);
        rep.groups = vec!["/staff".to_string(), "/staff/admins".to_string()];
        let id = Uuid::now_v7();
        rep.id = Some(id.to_string());

        let user = provision_user(tx.as_mut(), realm.id, &rep).await.unwrap();

        assert_eq!(user.id, id);
        assert_eq!(tx.list_role_mappings(user.id).await.unwrap().len(), 2);
        assert_eq!(tx.list_group_memberships(user.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_role_is_reported() {
        let store = MemoryStore::new();
        let realm = seed_realm(&store, &sample_realm()).await;
        let mut tx = store.begin().await.unwrap();

        let mut rep = UserRepresentation::new("carol");
        rep.realm_roles = vec!["missing".to_string()];

        let err = provision_user(tx.as_mut(), realm.id, &rep).await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::UnknownReference { kind: "realm role", .. }
        ));
    }

    #[tokio::test]
    async fn resolves_nested_paths() {
        let store = MemoryStore::new();
        let realm = seed_realm(&store, &sample_realm()).await;
        let mut tx = store.begin().await.unwrap();

        let admins = resolve_group_path(tx.as_mut(), realm.id, "/staff/admins")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admins.name, "admins");
        assert!(admins.parent_id.is_some());

        assert!(
            resolve_group_path(tx.as_mut(), realm.id, "/admins")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            resolve_group_path(tx.as_mut(), Realm::new("other").id, "/staff")
                .await
                .unwrap()
                .is_none()
        );
    }
}
