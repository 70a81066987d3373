//! Realm import orchestration.
//!
//! For every realm the importer runs two units of work. The first holds
//! the whole structural cycle: teardown of the existing realm, removal of
//! users the representation re-creates, rebuild, identity remapping and
//! the orphan sweep. Any failure in it rolls everything back and the realm
//! stays as it was. The second configures service accounts and
//! authorization settings. User shards, when enabled, follow in one unit
//! of work per shard.

use std::sync::Arc;

use kc_model::Realm;
use kc_storage::{Store, StoreTransaction};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{ImportConfig, Strategy};
use crate::error::{ImportError, ImportResult, ImportStep, StepContext};
use crate::events::{RealmEventBus, RealmEventListener, TracingEventListener};
use crate::rebuild::{AuthorizationContext, AuthorizationReport, RealmRebuilder, StoreRealmRebuilder};
use crate::remap::{self, GroupSnapshot, RemapReport, RoleSnapshot, SweepReport};
use crate::representation::RealmRepresentation;
use crate::source::DirectorySource;
use crate::state::{ImportState, RealmProgress};
use crate::teardown::{RealmTeardown, TeardownReport};
use crate::users::{UserImportEngine, UserImportReport};

/// What happened to one imported realm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Realm name.
    pub realm: String,
    /// Realm id after import.
    pub realm_id: Uuid,
    /// Whether the realm existed before.
    pub existed: bool,
    /// What teardown deleted.
    pub teardown: TeardownReport,
    /// Users deleted because the representation re-creates them.
    pub default_users_purged: usize,
    /// Role mapping remap.
    pub roles: RemapReport,
    /// Group membership remap.
    pub groups: RemapReport,
    /// Orphan sweep.
    pub swept: SweepReport,
    /// Authorization setup.
    pub authorization: AuthorizationReport,
    /// User shard import, if enabled.
    pub users: Option<UserImportReport>,
    /// States the import went through.
    pub states: Vec<ImportState>,
}

/// Outcome of a single realm import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The realm was created or overwritten.
    Imported(Box<ImportReport>),
    /// The realm existed and the strategy left its structure alone. User
    /// shards are still imported when enabled.
    SkippedExisting {
        /// User shard import, if enabled.
        users: Option<UserImportReport>,
    },
}

impl ImportOutcome {
    /// Returns the report of an imported realm.
    #[must_use]
    pub fn report(&self) -> Option<&ImportReport> {
        match self {
            Self::Imported(report) => Some(report),
            Self::SkippedExisting { .. } => None,
        }
    }
}

/// Result of one realm within [`RealmImporter::import_all`].
#[derive(Debug)]
pub enum RealmResult {
    /// The realm was created or overwritten.
    Imported(Box<ImportReport>),
    /// The realm existed and was left alone.
    Skipped {
        /// User shard import, if enabled.
        users: Option<UserImportReport>,
    },
    /// The import failed; structural changes were rolled back unless the
    /// failure happened after the structure was committed.
    Failed(ImportError),
}

/// Results of [`RealmImporter::import_all`], in import order.
#[derive(Debug, Default)]
pub struct ImportSummary {
    /// `(realm, result)` pairs.
    pub results: Vec<(String, RealmResult)>,
}

impl ImportSummary {
    /// Names of imported realms.
    pub fn imported(&self) -> impl Iterator<Item = &str> {
        self.filter(|r| matches!(r, RealmResult::Imported(_)))
    }

    /// Names of skipped realms.
    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.filter(|r| matches!(r, RealmResult::Skipped { .. }))
    }

    /// Failed realms with their errors.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &ImportError)> {
        self.results.iter().filter_map(|(name, result)| match result {
            RealmResult::Failed(e) => Some((name.as_str(), e)),
            _ => None,
        })
    }

    /// Checks whether every realm was imported or skipped.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    fn filter(&self, pred: impl Fn(&RealmResult) -> bool) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(move |(_, result)| pred(result))
            .map(|(name, _)| name.as_str())
    }
}

/// Imports realms from a directory into a store.
pub struct RealmImporter {
    config: ImportConfig,
    source: DirectorySource,
    store: Arc<dyn Store>,
    rebuilder: Arc<dyn RealmRebuilder>,
    events: RealmEventBus,
}

impl RealmImporter {
    /// Creates an importer with the default rebuilder and a tracing event
    /// listener.
    ///
    /// ## Errors
    ///
    /// Returns `ImportError::Config` if the import directory does not exist.
    pub fn new(config: ImportConfig, store: Arc<dyn Store>) -> ImportResult<Self> {
        let source = DirectorySource::new(&config.dir)?;
        let mut events = RealmEventBus::new();
        events.register(Arc::new(TracingEventListener));
        Ok(Self {
            config,
            source,
            store,
            rebuilder: Arc::new(StoreRealmRebuilder::new()),
            events,
        })
    }

    /// Replaces the rebuilder.
    #[must_use]
    pub fn with_rebuilder(mut self, rebuilder: Arc<dyn RealmRebuilder>) -> Self {
        self.rebuilder = rebuilder;
        self
    }

    /// Registers an additional event listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn RealmEventListener>) -> Self {
        self.events.register(listener);
        self
    }

    /// The resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// The import directory.
    #[must_use]
    pub const fn source(&self) -> &DirectorySource {
        &self.source
    }

    /// Checks whether the directory defines the administrative realm.
    #[must_use]
    pub fn contains_admin_realm(&self) -> bool {
        self.source.contains_admin_realm(&self.config.admin_realm)
    }

    /// Realms the next [`import_all`](Self::import_all) will import.
    #[must_use]
    pub fn realms_to_import(&self) -> Vec<String> {
        match &self.config.realm_name {
            Some(name) => vec![name.clone()],
            None => self.source.realm_names(&self.config.admin_realm),
        }
    }

    /// Imports every realm, continuing past failures.
    pub async fn import_all(&self) -> ImportSummary {
        let mut summary = ImportSummary::default();
        for name in self.realms_to_import() {
            let result = match self.import_realm(&name).await {
                Ok(ImportOutcome::Imported(report)) => RealmResult::Imported(report),
                Ok(ImportOutcome::SkippedExisting { users }) => RealmResult::Skipped { users },
                Err(e) => {
                    error!(realm = %name, error = %e, "Realm import failed");
                    RealmResult::Failed(e)
                }
            };
            summary.results.push((name, result));
        }
        summary
    }

    /// Reads `<realm>-realm.json` and imports it, followed by its user
    /// shards when enabled.
    ///
    /// ## Errors
    ///
    /// Returns the failing step wrapped in `ImportError::Step`.
    pub async fn import_realm(&self, name: &str) -> ImportResult<ImportOutcome> {
        let rep = self.source.read_realm(name).in_step(name, ImportStep::Read)?;
        self.import_representation(&rep).await
    }

    /// Imports a realm representation.
    ///
    /// ## Errors
    ///
    /// Returns the failing step wrapped in `ImportError::Step`.
    pub async fn import_representation(
        &self,
        rep: &RealmRepresentation,
    ) -> ImportResult<ImportOutcome> {
        let name = rep.realm.as_str();
        let mut progress = RealmProgress::new();
        let mut report = ImportReport {
            realm: name.to_string(),
            ..ImportReport::default()
        };

        info!(realm = name, strategy = %self.config.strategy, "Starting to import realm");
        let mut tx = self.store.begin().await.in_step(name, ImportStep::Teardown)?;
        let structure = self
            .import_structure(tx.as_mut(), rep, &mut progress, &mut report)
            .await;
        let realm = match structure {
            Ok(Some(realm)) => {
                tx.commit().await.in_step(name, ImportStep::Rebuild)?;
                realm
            }
            Ok(None) => {
                rollback(tx, name).await;
                progress.advance(ImportState::SkippedExisting)?;
                info!(realm = name, "Realm already exists. Import skipped");
                let users = self.import_users(name, &mut progress).await?;
                return Ok(ImportOutcome::SkippedExisting { users });
            }
            Err(e) => {
                rollback(tx, name).await;
                return Err(e);
            }
        };
        report.realm_id = realm.id;

        let mut tx = self
            .store
            .begin()
            .await
            .in_step(name, ImportStep::Authorization)?;
        let authorization = self
            .rebuilder
            .setup_authorization(tx.as_mut(), &realm, rep, AuthorizationContext::for_import())
            .await;
        match authorization {
            Ok(auth) => {
                tx.commit().await.in_step(name, ImportStep::Authorization)?;
                report.authorization = auth;
            }
            Err(e) => {
                rollback(tx, name).await;
                return Err(e.in_step(name, ImportStep::Authorization));
            }
        }
        progress.advance(ImportState::AuthorizationConfigured)?;
        info!(realm = name, "Realm imported successfully");

        report.users = self.import_users(name, &mut progress).await?;
        progress.advance(ImportState::Done)?;
        report.states = progress.into_history();
        Ok(ImportOutcome::Imported(Box::new(report)))
    }

    /// Imports the realm's user shards when enabled.
    async fn import_users(
        &self,
        name: &str,
        progress: &mut RealmProgress,
    ) -> ImportResult<Option<UserImportReport>> {
        if !self.config.with_users {
            return Ok(None);
        }
        let users = UserImportEngine::new(&self.source, self.store.as_ref())
            .import_realm_users(name)
            .await
            .in_step(name, ImportStep::Users)?;
        progress.advance(ImportState::UsersImported)?;
        Ok(Some(users))
    }

    /// Runs the structural cycle. Returns `None` when the realm exists and
    /// the strategy says to leave it alone.
    async fn import_structure(
        &self,
        tx: &mut dyn StoreTransaction,
        rep: &RealmRepresentation,
        progress: &mut RealmProgress,
        report: &mut ImportReport,
    ) -> ImportResult<Option<Realm>> {
        let name = rep.realm.as_str();
        let existing = tx
            .find_realm_by_name(name)
            .await
            .in_step(name, ImportStep::Teardown)?;

        let Some(existing) = existing else {
            info!(realm = name, "Realm is absent. Creating new realm");
            let realm = self
                .rebuilder
                .rebuild(tx, rep, None)
                .await
                .in_step(name, ImportStep::Rebuild)?;
            progress.advance(ImportState::Rebuilt)?;
            return Ok(Some(realm));
        };

        if self.config.strategy == Strategy::IgnoreExisting {
            return Ok(None);
        }
        report.existed = true;

        let roles_before = RoleSnapshot::capture(tx, existing.id)
            .await
            .in_step(name, ImportStep::Remap)?;
        let groups_before = GroupSnapshot::capture(tx, existing.id)
            .await
            .in_step(name, ImportStep::Remap)?;

        info!(realm = name, "Removing realm");
        report.teardown = RealmTeardown::new(&self.events)
            .remove_realm(tx, existing.id)
            .await
            .in_step(name, ImportStep::Teardown)?
            .unwrap_or_default();
        progress.advance(ImportState::TornDown)?;

        report.default_users_purged = purge_default_users(tx, existing.id, rep)
            .await
            .in_step(name, ImportStep::PurgeDefaultUsers)?;

        info!(realm = name, "Importing realm");
        let realm = self
            .rebuilder
            .rebuild(tx, rep, Some(existing.id))
            .await
            .in_step(name, ImportStep::Rebuild)?;
        progress.advance(ImportState::Rebuilt)?;

        let roles_after = RoleSnapshot::capture(tx, realm.id)
            .await
            .in_step(name, ImportStep::Remap)?;
        let groups_after = GroupSnapshot::capture(tx, realm.id)
            .await
            .in_step(name, ImportStep::Remap)?;
        report.roles = remap::remap_role_mappings(tx, &roles_before, &roles_after)
            .await
            .in_step(name, ImportStep::Remap)?;
        report.groups = remap::remap_group_memberships(tx, &groups_before, &groups_after)
            .await
            .in_step(name, ImportStep::Remap)?;
        progress.advance(ImportState::Remapped)?;

        report.swept = remap::sweep_orphans(tx)
            .await
            .in_step(name, ImportStep::Sweep)?;
        progress.advance(ImportState::Swept)?;

        info!(
            realm = name,
            roles_remapped = report.roles.objects,
            groups_remapped = report.groups.objects,
            rows = report.roles.rows + report.groups.rows,
            "Remapped user associations"
        );
        Ok(Some(realm))
    }
}

impl std::fmt::Debug for RealmImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmImporter")
            .field("config", &self.config)
            .field("source", &self.source)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Deletes users of the realm whose username the representation re-creates,
/// along with their role mappings and group memberships.
async fn purge_default_users(
    tx: &mut dyn StoreTransaction,
    realm_id: Uuid,
    rep: &RealmRepresentation,
) -> ImportResult<usize> {
    let mut purged = 0;
    for user_rep in &rep.users {
        let Some(user) = tx.find_user_by_username(realm_id, &user_rep.username).await? else {
            continue;
        };
        tx.delete_role_mappings_by_user(user.id).await?;
        tx.delete_group_memberships_by_user(user.id).await?;
        tx.delete_user(user.id).await?;
        purged += 1;
    }
    Ok(purged)
}

async fn rollback(tx: Box<dyn StoreTransaction>, realm: &str) {
    if let Err(e) = tx.rollback().await {
        warn!(realm, error = %e, "Rollback failed");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;
    use kc_model::{Realm, User};
    use kc_storage::{MemoryState, MemoryStore};
    use tempfile::TempDir;

    use super::*;
    use crate::events::{RealmEvent, RecordingEventListener};
    use crate::testing::sample_realm;

    struct Fixture {
        dir: TempDir,
        store: MemoryStore,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                store: MemoryStore::new(),
            }
        }

        fn importer(&self, config: ImportConfig) -> RealmImporter {
            RealmImporter::new(config, Arc::new(self.store.clone())).unwrap()
        }

        fn config(&self) -> ImportConfig {
            ImportConfig::new(self.dir.path())
        }

        fn write(&self, name: &str, body: &str) {
            std::fs::write(self.dir.path().join(name), body).unwrap();
        }

        fn write_realm(&self, rep: &RealmRepresentation) {
            self.write(
                &format!("{}-realm.json", rep.realm),
                &serde_json::to_string(rep).unwrap(),
            );
        }

        /// Creates a user holding `roles` (`name` or `client.name`) and
        /// joined to `groups` (paths).
        async fn add_user(&self, realm: &str, username: &str, roles: &[&str], groups: &[&str]) -> User {
            let mut tx = self.store.begin().await.unwrap();
            let realm = tx.find_realm_by_name(realm).await.unwrap().unwrap();
            let user = User::new(realm.id, username);
            tx.create_user(&user).await.unwrap();
            for role in roles {
                let role = match role.split_once('.') {
                    Some((client, name)) => {
                        let client = tx.find_client_by_client_id(realm.id, client).await.unwrap().unwrap();
                        tx.find_client_role_by_name(client.id, name).await.unwrap().unwrap()
                    }
                    None => tx.find_realm_role_by_name(realm.id, role).await.unwrap().unwrap(),
                };
                tx.grant_role(user.id, role.id).await.unwrap();
            }
            for path in groups {
                let group = crate::provision::resolve_group_path(tx.as_mut(), realm.id, path)
                    .await
                    .unwrap()
                    .unwrap();
                tx.join_group(user.id, group.id).await.unwrap();
            }
            tx.commit().await.unwrap();
            user
        }
    }

    fn role_names(state: &MemoryState, user: &User) -> BTreeSet<String> {
        state
            .role_mappings
            .iter()
            .filter(|m| m.user_id == user.id)
            .filter_map(|m| state.roles.get(&m.role_id))
            .map(|role| match role.client_id.and_then(|id| state.clients.get(&id)) {
                Some(client) => format!("{}.{}", client.client_id, role.name),
                None => role.name.clone(),
            })
            .collect()
    }

    fn group_names(state: &MemoryState, user: &User) -> BTreeSet<String> {
        state
            .group_memberships
            .iter()
            .filter(|m| m.user_id == user.id)
            .filter_map(|m| state.groups.get(&m.group_id))
            .map(|group| group.name.clone())
            .collect()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn creates_absent_realm() {
        let fx = Fixture::new();
        let importer = fx.importer(fx.config());

        let outcome = importer.import_representation(&sample_realm()).await.unwrap();
        let report = outcome.report().unwrap();

        assert!(!report.existed);
        assert_eq!(
            report.states,
            vec![
                ImportState::NotStarted,
                ImportState::Rebuilt,
                ImportState::AuthorizationConfigured,
                ImportState::Done
            ]
        );
        assert_eq!(report.authorization.service_accounts_created, 1);

        let state = fx.store.snapshot().await;
        assert_eq!(state.realms.len(), 1);
        assert!(state.users.values().any(|u| u.username == "service-account-web"));
    }

    #[tokio::test]
    async fn reimport_keeps_user_assignments() {
        let fx = Fixture::new();
        let importer = fx.importer(fx.config());
        importer.import_representation(&sample_realm()).await.unwrap();
        let before = fx.store.snapshot().await;
        let realm_id = *before.realms.keys().next().unwrap();
        let bob = fx
            .add_user("acme", "bob", &["viewer", "web.edit"], &["/staff", "/staff/admins"])
            .await;

        let outcome = importer.import_representation(&sample_realm()).await.unwrap();
        let report = outcome.report().unwrap();

        let after = fx.store.snapshot().await;
        assert!(report.existed);
        assert_eq!(report.realm_id, realm_id);
        assert!(after.realms.contains_key(&realm_id));
        assert!(before.roles.keys().all(|id| !after.roles.contains_key(id)));
        assert_eq!(role_names(&after, &bob), set(&["viewer", "web.edit"]));
        assert_eq!(group_names(&after, &bob), set(&["staff", "admins"]));
        assert!(after.dangling_role_mappings().is_empty());
        assert!(after.dangling_group_memberships().is_empty());
        assert_eq!(report.states.last(), Some(&ImportState::Done));
        assert!(report.states.contains(&ImportState::Swept));
        assert_eq!(report.authorization.service_accounts_created, 0);
        assert_eq!(report.authorization.service_accounts_linked, 1);
    }

    #[tokio::test]
    async fn assignments_to_removed_roles_are_swept() {
        let fx = Fixture::new();
        let importer = fx.importer(fx.config());
        importer.import_representation(&sample_realm()).await.unwrap();
        let bob = fx.add_user("acme", "bob", &["viewer", "admin"], &["/staff/admins"]).await;

        let mut rep = sample_realm();
        rep.roles.realm.retain(|r| r.name != "admin");
        rep.groups[0].sub_groups.clear();
        rep.users[0].groups.clear();
        let outcome = importer.import_representation(&rep).await.unwrap();
        let report = outcome.report().unwrap();

        let state = fx.store.snapshot().await;
        assert_eq!(role_names(&state, &bob), set(&["viewer"]));
        assert!(group_names(&state, &bob).is_empty());
        assert!(state.role_mappings.iter().all(|m| state.roles.contains_key(&m.role_id)));
        assert!(state.dangling_group_memberships().is_empty());
        assert_eq!(report.swept.role_mappings, 1);
        assert_eq!(report.swept.group_memberships, 1);
    }

    #[tokio::test]
    async fn default_users_are_recreated_from_representation() {
        let fx = Fixture::new();
        let importer = fx.importer(fx.config());
        importer.import_representation(&sample_realm()).await.unwrap();

        let mut tx = fx.store.begin().await.unwrap();
        let realm = tx.find_realm_by_name("acme").await.unwrap().unwrap();
        let alice = tx.find_user_by_username(realm.id, "alice").await.unwrap().unwrap();
        let admin = tx.find_realm_role_by_name(realm.id, "admin").await.unwrap().unwrap();
        tx.grant_role(alice.id, admin.id).await.unwrap();
        tx.commit().await.unwrap();

        let outcome = importer.import_representation(&sample_realm()).await.unwrap();
        assert_eq!(outcome.report().unwrap().default_users_purged, 1);

        let state = fx.store.snapshot().await;
        assert!(!state.users.contains_key(&alice.id));
        let alice = state.users.values().find(|u| u.username == "alice").unwrap();
        assert_eq!(role_names(&state, alice), set(&["viewer", "web.edit"]));
        assert_eq!(group_names(&state, alice), set(&["admins"]));
    }

    #[tokio::test]
    async fn ignore_existing_leaves_realm_alone() {
        let fx = Fixture::new();
        fx.importer(fx.config())
            .import_representation(&sample_realm())
            .await
            .unwrap();
        let before = fx.store.snapshot().await;

        let importer = fx.importer(fx.config().with_strategy(Strategy::IgnoreExisting));
        let outcome = importer.import_representation(&sample_realm()).await.unwrap();

        assert_eq!(outcome, ImportOutcome::SkippedExisting { users: None });
        let after = fx.store.snapshot().await;
        assert_eq!(before.roles, after.roles);
        assert_eq!(before.clients, after.clients);
        assert_eq!(before.role_mappings, after.role_mappings);
    }

    struct FailingRebuilder;

    #[async_trait]
    impl RealmRebuilder for FailingRebuilder {
        async fn rebuild(
            &self,
            tx: &mut dyn StoreTransaction,
            rep: &RealmRepresentation,
            realm_id: Option<Uuid>,
        ) -> ImportResult<Realm> {
            StoreRealmRebuilder::new().rebuild(tx, rep, realm_id).await?;
            Err(ImportError::Rebuild("disk on fire".to_string()))
        }

        async fn setup_authorization(
            &self,
            _tx: &mut dyn StoreTransaction,
            _realm: &Realm,
            _rep: &RealmRepresentation,
            _ctx: AuthorizationContext,
        ) -> ImportResult<AuthorizationReport> {
            Ok(AuthorizationReport::default())
        }
    }

    #[tokio::test]
    async fn failed_rebuild_rolls_everything_back() {
        let fx = Fixture::new();
        fx.importer(fx.config())
            .import_representation(&sample_realm())
            .await
            .unwrap();
        let bob = fx.add_user("acme", "bob", &["viewer"], &["/staff"]).await;
        let before = fx.store.snapshot().await;

        let recorder = Arc::new(RecordingEventListener::new());
        let importer = fx
            .importer(fx.config())
            .with_rebuilder(Arc::new(FailingRebuilder))
            .with_listener(recorder.clone());
        let err = importer
            .import_representation(&sample_realm())
            .await
            .unwrap_err();

        assert_eq!(err.step(), Some(ImportStep::Rebuild));
        assert!(matches!(err.root_cause(), ImportError::Rebuild(_)));
        assert!(matches!(recorder.events().last(), Some(RealmEvent::RealmRemoved { .. })));

        let after = fx.store.snapshot().await;
        assert_eq!(before.realms, after.realms);
        assert_eq!(before.roles, after.roles);
        assert_eq!(before.groups, after.groups);
        assert_eq!(before.users, after.users);
        assert_eq!(role_names(&after, &bob), set(&["viewer"]));
    }

    #[tokio::test]
    async fn import_all_continues_past_failures() {
        let fx = Fixture::new();
        fx.write_realm(&RealmRepresentation::new("acme"));
        fx.write_realm(&RealmRepresentation::new("master"));
        fx.write("broken-realm.json", "{ not json");

        let summary = fx.importer(fx.config()).import_all().await;

        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.results[0].0, "master");
        assert_eq!(summary.imported().count(), 2);
        let failed: Vec<_> = summary.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "broken");
        assert_eq!(failed[0].1.step(), Some(ImportStep::Read));
        assert!(!summary.is_success());
    }

    #[tokio::test]
    async fn realm_name_restricts_import() {
        let fx = Fixture::new();
        fx.write_realm(&RealmRepresentation::new("acme"));
        fx.write_realm(&RealmRepresentation::new("beta"));
        let importer = fx.importer(fx.config().with_realm_name("beta"));

        assert_eq!(importer.realms_to_import(), vec!["beta".to_string()]);
        let summary = importer.import_all().await;

        assert!(summary.is_success());
        assert_eq!(summary.imported().collect::<Vec<_>>(), vec!["beta"]);
        assert!(!importer.contains_admin_realm());
    }

    #[tokio::test]
    async fn imports_user_shards_when_enabled() {
        let fx = Fixture::new();
        fx.write_realm(&sample_realm());
        fx.write(
            "acme-users-0.json",
            r#"{"realm": "acme", "users": [{"username": "dave", "realmRoles": ["viewer"]}, {"username": "alice"}]}"#,
        );
        let importer = fx.importer(fx.config().with_users(true));

        let outcome = importer.import_realm("acme").await.unwrap();
        let report = outcome.report().unwrap();

        assert_eq!(
            report.users,
            Some(UserImportReport {
                shards: 1,
                created: 1,
                skipped: 1
            })
        );
        assert!(report.states.contains(&ImportState::UsersImported));
        let state = fx.store.snapshot().await;
        let dave = state.users.values().find(|u| u.username == "dave").unwrap();
        assert_eq!(role_names(&state, dave), set(&["viewer"]));
    }

    #[tokio::test]
    async fn skipped_realm_still_imports_new_users() {
        let fx = Fixture::new();
        fx.write_realm(&sample_realm());
        fx.importer(fx.config()).import_realm("acme").await.unwrap();
        let before = fx.store.snapshot().await;
        fx.write(
            "acme-users-0.json",
            r#"{"realm": "acme", "users": [{"username": "zed", "groups": ["/staff"]}, {"username": "alice"}]}"#,
        );

        let importer = fx.importer(
            fx.config()
                .with_strategy(Strategy::IgnoreExisting)
                .with_users(true),
        );
        let outcome = importer.import_realm("acme").await.unwrap();

        assert_eq!(
            outcome,
            ImportOutcome::SkippedExisting {
                users: Some(UserImportReport {
                    shards: 1,
                    created: 1,
                    skipped: 1
                })
            }
        );
        let after = fx.store.snapshot().await;
        assert_eq!(before.roles, after.roles);
        assert_eq!(before.groups, after.groups);
        let zed = after.users.values().find(|u| u.username == "zed").unwrap();
        assert_eq!(group_names(&after, zed), set(&["staff"]));
    }

    #[tokio::test]
    async fn skipped_realm_is_reported_in_summary() {
        let fx = Fixture::new();
        fx.write_realm(&RealmRepresentation::new("acme"));
        fx.importer(fx.config()).import_all().await;

        let summary = fx
            .importer(fx.config().with_strategy(Strategy::IgnoreExisting))
            .import_all()
            .await;

        assert_eq!(summary.skipped().collect::<Vec<_>>(), vec!["acme"]);
        assert!(summary.is_success());
    }

    #[test]
    fn missing_directory_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let config = ImportConfig::new(dir.path().join("absent"));
        let err = RealmImporter::new(config, Arc::new(MemoryStore::new())).unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }
}
