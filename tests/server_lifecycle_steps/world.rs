//! Shared world state for server lifecycle BDD scenarios.

use std::sync::Arc;

use caisson::server_lifecycle::{
    adapters::{
        authorization::RoleTableAuthorization,
        memory::{
            InMemoryAuditLog, InMemoryConfigurationStore, SubsystemJournal, in_memory_catalog,
        },
    },
    domain::{
        AccessServiceConfig, AccessServiceKind, LocalRepositoryConfig, LocalRepositoryMode,
        RepositoryServicesConfig, ServerConfiguration, ServerName, UserId, ViewServiceConfig,
        ViewServiceKind,
    },
    ports::ServerRole,
    services::{
        ActivationReport, BulkActivationError, BulkActivationReport, DeactivationReport,
        InstanceRegistry, LifecycleOrchestrator, LifecycleResult, SubsystemCatalog,
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Orchestrator type used by the BDD world.
pub type WorldOrchestrator =
    LifecycleOrchestrator<InMemoryConfigurationStore, RoleTableAuthorization, DefaultClock>;

/// Scenario world for server lifecycle behaviour tests.
pub struct LifecycleWorld {
    pub orchestrator: WorldOrchestrator,
    pub store: InMemoryConfigurationStore,
    pub journal: SubsystemJournal,
    pub last_activation: Option<LifecycleResult<ActivationReport>>,
    pub last_deactivation: Option<LifecycleResult<DeactivationReport>>,
    pub last_bulk: Option<Result<BulkActivationReport, BulkActivationError>>,
}

impl LifecycleWorld {
    /// Creates a world whose subsystems all behave.
    #[must_use]
    pub fn new() -> Self {
        let store = InMemoryConfigurationStore::new();
        let journal = SubsystemJournal::new();
        let orchestrator = build_orchestrator(&store, in_memory_catalog(&journal));
        Self {
            orchestrator,
            store,
            journal,
            last_activation: None,
            last_deactivation: None,
            last_bulk: None,
        }
    }

    /// Replaces the subsystem catalog. Only valid before any activation.
    pub fn install_catalog(&mut self, catalog: SubsystemCatalog) {
        self.orchestrator = build_orchestrator(&self.store, catalog);
    }
}

impl Default for LifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn build_orchestrator(
    store: &InMemoryConfigurationStore,
    catalog: SubsystemCatalog,
) -> WorldOrchestrator {
    LifecycleOrchestrator::new(
        Arc::new(store.clone()),
        Arc::new(authorization()),
        catalog,
        Arc::new(InstanceRegistry::new()),
        Arc::new(InMemoryAuditLog::new()),
        Arc::new(DefaultClock),
    )
}

/// `garygeeke` administers every server; `peterprofile` may only look.
fn authorization() -> RoleTableAuthorization {
    RoleTableAuthorization::new()
        .grant(user("garygeeke"), ServerRole::Administrator)
        .grant(user("peterprofile"), ServerRole::Investigator)
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Parses a user identifier.
pub fn user(name: &str) -> UserId {
    UserId::new(name).expect("valid user id")
}

/// Parses a server name.
pub fn server(name: &str) -> Result<ServerName, eyre::Report> {
    ServerName::new(name).map_err(|err| eyre::eyre!("invalid server name {name}: {err}"))
}

/// Metadata server with an in-memory repository and two access services.
pub fn metadata_server_config() -> ServerConfiguration {
    ServerConfiguration::new()
        .with_repository_services(
            RepositoryServicesConfig::new()
                .with_local_repository(LocalRepositoryConfig::new(LocalRepositoryMode::InMemory))
                .with_cohort("cocoCohort"),
        )
        .with_access_service(AccessServiceConfig::new(AccessServiceKind::AssetCatalog))
        .with_access_service(AccessServiceConfig::new(AccessServiceKind::AssetOwner))
}

/// View server hosting one view service.
pub fn view_server_config() -> ServerConfiguration {
    ServerConfiguration::new()
        .with_view_service(ViewServiceConfig::new(ViewServiceKind::GlossaryBrowser))
}
