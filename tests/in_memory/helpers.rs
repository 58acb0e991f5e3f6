//! Shared helpers for in-memory lifecycle integration tests.

use std::sync::Arc;

use caisson::server_lifecycle::{
    adapters::{
        authorization::AllowAllAuthorization,
        memory::{
            InMemoryAuditLog, InMemoryConfigurationStore, SubsystemJournal, in_memory_catalog,
        },
    },
    domain::{
        AccessServiceConfig, AccessServiceKind, LocalRepositoryConfig, LocalRepositoryMode,
        RepositoryServicesConfig, ServerConfiguration, ServerName, ViewServiceConfig,
        ViewServiceKind,
    },
    ports::ConfigurationStore,
    services::{InstanceRegistry, LifecycleOrchestrator, SubsystemCatalog},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Orchestrator wired to in-memory adapters.
pub type TestOrchestrator =
    LifecycleOrchestrator<InMemoryConfigurationStore, AllowAllAuthorization, DefaultClock>;

/// Orchestrator plus handles onto the adapters it was built from.
pub struct Platform {
    /// Orchestrator under test.
    pub orchestrator: Arc<TestOrchestrator>,
    /// Store shared with the orchestrator.
    pub store: InMemoryConfigurationStore,
    /// Journal of subsystem admin calls.
    pub journal: SubsystemJournal,
    /// Audit events recorded by the orchestrator.
    pub audit: InMemoryAuditLog,
}

/// Builds a platform whose catalog is derived from the shared journal.
pub fn platform_with(catalog: impl FnOnce(&SubsystemJournal) -> SubsystemCatalog) -> Platform {
    let store = InMemoryConfigurationStore::new();
    let journal = SubsystemJournal::new();
    let audit = InMemoryAuditLog::new();
    let orchestrator = LifecycleOrchestrator::new(
        Arc::new(store.clone()),
        Arc::new(AllowAllAuthorization),
        catalog(&journal),
        Arc::new(InstanceRegistry::new()),
        Arc::new(audit.clone()),
        Arc::new(DefaultClock),
    );
    Platform {
        orchestrator: Arc::new(orchestrator),
        store,
        journal,
        audit,
    }
}

/// Provides a platform with well-behaved subsystems.
#[fixture]
pub fn platform() -> Platform {
    platform_with(in_memory_catalog)
}

/// Parses a server name.
///
/// # Panics
///
/// Panics when `name` is not a valid server name.
#[must_use]
pub fn server(name: &str) -> ServerName {
    ServerName::new(name).expect("valid server name")
}

/// Metadata server with an in-memory repository and two access services.
#[must_use]
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

/// View server hosting two view services.
#[must_use]
pub fn view_server_config() -> ServerConfiguration {
    ServerConfiguration::new()
        .with_view_service(ViewServiceConfig::new(ViewServiceKind::GlossaryBrowser))
        .with_view_service(ViewServiceConfig::new(ViewServiceKind::TypeExplorer))
}

/// Saves `config` as the stored document for `name`.
///
/// # Panics
///
/// Panics when the store rejects the document.
pub async fn store_config(platform: &Platform, name: &str, config: &ServerConfiguration) {
    platform
        .store
        .save(&server(name), config)
        .await
        .expect("document should be stored");
}
