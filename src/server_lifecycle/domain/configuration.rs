//! Server configuration document as consumed by the lifecycle core.
//!
//! The core only looks at which optional sections are populated and at the
//! handful of common fields every subsystem receives. Everything inside a
//! section is passed through to the owning subsystem untouched.

use super::{AccessServiceKind, LifecycleDomainError, ViewServiceKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

const DEFAULT_LOCAL_SERVER_USER_ID: &str = "server";
const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

fn default_local_server_user_id() -> String {
    DEFAULT_LOCAL_SERVER_USER_ID.to_owned()
}

const fn default_max_page_size() -> u32 {
    DEFAULT_MAX_PAGE_SIZE
}

/// Administrative switch on a configured service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// The service is started with the server.
    #[default]
    Enabled,
    /// The service stays configured but is not started.
    Disabled,
}

/// Maturity of a service implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentStatus {
    /// Supported for production use.
    #[default]
    Stable,
    /// Usable but subject to change.
    TechnicalPreview,
    /// Incomplete.
    InDevelopment,
    /// Retained for compatibility and no longer started.
    Deprecated,
}

/// Configuration of one access or view service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig<K> {
    kind: K,
    #[serde(default)]
    status: ServiceStatus,
    #[serde(default)]
    development_status: DevelopmentStatus,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    options: Map<String, Value>,
}

/// Configuration of one access service.
pub type AccessServiceConfig = ServiceConfig<AccessServiceKind>;

/// Configuration of one view service.
pub type ViewServiceConfig = ServiceConfig<ViewServiceKind>;

impl<K: Copy> ServiceConfig<K> {
    /// Creates an enabled, stable service entry.
    #[must_use]
    pub fn new(kind: K) -> Self {
        Self {
            kind,
            status: ServiceStatus::Enabled,
            development_status: DevelopmentStatus::Stable,
            options: Map::new(),
        }
    }

    /// Sets the administrative status.
    #[must_use]
    pub const fn with_status(mut self, status: ServiceStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the development status.
    #[must_use]
    pub const fn with_development_status(mut self, development_status: DevelopmentStatus) -> Self {
        self.development_status = development_status;
        self
    }

    /// Adds a service-specific option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Returns the service tag.
    #[must_use]
    pub const fn kind(&self) -> K {
        self.kind
    }

    /// Returns the administrative status.
    #[must_use]
    pub const fn status(&self) -> ServiceStatus {
        self.status
    }

    /// Returns the development status.
    #[must_use]
    pub const fn development_status(&self) -> DevelopmentStatus {
        self.development_status
    }

    /// Returns service-specific options.
    #[must_use]
    pub const fn options(&self) -> &Map<String, Value> {
        &self.options
    }
}

/// Storage mode of a server's local repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalRepositoryMode {
    /// Volatile in-memory repository.
    InMemory,
    /// Persistent graph repository.
    Graph,
    /// Read-only repository loaded from archives.
    ReadOnly,
    /// Proxy in front of a third-party metadata store.
    RepositoryProxy,
}

/// Local repository section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRepositoryConfig {
    mode: LocalRepositoryMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata_collection_name: Option<String>,
}

impl LocalRepositoryConfig {
    /// Creates a local repository section.
    #[must_use]
    pub const fn new(mode: LocalRepositoryMode) -> Self {
        Self {
            mode,
            metadata_collection_name: None,
        }
    }

    /// Names the metadata collection hosted by the repository.
    #[must_use]
    pub fn with_metadata_collection_name(mut self, name: impl Into<String>) -> Self {
        self.metadata_collection_name = Some(name.into());
        self
    }

    /// Returns the repository mode.
    #[must_use]
    pub const fn mode(&self) -> LocalRepositoryMode {
        self.mode
    }

    /// Returns the metadata collection name.
    #[must_use]
    pub fn metadata_collection_name(&self) -> Option<&str> {
        self.metadata_collection_name.as_deref()
    }
}

/// Repository services section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepositoryServicesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    local_repository: Option<LocalRepositoryConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    cohorts: Vec<String>,
}

impl RepositoryServicesConfig {
    /// Creates an empty repository services section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the local repository.
    #[must_use]
    pub fn with_local_repository(mut self, local_repository: LocalRepositoryConfig) -> Self {
        self.local_repository = Some(local_repository);
        self
    }

    /// Adds a cohort membership.
    #[must_use]
    pub fn with_cohort(mut self, cohort: impl Into<String>) -> Self {
        self.cohorts.push(cohort.into());
        self
    }

    /// Returns the local repository section.
    #[must_use]
    pub const fn local_repository(&self) -> Option<&LocalRepositoryConfig> {
        self.local_repository.as_ref()
    }

    /// Returns cohort memberships.
    #[must_use]
    pub fn cohorts(&self) -> &[String] {
        &self.cohorts
    }
}

/// Section for servers that run conformance workbenches.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConformanceSuiteConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    workbenches: Vec<String>,
}

impl ConformanceSuiteConfig {
    /// Creates a conformance section running the given workbenches.
    #[must_use]
    pub fn new(workbenches: impl IntoIterator<Item = String>) -> Self {
        Self {
            workbenches: workbenches.into_iter().collect(),
        }
    }

    /// Returns the configured workbenches.
    #[must_use]
    pub fn workbenches(&self) -> &[String] {
        &self.workbenches
    }
}

/// Section for one governance server subtype.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GovernanceServerConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    services: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    options: Map<String, Value>,
}

impl GovernanceServerConfig {
    /// Creates a governance section hosting the named services.
    #[must_use]
    pub fn new(services: impl IntoIterator<Item = String>) -> Self {
        Self {
            services: services.into_iter().collect(),
            options: Map::new(),
        }
    }

    /// Adds a subtype-specific option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Returns the hosted services.
    #[must_use]
    pub fn services(&self) -> &[String] {
        &self.services
    }
}

/// Governance server subtypes, in the order their sections are inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceSection {
    /// `integration_daemon` section.
    IntegrationDaemon,
    /// `engine_host` section.
    EngineHost,
    /// `data_engine_proxy` section.
    DataEngineProxy,
    /// `lineage_warehouse` section.
    LineageWarehouse,
}

impl GovernanceSection {
    /// Every governance section.
    pub const ALL: [Self; 4] = [
        Self::IntegrationDaemon,
        Self::EngineHost,
        Self::DataEngineProxy,
        Self::LineageWarehouse,
    ];

    /// Returns the section name used in configuration documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IntegrationDaemon => "integration_daemon",
            Self::EngineHost => "engine_host",
            Self::DataEngineProxy => "data_engine_proxy",
            Self::LineageWarehouse => "lineage_warehouse",
        }
    }
}

/// Validated configuration document for one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfiguration {
    #[serde(default = "default_local_server_user_id")]
    local_server_user_id: String,
    #[serde(default = "default_max_page_size")]
    max_page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repository_services: Option<RepositoryServicesConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    access_services: Vec<AccessServiceConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    view_services: Vec<ViewServiceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conformance_suite: Option<ConformanceSuiteConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    integration_daemon: Option<GovernanceServerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    engine_host: Option<GovernanceServerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_engine_proxy: Option<GovernanceServerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lineage_warehouse: Option<GovernanceServerConfig>,
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        Self {
            local_server_user_id: default_local_server_user_id(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            repository_services: None,
            access_services: Vec::new(),
            view_services: Vec::new(),
            conformance_suite: None,
            integration_daemon: None,
            engine_host: None,
            data_engine_proxy: None,
            lineage_warehouse: None,
        }
    }
}

impl ServerConfiguration {
    /// Creates a document with no optional sections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the identity the server uses for its own requests.
    #[must_use]
    pub fn with_local_server_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.local_server_user_id = user_id.into();
        self
    }

    /// Sets the maximum page size subsystems may return.
    #[must_use]
    pub const fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// Sets the repository services section.
    #[must_use]
    pub fn with_repository_services(mut self, section: RepositoryServicesConfig) -> Self {
        self.repository_services = Some(section);
        self
    }

    /// Adds an access service entry.
    #[must_use]
    pub fn with_access_service(mut self, service: AccessServiceConfig) -> Self {
        self.access_services.push(service);
        self
    }

    /// Adds a view service entry.
    #[must_use]
    pub fn with_view_service(mut self, service: ViewServiceConfig) -> Self {
        self.view_services.push(service);
        self
    }

    /// Sets the conformance suite section.
    #[must_use]
    pub fn with_conformance_suite(mut self, section: ConformanceSuiteConfig) -> Self {
        self.conformance_suite = Some(section);
        self
    }

    /// Sets one governance server section.
    #[must_use]
    pub fn with_governance_section(
        mut self,
        section: GovernanceSection,
        config: GovernanceServerConfig,
    ) -> Self {
        *self.governance_slot(section) = Some(config);
        self
    }

    /// Returns the local server user identifier.
    #[must_use]
    pub fn local_server_user_id(&self) -> &str {
        &self.local_server_user_id
    }

    /// Returns the maximum page size.
    #[must_use]
    pub const fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    /// Returns the repository services section.
    #[must_use]
    pub const fn repository_services(&self) -> Option<&RepositoryServicesConfig> {
        self.repository_services.as_ref()
    }

    /// Returns configured access services in document order.
    #[must_use]
    pub fn access_services(&self) -> &[AccessServiceConfig] {
        &self.access_services
    }

    /// Returns configured view services in document order.
    #[must_use]
    pub fn view_services(&self) -> &[ViewServiceConfig] {
        &self.view_services
    }

    /// Returns the conformance suite section.
    #[must_use]
    pub const fn conformance_suite(&self) -> Option<&ConformanceSuiteConfig> {
        self.conformance_suite.as_ref()
    }

    /// Returns one governance server section.
    #[must_use]
    pub const fn governance_section(
        &self,
        section: GovernanceSection,
    ) -> Option<&GovernanceServerConfig> {
        match section {
            GovernanceSection::IntegrationDaemon => self.integration_daemon.as_ref(),
            GovernanceSection::EngineHost => self.engine_host.as_ref(),
            GovernanceSection::DataEngineProxy => self.data_engine_proxy.as_ref(),
            GovernanceSection::LineageWarehouse => self.lineage_warehouse.as_ref(),
        }
    }

    /// Returns the governance sections that are populated, in inspection
    /// order.
    #[must_use]
    pub fn populated_governance_sections(&self) -> Vec<GovernanceSection> {
        GovernanceSection::ALL
            .into_iter()
            .filter(|section| self.governance_section(*section).is_some())
            .collect()
    }

    /// Checks the common fields every subsystem relies on.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::EmptyUserId`] when the local server
    /// user is blank, or [`LifecycleDomainError::InvalidMaxPageSize`] when
    /// the page size is zero.
    pub fn validate(&self) -> Result<(), LifecycleDomainError> {
        if self.local_server_user_id.trim().is_empty() {
            return Err(LifecycleDomainError::EmptyUserId);
        }
        if self.max_page_size == 0 {
            return Err(LifecycleDomainError::InvalidMaxPageSize);
        }
        Ok(())
    }

    /// Computes the SHA-256 fingerprint of the document's JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::UnserializableConfiguration`] when the
    /// document cannot be encoded.
    pub fn fingerprint(&self) -> Result<ConfigurationFingerprint, LifecycleDomainError> {
        let encoded = serde_json::to_vec(self)
            .map_err(|err| LifecycleDomainError::UnserializableConfiguration(err.to_string()))?;
        let digest = Sha256::digest(&encoded);
        let hex = digest.iter().map(|byte| format!("{byte:02x}")).collect();
        Ok(ConfigurationFingerprint(hex))
    }

    fn governance_slot(
        &mut self,
        section: GovernanceSection,
    ) -> &mut Option<GovernanceServerConfig> {
        match section {
            GovernanceSection::IntegrationDaemon => &mut self.integration_daemon,
            GovernanceSection::EngineHost => &mut self.engine_host,
            GovernanceSection::DataEngineProxy => &mut self.data_engine_proxy,
            GovernanceSection::LineageWarehouse => &mut self.lineage_warehouse,
        }
    }
}

/// Hex-encoded SHA-256 digest of a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationFingerprint(String);

impl ConfigurationFingerprint {
    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigurationFingerprint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
