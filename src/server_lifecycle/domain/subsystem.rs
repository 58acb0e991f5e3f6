//! Closed set of pluggable subsystem tags.

use super::ParseSubsystemKindError;
use serde::{Deserialize, Serialize};
use std::fmt;

const ACCESS_SERVICE_PREFIX: &str = "access-service:";
const VIEW_SERVICE_PREFIX: &str = "view-service:";

/// Access services a metadata-bearing server can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessServiceKind {
    /// Catalog search over assets.
    AssetCatalog,
    /// Consumer-facing asset queries and feedback.
    AssetConsumer,
    /// Bulk asset cataloguing for integration.
    AssetManager,
    /// Asset ownership and classification.
    AssetOwner,
    /// Personal and team profiles.
    CommunityProfile,
    /// Data platform cataloguing.
    DataManager,
    /// Architecture and solution design.
    DigitalArchitecture,
    /// Metadata for governance engines.
    GovernanceEngine,
}

impl AccessServiceKind {
    /// Every access service kind.
    pub const ALL: [Self; 8] = [
        Self::AssetCatalog,
        Self::AssetConsumer,
        Self::AssetManager,
        Self::AssetOwner,
        Self::CommunityProfile,
        Self::DataManager,
        Self::DigitalArchitecture,
        Self::GovernanceEngine,
    ];

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AssetCatalog => "asset-catalog",
            Self::AssetConsumer => "asset-consumer",
            Self::AssetManager => "asset-manager",
            Self::AssetOwner => "asset-owner",
            Self::CommunityProfile => "community-profile",
            Self::DataManager => "data-manager",
            Self::DigitalArchitecture => "digital-architecture",
            Self::GovernanceEngine => "governance-engine",
        }
    }
}

/// View services a view server can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewServiceKind {
    /// Glossary browsing.
    GlossaryBrowser,
    /// Lineage graphs.
    LineageViewer,
    /// Raw repository exploration.
    RepositoryExplorer,
    /// Server configuration authoring.
    ServerAuthor,
    /// Type system exploration.
    TypeExplorer,
}

impl ViewServiceKind {
    /// Every view service kind.
    pub const ALL: [Self; 5] = [
        Self::GlossaryBrowser,
        Self::LineageViewer,
        Self::RepositoryExplorer,
        Self::ServerAuthor,
        Self::TypeExplorer,
    ];

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GlossaryBrowser => "glossary-browser",
            Self::LineageViewer => "lineage-viewer",
            Self::RepositoryExplorer => "repository-explorer",
            Self::ServerAuthor => "server-author",
            Self::TypeExplorer => "type-explorer",
        }
    }
}

/// Tag identifying one pluggable subsystem in a startup recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SubsystemKind {
    /// Local repository, cohort membership and the enterprise connector.
    RepositoryServices,
    /// Conformance test workbenches.
    ConformanceSuite,
    /// One access service.
    AccessService(AccessServiceKind),
    /// One view service.
    ViewService(ViewServiceKind),
    /// Starts event delivery on the shared enterprise topic.
    EnterpriseEventBus,
    /// Integration daemon services.
    IntegrationDaemon,
    /// Engine host services.
    EngineHost,
    /// Data engine proxy services.
    DataEngineProxy,
    /// Lineage warehouse services.
    LineageWarehouse,
}

impl SubsystemKind {
    /// Returns every subsystem tag.
    #[must_use]
    pub fn all() -> Vec<Self> {
        let mut kinds = vec![
            Self::RepositoryServices,
            Self::ConformanceSuite,
            Self::EnterpriseEventBus,
            Self::IntegrationDaemon,
            Self::EngineHost,
            Self::DataEngineProxy,
            Self::LineageWarehouse,
        ];
        kinds.extend(AccessServiceKind::ALL.map(Self::AccessService));
        kinds.extend(ViewServiceKind::ALL.map(Self::ViewService));
        kinds
    }

    /// Returns whether this subsystem is a governance server implementation.
    #[must_use]
    pub const fn is_governance_server(self) -> bool {
        matches!(
            self,
            Self::IntegrationDaemon
                | Self::EngineHost
                | Self::DataEngineProxy
                | Self::LineageWarehouse
        )
    }

    fn fixed_name(self) -> Option<&'static str> {
        match self {
            Self::RepositoryServices => Some("repository-services"),
            Self::ConformanceSuite => Some("conformance-suite"),
            Self::EnterpriseEventBus => Some("enterprise-event-bus"),
            Self::IntegrationDaemon => Some("integration-daemon"),
            Self::EngineHost => Some("engine-host"),
            Self::DataEngineProxy => Some("data-engine-proxy"),
            Self::LineageWarehouse => Some("lineage-warehouse"),
            Self::AccessService(_) | Self::ViewService(_) => None,
        }
    }
}

impl fmt::Display for SubsystemKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessService(kind) => {
                write!(formatter, "{ACCESS_SERVICE_PREFIX}{}", kind.as_str())
            }
            Self::ViewService(kind) => write!(formatter, "{VIEW_SERVICE_PREFIX}{}", kind.as_str()),
            other => formatter.write_str(other.fixed_name().unwrap_or_default()),
        }
    }
}

impl TryFrom<&str> for SubsystemKind {
    type Error = ParseSubsystemKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        let unknown = || ParseSubsystemKindError(value.to_owned());

        if let Some(service) = normalized.strip_prefix(ACCESS_SERVICE_PREFIX) {
            return AccessServiceKind::ALL
                .into_iter()
                .find(|kind| kind.as_str() == service)
                .map(Self::AccessService)
                .ok_or_else(unknown);
        }

        if let Some(service) = normalized.strip_prefix(VIEW_SERVICE_PREFIX) {
            return ViewServiceKind::ALL
                .into_iter()
                .find(|kind| kind.as_str() == service)
                .map(Self::ViewService)
                .ok_or_else(unknown);
        }

        Self::all()
            .into_iter()
            .find(|kind| kind.fixed_name() == Some(normalized.as_str()))
            .ok_or_else(unknown)
    }
}

impl TryFrom<String> for SubsystemKind {
    type Error = ParseSubsystemKindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<SubsystemKind> for String {
    fn from(value: SubsystemKind) -> Self {
        value.to_string()
    }
}
