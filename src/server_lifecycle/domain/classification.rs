//! Server type classification.
//!
//! Classification is always derived from the configuration document and
//! never stored, so an edited document reclassifies on its next activation.

use super::{GovernanceSection, LifecycleDomainError, LocalRepositoryMode, ServerConfiguration, ServerName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server type that selects the startup recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Hosts a local repository and joins cohorts.
    MetadataServer,
    /// Serves access services over the enterprise view without a local
    /// repository.
    MetadataAccessPoint,
    /// Wraps a third-party metadata store.
    RepositoryProxy,
    /// Runs conformance workbenches against other servers.
    ConformanceServer,
    /// Hosts view services only.
    ViewServer,
    /// Governance server running integration services.
    IntegrationDaemon,
    /// Governance server running governance engines.
    EngineHost,
    /// Governance server proxying data engines.
    DataEngineProxy,
    /// Governance server maintaining lineage.
    LineageWarehouse,
}

impl Classification {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MetadataServer => "metadata_server",
            Self::MetadataAccessPoint => "metadata_access_point",
            Self::RepositoryProxy => "repository_proxy",
            Self::ConformanceServer => "conformance_server",
            Self::ViewServer => "view_server",
            Self::IntegrationDaemon => "integration_daemon",
            Self::EngineHost => "engine_host",
            Self::DataEngineProxy => "data_engine_proxy",
            Self::LineageWarehouse => "lineage_warehouse",
        }
    }

    /// Returns whether servers of this type join the enterprise event bus.
    #[must_use]
    pub const fn is_metadata_bearing(self) -> bool {
        matches!(
            self,
            Self::MetadataServer
                | Self::MetadataAccessPoint
                | Self::RepositoryProxy
                | Self::ConformanceServer
        )
    }

    const fn for_governance_section(section: GovernanceSection) -> Self {
        match section {
            GovernanceSection::IntegrationDaemon => Self::IntegrationDaemon,
            GovernanceSection::EngineHost => Self::EngineHost,
            GovernanceSection::DataEngineProxy => Self::DataEngineProxy,
            GovernanceSection::LineageWarehouse => Self::LineageWarehouse,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Classifies a configuration document.
///
/// Sections fall into three families: metadata (repository services, access
/// services, conformance suite), view services, and the governance
/// sections. Exactly one family, and at most one governance section, may be
/// populated. Within the metadata family the rules are checked in priority
/// order: conformance suite, repository proxy, local repository, enterprise
/// access only.
///
/// # Errors
///
/// Returns [`LifecycleDomainError::UnclassifiableConfiguration`] when no
/// section is populated, [`LifecycleDomainError::ConflictingSections`] when
/// sections of different server types are mixed, and
/// [`LifecycleDomainError::IncompleteConfiguration`] when the metadata
/// sections cannot stand on their own.
pub fn classify(
    server: &ServerName,
    config: &ServerConfiguration,
) -> Result<Classification, LifecycleDomainError> {
    let metadata_sections = populated_metadata_sections(config);
    let has_view_services = !config.view_services().is_empty();
    let governance_sections = config.populated_governance_sections();

    let mut populated: Vec<&'static str> = metadata_sections.clone();
    if has_view_services {
        populated.push("view_services");
    }
    populated.extend(governance_sections.iter().map(|section| section.as_str()));

    let family_count = usize::from(!metadata_sections.is_empty())
        + usize::from(has_view_services)
        + governance_sections.len();

    match family_count {
        0 => Err(LifecycleDomainError::UnclassifiableConfiguration {
            server: server.clone(),
        }),
        1 => {
            if !metadata_sections.is_empty() {
                classify_metadata_server(server, config)
            } else if has_view_services {
                Ok(Classification::ViewServer)
            } else {
                governance_sections
                    .first()
                    .map(|section| Classification::for_governance_section(*section))
                    .ok_or_else(|| LifecycleDomainError::UnclassifiableConfiguration {
                        server: server.clone(),
                    })
            }
        }
        _ => Err(LifecycleDomainError::ConflictingSections {
            server: server.clone(),
            sections: populated.join(", "),
        }),
    }
}

fn populated_metadata_sections(config: &ServerConfiguration) -> Vec<&'static str> {
    let mut sections = Vec::new();
    if config.repository_services().is_some() {
        sections.push("repository_services");
    }
    if !config.access_services().is_empty() {
        sections.push("access_services");
    }
    if config.conformance_suite().is_some() {
        sections.push("conformance_suite");
    }
    sections
}

fn classify_metadata_server(
    server: &ServerName,
    config: &ServerConfiguration,
) -> Result<Classification, LifecycleDomainError> {
    let incomplete = |reason: &str| LifecycleDomainError::IncompleteConfiguration {
        server: server.clone(),
        reason: reason.to_owned(),
    };

    let Some(repository_services) = config.repository_services() else {
        return Err(if config.conformance_suite().is_some() {
            incomplete("the conformance suite requires repository services")
        } else {
            incomplete("access services require repository services")
        });
    };

    if config.conformance_suite().is_some() {
        return Ok(Classification::ConformanceServer);
    }

    match repository_services.local_repository() {
        Some(local) if local.mode() == LocalRepositoryMode::RepositoryProxy => {
            if config.access_services().is_empty() {
                Ok(Classification::RepositoryProxy)
            } else {
                Err(LifecycleDomainError::ConflictingSections {
                    server: server.clone(),
                    sections: "repository_services.local_repository (repository_proxy), access_services"
                        .to_owned(),
                })
            }
        }
        Some(_) => Ok(Classification::MetadataServer),
        None if !config.access_services().is_empty() || !repository_services.cohorts().is_empty() => {
            Ok(Classification::MetadataAccessPoint)
        }
        None => Err(incomplete(
            "repository services declare no local repository, cohort or access service",
        )),
    }
}
