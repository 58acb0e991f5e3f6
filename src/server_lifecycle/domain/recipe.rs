//! Startup recipes: the ordered subsystem steps for each classification.
//!
//! Recipes are plain data. The orchestrator walks every recipe the same
//! way, so the ordering rules live here and can be tested without starting
//! anything.

use super::{
    Classification, DevelopmentStatus, GovernanceSection, LifecycleDomainError,
    ServerConfiguration, ServiceConfig, ServiceStatus, SubsystemKind,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::fmt;

/// Policy condition under which a configured step is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCondition {
    /// The service is administratively disabled.
    Disabled,
    /// The service implementation is deprecated.
    Deprecated,
}

impl SkipCondition {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Deprecated => "deprecated",
        }
    }

    const fn holds(self, status: ServiceStatus, development_status: DevelopmentStatus) -> bool {
        match self {
            Self::Disabled => matches!(status, ServiceStatus::Disabled),
            Self::Deprecated => matches!(development_status, DevelopmentStatus::Deprecated),
        }
    }
}

impl fmt::Display for SkipCondition {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Part a step plays around the shared enterprise event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
    /// Does not touch the event source.
    Standalone,
    /// Creates the event source and exports its handle.
    ProvidesEventSource,
    /// Registers listeners on the event source during initialization.
    RegistersListener,
    /// Tells the event source to start delivering events.
    StartsDelivery,
}

impl StepRole {
    /// Returns whether the step consumes the event source handle.
    #[must_use]
    pub const fn requires_event_source(self) -> bool {
        matches!(self, Self::RegistersListener | Self::StartsDelivery)
    }
}

/// One subsystem step of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeStep {
    kind: SubsystemKind,
    role: StepRole,
    section: Value,
    skip_when: Vec<SkipCondition>,
    status: ServiceStatus,
    development_status: DevelopmentStatus,
}

impl RecipeStep {
    /// Creates an unconditional step.
    #[must_use]
    pub fn new(kind: SubsystemKind, role: StepRole, section: Value) -> Self {
        Self {
            kind,
            role,
            section,
            skip_when: Vec::new(),
            status: ServiceStatus::Enabled,
            development_status: DevelopmentStatus::Stable,
        }
    }

    /// Adds policy skip conditions evaluated against the given service
    /// statuses.
    #[must_use]
    pub fn skipped_when(
        mut self,
        conditions: impl IntoIterator<Item = SkipCondition>,
        status: ServiceStatus,
        development_status: DevelopmentStatus,
    ) -> Self {
        self.skip_when = conditions.into_iter().collect();
        self.status = status;
        self.development_status = development_status;
        self
    }

    /// Returns the subsystem tag.
    #[must_use]
    pub const fn kind(&self) -> SubsystemKind {
        self.kind
    }

    /// Returns the step's event source role.
    #[must_use]
    pub const fn role(&self) -> StepRole {
        self.role
    }

    /// Returns the configuration section handed to the subsystem.
    #[must_use]
    pub const fn section(&self) -> &Value {
        &self.section
    }

    /// Returns the declared skip conditions.
    #[must_use]
    pub fn skip_conditions(&self) -> &[SkipCondition] {
        &self.skip_when
    }

    /// Returns the first skip condition that holds, if any.
    #[must_use]
    pub fn skip_reason(&self) -> Option<SkipCondition> {
        self.skip_when
            .iter()
            .copied()
            .find(|condition| condition.holds(self.status, self.development_status))
    }
}

/// Ordered startup steps for one classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    classification: Classification,
    steps: Vec<RecipeStep>,
}

impl Recipe {
    /// Creates a recipe from explicit steps.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError`] when the steps break an ordering
    /// rule (see [`Recipe::validate`]).
    pub fn new(
        classification: Classification,
        steps: Vec<RecipeStep>,
    ) -> Result<Self, LifecycleDomainError> {
        let recipe = Self {
            classification,
            steps,
        };
        recipe.validate()?;
        Ok(recipe)
    }

    /// Builds the recipe a configuration needs for its classification.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::DuplicateSubsystem`] when a service is
    /// listed twice, or [`LifecycleDomainError::UnserializableConfiguration`]
    /// when a section cannot be encoded.
    pub fn for_configuration(
        classification: Classification,
        config: &ServerConfiguration,
    ) -> Result<Self, LifecycleDomainError> {
        let steps = match classification {
            Classification::MetadataServer | Classification::MetadataAccessPoint => {
                let mut steps = vec![repository_step(config)?];
                steps.extend(access_service_steps(config)?);
                steps.push(event_bus_step(config)?);
                steps
            }
            Classification::RepositoryProxy => {
                vec![repository_step(config)?, event_bus_step(config)?]
            }
            Classification::ConformanceServer => {
                let mut steps = vec![
                    repository_step(config)?,
                    RecipeStep::new(
                        SubsystemKind::ConformanceSuite,
                        StepRole::RegistersListener,
                        encode(config.conformance_suite())?,
                    ),
                ];
                steps.extend(access_service_steps(config)?);
                steps.push(event_bus_step(config)?);
                steps
            }
            Classification::ViewServer => config
                .view_services()
                .iter()
                .map(|service| {
                    service_step(
                        SubsystemKind::ViewService(service.kind()),
                        StepRole::Standalone,
                        service,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?,
            Classification::IntegrationDaemon => {
                vec![governance_step(config, GovernanceSection::IntegrationDaemon)?]
            }
            Classification::EngineHost => {
                vec![governance_step(config, GovernanceSection::EngineHost)?]
            }
            Classification::DataEngineProxy => {
                vec![governance_step(config, GovernanceSection::DataEngineProxy)?]
            }
            Classification::LineageWarehouse => {
                vec![governance_step(config, GovernanceSection::LineageWarehouse)?]
            }
        };

        Self::new(classification, steps)
    }

    /// Checks the ordering rules every recipe must satisfy.
    ///
    /// - a subsystem appears at most once;
    /// - steps that need the event source come after the step providing it;
    /// - every listener-registering step comes before any step that starts
    ///   event delivery, so no listener misses early events.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule as a [`LifecycleDomainError`].
    pub fn validate(&self) -> Result<(), LifecycleDomainError> {
        let mut seen = HashSet::new();
        let mut event_source_provided = false;
        let mut delivery_started = false;

        for step in &self.steps {
            if !seen.insert(step.kind) {
                return Err(LifecycleDomainError::DuplicateSubsystem {
                    kind: step.kind,
                    classification: self.classification,
                });
            }

            if step.role.requires_event_source() && !event_source_provided {
                return Err(LifecycleDomainError::MissingEventSource(step.kind));
            }

            match step.role {
                StepRole::ProvidesEventSource => event_source_provided = true,
                StepRole::RegistersListener if delivery_started => {
                    return Err(LifecycleDomainError::ListenerAfterDeliveryStart {
                        listener: step.kind,
                    });
                }
                StepRole::StartsDelivery => delivery_started = true,
                StepRole::RegistersListener | StepRole::Standalone => {}
            }
        }

        Ok(())
    }

    /// Returns the classification the recipe was built for.
    #[must_use]
    pub const fn classification(&self) -> Classification {
        self.classification
    }

    /// Returns every step in startup order, including skipped ones.
    #[must_use]
    pub fn steps(&self) -> &[RecipeStep] {
        &self.steps
    }

    /// Returns the steps that will actually run, in startup order.
    pub fn active_steps(&self) -> impl Iterator<Item = &RecipeStep> {
        self.steps.iter().filter(|step| step.skip_reason().is_none())
    }
}

fn encode<T: Serialize>(section: T) -> Result<Value, LifecycleDomainError> {
    serde_json::to_value(section)
        .map_err(|err| LifecycleDomainError::UnserializableConfiguration(err.to_string()))
}

fn repository_step(config: &ServerConfiguration) -> Result<RecipeStep, LifecycleDomainError> {
    Ok(RecipeStep::new(
        SubsystemKind::RepositoryServices,
        StepRole::ProvidesEventSource,
        encode(config.repository_services())?,
    ))
}

fn event_bus_step(config: &ServerConfiguration) -> Result<RecipeStep, LifecycleDomainError> {
    let cohorts = config
        .repository_services()
        .map(|section| section.cohorts().to_vec())
        .unwrap_or_default();
    Ok(RecipeStep::new(
        SubsystemKind::EnterpriseEventBus,
        StepRole::StartsDelivery,
        json!({ "cohorts": encode(cohorts)? }),
    ))
}

fn service_step<K: Copy + Serialize>(
    kind: SubsystemKind,
    role: StepRole,
    service: &ServiceConfig<K>,
) -> Result<RecipeStep, LifecycleDomainError> {
    Ok(RecipeStep::new(kind, role, encode(service)?).skipped_when(
        [SkipCondition::Disabled, SkipCondition::Deprecated],
        service.status(),
        service.development_status(),
    ))
}

fn access_service_steps(
    config: &ServerConfiguration,
) -> Result<Vec<RecipeStep>, LifecycleDomainError> {
    config
        .access_services()
        .iter()
        .map(|service| {
            service_step(
                SubsystemKind::AccessService(service.kind()),
                StepRole::RegistersListener,
                service,
            )
        })
        .collect()
}

fn governance_step(
    config: &ServerConfiguration,
    section: GovernanceSection,
) -> Result<RecipeStep, LifecycleDomainError> {
    let kind = match section {
        GovernanceSection::IntegrationDaemon => SubsystemKind::IntegrationDaemon,
        GovernanceSection::EngineHost => SubsystemKind::EngineHost,
        GovernanceSection::DataEngineProxy => SubsystemKind::DataEngineProxy,
        GovernanceSection::LineageWarehouse => SubsystemKind::LineageWarehouse,
    };
    Ok(RecipeStep::new(
        kind,
        StepRole::Standalone,
        encode(config.governance_section(section))?,
    ))
}
