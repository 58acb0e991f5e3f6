//! Domain model for hosted server lifecycle.
//!
//! The lifecycle domain models server identity, the configuration document
//! sections the core inspects, classification, startup recipes, and the
//! status of running instances. Infrastructure concerns remain outside this
//! boundary.

mod audit;
mod classification;
mod configuration;
mod error;
mod ids;
mod instance;
mod recipe;
mod status;
mod subsystem;

pub use audit::{LifecycleEvent, LifecycleEventKind};
pub use classification::{Classification, classify};
pub use configuration::{
    AccessServiceConfig, ConfigurationFingerprint, ConformanceSuiteConfig, DevelopmentStatus,
    GovernanceSection, GovernanceServerConfig, LocalRepositoryConfig, LocalRepositoryMode,
    RepositoryServicesConfig, ServerConfiguration, ServiceConfig, ServiceStatus,
    ViewServiceConfig,
};
pub use error::{LifecycleDomainError, ParseSubsystemKindError, ParseSubsystemStatusError};
pub use ids::{ActivationId, ServerName, UserId};
pub use instance::{ActiveStatus, OperationalInstance, SubsystemEntry};
pub use recipe::{Recipe, RecipeStep, SkipCondition, StepRole};
pub use status::{DeactivationMode, SubsystemStatus};
pub use subsystem::{AccessServiceKind, SubsystemKind, ViewServiceKind};
