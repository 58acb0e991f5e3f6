//! Application services for server lifecycle orchestration.

mod bulk;
mod catalog;
mod error;
mod orchestrator;
mod registry;
mod reports;

pub use bulk::{BulkActivationError, BulkActivationReport};
pub use catalog::{MissingSubsystemError, SubsystemCatalog};
pub use error::{LifecycleError, LifecycleResult, ShutdownFailure};
pub use orchestrator::LifecycleOrchestrator;
pub use registry::{InstanceGuard, InstanceRegistry, RegistryError, RegistryResult};
pub use reports::{
    ActivationReport, DeactivationReport, PlatformShutdownReport, ServerShutdownFailure,
    SkippedSubsystem,
};
