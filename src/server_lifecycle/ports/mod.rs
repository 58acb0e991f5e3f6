//! Port contracts for server lifecycle orchestration.

mod audit;
mod authorization;
mod configuration_store;
mod subsystem;

pub use audit::LifecycleAuditLog;
#[cfg(test)]
pub use authorization::MockServerAuthorization;
pub use authorization::{
    AuthorizationError, AuthorizationResult, ServerAuthorization, ServerRole,
};
pub use configuration_store::{
    ConfigurationStore, ConfigurationStoreError, ConfigurationStoreResult,
};
pub use subsystem::{
    EventSourceHandle, SharedDependencies, SubsystemAdmin, SubsystemError, SubsystemHandle,
    SubsystemResult, SubsystemStarted,
};
