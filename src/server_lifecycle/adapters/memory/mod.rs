//! In-memory adapters for tests and dry runs.

mod audit_log;
mod configuration_store;
mod subsystem;

pub use audit_log::InMemoryAuditLog;
pub use configuration_store::InMemoryConfigurationStore;
pub use subsystem::{
    InMemoryEventSource, InMemorySubsystem, InitializeGate, ScriptedFailure, SubsystemCall,
    SubsystemJournal, in_memory_catalog,
};
