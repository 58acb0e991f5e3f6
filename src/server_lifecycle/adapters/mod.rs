//! Adapter implementations for server lifecycle ports.

pub mod authorization;
pub mod file_store;
pub mod memory;
pub mod tracing_audit;
