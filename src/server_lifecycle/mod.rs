//! Lifecycle management for hosted servers.
//!
//! This module turns stored configuration documents into running server
//! instances and back. Activation classifies the document, derives the
//! startup recipe for that classification, and initializes each subsystem in
//! order while holding the server's lifecycle lock. Deactivation shuts the
//! subsystems down newest first and, when permanent, deletes the stored
//! document. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
