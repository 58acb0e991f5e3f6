//! Caisson: lifecycle orchestration for hosted metadata servers.
//!
//! A single platform process hosts many logical servers. Each server is
//! described by a configuration document; activating it classifies the
//! document, derives an ordered startup recipe, and initializes the
//! matching subsystems. Any startup failure unwinds what was started, in
//! reverse order, before the error reaches the caller.
//!
//! # Architecture
//!
//! Caisson follows hexagonal architecture principles:
//!
//! - **Domain**: Pure lifecycle logic with no infrastructure dependencies
//! - **Ports**: Trait interfaces for subsystems, storage, authorization, audit
//! - **Adapters**: Concrete implementations of ports (filesystem, in-memory)
//!
//! # Modules
//!
//! - [`server_lifecycle`]: Classification, recipes, registry, orchestration
//! - [`config`]: Platform settings read from the environment

pub mod config;
pub mod server_lifecycle;
