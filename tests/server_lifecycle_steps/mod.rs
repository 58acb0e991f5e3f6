//! Step definitions for server lifecycle behaviour tests.

mod given;
mod then;
pub mod world;
