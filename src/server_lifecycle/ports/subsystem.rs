//! Admin contract implemented by every pluggable subsystem.

use crate::server_lifecycle::domain::{DeactivationMode, ServerName};
use async_trait::async_trait;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for subsystem admin operations.
pub type SubsystemResult<T> = Result<T, SubsystemError>;

/// Opaque token a subsystem returns from `initialize` and receives back on
/// `shutdown`.
#[derive(Clone)]
pub struct SubsystemHandle(Arc<dyn Any + Send + Sync>);

impl SubsystemHandle {
    /// Wraps subsystem-private state.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(state: T) -> Self {
        Self(Arc::new(state))
    }

    /// Returns the wrapped state when it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for SubsystemHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SubsystemHandle(..)")
    }
}

/// Handle to the shared enterprise event source.
///
/// Produced by the repository services step and handed to every step that
/// registers listeners or starts event delivery.
#[derive(Clone)]
pub struct EventSourceHandle(Arc<dyn Any + Send + Sync>);

impl EventSourceHandle {
    /// Wraps the concrete event source.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(source: T) -> Self {
        Self(Arc::new(source))
    }

    /// Returns the concrete event source when it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for EventSourceHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("EventSourceHandle(..)")
    }
}

/// Values every subsystem receives alongside its configuration section.
#[derive(Debug, Clone)]
pub struct SharedDependencies {
    server_name: ServerName,
    local_server_user_id: String,
    max_page_size: u32,
    event_source: Option<EventSourceHandle>,
}

impl SharedDependencies {
    /// Creates dependencies without an event source.
    #[must_use]
    pub fn new(
        server_name: ServerName,
        local_server_user_id: impl Into<String>,
        max_page_size: u32,
    ) -> Self {
        Self {
            server_name,
            local_server_user_id: local_server_user_id.into(),
            max_page_size,
            event_source: None,
        }
    }

    /// Attaches the shared event source.
    #[must_use]
    pub fn with_event_source(mut self, event_source: EventSourceHandle) -> Self {
        self.event_source = Some(event_source);
        self
    }

    /// Returns the hosting server's name.
    #[must_use]
    pub const fn server_name(&self) -> &ServerName {
        &self.server_name
    }

    /// Returns the identity the server uses for its own requests.
    #[must_use]
    pub fn local_server_user_id(&self) -> &str {
        &self.local_server_user_id
    }

    /// Returns the maximum page size.
    #[must_use]
    pub const fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    /// Returns the shared event source, if an earlier step produced one.
    #[must_use]
    pub const fn event_source(&self) -> Option<&EventSourceHandle> {
        self.event_source.as_ref()
    }
}

/// Successful outcome of `initialize`.
#[derive(Debug, Clone)]
pub struct SubsystemStarted {
    handle: SubsystemHandle,
    event_source: Option<EventSourceHandle>,
}

impl SubsystemStarted {
    /// Creates an outcome carrying the shutdown handle.
    #[must_use]
    pub const fn new(handle: SubsystemHandle) -> Self {
        Self {
            handle,
            event_source: None,
        }
    }

    /// Exports an event source for later steps.
    #[must_use]
    pub fn with_event_source(mut self, event_source: EventSourceHandle) -> Self {
        self.event_source = Some(event_source);
        self
    }

    /// Splits the outcome into its handle and exported event source.
    #[must_use]
    pub fn into_parts(self) -> (SubsystemHandle, Option<EventSourceHandle>) {
        (self.handle, self.event_source)
    }
}

/// Admin contract every pluggable subsystem implements.
///
/// Both calls may block for as long as the subsystem needs; the
/// orchestrator applies no timeout of its own.
#[async_trait]
pub trait SubsystemAdmin: Send + Sync {
    /// Starts the subsystem from its configuration section.
    async fn initialize(
        &self,
        section: &Value,
        dependencies: &SharedDependencies,
    ) -> SubsystemResult<SubsystemStarted>;

    /// Stops the subsystem identified by `handle`.
    async fn shutdown(&self, handle: SubsystemHandle, mode: DeactivationMode)
    -> SubsystemResult<()>;
}

/// Errors returned by subsystem admin implementations.
#[derive(Debug, Clone, Error)]
pub enum SubsystemError {
    /// The subsystem rejected its configuration.
    #[error("configuration rejected: {0}")]
    Configuration(String),

    /// Unexpected runtime failure.
    #[error("subsystem fault: {0}")]
    Fault(Arc<dyn std::error::Error + Send + Sync>),
}

impl SubsystemError {
    /// Creates a configuration-shaped failure.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Wraps an unexpected runtime failure.
    pub fn fault(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Fault(Arc::new(err))
    }
}
