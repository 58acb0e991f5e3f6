//! Factory registry mapping subsystem tags to admin implementations.

use crate::server_lifecycle::{domain::SubsystemKind, ports::SubsystemAdmin};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

type AdminConstructor = Arc<dyn Fn() -> Arc<dyn SubsystemAdmin> + Send + Sync>;

/// Error returned when no implementation is registered for a subsystem.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no admin implementation registered for subsystem {0}")]
pub struct MissingSubsystemError(pub SubsystemKind);

/// Explicit registry of subsystem admin constructors.
///
/// Each activation asks the catalog for a fresh admin per started
/// subsystem; the orchestrator keeps that admin alongside the handle so the
/// same object receives the matching `shutdown`.
#[derive(Clone, Default)]
pub struct SubsystemCatalog {
    constructors: HashMap<SubsystemKind, AdminConstructor>,
}

impl SubsystemCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor for a subsystem, replacing any previous one.
    #[must_use]
    pub fn with_constructor<F>(mut self, kind: SubsystemKind, constructor: F) -> Self
    where
        F: Fn() -> Arc<dyn SubsystemAdmin> + Send + Sync + 'static,
    {
        self.constructors.insert(kind, Arc::new(constructor));
        self
    }

    /// Registers a shared admin instance for a subsystem.
    #[must_use]
    pub fn with_admin(self, kind: SubsystemKind, admin: Arc<dyn SubsystemAdmin>) -> Self {
        self.with_constructor(kind, move || Arc::clone(&admin))
    }

    /// Returns whether an implementation is registered.
    #[must_use]
    pub fn contains(&self, kind: SubsystemKind) -> bool {
        self.constructors.contains_key(&kind)
    }

    /// Returns the registered subsystem tags in display order.
    #[must_use]
    pub fn registered_kinds(&self) -> Vec<SubsystemKind> {
        let mut kinds: Vec<_> = self.constructors.keys().copied().collect();
        kinds.sort_by_key(ToString::to_string);
        kinds
    }

    /// Constructs the admin for a subsystem.
    ///
    /// # Errors
    ///
    /// Returns [`MissingSubsystemError`] when nothing is registered for
    /// `kind`.
    pub fn admin_for(
        &self,
        kind: SubsystemKind,
    ) -> Result<Arc<dyn SubsystemAdmin>, MissingSubsystemError> {
        self.constructors
            .get(&kind)
            .map(|constructor| constructor())
            .ok_or(MissingSubsystemError(kind))
    }
}

impl fmt::Debug for SubsystemCatalog {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SubsystemCatalog")
            .field("registered", &self.registered_kinds())
            .finish()
    }
}
