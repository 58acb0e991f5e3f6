//! Process-wide registry of live server instances.
//!
//! The registry keeps one slot per server name. A slot pairs an async
//! lifecycle lock, which also owns the started subsystems' handles, with a
//! short-lived record lock holding the public [`OperationalInstance`].
//! Lifecycle operations for different names never contend; a second
//! operation for a name whose lock is held is rejected rather than queued.

use crate::server_lifecycle::{
    domain::{LifecycleDomainError, OperationalInstance, ServerName, SubsystemKind},
    ports::{SubsystemAdmin, SubsystemHandle},
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors returned by the instance registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Another lifecycle operation for the server is in flight.
    #[error("a lifecycle operation for server {0} is already in progress")]
    LifecycleInProgress(ServerName),

    /// No instance is registered for the server.
    #[error("server {0} is not active")]
    NotFound(ServerName),

    /// A record lock was poisoned by a panicking writer.
    #[error("instance registry lock poisoned: {0}")]
    LockPoisoned(String),

    /// A status change on the stored instance was rejected.
    #[error(transparent)]
    Domain(#[from] LifecycleDomainError),
}

/// A started subsystem's admin and handle.
pub(crate) struct HandleEntry {
    pub(crate) kind: SubsystemKind,
    pub(crate) admin: Arc<dyn SubsystemAdmin>,
    pub(crate) handle: SubsystemHandle,
}

/// Handles of the subsystems started for one instance, in startup order.
#[derive(Default)]
pub(crate) struct HandleTable {
    entries: Vec<HandleEntry>,
}

impl HandleTable {
    pub(crate) fn insert(
        &mut self,
        kind: SubsystemKind,
        admin: Arc<dyn SubsystemAdmin>,
        handle: SubsystemHandle,
    ) {
        self.entries.retain(|entry| entry.kind != kind);
        self.entries.push(HandleEntry {
            kind,
            admin,
            handle,
        });
    }

    pub(crate) fn take(&mut self, kind: SubsystemKind) -> Option<HandleEntry> {
        let position = self.entries.iter().position(|entry| entry.kind == kind)?;
        Some(self.entries.remove(position))
    }

    pub(crate) fn drain_newest_first(&mut self) -> Vec<HandleEntry> {
        let mut drained: Vec<_> = self.entries.drain(..).collect();
        drained.reverse();
        drained
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Default)]
struct ServerSlot {
    lifecycle: Arc<Mutex<HandleTable>>,
    record: RwLock<Option<OperationalInstance>>,
}

/// Registry of live instances keyed by server name.
///
/// Construct one per platform process and share it by `Arc`.
#[derive(Default)]
pub struct InstanceRegistry {
    slots: RwLock<HashMap<ServerName, Arc<ServerSlot>>>,
}

impl InstanceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lifecycle lock for a server without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LifecycleInProgress`] when another operation
    /// holds the lock.
    pub fn try_acquire(&self, server_name: &ServerName) -> RegistryResult<InstanceGuard> {
        let slot = self.slot_for(server_name)?;
        lock_slot(server_name, slot)
    }

    /// Takes the lifecycle lock for a server the registry already tracks.
    ///
    /// Returns `None` without creating a slot when the name has never been
    /// locked, so probing an unknown name leaves the registry unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LifecycleInProgress`] when another operation
    /// holds the lock.
    pub fn try_acquire_existing(
        &self,
        server_name: &ServerName,
    ) -> RegistryResult<Option<InstanceGuard>> {
        let existing = self.slots.read().map_err(poisoned)?.get(server_name).cloned();
        existing
            .map(|slot| lock_slot(server_name, slot))
            .transpose()
    }

    /// Returns a copy of the registered instance.
    ///
    /// The record may be mid-transition (`STARTING` or `STOPPING`) when a
    /// lifecycle operation is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when no instance is registered.
    pub fn lookup(&self, server_name: &ServerName) -> RegistryResult<OperationalInstance> {
        let slot = {
            let slots = self.slots.read().map_err(poisoned)?;
            slots.get(server_name).cloned()
        };
        slot.map(|found| read_record(&found))
            .transpose()?
            .flatten()
            .ok_or_else(|| RegistryError::NotFound(server_name.clone()))
    }

    /// Returns the names of all registered instances, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] when a lock is poisoned.
    pub fn active_server_names(&self) -> RegistryResult<Vec<ServerName>> {
        let slots: Vec<(ServerName, Arc<ServerSlot>)> = {
            let guard = self.slots.read().map_err(poisoned)?;
            guard
                .iter()
                .map(|(name, slot)| (name.clone(), Arc::clone(slot)))
                .collect()
        };

        let mut names = Vec::new();
        for (name, slot) in slots {
            if read_record(&slot)?.is_some() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    #[cfg(test)]
    pub(crate) fn tracked_slot_count(&self) -> usize {
        self.slots.read().map_or(0, |slots| slots.len())
    }

    /// Slots are never released, so the map is bounded by the names that
    /// have been activated or permanently deleted.
    fn slot_for(&self, server_name: &ServerName) -> RegistryResult<Arc<ServerSlot>> {
        if let Some(slot) = self.slots.read().map_err(poisoned)?.get(server_name) {
            return Ok(Arc::clone(slot));
        }
        let mut slots = self.slots.write().map_err(poisoned)?;
        Ok(Arc::clone(slots.entry(server_name.clone()).or_default()))
    }
}

/// Exclusive right to run a lifecycle operation for one server.
///
/// Dropping the guard releases the lock.
pub struct InstanceGuard {
    server_name: ServerName,
    slot: Arc<ServerSlot>,
    handles: OwnedMutexGuard<HandleTable>,
}

impl InstanceGuard {
    /// Returns the guarded server name.
    #[must_use]
    pub const fn server_name(&self) -> &ServerName {
        &self.server_name
    }

    /// Returns a copy of the registered instance, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] when the record lock is
    /// poisoned.
    pub fn instance(&self) -> RegistryResult<Option<OperationalInstance>> {
        read_record(&self.slot)
    }

    /// Registers an instance, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] when the record lock is
    /// poisoned.
    pub fn store(&self, instance: OperationalInstance) -> RegistryResult<()> {
        *self.slot.record.write().map_err(poisoned)? = Some(instance);
        Ok(())
    }

    /// Applies a change to the registered instance.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when nothing is registered, or
    /// the domain error produced by `change`.
    pub fn update<T>(
        &self,
        change: impl FnOnce(&mut OperationalInstance) -> Result<T, LifecycleDomainError>,
    ) -> RegistryResult<T> {
        let mut record = self.slot.record.write().map_err(poisoned)?;
        let instance = record
            .as_mut()
            .ok_or_else(|| RegistryError::NotFound(self.server_name.clone()))?;
        Ok(change(instance)?)
    }

    /// Removes the registered instance and forgets any remaining handles.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] when the record lock is
    /// poisoned.
    pub fn remove(&mut self) -> RegistryResult<Option<OperationalInstance>> {
        self.handles.clear();
        Ok(self.slot.record.write().map_err(poisoned)?.take())
    }

    pub(crate) fn handles_mut(&mut self) -> &mut HandleTable {
        &mut self.handles
    }
}

fn lock_slot(server_name: &ServerName, slot: Arc<ServerSlot>) -> RegistryResult<InstanceGuard> {
    let handles = Arc::clone(&slot.lifecycle)
        .try_lock_owned()
        .map_err(|_| RegistryError::LifecycleInProgress(server_name.clone()))?;
    Ok(InstanceGuard {
        server_name: server_name.clone(),
        slot,
        handles,
    })
}

fn read_record(slot: &ServerSlot) -> RegistryResult<Option<OperationalInstance>> {
    Ok(slot.record.read().map_err(poisoned)?.clone())
}

fn poisoned<E: std::fmt::Display>(err: E) -> RegistryError {
    RegistryError::LockPoisoned(err.to_string())
}
