//! In-memory subsystem admins for tests and dry runs.
//!
//! The repository subsystem exports an [`InMemoryEventSource`]; access
//! services and the conformance suite register listeners on it; the event
//! bus starts delivery. Every call is written to a shared
//! [`SubsystemJournal`] so tests can assert ordering.

use crate::server_lifecycle::{
    domain::{DeactivationMode, ServerName, SubsystemKind},
    ports::{
        EventSourceHandle, SharedDependencies, SubsystemAdmin, SubsystemError, SubsystemHandle,
        SubsystemResult, SubsystemStarted,
    },
    services::SubsystemCatalog,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

/// One admin call observed by the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubsystemCall {
    /// `initialize` was called.
    Initialize {
        /// Hosting server.
        server: ServerName,
        /// Subsystem initialized.
        kind: SubsystemKind,
    },
    /// `shutdown` was called.
    Shutdown {
        /// Hosting server.
        server: ServerName,
        /// Subsystem shut down.
        kind: SubsystemKind,
        /// Requested mode.
        mode: DeactivationMode,
    },
}

#[derive(Debug, Default)]
struct JournalState {
    calls: Vec<SubsystemCall>,
    event_sources: HashMap<ServerName, Arc<InMemoryEventSource>>,
}

/// Shared record of admin calls across all in-memory subsystems.
#[derive(Debug, Clone, Default)]
pub struct SubsystemJournal {
    state: Arc<Mutex<JournalState>>,
}

impl SubsystemJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded call in order.
    #[must_use]
    pub fn calls(&self) -> Vec<SubsystemCall> {
        self.lock().calls.clone()
    }

    /// Returns the subsystems `initialize` was called for on a server.
    #[must_use]
    pub fn initialized(&self, server: &ServerName) -> Vec<SubsystemKind> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SubsystemCall::Initialize { server: host, kind } if host == server => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Returns the subsystems `shutdown` was called for on a server.
    #[must_use]
    pub fn shut_down(&self, server: &ServerName) -> Vec<SubsystemKind> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SubsystemCall::Shutdown {
                    server: host, kind, ..
                } if host == server => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Returns the shutdown modes requested for a server.
    #[must_use]
    pub fn shutdown_modes(&self, server: &ServerName) -> Vec<DeactivationMode> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SubsystemCall::Shutdown {
                    server: host, mode, ..
                } if host == server => Some(*mode),
                _ => None,
            })
            .collect()
    }

    /// Returns the event source most recently exported for a server.
    #[must_use]
    pub fn event_source(&self, server: &ServerName) -> Option<Arc<InMemoryEventSource>> {
        self.lock().event_sources.get(server).cloned()
    }

    fn record(&self, call: SubsystemCall) {
        self.lock().calls.push(call);
    }

    fn publish_event_source(&self, server: &ServerName, source: Arc<InMemoryEventSource>) {
        self.lock().event_sources.insert(server.clone(), source);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JournalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default)]
struct EventSourceState {
    listeners: Vec<SubsystemKind>,
    late_listeners: Vec<SubsystemKind>,
    delivering: bool,
}

/// Event source exported by the in-memory repository subsystem.
#[derive(Debug, Default)]
pub struct InMemoryEventSource {
    state: Mutex<EventSourceState>,
}

impl InMemoryEventSource {
    /// Registers a listener. Listeners added after delivery started are
    /// remembered as late.
    pub fn register_listener(&self, kind: SubsystemKind) {
        let mut state = self.lock();
        if state.delivering {
            state.late_listeners.push(kind);
        }
        state.listeners.push(kind);
    }

    /// Starts event delivery.
    pub fn start_delivery(&self) {
        self.lock().delivering = true;
    }

    /// Stops event delivery.
    pub fn stop_delivery(&self) {
        self.lock().delivering = false;
    }

    /// Returns registered listeners in registration order.
    #[must_use]
    pub fn listeners(&self) -> Vec<SubsystemKind> {
        self.lock().listeners.clone()
    }

    /// Returns listeners registered after delivery started.
    #[must_use]
    pub fn late_listeners(&self) -> Vec<SubsystemKind> {
        self.lock().late_listeners.clone()
    }

    /// Returns whether events are being delivered.
    #[must_use]
    pub fn is_delivering(&self) -> bool {
        self.lock().delivering
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EventSourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Failure an in-memory subsystem is scripted to raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    /// Reject the configuration section.
    Reject,
    /// Raise an unexpected fault.
    Fault,
}

impl ScriptedFailure {
    fn to_error(self, kind: SubsystemKind, phase: &str) -> SubsystemError {
        match self {
            Self::Reject => {
                SubsystemError::configuration(format!("{kind} rejected its section during {phase}"))
            }
            Self::Fault => SubsystemError::fault(std::io::Error::other(format!(
                "{kind} faulted during {phase}"
            ))),
        }
    }
}

/// Two-way rendezvous that holds an `initialize` call open.
///
/// The subsystem signals `entered` once `initialize` begins and then waits
/// for `release`.
#[derive(Debug, Clone, Default)]
pub struct InitializeGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl InitializeGate {
    /// Creates a closed gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until a gated `initialize` has begun.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the gated `initialize` continue.
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

struct StartedState {
    server: ServerName,
    event_source: Option<Arc<InMemoryEventSource>>,
}

/// Scriptable in-memory admin for one subsystem kind.
#[derive(Debug, Clone)]
pub struct InMemorySubsystem {
    kind: SubsystemKind,
    journal: SubsystemJournal,
    initialize_failure: Option<ScriptedFailure>,
    healthy_initializations: usize,
    initializations: Arc<AtomicUsize>,
    shutdown_failure: Option<ScriptedFailure>,
    gate: Option<InitializeGate>,
}

impl InMemorySubsystem {
    /// Creates a well-behaved admin writing to `journal`.
    #[must_use]
    pub fn new(kind: SubsystemKind, journal: SubsystemJournal) -> Self {
        Self {
            kind,
            journal,
            initialize_failure: None,
            healthy_initializations: 0,
            initializations: Arc::new(AtomicUsize::new(0)),
            shutdown_failure: None,
            gate: None,
        }
    }

    /// Makes every `initialize` call fail.
    #[must_use]
    pub const fn failing_initialize(self, failure: ScriptedFailure) -> Self {
        self.failing_initialize_after(0, failure)
    }

    /// Lets the first `successes` calls to `initialize` succeed and fails
    /// every later one. Clones share the count.
    #[must_use]
    pub const fn failing_initialize_after(
        mut self,
        successes: usize,
        failure: ScriptedFailure,
    ) -> Self {
        self.initialize_failure = Some(failure);
        self.healthy_initializations = successes;
        self
    }

    /// Makes every `shutdown` call fail after it is recorded.
    #[must_use]
    pub const fn failing_shutdown(mut self, failure: ScriptedFailure) -> Self {
        self.shutdown_failure = Some(failure);
        self
    }

    /// Holds `initialize` open until the gate is released.
    #[must_use]
    pub fn gated(mut self, gate: InitializeGate) -> Self {
        self.gate = Some(gate);
        self
    }

    fn shared_event_source(
        &self,
        dependencies: &SharedDependencies,
    ) -> SubsystemResult<Arc<InMemoryEventSource>> {
        dependencies
            .event_source()
            .and_then(EventSourceHandle::downcast_ref::<Arc<InMemoryEventSource>>)
            .cloned()
            .ok_or_else(|| {
                SubsystemError::configuration(format!("{} requires an event source", self.kind))
            })
    }
}

#[async_trait]
impl SubsystemAdmin for InMemorySubsystem {
    async fn initialize(
        &self,
        _section: &Value,
        dependencies: &SharedDependencies,
    ) -> SubsystemResult<SubsystemStarted> {
        let server = dependencies.server_name().clone();
        self.journal.record(SubsystemCall::Initialize {
            server: server.clone(),
            kind: self.kind,
        });
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        let attempt = self.initializations.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self
            .initialize_failure
            .filter(|_| attempt >= self.healthy_initializations)
        {
            return Err(failure.to_error(self.kind, "initialize"));
        }

        match self.kind {
            SubsystemKind::RepositoryServices => {
                let source = Arc::new(InMemoryEventSource::default());
                self.journal
                    .publish_event_source(&server, Arc::clone(&source));
                let handle = SubsystemHandle::new(StartedState {
                    server,
                    event_source: Some(Arc::clone(&source)),
                });
                Ok(SubsystemStarted::new(handle).with_event_source(EventSourceHandle::new(source)))
            }
            SubsystemKind::AccessService(_) | SubsystemKind::ConformanceSuite => {
                let source = self.shared_event_source(dependencies)?;
                source.register_listener(self.kind);
                Ok(SubsystemStarted::new(SubsystemHandle::new(StartedState {
                    server,
                    event_source: Some(source),
                })))
            }
            SubsystemKind::EnterpriseEventBus => {
                let source = self.shared_event_source(dependencies)?;
                source.start_delivery();
                Ok(SubsystemStarted::new(SubsystemHandle::new(StartedState {
                    server,
                    event_source: Some(source),
                })))
            }
            SubsystemKind::ViewService(_)
            | SubsystemKind::IntegrationDaemon
            | SubsystemKind::EngineHost
            | SubsystemKind::DataEngineProxy
            | SubsystemKind::LineageWarehouse => {
                Ok(SubsystemStarted::new(SubsystemHandle::new(StartedState {
                    server,
                    event_source: None,
                })))
            }
        }
    }

    async fn shutdown(
        &self,
        handle: SubsystemHandle,
        mode: DeactivationMode,
    ) -> SubsystemResult<()> {
        let state = handle.downcast_ref::<StartedState>().ok_or_else(|| {
            SubsystemError::configuration(format!("{} received a foreign handle", self.kind))
        })?;
        self.journal.record(SubsystemCall::Shutdown {
            server: state.server.clone(),
            kind: self.kind,
            mode,
        });
        if self.kind == SubsystemKind::EnterpriseEventBus {
            if let Some(source) = &state.event_source {
                source.stop_delivery();
            }
        }
        self.shutdown_failure
            .map_or(Ok(()), |failure| Err(failure.to_error(self.kind, "shutdown")))
    }
}

/// Builds a catalog with a well-behaved in-memory admin for every subsystem.
#[must_use]
pub fn in_memory_catalog(journal: &SubsystemJournal) -> SubsystemCatalog {
    SubsystemKind::all()
        .into_iter()
        .fold(SubsystemCatalog::new(), |catalog, kind| {
            let shared = journal.clone();
            catalog.with_constructor(kind, move || {
                Arc::new(InMemorySubsystem::new(kind, shared.clone())) as Arc<dyn SubsystemAdmin>
            })
        })
}
