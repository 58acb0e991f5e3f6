//! Lifecycle orchestration for hosted servers.
//!
//! The orchestrator turns a configuration document into a running
//! [`OperationalInstance`] by classifying it, deriving its startup recipe,
//! and initializing each subsystem in order. A step failure unwinds every
//! subsystem started so far, newest first, before the error is returned.
//! Deactivation runs the same unwind for a live instance.

use super::{
    ActivationReport, DeactivationReport, InstanceGuard, InstanceRegistry, LifecycleError,
    LifecycleResult, PlatformShutdownReport, ServerShutdownFailure, ShutdownFailure,
    SkippedSubsystem, SubsystemCatalog,
    registry::{HandleEntry, RegistryError},
};
use crate::server_lifecycle::{
    domain::{
        ActivationId, ActiveStatus, DeactivationMode, LifecycleDomainError, LifecycleEvent,
        LifecycleEventKind, OperationalInstance, Recipe, ServerConfiguration, ServerName,
        SubsystemKind, UserId, classify,
    },
    ports::{
        AuthorizationError, ConfigurationStore, ConfigurationStoreError, EventSourceHandle,
        LifecycleAuditLog, ServerAuthorization, ServerRole, SharedDependencies, SubsystemError,
    },
};
use mockable::Clock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Starts, stops, and reports on hosted server instances.
#[derive(Clone)]
pub struct LifecycleOrchestrator<S, A, C>
where
    S: ConfigurationStore,
    A: ServerAuthorization,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    authorization: Arc<A>,
    catalog: SubsystemCatalog,
    registry: Arc<InstanceRegistry>,
    audit: Arc<dyn LifecycleAuditLog>,
    clock: Arc<C>,
}

impl<S, A, C> LifecycleOrchestrator<S, A, C>
where
    S: ConfigurationStore,
    A: ServerAuthorization,
    C: Clock + Send + Sync,
{
    /// Creates an orchestrator from its collaborators.
    #[must_use]
    pub const fn new(
        store: Arc<S>,
        authorization: Arc<A>,
        catalog: SubsystemCatalog,
        registry: Arc<InstanceRegistry>,
        audit: Arc<dyn LifecycleAuditLog>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            store,
            authorization,
            catalog,
            registry,
            audit,
            clock,
        }
    }

    /// Returns the registry the orchestrator records instances in.
    #[must_use]
    pub const fn registry(&self) -> &Arc<InstanceRegistry> {
        &self.registry
    }

    /// Activates a server from its stored configuration document.
    ///
    /// A server that is already running is stopped first and started again
    /// from the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidParameter`] for malformed names,
    /// [`LifecycleError::NotAuthorized`] when the user is not an operator of
    /// the server, [`LifecycleError::ConfigurationStore`] when the document
    /// cannot be loaded, and the activation errors described on
    /// [`LifecycleError`].
    pub async fn activate_with_stored_config(
        &self,
        user: &str,
        server: &str,
    ) -> LifecycleResult<ActivationReport> {
        let (user_id, server_name) = parse_request(user, server)?;
        self.require(ServerRole::Operator, &user_id, &server_name)
            .await?;
        let configuration = self.store.load(&server_name).await?;
        self.activate(server_name, configuration, DocumentSource::Stored)
            .await
    }

    /// Stores a caller-supplied configuration document and activates it.
    ///
    /// The document is saved only once it has been classified, while the
    /// server's lifecycle lock is held. A rejected document never replaces
    /// the stored one.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotAuthorized`] unless the user is both an
    /// operator and an administrator of the server, plus the errors of
    /// [`Self::activate_with_stored_config`].
    pub async fn activate_with_supplied_config(
        &self,
        user: &str,
        server: &str,
        configuration: ServerConfiguration,
    ) -> LifecycleResult<ActivationReport> {
        let (user_id, server_name) = parse_request(user, server)?;
        self.require(ServerRole::Operator, &user_id, &server_name)
            .await?;
        self.require(ServerRole::Administrator, &user_id, &server_name)
            .await?;
        self.activate(server_name, configuration, DocumentSource::Supplied)
            .await
    }

    /// Stops a server, keeping its stored configuration.
    ///
    /// Stopping a server that is not active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotAuthorized`] when the user is not an
    /// operator of the server, or [`LifecycleError::LifecycleInProgress`]
    /// when another operation for the server is running.
    pub async fn deactivate_temporarily(
        &self,
        user: &str,
        server: &str,
    ) -> LifecycleResult<DeactivationReport> {
        let (user_id, server_name) = parse_request(user, server)?;
        self.require(ServerRole::Operator, &user_id, &server_name)
            .await?;
        self.stop(server_name, DeactivationMode::Temporary).await
    }

    /// Stops a server and deletes its stored configuration.
    ///
    /// The stored document is deleted even when no instance is running.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotAuthorized`] when the user is not an
    /// administrator of the server, [`LifecycleError::ConfigurationStore`]
    /// when the document cannot be deleted, or
    /// [`LifecycleError::LifecycleInProgress`].
    pub async fn deactivate_permanently(
        &self,
        user: &str,
        server: &str,
    ) -> LifecycleResult<DeactivationReport> {
        let (user_id, server_name) = parse_request(user, server)?;
        self.require(ServerRole::Administrator, &user_id, &server_name)
            .await?;
        self.stop(server_name, DeactivationMode::Permanent).await
    }

    /// Stops every registered server.
    ///
    /// The user must hold the required role for every server before any is
    /// touched. Failures for one server do not prevent the others from
    /// stopping.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotAuthorized`] when any check fails.
    pub async fn shutdown_all(
        &self,
        user: &str,
        mode: DeactivationMode,
    ) -> LifecycleResult<PlatformShutdownReport> {
        let user_id = parse_user(user)?;
        let names = self
            .registry
            .active_server_names()
            .map_err(|err| LifecycleError::from_registry("*", err))?;
        let role = if mode.is_permanent() {
            ServerRole::Administrator
        } else {
            ServerRole::Operator
        };
        for server_name in &names {
            self.require(role, &user_id, server_name).await?;
        }

        info!(servers = names.len(), mode = mode.as_str(), "stopping all servers");
        let mut report = PlatformShutdownReport::default();
        for server_name in names {
            match self.stop(server_name.clone(), mode).await {
                Ok(stopped) => report.stopped.push(stopped),
                Err(err) => {
                    warn!(server = %server_name, error = %err, "server did not stop");
                    report.failures.push(ServerShutdownFailure {
                        server_name,
                        code: err.code(),
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Returns the configuration a running server was started with.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotActive`] when no instance is registered
    /// and [`LifecycleError::NotAuthorized`] when the user is not an
    /// investigator of the server.
    pub async fn active_configuration(
        &self,
        user: &str,
        server: &str,
    ) -> LifecycleResult<ServerConfiguration> {
        let instance = self.visible_instance(user, server).await?;
        Ok(instance.configuration().clone())
    }

    /// Returns the status view of a running server.
    ///
    /// # Errors
    ///
    /// Same as [`Self::active_configuration`].
    pub async fn active_status(&self, user: &str, server: &str) -> LifecycleResult<ActiveStatus> {
        let instance = self.visible_instance(user, server).await?;
        Ok(instance.status_report())
    }

    /// Returns whether an instance is registered for the server.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotAuthorized`] when the user is not an
    /// investigator of the server.
    pub async fn is_server_active(&self, user: &str, server: &str) -> LifecycleResult<bool> {
        match self.visible_instance(user, server).await {
            Ok(_) => Ok(true),
            Err(LifecycleError::NotActive(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Returns the registered servers the user may investigate.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotAuthorized`] when the authorization
    /// backend is unavailable.
    pub async fn active_server_names(&self, user: &str) -> LifecycleResult<Vec<ServerName>> {
        let user_id = parse_user(user)?;
        let names = self
            .registry
            .active_server_names()
            .map_err(|err| LifecycleError::from_registry("*", err))?;
        let mut visible = Vec::with_capacity(names.len());
        for server_name in names {
            match self
                .authorization
                .validate_investigator(&user_id, &server_name)
                .await
            {
                Ok(()) => visible.push(server_name),
                Err(AuthorizationError::Denied { .. }) => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(visible)
    }

    /// Returns whether the stored document differs from the one the running
    /// instance was started with.
    ///
    /// A stored document that has since been deleted counts as stale.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotActive`] when no instance is registered
    /// and [`LifecycleError::ConfigurationStore`] when the stored document
    /// cannot be read.
    pub async fn is_configuration_stale(&self, user: &str, server: &str) -> LifecycleResult<bool> {
        let instance = self.visible_instance(user, server).await?;
        let stored = match self.store.load(instance.server_name()).await {
            Ok(stored) => stored,
            Err(ConfigurationStoreError::NotFound(_)) => return Ok(true),
            Err(err) => return Err(err.into()),
        };
        let fingerprint = stored.fingerprint().map_err(|err| LifecycleError::Internal {
            server: instance.server_name().to_string(),
            reason: err.to_string(),
        })?;
        Ok(fingerprint.as_str() != instance.fingerprint().as_str())
    }

    async fn visible_instance(
        &self,
        user: &str,
        server: &str,
    ) -> LifecycleResult<OperationalInstance> {
        let (user_id, server_name) = parse_request(user, server)?;
        self.require(ServerRole::Investigator, &user_id, &server_name)
            .await?;
        self.registry
            .lookup(&server_name)
            .map_err(|err| LifecycleError::from_registry(server_name.as_str(), err))
    }

    async fn require(
        &self,
        role: ServerRole,
        user: &UserId,
        server: &ServerName,
    ) -> LifecycleResult<()> {
        let outcome = match role {
            ServerRole::Operator => self.authorization.validate_operator(user, server).await,
            ServerRole::Administrator => {
                self.authorization
                    .validate_administrator(user, server)
                    .await
            }
            ServerRole::Investigator => {
                self.authorization
                    .validate_investigator(user, server)
                    .await
            }
        };
        outcome.map_err(|err| {
            warn!(user = %user, server = %server, role = role.as_str(), "authorization failed");
            LifecycleError::NotAuthorized(err)
        })
    }

    async fn activate(
        &self,
        server_name: ServerName,
        configuration: ServerConfiguration,
        source: DocumentSource,
    ) -> LifecycleResult<ActivationReport> {
        configuration
            .validate()
            .map_err(|err| LifecycleError::invalid_parameter("configuration", &err))?;
        let mut guard = self
            .registry
            .try_acquire(&server_name)
            .map_err(|err| LifecycleError::from_registry(server_name.as_str(), err))?;
        let restarted = self.stop_previous(&mut guard).await?;

        let classification = classify(&server_name, &configuration)
            .map_err(|err| rejected_configuration(&server_name, &err))?;
        let recipe = Recipe::for_configuration(classification, &configuration)
            .map_err(|err| rejected_configuration(&server_name, &err))?;
        if source == DocumentSource::Supplied {
            self.store.save(&server_name, &configuration).await?;
            debug!(server = %server_name, "supplied configuration stored");
        }
        let dependencies = SharedDependencies::new(
            server_name.clone(),
            configuration.local_server_user_id(),
            configuration.max_page_size(),
        );
        let instance = OperationalInstance::starting(
            server_name.clone(),
            classification,
            configuration,
            &*self.clock,
        )
        .map_err(|err| rejected_configuration(&server_name, &err))?;
        let activation_id = instance.activation_id();
        guard
            .store(instance)
            .map_err(|err| LifecycleError::from_registry(server_name.as_str(), err))?;

        info!(
            server = %server_name,
            classification = classification.as_str(),
            activation = %activation_id,
            "activating server"
        );
        self.emit(
            &server_name,
            Some(activation_id),
            LifecycleEventKind::ActivationStarted { classification },
        );

        match self
            .run_recipe(&mut guard, &recipe, &dependencies, activation_id)
            .await
        {
            Ok(progress) => {
                info!(
                    server = %server_name,
                    started = progress.started.len(),
                    skipped = progress.skipped.len(),
                    "server running"
                );
                self.emit(
                    &server_name,
                    Some(activation_id),
                    LifecycleEventKind::ActivationCompleted {
                        started: progress.started.clone(),
                    },
                );
                Ok(ActivationReport {
                    server_name,
                    activation_id,
                    classification,
                    started: progress.started,
                    skipped: progress.skipped,
                    restarted,
                })
            }
            Err(failure) => {
                warn!(server = %server_name, error = %failure, "activation failed; rolling back");
                let rollback = self
                    .unwind(
                        &mut guard,
                        activation_id,
                        DeactivationMode::Temporary,
                        UnwindCause::Rollback,
                    )
                    .await;
                if let Err(err) = guard.remove() {
                    warn!(server = %server_name, error = %err, "failed to deregister instance");
                }
                self.emit(
                    &server_name,
                    Some(activation_id),
                    LifecycleEventKind::ActivationFailed {
                        subsystem: failure.subsystem(),
                        message: failure.to_string(),
                    },
                );
                Err(failure.into_error(&server_name, rollback.failures))
            }
        }
    }

    async fn run_recipe(
        &self,
        guard: &mut InstanceGuard,
        recipe: &Recipe,
        dependencies: &SharedDependencies,
        activation_id: ActivationId,
    ) -> Result<RecipeProgress, StepFailure> {
        let server_name = guard.server_name().clone();
        let mut skipped = Vec::new();
        let mut planned = Vec::new();
        for step in recipe.steps() {
            if let Some(reason) = step.skip_reason() {
                debug!(
                    server = %server_name,
                    subsystem = %step.kind(),
                    reason = reason.as_str(),
                    "skipping subsystem"
                );
                self.emit(
                    &server_name,
                    Some(activation_id),
                    LifecycleEventKind::SubsystemSkipped {
                        subsystem: step.kind(),
                        reason,
                    },
                );
                skipped.push(SkippedSubsystem {
                    subsystem: step.kind(),
                    reason,
                });
                continue;
            }
            let admin = self
                .catalog
                .admin_for(step.kind())
                .map_err(|err| StepFailure::Rejected {
                    subsystem: Some(step.kind()),
                    reason: err.to_string(),
                })?;
            planned.push((step, admin));
        }

        let mut event_source: Option<EventSourceHandle> = None;
        let mut started = Vec::with_capacity(planned.len());
        for (step, admin) in planned {
            let kind = step.kind();
            guard
                .update(|instance| instance.mark_subsystem_starting(kind, &*self.clock))
                .map_err(StepFailure::Bookkeeping)?;
            let step_dependencies = match (step.role().requires_event_source(), &event_source) {
                (false, _) => dependencies.clone(),
                (true, Some(source)) => dependencies.clone().with_event_source(source.clone()),
                (true, None) => {
                    return Err(StepFailure::Rejected {
                        subsystem: Some(kind),
                        reason: LifecycleDomainError::MissingEventSource(kind).to_string(),
                    });
                }
            };

            debug!(server = %server_name, subsystem = %kind, "initializing subsystem");
            let (handle, exported) = admin
                .initialize(step.section(), &step_dependencies)
                .await
                .map_err(|err| StepFailure::from_subsystem(kind, err))?
                .into_parts();
            guard.handles_mut().insert(kind, admin, handle);
            if let Some(source) = exported {
                event_source = Some(source);
            }
            guard
                .update(|instance| instance.mark_subsystem_running(kind, &*self.clock))
                .map_err(StepFailure::Bookkeeping)?;
            self.emit(
                &server_name,
                Some(activation_id),
                LifecycleEventKind::SubsystemStarted { subsystem: kind },
            );
            started.push(kind);
        }

        guard
            .update(|instance| instance.mark_running(&*self.clock))
            .map_err(StepFailure::Bookkeeping)?;
        Ok(RecipeProgress { started, skipped })
    }

    async fn stop_previous(&self, guard: &mut InstanceGuard) -> LifecycleResult<bool> {
        let server_name = guard.server_name().clone();
        let Some(previous) = guard
            .instance()
            .map_err(|err| LifecycleError::from_registry(server_name.as_str(), err))?
        else {
            return Ok(false);
        };

        info!(server = %server_name, "server already active; restarting");
        let activation_id = previous.activation_id();
        self.unwind(
            guard,
            activation_id,
            DeactivationMode::Temporary,
            UnwindCause::Deactivation,
        )
        .await;
        guard
            .remove()
            .map_err(|err| LifecycleError::from_registry(server_name.as_str(), err))?;
        self.emit(
            &server_name,
            Some(activation_id),
            LifecycleEventKind::DeactivationCompleted {
                mode: DeactivationMode::Temporary,
            },
        );
        Ok(true)
    }

    async fn stop(
        &self,
        server_name: ServerName,
        mode: DeactivationMode,
    ) -> LifecycleResult<DeactivationReport> {
        // Permanent deletion always takes the lock so the delete cannot
        // interleave with an activation of the same name.
        let acquired = if mode.is_permanent() {
            self.registry.try_acquire(&server_name).map(Some)
        } else {
            self.registry.try_acquire_existing(&server_name)
        };
        let mut lock = acquired
            .map_err(|err| LifecycleError::from_registry(server_name.as_str(), err))?;
        let current = lock
            .as_ref()
            .map(InstanceGuard::instance)
            .transpose()
            .map_err(|err| LifecycleError::from_registry(server_name.as_str(), err))?
            .flatten();

        let (was_active, outcome) = match (current, lock.as_mut()) {
            (Some(instance), Some(guard)) => {
                info!(server = %server_name, mode = mode.as_str(), "deactivating server");
                let activation_id = instance.activation_id();
                let outcome = self
                    .unwind(guard, activation_id, mode, UnwindCause::Deactivation)
                    .await;
                guard
                    .remove()
                    .map_err(|err| LifecycleError::from_registry(server_name.as_str(), err))?;
                self.emit(
                    &server_name,
                    Some(activation_id),
                    LifecycleEventKind::DeactivationCompleted { mode },
                );
                (true, outcome)
            }
            _ => {
                debug!(server = %server_name, "server not active; nothing to stop");
                (false, UnwindOutcome::default())
            }
        };

        let configuration_deleted = if mode.is_permanent() {
            self.store.delete(&server_name).await?;
            info!(server = %server_name, "stored configuration deleted");
            self.emit(&server_name, None, LifecycleEventKind::ConfigurationDeleted);
            true
        } else {
            false
        };

        Ok(DeactivationReport {
            server_name,
            mode,
            was_active,
            stopped: outcome.stopped,
            shutdown_failures: outcome.failures,
            configuration_deleted,
        })
    }

    /// Shuts down every live subsystem of the guarded instance, newest first.
    ///
    /// Shutdown errors are collected and never stop the unwind. A subsystem
    /// that failed while `STARTING` has no handle and is only marked
    /// inactive.
    async fn unwind(
        &self,
        guard: &mut InstanceGuard,
        activation_id: ActivationId,
        mode: DeactivationMode,
        cause: UnwindCause,
    ) -> UnwindOutcome {
        let server_name = guard.server_name().clone();
        self.record_status(guard, |instance, clock| instance.mark_stopping(clock));
        let live = match guard.instance() {
            Ok(instance) => instance
                .map(|found| found.live_subsystems_newest_first())
                .unwrap_or_default(),
            Err(err) => {
                warn!(server = %server_name, error = %err, "instance record unavailable");
                Vec::new()
            }
        };

        let mut outcome = UnwindOutcome::default();
        for kind in live {
            self.record_status(guard, |instance, clock| {
                instance.mark_subsystem_stopping(kind, clock)
            });
            if let Some(entry) = guard.handles_mut().take(kind) {
                self.shut_down(&server_name, activation_id, entry, mode, cause, &mut outcome)
                    .await;
            }
            self.record_status(guard, |instance, clock| {
                instance.mark_subsystem_inactive(kind, clock)
            });
        }
        for entry in guard.handles_mut().drain_newest_first() {
            self.shut_down(&server_name, activation_id, entry, mode, cause, &mut outcome)
                .await;
        }
        self.record_status(guard, |instance, clock| instance.mark_inactive(clock));
        outcome
    }

    async fn shut_down(
        &self,
        server_name: &ServerName,
        activation_id: ActivationId,
        entry: HandleEntry,
        mode: DeactivationMode,
        cause: UnwindCause,
        outcome: &mut UnwindOutcome,
    ) {
        let HandleEntry {
            kind,
            admin,
            handle,
        } = entry;
        debug!(server = %server_name, subsystem = %kind, mode = mode.as_str(), "shutting down subsystem");
        match admin.shutdown(handle, mode).await {
            Ok(()) => {
                self.emit(
                    server_name,
                    Some(activation_id),
                    LifecycleEventKind::SubsystemStopped { subsystem: kind },
                );
                outcome.stopped.push(kind);
            }
            Err(err) => {
                let message = err.to_string();
                warn!(server = %server_name, subsystem = %kind, error = %message, "subsystem shutdown failed");
                self.emit(
                    server_name,
                    Some(activation_id),
                    cause.failure_event(kind, message.clone()),
                );
                outcome.failures.push(ShutdownFailure {
                    subsystem: kind,
                    message,
                });
            }
        }
    }

    fn record_status(
        &self,
        guard: &InstanceGuard,
        change: impl FnOnce(&mut OperationalInstance, &C) -> Result<(), LifecycleDomainError>,
    ) {
        if let Err(err) = guard.update(|instance| change(instance, &*self.clock)) {
            warn!(server = %guard.server_name(), error = %err, "status change not recorded");
        }
    }

    fn emit(
        &self,
        server_name: &ServerName,
        activation_id: Option<ActivationId>,
        kind: LifecycleEventKind,
    ) {
        self.audit.record(LifecycleEvent {
            server_name: server_name.clone(),
            activation_id,
            occurred_at: self.clock.utc(),
            kind,
        });
    }
}

struct RecipeProgress {
    started: Vec<SubsystemKind>,
    skipped: Vec<SkippedSubsystem>,
}

#[derive(Default)]
struct UnwindOutcome {
    stopped: Vec<SubsystemKind>,
    failures: Vec<ShutdownFailure>,
}

/// Where an activation's configuration document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentSource {
    Stored,
    Supplied,
}

#[derive(Debug, Clone, Copy)]
enum UnwindCause {
    Rollback,
    Deactivation,
}

impl UnwindCause {
    fn failure_event(self, subsystem: SubsystemKind, message: String) -> LifecycleEventKind {
        match self {
            Self::Rollback => LifecycleEventKind::RollbackFailed { subsystem, message },
            Self::Deactivation => LifecycleEventKind::ShutdownFailed { subsystem, message },
        }
    }
}

/// Why a recipe step aborted activation.
enum StepFailure {
    Rejected {
        subsystem: Option<SubsystemKind>,
        reason: String,
    },
    Fault {
        subsystem: SubsystemKind,
        message: String,
    },
    Bookkeeping(RegistryError),
}

impl StepFailure {
    fn from_subsystem(subsystem: SubsystemKind, err: SubsystemError) -> Self {
        match err {
            SubsystemError::Configuration(reason) => Self::Rejected {
                subsystem: Some(subsystem),
                reason,
            },
            SubsystemError::Fault(cause) => Self::Fault {
                subsystem,
                message: cause.to_string(),
            },
        }
    }

    const fn subsystem(&self) -> Option<SubsystemKind> {
        match self {
            Self::Rejected { subsystem, .. } => *subsystem,
            Self::Fault { subsystem, .. } => Some(*subsystem),
            Self::Bookkeeping(_) => None,
        }
    }

    fn into_error(
        self,
        server: &ServerName,
        rollback_failures: Vec<ShutdownFailure>,
    ) -> LifecycleError {
        match self {
            Self::Rejected { subsystem, reason } => LifecycleError::Configuration {
                server: server.clone(),
                subsystem,
                reason,
                rollback_failures,
            },
            Self::Fault { subsystem, message } => LifecycleError::SubsystemFailure {
                server: server.clone(),
                subsystem,
                message,
                rollback_failures,
            },
            Self::Bookkeeping(err) => LifecycleError::from_registry(server.as_str(), err),
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected {
                subsystem: Some(subsystem),
                reason,
            } => write!(formatter, "{subsystem} rejected its configuration: {reason}"),
            Self::Rejected {
                subsystem: None,
                reason,
            } => formatter.write_str(reason),
            Self::Fault { subsystem, message } => write!(formatter, "{subsystem} failed: {message}"),
            Self::Bookkeeping(err) => write!(formatter, "{err}"),
        }
    }
}

fn rejected_configuration(server: &ServerName, err: &LifecycleDomainError) -> LifecycleError {
    LifecycleError::Configuration {
        server: server.clone(),
        subsystem: None,
        reason: err.to_string(),
        rollback_failures: Vec::new(),
    }
}

fn parse_request(user: &str, server: &str) -> LifecycleResult<(UserId, ServerName)> {
    Ok((parse_user(user)?, parse_server(server)?))
}

fn parse_user(user: &str) -> LifecycleResult<UserId> {
    UserId::new(user).map_err(|err| LifecycleError::invalid_parameter("user", &err))
}

fn parse_server(server: &str) -> LifecycleResult<ServerName> {
    ServerName::new(server).map_err(|err| LifecycleError::invalid_parameter("server_name", &err))
}
