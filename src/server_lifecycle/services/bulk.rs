//! Sequential activation of a list of servers.
//!
//! Servers start in list order and the first failure stops the run. Servers
//! already started stay running; the error names them so the caller can
//! decide what to do.

use super::{ActivationReport, LifecycleError, LifecycleOrchestrator};
use crate::server_lifecycle::ports::{ConfigurationStore, ServerAuthorization};
use mockable::Clock;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// Outcome of a bulk activation in which every server started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkActivationReport {
    /// Per-server reports in list order.
    pub activated: Vec<ActivationReport>,
}

impl BulkActivationReport {
    /// Returns a one-line human-readable summary.
    #[must_use]
    pub fn message(&self) -> String {
        if self.activated.is_empty() {
            return "no servers to activate".to_owned();
        }
        let names = self
            .activated
            .iter()
            .map(|report| report.server_name.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("activated servers: {names}")
    }
}

/// Bulk activation stopped at a failing server.
#[derive(Debug, Clone, Error)]
#[error("bulk activation stopped at server {failed_server}: {cause}")]
pub struct BulkActivationError {
    /// Servers started before the failure, still running.
    pub activated: Vec<ActivationReport>,
    /// Server whose activation failed, as supplied by the caller.
    pub failed_server: String,
    /// Why it failed.
    pub cause: Box<LifecycleError>,
    /// Servers after the failure that were never attempted.
    pub not_attempted: Vec<String>,
}

impl BulkActivationError {
    /// Returns the diagnostic code of the underlying failure.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.cause.code()
    }

    /// Returns the per-server trail: started, failed, and not attempted.
    #[must_use]
    pub fn trail(&self) -> String {
        let started = self
            .activated
            .iter()
            .map(|report| format!("{}: started", report.server_name));
        let failed = std::iter::once(format!(
            "{}: failed ({}) {}",
            self.failed_server,
            self.cause.code(),
            self.cause
        ));
        let skipped = self
            .not_attempted
            .iter()
            .map(|server| format!("{server}: not attempted"));
        started.chain(failed).chain(skipped).collect::<Vec<_>>().join("; ")
    }
}

impl<S, A, C> LifecycleOrchestrator<S, A, C>
where
    S: ConfigurationStore,
    A: ServerAuthorization,
    C: Clock + Send + Sync,
{
    /// Activates each listed server from its stored configuration, in order.
    ///
    /// An empty list succeeds with an empty report.
    ///
    /// # Errors
    ///
    /// Returns [`BulkActivationError`] for the first server that fails. No
    /// later server is attempted.
    pub async fn activate_list<N>(
        &self,
        user: &str,
        servers: &[N],
    ) -> Result<BulkActivationReport, BulkActivationError>
    where
        N: AsRef<str> + Sync,
    {
        let mut report = BulkActivationReport::default();
        for (position, server) in servers.iter().enumerate() {
            match self.activate_with_stored_config(user, server.as_ref()).await {
                Ok(activated) => report.activated.push(activated),
                Err(cause) => {
                    let not_attempted: Vec<String> = servers
                        .iter()
                        .skip(position + 1)
                        .map(|remaining| remaining.as_ref().to_owned())
                        .collect();
                    warn!(
                        server = server.as_ref(),
                        error = %cause,
                        not_attempted = not_attempted.len(),
                        "bulk activation stopped"
                    );
                    let mut activated = report.activated;
                    activated.retain(|earlier| self.still_running(earlier));
                    return Err(BulkActivationError {
                        activated,
                        failed_server: server.as_ref().to_owned(),
                        cause: Box::new(cause),
                        not_attempted,
                    });
                }
            }
        }
        info!(servers = report.activated.len(), "bulk activation complete");
        Ok(report)
    }

    /// A listed server restarted by a later failing entry is no longer the
    /// instance its report describes.
    fn still_running(&self, report: &ActivationReport) -> bool {
        self.registry()
            .lookup(&report.server_name)
            .is_ok_and(|instance| instance.activation_id() == report.activation_id)
    }
}
