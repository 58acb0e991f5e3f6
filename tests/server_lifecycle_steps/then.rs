//! Then steps for server lifecycle BDD scenarios.

use super::world::{LifecycleWorld, run_async, server};
use caisson::server_lifecycle::{
    domain::{AccessServiceKind, SubsystemKind},
    ports::{ConfigurationStore, ConfigurationStoreError},
    services::ActivationReport,
};
use eyre::eyre;
use rstest_bdd_macros::then;

/// Returns the last activation report, failing if activation failed.
fn activation_report(world: &LifecycleWorld) -> Result<&ActivationReport, eyre::Report> {
    match world.last_activation.as_ref() {
        Some(Ok(report)) => Ok(report),
        Some(Err(err)) => Err(eyre!("activation failed: {err}")),
        None => Err(eyre!("no activation was attempted")),
    }
}

fn is_active(world: &LifecycleWorld, name: &str) -> Result<bool, eyre::Report> {
    run_async(world.orchestrator.is_server_active("garygeeke", name))
        .map_err(|err| eyre!("activity query failed: {err}"))
}

#[then("the activation succeeds")]
fn activation_succeeds(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    activation_report(world).map(|_| ())
}

#[then(r#"the activation fails with code "{code}""#)]
fn activation_fails_with(world: &LifecycleWorld, code: String) -> Result<(), eyre::Report> {
    match world.last_activation.as_ref() {
        Some(Err(err)) if err.code() == code => Ok(()),
        Some(Err(err)) => Err(eyre!("expected {code}, got {}: {err}", err.code())),
        Some(Ok(_)) => Err(eyre!("activation unexpectedly succeeded")),
        None => Err(eyre!("no activation was attempted")),
    }
}

#[then("the subsystems started in recipe order")]
fn started_in_recipe_order(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let report = activation_report(world)?;
    let expected = vec![
        SubsystemKind::RepositoryServices,
        SubsystemKind::AccessService(AccessServiceKind::AssetCatalog),
        SubsystemKind::AccessService(AccessServiceKind::AssetOwner),
        SubsystemKind::EnterpriseEventBus,
    ];
    eyre::ensure!(
        report.started == expected,
        "unexpected startup order: {:?}",
        report.started
    );
    let initialized = world.journal.initialized(&report.server_name);
    eyre::ensure!(
        initialized == expected,
        "unexpected initialize calls: {initialized:?}"
    );
    Ok(())
}

#[then("all listeners registered before event delivery began")]
fn listeners_before_delivery(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let report = activation_report(world)?;
    let source = world
        .journal
        .event_source(&report.server_name)
        .ok_or_else(|| eyre!("no event source was exported"))?;
    eyre::ensure!(source.is_delivering(), "event delivery never started");
    eyre::ensure!(
        source.late_listeners().is_empty(),
        "late listeners: {:?}",
        source.late_listeners()
    );
    Ok(())
}

#[then("no subsystem after the asset owner was initialized")]
fn nothing_initialized_after_failure(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let initialized = world.journal.initialized(&server("cocoMDS1")?);
    let expected = vec![
        SubsystemKind::RepositoryServices,
        SubsystemKind::AccessService(AccessServiceKind::AssetCatalog),
        SubsystemKind::AccessService(AccessServiceKind::AssetOwner),
    ];
    eyre::ensure!(
        initialized == expected,
        "unexpected initialize calls: {initialized:?}"
    );
    eyre::ensure!(
        !initialized.contains(&SubsystemKind::EnterpriseEventBus),
        "event bus started after a failed step"
    );
    Ok(())
}

#[then("the started subsystems were shut down newest first")]
fn started_subsystems_shut_down(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let stopped = world.journal.shut_down(&server("cocoMDS1")?);
    let expected = vec![
        SubsystemKind::AccessService(AccessServiceKind::AssetCatalog),
        SubsystemKind::RepositoryServices,
    ];
    eyre::ensure!(stopped == expected, "unexpected shutdown order: {stopped:?}");
    Ok(())
}

#[then("no subsystem was initialized")]
fn no_subsystem_initialized(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let calls = world.journal.calls();
    eyre::ensure!(calls.is_empty(), "unexpected admin calls: {calls:?}");
    Ok(())
}

#[then(r#""{name}" is reported active"#)]
fn reported_active(world: &LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    eyre::ensure!(is_active(world, &name)?, "{name} should be active");
    Ok(())
}

#[then(r#""{name}" is reported inactive"#)]
fn reported_inactive(world: &LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    eyre::ensure!(!is_active(world, &name)?, "{name} should be inactive");
    Ok(())
}

#[then(r#"the stored configuration for "{name}" is kept"#)]
fn stored_configuration_kept(world: &LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    run_async(world.store.load(&server(&name)?))
        .map(|_| ())
        .map_err(|err| eyre!("stored configuration missing: {err}"))
}

#[then(r#"the stored configuration for "{name}" is deleted"#)]
fn stored_configuration_deleted(world: &LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    match run_async(world.store.load(&server(&name)?)) {
        Err(ConfigurationStoreError::NotFound(_)) => Ok(()),
        Err(err) => Err(eyre!("unexpected store error: {err}")),
        Ok(_) => Err(eyre!("configuration for {name} is still stored")),
    }
}

#[then("the deactivation succeeds")]
fn deactivation_succeeds(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    match world.last_deactivation.as_ref() {
        Some(Ok(report)) if report.was_active => Ok(()),
        Some(Ok(_)) => Err(eyre!("no instance was running")),
        Some(Err(err)) => Err(eyre!("deactivation failed: {err}")),
        None => Err(eyre!("no deactivation was attempted")),
    }
}

#[then(r#"bulk activation stops at "{name}""#)]
fn bulk_stops_at(world: &LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    match world.last_bulk.as_ref() {
        Some(Err(err)) if err.failed_server == name => Ok(()),
        Some(Err(err)) => Err(eyre!("bulk activation stopped at {}", err.failed_server)),
        Some(Ok(_)) => Err(eyre!("bulk activation unexpectedly succeeded")),
        None => Err(eyre!("no bulk activation was attempted")),
    }
}

#[then(r#""{name}" was not attempted"#)]
fn not_attempted(world: &LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let Some(Err(err)) = world.last_bulk.as_ref() else {
        return Err(eyre!("bulk activation did not fail"));
    };
    eyre::ensure!(
        err.not_attempted.contains(&name),
        "{name} missing from not attempted: {:?}",
        err.not_attempted
    );
    eyre::ensure!(
        world.journal.initialized(&server(&name)?).is_empty(),
        "{name} was initialized"
    );
    Ok(())
}
