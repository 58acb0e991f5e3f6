//! Given steps for server lifecycle BDD scenarios.

use std::sync::Arc;

use super::world::{
    LifecycleWorld, metadata_server_config, run_async, server, view_server_config,
};
use caisson::server_lifecycle::{
    adapters::memory::{InMemorySubsystem, ScriptedFailure, in_memory_catalog},
    domain::{AccessServiceKind, SubsystemKind},
    ports::ConfigurationStore,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"a stored metadata server configuration for "{name}""#)]
fn stored_metadata_server(world: &mut LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let server_name = server(&name)?;
    run_async(world.store.save(&server_name, &metadata_server_config()))
        .wrap_err("store metadata server configuration")
}

#[given(r#"a stored view server configuration for "{name}""#)]
fn stored_view_server(world: &mut LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let server_name = server(&name)?;
    run_async(world.store.save(&server_name, &view_server_config()))
        .wrap_err("store view server configuration")
}

#[given(r#"a running metadata server "{name}""#)]
fn running_metadata_server(world: &mut LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let report = run_async(world.orchestrator.activate_with_supplied_config(
        "garygeeke",
        &name,
        metadata_server_config(),
    ))
    .wrap_err("activate metadata server")?;
    eyre::ensure!(
        report.server_name.as_str() == name,
        "activated {} instead of {name}",
        report.server_name
    );
    Ok(())
}

#[given("the asset owner access service fails to start")]
fn asset_owner_fails(world: &mut LifecycleWorld) {
    let owner = SubsystemKind::AccessService(AccessServiceKind::AssetOwner);
    let catalog = in_memory_catalog(&world.journal).with_admin(
        owner,
        Arc::new(
            InMemorySubsystem::new(owner, world.journal.clone())
                .failing_initialize(ScriptedFailure::Fault),
        ),
    );
    world.install_catalog(catalog);
}
