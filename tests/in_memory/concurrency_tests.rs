//! In-memory integration tests for per-server operation exclusion.

use std::sync::Arc;

use super::helpers::{
    metadata_server_config, platform_with, server, store_config, view_server_config,
};
use caisson::server_lifecycle::{
    adapters::memory::{InMemorySubsystem, InitializeGate, in_memory_catalog},
    domain::{SubsystemKind, SubsystemStatus},
    ports::ConfigurationStore,
    services::LifecycleError,
};
use rstest::rstest;

const USER: &str = "garygeeke";

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn operations_on_a_busy_server_are_rejected() {
    let gate = InitializeGate::new();
    let gated = gate.clone();
    let platform = platform_with(move |journal| {
        in_memory_catalog(journal).with_admin(
            SubsystemKind::RepositoryServices,
            Arc::new(
                InMemorySubsystem::new(SubsystemKind::RepositoryServices, journal.clone())
                    .gated(gated),
            ),
        )
    });
    store_config(&platform, "cocoMDS1", &metadata_server_config()).await;

    let orchestrator = Arc::clone(&platform.orchestrator);
    let activation = tokio::spawn(async move {
        orchestrator
            .activate_with_stored_config(USER, "cocoMDS1")
            .await
    });
    gate.entered().await;

    let second = platform
        .orchestrator
        .activate_with_stored_config(USER, "cocoMDS1")
        .await;
    let stop = platform
        .orchestrator
        .deactivate_temporarily(USER, "cocoMDS1")
        .await;
    let Err(err) = second else {
        panic!("second activation should be rejected");
    };
    assert!(matches!(err, LifecycleError::LifecycleInProgress(_)));
    assert_eq!(err.code(), "CAISSON-409-001");
    assert!(matches!(stop, Err(LifecycleError::LifecycleInProgress(_))));

    let status = platform
        .orchestrator
        .active_status(USER, "cocoMDS1")
        .await
        .expect("a starting instance should be visible");
    assert_eq!(status.overall_status, SubsystemStatus::Starting);

    gate.release();
    let report = activation
        .await
        .expect("activation task should not panic")
        .expect("gated activation should succeed");
    assert!(!report.restarted);
    assert_eq!(
        platform.journal.initialized(&server("cocoMDS1")).len(),
        report.started.len()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn different_servers_proceed_independently() {
    let gate = InitializeGate::new();
    let gated = gate.clone();
    let platform = platform_with(move |journal| {
        in_memory_catalog(journal).with_admin(
            SubsystemKind::RepositoryServices,
            Arc::new(
                InMemorySubsystem::new(SubsystemKind::RepositoryServices, journal.clone())
                    .gated(gated),
            ),
        )
    });
    store_config(&platform, "cocoMDS1", &metadata_server_config()).await;

    let orchestrator = Arc::clone(&platform.orchestrator);
    let activation = tokio::spawn(async move {
        orchestrator
            .activate_with_stored_config(USER, "cocoMDS1")
            .await
    });
    gate.entered().await;

    let view = platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoView1", view_server_config())
        .await
        .expect("an unrelated server should activate");
    assert_eq!(view.started.len(), 2);

    gate.release();
    activation
        .await
        .expect("activation task should not panic")
        .expect("gated activation should succeed");
    assert_eq!(
        platform
            .orchestrator
            .active_server_names(USER)
            .await
            .expect("listing should succeed"),
        vec![server("cocoMDS1"), server("cocoView1")]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_supplied_activation_leaves_the_stored_document() {
    let gate = InitializeGate::new();
    let gated = gate.clone();
    let platform = platform_with(move |journal| {
        in_memory_catalog(journal).with_admin(
            SubsystemKind::RepositoryServices,
            Arc::new(
                InMemorySubsystem::new(SubsystemKind::RepositoryServices, journal.clone())
                    .gated(gated),
            ),
        )
    });
    store_config(&platform, "cocoMDS1", &metadata_server_config()).await;

    let orchestrator = Arc::clone(&platform.orchestrator);
    let activation = tokio::spawn(async move {
        orchestrator
            .activate_with_stored_config(USER, "cocoMDS1")
            .await
    });
    gate.entered().await;

    let competing = platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoMDS1", view_server_config())
        .await;
    assert!(matches!(
        competing,
        Err(LifecycleError::LifecycleInProgress(_))
    ));
    let stored = platform
        .store
        .load(&server("cocoMDS1"))
        .await
        .expect("stored document should remain");
    assert_eq!(stored, metadata_server_config());

    gate.release();
    activation
        .await
        .expect("activation task should not panic")
        .expect("gated activation should succeed");
    assert!(
        !platform
            .orchestrator
            .is_configuration_stale(USER, "cocoMDS1")
            .await
            .expect("staleness check should succeed")
    );
}
