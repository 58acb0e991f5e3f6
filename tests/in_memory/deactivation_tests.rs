//! In-memory integration tests for deactivation and platform shutdown.

use std::sync::Arc;

use super::helpers::{
    Platform, metadata_server_config, platform, platform_with, server, store_config,
    view_server_config,
};
use caisson::server_lifecycle::{
    adapters::memory::{InMemorySubsystem, ScriptedFailure, in_memory_catalog},
    domain::{AccessServiceKind, DeactivationMode, LifecycleEventKind, SubsystemKind},
    services::LifecycleError,
};
use rstest::rstest;

const USER: &str = "garygeeke";

fn metadata_shutdown_order() -> Vec<SubsystemKind> {
    vec![
        SubsystemKind::EnterpriseEventBus,
        SubsystemKind::AccessService(AccessServiceKind::AssetOwner),
        SubsystemKind::AccessService(AccessServiceKind::AssetCatalog),
        SubsystemKind::RepositoryServices,
    ]
}

async fn activate_metadata_server(platform: &Platform) {
    platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoMDS1", metadata_server_config())
        .await
        .expect("activation should succeed");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn temporary_deactivation_stops_newest_first_and_keeps_document(platform: Platform) {
    activate_metadata_server(&platform).await;

    let report = platform
        .orchestrator
        .deactivate_temporarily(USER, "cocoMDS1")
        .await
        .expect("deactivation should succeed");

    assert!(report.was_active);
    assert!(!report.configuration_deleted);
    assert_eq!(report.stopped, metadata_shutdown_order());
    assert_eq!(
        platform.journal.shut_down(&server("cocoMDS1")),
        metadata_shutdown_order()
    );
    assert!(
        platform
            .journal
            .shutdown_modes(&server("cocoMDS1"))
            .iter()
            .all(|mode| *mode == DeactivationMode::Temporary)
    );
    assert_eq!(
        platform
            .store
            .stored_server_names()
            .expect("store should list"),
        vec![server("cocoMDS1")]
    );
    assert!(
        !platform
            .orchestrator
            .is_server_active(USER, "cocoMDS1")
            .await
            .expect("query should succeed")
    );
    let source = platform
        .journal
        .event_source(&server("cocoMDS1"))
        .expect("event source should have been exported");
    assert!(!source.is_delivering());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn permanent_deactivation_deletes_the_stored_document(platform: Platform) {
    activate_metadata_server(&platform).await;

    let report = platform
        .orchestrator
        .deactivate_permanently(USER, "cocoMDS1")
        .await
        .expect("deactivation should succeed");

    assert!(report.configuration_deleted);
    assert!(
        platform
            .journal
            .shutdown_modes(&server("cocoMDS1"))
            .iter()
            .all(|mode| *mode == DeactivationMode::Permanent)
    );
    assert!(
        platform
            .store
            .stored_server_names()
            .expect("store should list")
            .is_empty()
    );
    let kinds = platform.audit.kinds_for(&server("cocoMDS1"));
    assert_eq!(
        kinds.last(),
        Some(&LifecycleEventKind::ConfigurationDeleted)
    );
    assert!(report.message().ends_with("stored configuration deleted"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stopping_an_inactive_server_is_a_no_op(platform: Platform) {
    for _ in 0..2 {
        let report = platform
            .orchestrator
            .deactivate_temporarily(USER, "cocoMDS1")
            .await
            .expect("deactivation should succeed");
        assert!(!report.was_active);
        assert!(report.stopped.is_empty());
        assert_eq!(report.message(), "server cocoMDS1 was not active");
    }
    assert!(platform.journal.calls().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn permanent_deactivation_of_inactive_server_still_deletes(platform: Platform) {
    store_config(&platform, "cocoView1", &view_server_config()).await;

    let report = platform
        .orchestrator
        .deactivate_permanently(USER, "cocoView1")
        .await
        .expect("deactivation should succeed");

    assert!(!report.was_active);
    assert!(report.configuration_deleted);
    assert!(
        platform
            .store
            .stored_server_names()
            .expect("store should list")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn shutdown_errors_are_reported_without_stopping_the_unwind() {
    let catalog_kind = SubsystemKind::AccessService(AccessServiceKind::AssetCatalog);
    let platform = platform_with(|journal| {
        in_memory_catalog(journal).with_admin(
            catalog_kind,
            Arc::new(
                InMemorySubsystem::new(catalog_kind, journal.clone())
                    .failing_shutdown(ScriptedFailure::Fault),
            ),
        )
    });
    activate_metadata_server(&platform).await;

    let report = platform
        .orchestrator
        .deactivate_temporarily(USER, "cocoMDS1")
        .await
        .expect("deactivation should succeed despite shutdown errors");

    assert_eq!(
        platform.journal.shut_down(&server("cocoMDS1")),
        metadata_shutdown_order()
    );
    assert!(!report.stopped.contains(&catalog_kind));
    let failed: Vec<_> = report
        .shutdown_failures
        .iter()
        .map(|failure| failure.subsystem)
        .collect();
    assert_eq!(failed, vec![catalog_kind]);
    assert!(
        platform
            .audit
            .kinds_for(&server("cocoMDS1"))
            .iter()
            .any(|kind| matches!(kind, LifecycleEventKind::ShutdownFailed { subsystem, .. } if *subsystem == catalog_kind))
    );
    assert!(
        !platform
            .orchestrator
            .is_server_active(USER, "cocoMDS1")
            .await
            .expect("query should succeed")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_of_a_stopped_server_is_not_active(platform: Platform) {
    activate_metadata_server(&platform).await;
    platform
        .orchestrator
        .deactivate_temporarily(USER, "cocoMDS1")
        .await
        .expect("deactivation should succeed");

    let result = platform.orchestrator.active_status(USER, "cocoMDS1").await;

    let Err(err) = result else {
        panic!("status of a stopped server should fail");
    };
    assert!(matches!(err, LifecycleError::NotActive(_)));
    assert_eq!(err.code(), "CAISSON-404-001");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn platform_shutdown_stops_every_server(platform: Platform) {
    activate_metadata_server(&platform).await;
    platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoView1", view_server_config())
        .await
        .expect("activation should succeed");

    let report = platform
        .orchestrator
        .shutdown_all(USER, DeactivationMode::Temporary)
        .await
        .expect("shutdown should succeed");

    assert!(report.is_clean());
    let stopped: Vec<_> = report
        .stopped
        .iter()
        .map(|entry| entry.server_name.clone())
        .collect();
    assert_eq!(stopped, vec![server("cocoMDS1"), server("cocoView1")]);
    assert!(
        platform
            .orchestrator
            .active_server_names(USER)
            .await
            .expect("listing should succeed")
            .is_empty()
    );
    assert_eq!(
        platform
            .store
            .stored_server_names()
            .expect("store should list")
            .len(),
        2
    );
}
