//! In-memory integration tests for ordered bulk activation.

use std::sync::Arc;

use super::helpers::{
    Platform, metadata_server_config, platform, platform_with, server, store_config,
    view_server_config,
};
use caisson::server_lifecycle::{
    adapters::memory::{InMemorySubsystem, ScriptedFailure, in_memory_catalog},
    domain::{AccessServiceKind, SubsystemKind},
};
use rstest::rstest;

const USER: &str = "garygeeke";

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn servers_start_in_list_order(platform: Platform) {
    store_config(&platform, "cocoView1", &view_server_config()).await;
    store_config(&platform, "cocoMDS1", &metadata_server_config()).await;

    let report = platform
        .orchestrator
        .activate_list(USER, &["cocoView1", "cocoMDS1"])
        .await
        .expect("bulk activation should succeed");

    let names: Vec<_> = report
        .activated
        .iter()
        .map(|entry| entry.server_name.clone())
        .collect();
    assert_eq!(names, vec![server("cocoView1"), server("cocoMDS1")]);
    assert_eq!(report.message(), "activated servers: cocoView1, cocoMDS1");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_list_activates_nothing(platform: Platform) {
    let servers: [&str; 0] = [];

    let report = platform
        .orchestrator
        .activate_list(USER, &servers)
        .await
        .expect("empty bulk activation should succeed");

    assert!(report.activated.is_empty());
    assert_eq!(report.message(), "no servers to activate");
    assert!(platform.journal.calls().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_failure_stops_the_run(platform: Platform) {
    store_config(&platform, "cocoMDS1", &metadata_server_config()).await;
    store_config(&platform, "cocoView1", &view_server_config()).await;
    let servers = vec![
        "cocoMDS1".to_owned(),
        "cocoMDS2".to_owned(),
        "cocoView1".to_owned(),
    ];

    let result = platform.orchestrator.activate_list(USER, &servers).await;

    let Err(err) = result else {
        panic!("bulk activation should stop at the missing document");
    };
    assert_eq!(err.failed_server, "cocoMDS2");
    assert_eq!(err.code(), "CAISSON-404-002");
    assert_eq!(err.activated.len(), 1);
    assert_eq!(err.not_attempted, vec!["cocoView1".to_owned()]);
    let trail = err.trail();
    assert!(trail.starts_with("cocoMDS1: started; cocoMDS2: failed (CAISSON-404-002)"));
    assert!(trail.ends_with("cocoView1: not attempted"));
    assert_eq!(
        platform
            .orchestrator
            .active_server_names(USER)
            .await
            .expect("listing should succeed"),
        vec![server("cocoMDS1")]
    );
    assert!(platform.journal.initialized(&server("cocoView1")).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_restart_is_not_reported_as_started() {
    let owner = SubsystemKind::AccessService(AccessServiceKind::AssetOwner);
    let platform = platform_with(move |journal| {
        in_memory_catalog(journal).with_admin(
            owner,
            Arc::new(
                InMemorySubsystem::new(owner, journal.clone())
                    .failing_initialize_after(1, ScriptedFailure::Fault),
            ),
        )
    });
    store_config(&platform, "cocoMDS1", &metadata_server_config()).await;

    let result = platform
        .orchestrator
        .activate_list(USER, &["cocoMDS1", "cocoMDS1"])
        .await;

    let Err(err) = result else {
        panic!("the restart should fail");
    };
    assert_eq!(err.failed_server, "cocoMDS1");
    assert!(err.activated.is_empty());
    assert!(err.trail().starts_with("cocoMDS1: failed"));
    assert!(
        platform
            .orchestrator
            .active_server_names(USER)
            .await
            .expect("listing should succeed")
            .is_empty()
    );
}
