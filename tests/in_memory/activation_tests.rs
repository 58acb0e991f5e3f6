//! In-memory integration tests for server activation.

use super::helpers::{
    Platform, metadata_server_config, platform, server, store_config, view_server_config,
};
use caisson::server_lifecycle::{
    domain::{
        AccessServiceConfig, AccessServiceKind, Classification, LifecycleEventKind,
        ServerConfiguration, ServiceStatus, SkipCondition, SubsystemKind, SubsystemStatus,
    },
    ports::ConfigurationStore,
    services::{LifecycleError, SkippedSubsystem},
};
use rstest::rstest;

const USER: &str = "garygeeke";

fn metadata_startup_order() -> Vec<SubsystemKind> {
    vec![
        SubsystemKind::RepositoryServices,
        SubsystemKind::AccessService(AccessServiceKind::AssetCatalog),
        SubsystemKind::AccessService(AccessServiceKind::AssetOwner),
        SubsystemKind::EnterpriseEventBus,
    ]
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn metadata_server_starts_subsystems_in_recipe_order(platform: Platform) {
    let report = platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoMDS1", metadata_server_config())
        .await
        .expect("activation should succeed");

    assert_eq!(report.classification, Classification::MetadataServer);
    assert_eq!(report.started, metadata_startup_order());
    assert!(!report.restarted);
    assert_eq!(
        platform.journal.initialized(&server("cocoMDS1")),
        metadata_startup_order()
    );

    let status = platform
        .orchestrator
        .active_status(USER, "cocoMDS1")
        .await
        .expect("status should be visible");
    assert_eq!(status.overall_status, SubsystemStatus::Running);
    assert!(
        status
            .subsystems
            .iter()
            .all(|entry| entry.status() == SubsystemStatus::Running)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listeners_register_before_event_delivery_starts(platform: Platform) {
    platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoMDS1", metadata_server_config())
        .await
        .expect("activation should succeed");

    let source = platform
        .journal
        .event_source(&server("cocoMDS1"))
        .expect("repository should export an event source");
    assert_eq!(
        source.listeners(),
        vec![
            SubsystemKind::AccessService(AccessServiceKind::AssetCatalog),
            SubsystemKind::AccessService(AccessServiceKind::AssetOwner),
        ]
    );
    assert!(source.late_listeners().is_empty());
    assert!(source.is_delivering());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_configuration_is_loaded_for_activation(platform: Platform) {
    store_config(&platform, "cocoView1", &view_server_config()).await;

    let report = platform
        .orchestrator
        .activate_with_stored_config(USER, "cocoView1")
        .await
        .expect("activation should succeed");

    assert_eq!(report.classification, Classification::ViewServer);
    assert!(
        platform
            .orchestrator
            .is_server_active(USER, "cocoView1")
            .await
            .expect("query should succeed")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_stored_configuration_is_reported(platform: Platform) {
    let result = platform
        .orchestrator
        .activate_with_stored_config(USER, "cocoMDS9")
        .await;

    let Err(err) = result else {
        panic!("activation without a document should fail");
    };
    assert!(matches!(err, LifecycleError::ConfigurationStore(_)));
    assert_eq!(err.code(), "CAISSON-404-002");
    assert!(platform.journal.calls().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unclassifiable_document_starts_nothing(platform: Platform) {
    let result = platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoEmpty", ServerConfiguration::new())
        .await;

    assert!(matches!(
        result,
        Err(LifecycleError::Configuration {
            subsystem: None,
            ..
        })
    ));
    assert!(platform.journal.calls().is_empty());
    assert!(
        !platform
            .orchestrator
            .is_server_active(USER, "cocoEmpty")
            .await
            .expect("query should succeed")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disabled_service_is_skipped_and_audited(platform: Platform) {
    let owner = SubsystemKind::AccessService(AccessServiceKind::AssetOwner);
    let config = metadata_server_config().with_access_service(
        AccessServiceConfig::new(AccessServiceKind::AssetConsumer)
            .with_status(ServiceStatus::Disabled),
    );

    let report = platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoMDS1", config)
        .await
        .expect("activation should succeed");

    let consumer = SubsystemKind::AccessService(AccessServiceKind::AssetConsumer);
    assert_eq!(
        report.skipped,
        vec![SkippedSubsystem {
            subsystem: consumer,
            reason: SkipCondition::Disabled,
        }]
    );
    assert!(report.started.contains(&owner));
    assert!(
        !platform
            .journal
            .initialized(&server("cocoMDS1"))
            .contains(&consumer)
    );
    assert!(
        platform
            .audit
            .kinds_for(&server("cocoMDS1"))
            .contains(&LifecycleEventKind::SubsystemSkipped {
                subsystem: consumer,
                reason: SkipCondition::Disabled,
            })
    );
    assert!(report.message().ends_with("asset-consumer (disabled)"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_activation_emits_ordered_audit_trail(platform: Platform) {
    platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoMDS1", metadata_server_config())
        .await
        .expect("activation should succeed");

    let mut expected = vec![LifecycleEventKind::ActivationStarted {
        classification: Classification::MetadataServer,
    }];
    expected.extend(
        metadata_startup_order()
            .into_iter()
            .map(|subsystem| LifecycleEventKind::SubsystemStarted { subsystem }),
    );
    expected.push(LifecycleEventKind::ActivationCompleted {
        started: metadata_startup_order(),
    });
    assert_eq!(platform.audit.kinds_for(&server("cocoMDS1")), expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reactivation_restarts_the_running_instance(platform: Platform) {
    let first = platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoMDS1", metadata_server_config())
        .await
        .expect("first activation should succeed");

    let second = platform
        .orchestrator
        .activate_with_stored_config(USER, "cocoMDS1")
        .await
        .expect("reactivation should succeed");

    assert!(second.restarted);
    assert_ne!(first.activation_id, second.activation_id);
    let mut reversed = metadata_startup_order();
    reversed.reverse();
    assert_eq!(platform.journal.shut_down(&server("cocoMDS1")), reversed);
    assert_eq!(
        platform.journal.initialized(&server("cocoMDS1")).len(),
        metadata_startup_order().len() * 2
    );
    let status = platform
        .orchestrator
        .active_status(USER, "cocoMDS1")
        .await
        .expect("status should be visible");
    assert_eq!(status.activation_id, second.activation_id);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn staleness_tracks_the_stored_document(platform: Platform) {
    platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoMDS1", metadata_server_config())
        .await
        .expect("activation should succeed");
    assert!(
        !platform
            .orchestrator
            .is_configuration_stale(USER, "cocoMDS1")
            .await
            .expect("query should succeed")
    );

    let edited = metadata_server_config().with_max_page_size(500);
    store_config(&platform, "cocoMDS1", &edited).await;
    assert!(
        platform
            .orchestrator
            .is_configuration_stale(USER, "cocoMDS1")
            .await
            .expect("query should succeed")
    );

    platform
        .store
        .delete(&server("cocoMDS1"))
        .await
        .expect("delete should succeed");
    assert!(
        platform
            .orchestrator
            .is_configuration_stale(USER, "cocoMDS1")
            .await
            .expect("query should succeed")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn active_configuration_is_the_activation_snapshot(platform: Platform) {
    platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoMDS1", metadata_server_config())
        .await
        .expect("activation should succeed");
    store_config(
        &platform,
        "cocoMDS1",
        &metadata_server_config().with_max_page_size(10),
    )
    .await;

    let active = platform
        .orchestrator
        .active_configuration(USER, "cocoMDS1")
        .await
        .expect("configuration should be visible");

    assert_eq!(active, metadata_server_config());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_supplied_document_is_never_stored(platform: Platform) {
    store_config(&platform, "cocoView1", &view_server_config()).await;
    let mixed = view_server_config()
        .with_access_service(AccessServiceConfig::new(AccessServiceKind::AssetCatalog));

    let result = platform
        .orchestrator
        .activate_with_supplied_config(USER, "cocoView1", mixed)
        .await;

    assert!(matches!(
        result,
        Err(LifecycleError::Configuration {
            subsystem: None,
            ..
        })
    ));
    let stored = platform
        .store
        .load(&server("cocoView1"))
        .await
        .expect("original document should remain");
    assert_eq!(stored, view_server_config());
    assert!(platform.journal.calls().is_empty());
}
