mod test_utils;

use modwatch_core::{
    GuildId, LoaderFilter, ProjectId, ReleaseFilter, ReleaseType, RoleId, VersionId,
};
use modwatch_error::{CatalogErrorKind, ModwatchErrorKind};
use modwatch_interface::TrackerStore;
use modwatch_tracker::DetectionCycle;
use std::time::Duration;
use test_utils::{Harness, typed_version, version};

#[tokio::test]
async fn test_new_versions_delivered_oldest_first() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;

    h.catalog.add_version(version("sodium", "V1", 10));
    h.catalog.add_version(version("sodium", "V2", 20));

    let report = h.cycle(500).run().await.unwrap();

    assert_eq!(h.messenger.titles(100), vec!["Sodium V1", "Sodium V2"]);
    assert_eq!(h.store.cursor("sodium").await, Some(VersionId::new("V2")));
    assert_eq!(report.projects_updated, 1);
    assert_eq!(report.deliveries.sent, 2);
}

#[tokio::test]
async fn test_no_duplicate_delivery_across_cycles() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;
    let cycle = h.cycle(500);

    for (i, id) in ["V1", "V2", "V3"].into_iter().enumerate() {
        h.catalog.add_version(version("sodium", id, 10 * (i as i64 + 1)));
    }
    cycle.run().await.unwrap();
    let second = cycle.run().await.unwrap();
    let third = cycle.run().await.unwrap();

    assert_eq!(h.messenger.titles(100), vec!["Sodium V1", "Sodium V2", "Sodium V3"]);
    assert_eq!(second.deliveries.sent, 0);
    assert_eq!(third.projects_updated, 0);
}

#[tokio::test]
async fn test_cursor_only_moves_forward() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;
    let cycle = h.cycle(500);

    let mut seen = Vec::new();
    for step in 1..=4 {
        if step % 2 == 0 {
            h.catalog.add_version(version("sodium", &format!("V{step}"), step * 10));
        }
        cycle.run().await.unwrap();
        seen.push(h.store.cursor("sodium").await.unwrap());
    }

    assert_eq!(
        seen,
        vec![
            VersionId::new("V0"),
            VersionId::new("V2"),
            VersionId::new("V2"),
            VersionId::new("V4"),
        ]
    );
}

#[tokio::test]
async fn test_filters_applied_per_entry() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;
    h.subscribe(2, "sodium", Some(200)).await;
    h.service
        .set_release_filter(
            GuildId(1),
            &ProjectId::new("sodium"),
            ReleaseFilter::only(&[ReleaseType::Release]),
        )
        .await
        .unwrap();
    h.service
        .set_loader_filter(
            GuildId(2),
            &ProjectId::new("sodium"),
            Some(LoaderFilter::new(["fabric"])),
        )
        .await
        .unwrap();

    h.catalog.add_version(typed_version("sodium", "A", 1, ReleaseType::Alpha, &["fabric"]));
    h.catalog.add_version(typed_version("sodium", "B", 2, ReleaseType::Beta, &["forge"]));
    h.catalog.add_version(typed_version("sodium", "R", 3, ReleaseType::Release, &["forge"]));

    h.cycle(500).run().await.unwrap();

    assert_eq!(h.messenger.titles(100), vec!["Sodium R"]);
    assert_eq!(h.messenger.titles(200), vec!["Sodium A"]);
}

#[tokio::test]
async fn test_store_failure_skips_dispatch_and_retries() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;
    h.catalog.add_version(version("sodium", "V1", 10));
    let cycle = h.cycle(500);

    h.store.fail_cursor("sodium", true);
    let report = cycle.run().await.unwrap();

    assert_eq!(report.projects_skipped_store_failure, 1);
    assert!(h.messenger.sent().is_empty());
    assert_eq!(h.store.cursor("sodium").await, Some(VersionId::new("V0")));

    h.store.fail_cursor("sodium", false);
    cycle.run().await.unwrap();

    assert_eq!(h.messenger.titles(100), vec!["Sodium V1"]);
}

#[tokio::test]
async fn test_delivery_failure_isolated() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;
    h.subscribe(2, "sodium", Some(200)).await;
    h.messenger.deny(100);

    h.catalog.add_version(version("sodium", "V1", 10));
    let report = h.cycle(500).run().await.unwrap();

    assert_eq!(h.messenger.titles(200), vec!["Sodium V1"]);
    assert_eq!(report.deliveries.sent, 1);
    assert_eq!(report.deliveries.failed, 1);
    assert_eq!(h.store.cursor("sodium").await, Some(VersionId::new("V1")));
}

#[tokio::test]
async fn test_entry_without_channel_counted_undeliverable() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", None).await;

    h.catalog.add_version(version("sodium", "V1", 10));
    let report = h.cycle(500).run().await.unwrap();

    assert_eq!(report.deliveries.undeliverable, 1);
    assert!(h.messenger.sent().is_empty());
}

#[tokio::test]
async fn test_role_mention_falls_back_to_guild_ping_role() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;
    h.subscribe(2, "sodium", Some(200)).await;
    h.service
        .set_role(GuildId(1), &ProjectId::new("sodium"), Some(RoleId(11)))
        .await
        .unwrap();
    h.service
        .configure_guild(
            modwatch_core::Guild::new(GuildId(2)).with_ping_role_id(Some(RoleId(22))),
        )
        .await
        .unwrap();

    h.catalog.add_version(version("sodium", "V1", 10));
    h.cycle(500).run().await.unwrap();

    let sent = h.messenger.sent();
    let mention_for = |channel: u64| {
        sent.iter()
            .find(|m| m.channel.0 == channel)
            .and_then(|m| m.mention)
    };
    assert_eq!(mention_for(100), Some(RoleId(11)));
    assert_eq!(mention_for(200), Some(RoleId(22)));
}

#[tokio::test]
async fn test_deleted_cursor_version_never_moves_cursor_back() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;
    let cycle = h.cycle(500);
    h.catalog.add_version(version("sodium", "V1", 10));
    h.catalog.add_version(version("sodium", "V2", 20));
    cycle.run().await.unwrap();
    h.messenger.clear();

    h.catalog.remove_version("sodium", "V2");
    let first = cycle.run().await.unwrap();
    let second = cycle.run().await.unwrap();

    assert_eq!(h.store.cursor("sodium").await, Some(VersionId::new("V2")));
    assert_eq!(first.projects_resynced + second.projects_resynced, 0);
    assert_eq!(first.projects_updated + second.projects_updated, 0);
    assert!(h.messenger.sent().is_empty());

    h.catalog.add_version(version("sodium", "V3", 30));
    cycle.run().await.unwrap();
    assert_eq!(h.messenger.titles(100), vec!["Sodium V3"]);
    assert_eq!(h.store.cursor("sodium").await, Some(VersionId::new("V3")));
}

#[tokio::test]
async fn test_versions_after_deleted_cursor_are_announced() {
    let h = Harness::new();
    h.catalog.publish(
        "sodium",
        "Sodium",
        vec![version("sodium", "V0", 0), version("sodium", "V1", 10)],
    );
    h.subscribe(1, "sodium", Some(100)).await;
    assert_eq!(h.store.cursor("sodium").await, Some(VersionId::new("V1")));

    h.catalog.remove_version("sodium", "V1");
    h.catalog.add_version(version("sodium", "V2", 20));
    let report = h.cycle(500).run().await.unwrap();

    assert_eq!(h.messenger.titles(100), vec!["Sodium V2"]);
    assert_eq!(report.projects_updated, 1);
    assert_eq!(report.projects_resynced, 0);
    assert_eq!(h.store.cursor("sodium").await, Some(VersionId::new("V2")));
}

#[tokio::test]
async fn test_lost_cursor_without_timestamps_sends_one_resync_notice() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.store.track_without_basis("sodium", "V0").await;
    h.subscribe(1, "sodium", Some(100)).await;
    h.subscribe(2, "sodium", None).await;
    let cycle = h.cycle(500);

    h.catalog.remove_version("sodium", "V0");
    h.catalog.add_version(version("sodium", "V1", 10));
    h.catalog.add_version(version("sodium", "V2", 20));

    let first = cycle.run().await.unwrap();
    let second = cycle.run().await.unwrap();

    assert_eq!(first.projects_resynced, 1);
    assert_eq!(first.deliveries.diagnostics_sent, 1);
    assert_eq!(first.deliveries.sent, 0);
    assert_eq!(second.projects_resynced, 0);
    assert_eq!(h.messenger.sent().len(), 1);
    assert!(h.messenger.titles(100)[0].contains("resynchronised"));
    assert_eq!(h.store.cursor("sodium").await, Some(VersionId::new("V2")));
}

#[tokio::test]
async fn test_unset_cursor_anchored_silently() {
    let h = Harness::new();
    h.catalog.publish("fabric", "Fabric API", vec![]);
    h.subscribe(1, "fabric", Some(100)).await;
    assert_eq!(h.store.cursor("fabric").await, None);

    h.catalog.add_version(version("fabric", "F1", 10));
    h.catalog.add_version(version("fabric", "F2", 20));
    let report = h.cycle(500).run().await.unwrap();

    assert_eq!(report.projects_anchored, 1);
    assert!(h.messenger.sent().is_empty());
    assert_eq!(h.store.cursor("fabric").await, Some(VersionId::new("F2")));
}

#[tokio::test]
async fn test_transient_catalog_failure_aborts_cycle() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;
    h.catalog.add_version(version("sodium", "V1", 10));
    let cycle = h.cycle(500);

    h.catalog.fail_with(Some(CatalogErrorKind::Status {
        status: 502,
        message: "bad gateway".to_string(),
    }));
    let err = cycle.run().await.unwrap_err();

    assert!(matches!(err.kind(), ModwatchErrorKind::Catalog(e) if e.is_transient()));
    assert_eq!(h.store.cursor_writes(), 0);
    assert!(h.messenger.sent().is_empty());

    h.catalog.fail_with(None);
    cycle.run().await.unwrap();
    assert_eq!(h.messenger.titles(100), vec!["Sodium V1"]);
}

#[tokio::test]
async fn test_project_missing_upstream_is_skipped() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.catalog.publish("lithium", "Lithium", vec![version("lithium", "L0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;
    h.subscribe(1, "lithium", Some(100)).await;

    h.catalog.hide_project("sodium");
    h.catalog.add_version(version("lithium", "L1", 10));
    let report = h.cycle(500).run().await.unwrap();

    assert_eq!(report.projects_missing, 1);
    assert_eq!(report.projects_updated, 1);
    assert_eq!(h.store.cursor("sodium").await, Some(VersionId::new("V0")));
    assert_eq!(h.messenger.titles(100), vec!["Lithium L1"]);
}

#[tokio::test]
async fn test_project_with_unserved_versions_waits() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;
    let cycle = h.cycle(500);

    h.catalog.add_version(version("sodium", "V1", 10));
    h.catalog.add_version(version("sodium", "V2", 20));
    h.catalog.withhold_version("V1");
    let report = cycle.run().await.unwrap();

    assert_eq!(report.projects_incomplete, 1);
    assert_eq!(report.projects_updated, 0);
    assert!(h.messenger.sent().is_empty());
    assert_eq!(h.store.cursor("sodium").await, Some(VersionId::new("V0")));

    h.catalog.add_version(version("sodium", "V1", 10));
    cycle.run().await.unwrap();
    assert_eq!(h.messenger.titles(100), vec!["Sodium V1", "Sodium V2"]);
}

#[tokio::test]
async fn test_versions_fetched_in_batches() {
    let h = Harness::new();
    let versions = (0..12)
        .map(|i| version("sodium", &format!("V{i:02}"), i))
        .collect();
    h.catalog.publish("sodium", "Sodium", versions);
    h.subscribe(1, "sodium", Some(100)).await;

    h.cycle(5).run().await.unwrap();

    assert_eq!(h.catalog.project_calls(), 1);
    assert_eq!(h.catalog.version_calls(), 3);
}

#[tokio::test]
async fn test_orphans_swept_each_cycle() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;
    h.store
        .delete_entry(GuildId(1), &ProjectId::new("sodium"))
        .await
        .unwrap();
    let cycle = h.cycle(500);

    let first = cycle.run().await.unwrap();
    let second = cycle.run().await.unwrap();

    assert_eq!(first.orphans_removed, 1);
    assert_eq!(second.orphans_removed, 0);
    assert_eq!(second.projects_tracked, 0);
}

#[tokio::test]
async fn test_elapsed_deadline_defers_every_project() {
    let h = Harness::new();
    h.catalog.publish("sodium", "Sodium", vec![version("sodium", "V0", 0)]);
    h.subscribe(1, "sodium", Some(100)).await;
    h.catalog.add_version(version("sodium", "V1", 10));

    let cycle: DetectionCycle = h.cycle(500).with_deadline(Some(Duration::ZERO));
    let report = cycle.run().await.unwrap();

    assert_eq!(report.projects_deferred, 1);
    assert!(h.messenger.sent().is_empty());
    assert_eq!(h.store.cursor("sodium").await, Some(VersionId::new("V0")));

    h.cycle(500).run().await.unwrap();
    assert_eq!(h.messenger.titles(100), vec!["Sodium V1"]);
}
