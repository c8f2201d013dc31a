use chrono::{DateTime, Duration, TimeZone, Utc};
use modwatch_core::{
    ChannelId, Guild, GuildId, MessageStyle, ProjectId, ReleaseType, SubscriptionEntry,
    TrackedProject, Version, VersionId,
};
use modwatch_database::InMemoryTrackerStore;
use modwatch_error::StoreErrorKind;
use modwatch_interface::TrackerStore;

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn version(id: &str, minutes: i64) -> Version {
    Version::new(id, "AANobbMI", id, ReleaseType::Release, at(minutes))
}

async fn seeded() -> InMemoryTrackerStore {
    let store = InMemoryTrackerStore::new();
    for (id, title) in [("AANobbMI", "Sodium"), ("P7dR8mSH", "Fabric API")] {
        store
            .track_project(TrackedProject::new(
                ProjectId::new(id),
                title,
                Some(VersionId::new(format!("{id}-v0"))),
            ))
            .await
            .unwrap();
    }
    store
}

#[tokio::test]
async fn test_track_project_keeps_existing_cursor() {
    let store = seeded().await;

    let again = store
        .track_project(TrackedProject::new(ProjectId::new("AANobbMI"), "Sodium", None))
        .await
        .unwrap();

    assert_eq!(again.last_checked_version_id, Some(VersionId::new("AANobbMI-v0")));
    assert_eq!(store.project_count().await, 2);
}

#[tokio::test]
async fn test_update_cursor_moves_and_stamps() {
    let store = seeded().await;
    let now = Utc::now();

    let updated = store
        .update_cursor(&ProjectId::new("AANobbMI"), &version("v2", 20), now)
        .await
        .unwrap();

    assert_eq!(updated.last_checked_version_id, Some(VersionId::new("v2")));
    assert_eq!(updated.cursor_published_at, Some(at(20)));
    assert_eq!(updated.last_checked_at, Some(now));
    let stored = store
        .get_tracked_project(&ProjectId::new("AANobbMI"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn test_update_cursor_on_untracked_project_is_not_found() {
    let store = seeded().await;

    let err = store
        .update_cursor(&ProjectId::new("unknown"), &version("v1", 10), Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err.kind, StoreErrorKind::NotFound(_)));
}

#[tokio::test]
async fn test_update_cursor_refuses_to_move_backwards() {
    let store = seeded().await;
    let id = ProjectId::new("AANobbMI");
    store.update_cursor(&id, &version("v2", 20), Utc::now()).await.unwrap();

    let err = store
        .update_cursor(&id, &version("v1", 10), Utc::now())
        .await
        .unwrap_err();
    store.update_cursor(&id, &version("v2", 20), Utc::now()).await.unwrap();

    assert!(matches!(err.kind, StoreErrorKind::StaleCursor(_)));
    let stored = store.get_tracked_project(&id).await.unwrap().unwrap();
    assert_eq!(stored.last_checked_version_id, Some(VersionId::new("v2")));
}

#[tokio::test]
async fn test_upsert_entry_replaces_existing() {
    let store = seeded().await;
    let entry = SubscriptionEntry::new(GuildId(1), ProjectId::new("AANobbMI"));

    store.upsert_entry(entry.clone()).await.unwrap();
    store
        .upsert_entry(entry.with_channel_id(Some(ChannelId(10))))
        .await
        .unwrap();

    let entries = store
        .list_project_entries(&ProjectId::new("AANobbMI"))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].channel_id, Some(ChannelId(10)));
}

#[tokio::test]
async fn test_upsert_entry_requires_tracked_project() {
    let store = InMemoryTrackerStore::new();

    let result = store
        .upsert_entry(SubscriptionEntry::new(GuildId(1), ProjectId::new("AANobbMI")))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_orphan_sweep_removes_only_unreferenced_projects() {
    let store = seeded().await;
    store
        .upsert_entry(SubscriptionEntry::new(GuildId(1), ProjectId::new("AANobbMI")))
        .await
        .unwrap();

    assert_eq!(store.delete_orphaned_projects().await.unwrap(), 1);
    // A second sweep has nothing left to do
    assert_eq!(store.delete_orphaned_projects().await.unwrap(), 0);

    let remaining = store.list_tracked_projects().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, ProjectId::new("AANobbMI"));
}

#[tokio::test]
async fn test_remove_guild_drops_its_entries_only() {
    let store = seeded().await;
    store.upsert_guild(Guild::new(GuildId(1))).await.unwrap();
    for (guild, project) in [(1, "AANobbMI"), (1, "P7dR8mSH"), (2, "AANobbMI")] {
        store
            .upsert_entry(SubscriptionEntry::new(GuildId(guild), ProjectId::new(project)))
            .await
            .unwrap();
    }

    assert_eq!(store.remove_guild(GuildId(1)).await.unwrap(), 2);
    assert!(store.get_guild(GuildId(1)).await.unwrap().is_none());
    assert!(store.list_guild_entries(GuildId(1)).await.unwrap().is_empty());
    assert_eq!(store.list_guild_entries(GuildId(2)).await.unwrap().len(), 1);

    assert_eq!(store.delete_orphaned_projects().await.unwrap(), 1);
}

#[tokio::test]
async fn test_guild_settings_round_trip() {
    let store = InMemoryTrackerStore::new();
    let guild = Guild::new(GuildId(5)).with_message_style(MessageStyle::Compact);

    store.upsert_guild(guild.clone()).await.unwrap();

    assert_eq!(store.get_guild(GuildId(5)).await.unwrap(), Some(guild));
    assert!(store.get_guild(GuildId(6)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_entry_reports_presence() {
    let store = seeded().await;
    store
        .upsert_entry(SubscriptionEntry::new(GuildId(1), ProjectId::new("AANobbMI")))
        .await
        .unwrap();

    assert!(store.delete_entry(GuildId(1), &ProjectId::new("AANobbMI")).await.unwrap());
    assert!(!store.delete_entry(GuildId(1), &ProjectId::new("AANobbMI")).await.unwrap());
}
