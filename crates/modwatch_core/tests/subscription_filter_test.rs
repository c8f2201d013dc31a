use chrono::{Duration, TimeZone, Utc};
use modwatch_core::{
    GuildId, LoaderFilter, ProjectId, ReleaseFilter, ReleaseType, SubscriptionEntry, Version,
    newest_first,
};

fn version(id: &str, release_type: ReleaseType, loaders: &[&str]) -> Version {
    let published = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    Version::new(id, "P", id, release_type, published).with_loaders(loaders.iter().copied())
}

fn entry() -> SubscriptionEntry {
    SubscriptionEntry::new(GuildId(7), ProjectId::new("P"))
}

#[test]
fn test_release_only_filter_rejects_prereleases() {
    let entry = entry().with_release_filter(ReleaseFilter::only(&[ReleaseType::Release]));

    let admitted: Vec<_> = [
        version("a", ReleaseType::Alpha, &["fabric"]),
        version("b", ReleaseType::Beta, &["fabric"]),
        version("r", ReleaseType::Release, &["fabric"]),
    ]
    .into_iter()
    .filter(|v| entry.admits(v))
    .map(|v| v.id.0)
    .collect();

    assert_eq!(admitted, vec!["r".to_string()]);
}

#[test]
fn test_loader_filter_requires_intersection() {
    let entry = entry().with_loader_filter(Some(LoaderFilter::new(["fabric"])));

    assert!(!entry.admits(&version("forge-only", ReleaseType::Release, &["forge"])));
    assert!(entry.admits(&version("both", ReleaseType::Release, &["forge", "fabric"])));
}

#[test]
fn test_loader_filter_is_case_insensitive() {
    let entry = entry().with_loader_filter(Some(LoaderFilter::new(["NeoForge"])));
    assert!(entry.admits(&version("v", ReleaseType::Beta, &["neoforge"])));
}

#[test]
fn test_unset_loader_filter_admits_untagged_versions() {
    let entry = entry();
    assert!(entry.admits(&version("bare", ReleaseType::Alpha, &[])));
}

#[test]
fn test_empty_release_filter_admits_nothing() {
    let entry = entry().with_release_filter(ReleaseFilter::NONE);
    assert!(!entry.admits(&version("r", ReleaseType::Release, &[])));
}

#[test]
fn test_newest_first_orders_by_publish_time_then_id() {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut versions = vec![
        Version::new("old", "P", "1", ReleaseType::Release, base),
        Version::new("new", "P", "3", ReleaseType::Release, base + Duration::hours(2)),
        Version::new("mid-a", "P", "2a", ReleaseType::Release, base + Duration::hours(1)),
        Version::new("mid-b", "P", "2b", ReleaseType::Release, base + Duration::hours(1)),
    ];
    versions.sort_by(newest_first);

    let ids: Vec<_> = versions.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "mid-b", "mid-a", "old"]);
}

#[test]
fn test_entry_serializes_filter_as_bits() {
    let entry = entry().with_release_filter(ReleaseFilter::only(&[ReleaseType::Beta]));
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["release_filter"], 2);
}
