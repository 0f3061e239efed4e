//! Integration tests for the geolocation resolver backends

use proxy_identity::{Backend, GeoResolver, MemorySink, ResolveError, ResolverConfig};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

const CITY_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/city-fixture.mmdb");

fn offline_resolver(sink: Arc<MemorySink>) -> GeoResolver {
    // Generous bound: the first timezone lookup loads the zone polygons
    let config = ResolverConfig::new()
        .with_database_path(CITY_FIXTURE)
        .with_lookup_timeout(Duration::from_secs(30));
    GeoResolver::with_config(config, sink)
}

/// Test a city entry: country and coordinates from the database, zone from coordinates
#[tokio::test]
async fn test_offline_database_hit() {
    let sink = Arc::new(MemorySink::new());
    let resolver = offline_resolver(sink.clone());
    assert!(resolver.has_offline_database());

    let record = resolver.resolve("81.2.69.142", Backend::OfflineDatabase).await;
    assert_eq!(record.ip(), Some("81.2.69.142"));
    assert_eq!(record.country(), Some("GB"));
    assert_eq!(record.coordinates(), Some((51.5142, -0.0931)));
    assert_eq!(record.timezone(), Some("Europe/London"));

    // No zone stored for this entry; it still gets one
    let record = resolver.resolve("89.160.20.113", Backend::OfflineDatabase).await;
    assert_eq!(record.country(), Some("SE"));
    assert_eq!(record.timezone(), Some("Europe/Stockholm"));

    let record = resolver.resolve("67.43.156.7", Backend::OfflineDatabase).await;
    assert_eq!(record.country(), Some("BT"));
    assert!(record.coordinates().is_none());
    assert!(record.timezone().is_none());

    assert!(sink.is_empty());
}

/// Test a public address the database has no entry for
#[tokio::test]
async fn test_offline_database_miss_is_empty() {
    let sink = Arc::new(MemorySink::new());
    let resolver = offline_resolver(sink.clone());

    assert_eq!(
        resolver.try_resolve("8.8.8.8", Backend::OfflineDatabase).await,
        Err(ResolveError::LookupMiss("8.8.8.8".to_string()))
    );

    let record = resolver.resolve("8.8.8.8", Backend::OfflineDatabase).await;
    assert!(record.is_empty());
    assert_eq!(sink.len(), 1);

    // The table backend is independent of the database
    let record = resolver.resolve("8.8.8.8", Backend::InMemoryTable).await;
    assert_eq!(record.country(), Some("US"));
}

/// Test that a corrupt database file disables only the offline backend
#[tokio::test]
async fn test_corrupt_database_degrades_to_empty() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"IP2LOCATION-LITE-DB11 but truncated").unwrap();

    let sink = Arc::new(MemorySink::new());
    let resolver = GeoResolver::with_config(
        ResolverConfig::new().with_database_path(file.path()),
        sink.clone(),
    );

    assert!(!resolver.has_offline_database());
    assert!(matches!(
        resolver.try_resolve("8.8.8.8", Backend::OfflineDatabase).await,
        Err(ResolveError::BackendUnavailable(_))
    ));

    for ip in ["8.8.8.8", "1.1.1.1", "203.0.113.1"] {
        assert!(resolver.resolve(ip, Backend::OfflineDatabase).await.is_empty());
    }

    let record = resolver.resolve("1.1.1.1", Backend::InMemoryTable).await;
    assert_eq!(record.country(), Some("AU"));
    assert!(!sink.is_empty());
}

/// Test the known in-memory entry for Google's resolver
#[tokio::test]
async fn test_table_known_entry() {
    let resolver = GeoResolver::new(Arc::new(MemorySink::new()));
    let record = resolver.resolve("8.8.8.8", Backend::InMemoryTable).await;

    assert_eq!(record.ip(), Some("8.8.8.8"));
    assert!(!record.country().unwrap_or_default().is_empty());
    let (lat, lon) = record.coordinates().unwrap();
    assert!(lat != 0.0 && lon != 0.0);
    assert!(!record.timezone().unwrap_or_default().is_empty());
}

/// Test loading a replacement table from JSON
#[tokio::test]
async fn test_table_from_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"network": "5.6.7.0/24", "country": "DE", "ll": [52.52, 13.405], "timeZone": "Europe/Berlin"}},
            {{"network": "5.6.8.0/24", "country": "NL"}}
        ]"#
    )
    .unwrap();

    let resolver = GeoResolver::with_config(
        ResolverConfig::new().with_table_path(file.path()),
        Arc::new(MemorySink::new()),
    );

    let record = resolver.resolve("5.6.7.8", Backend::InMemoryTable).await;
    assert_eq!(record.country(), Some("DE"));
    assert_eq!(record.timezone(), Some("Europe/Berlin"));

    let record = resolver.resolve("5.6.8.1", Backend::InMemoryTable).await;
    assert_eq!(record.country(), Some("NL"));
    assert!(record.coordinates().is_none());
    assert!(record.timezone().is_none());

    // Built-in data is replaced, not merged
    assert!(resolver.resolve("8.8.8.8", Backend::InMemoryTable).await.is_empty());
}

/// Test that an unreadable table file falls back to the built-in data
#[tokio::test]
async fn test_bad_table_file_falls_back() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"{ not json").unwrap();

    let sink = Arc::new(MemorySink::new());
    let resolver = GeoResolver::with_config(
        ResolverConfig::new().with_table_path(file.path()),
        sink.clone(),
    );

    assert_eq!(sink.len(), 1);
    let record = resolver.resolve("8.8.8.8", Backend::InMemoryTable).await;
    assert_eq!(record.country(), Some("US"));
}

/// Test IPv6 against a configured resolver
#[tokio::test]
async fn test_ipv6_address_only() {
    let resolver = GeoResolver::new(Arc::new(MemorySink::new()));
    for backend in [Backend::OfflineDatabase, Backend::InMemoryTable] {
        let record = resolver.resolve("2606:4700:4700::1111", backend).await;
        assert_eq!(record.ip(), Some("2606:4700:4700::1111"));
        assert!(record.country().is_none());
        assert!(record.coordinates().is_none());
        assert!(record.timezone().is_none());
    }
}
