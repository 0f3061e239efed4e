//! Geolocation resolver
//!
//! Routes an address to one of two backends and normalizes the answer into a
//! [`LocationRecord`]. The public [`GeoResolver::resolve`] never fails: every
//! error collapses to an empty (or address-only) record and is reported to the
//! event sink.

use crate::error::ResolveError;
use crate::events::{DiagnosticEvent, EventSink};
use crate::geo::offline::OfflineDatabase;
use crate::geo::record::LocationRecord;
use crate::geo::source::{LocationSource, SourceHit};
use crate::geo::table::InMemoryTable;
use crate::geo::timezone::{TimezoneLookup, TzfLookup};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Default bound on a single backend lookup in milliseconds
const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 3000;

const LOG_LABEL: &str = "geo";

/// Geolocation data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Backend {
    /// Binary database on disk; timezone derived from coordinates
    OfflineDatabase,
    /// Range table held in memory; timezone carried by the entry
    InMemoryTable,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::OfflineDatabase => write!(f, "offline"),
            Backend::InMemoryTable => write!(f, "table"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "offline" | "ip2location" | "offlinedatabase" => Ok(Backend::OfflineDatabase),
            "table" | "geoip" | "inmemorytable" => Ok(Backend::InMemoryTable),
            _ => Err(format!(
                "Invalid backend: {}. Use: offline (ip2location), table (geoip)",
                s
            )),
        }
    }
}

/// Configuration for the geolocation resolver
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Path to the offline MMDB database
    pub database_path: Option<PathBuf>,
    /// JSON file replacing the built-in range table
    pub table_path: Option<PathBuf>,
    /// Upper bound on a single backend lookup
    pub lookup_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            table_path: None,
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn with_table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_path = Some(path.into());
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }
}

#[derive(Clone)]
enum OfflineSlot {
    Ready(Arc<dyn LocationSource>),
    Unavailable(String),
}

/// Resolves IP addresses to location records
#[derive(Clone)]
pub struct GeoResolver {
    offline: OfflineSlot,
    table: Arc<dyn LocationSource>,
    timezones: Arc<dyn TimezoneLookup>,
    sink: Arc<dyn EventSink>,
    lookup_timeout: Duration,
}

impl GeoResolver {
    /// Resolver with no offline database and the built-in table
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            offline: OfflineSlot::Unavailable("no offline database configured".to_string()),
            table: Arc::new(InMemoryTable::builtin()),
            timezones: Arc::new(TzfLookup),
            sink,
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
        }
    }

    /// Open the configured backends. Load failures are recorded, not returned:
    /// a missing database leaves the offline backend unavailable and a bad
    /// table file falls back to the built-in table.
    pub fn with_config(config: ResolverConfig, sink: Arc<dyn EventSink>) -> Self {
        let mut resolver = Self::new(sink).with_lookup_timeout(config.lookup_timeout);

        if let Some(path) = &config.database_path {
            match OfflineDatabase::open(path) {
                Ok(db) => {
                    tracing::info!(path = %path.display(), "offline geolocation database loaded");
                    resolver.offline = OfflineSlot::Ready(Arc::new(db));
                }
                Err(e) => {
                    resolver.sink.record(
                        DiagnosticEvent::new(LOG_LABEL, "failed to open offline database")
                            .with_error(&e),
                    );
                    resolver.offline = OfflineSlot::Unavailable(e.to_string());
                }
            }
        }

        if let Some(path) = &config.table_path {
            match InMemoryTable::from_json_path(path) {
                Ok(table) => resolver.table = Arc::new(table),
                Err(e) => resolver.sink.record(
                    DiagnosticEvent::new(LOG_LABEL, "failed to load table, using built-in data")
                        .with_error(format!("{:#}", e)),
                ),
            }
        }

        resolver
    }

    /// Use an already-open offline backend
    pub fn with_offline_source(mut self, source: Arc<dyn LocationSource>) -> Self {
        self.offline = OfflineSlot::Ready(source);
        self
    }

    pub fn with_table(mut self, table: Arc<dyn LocationSource>) -> Self {
        self.table = table;
        self
    }

    pub fn with_timezones(mut self, timezones: Arc<dyn TimezoneLookup>) -> Self {
        self.timezones = timezones;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Check if the offline backend is open
    pub fn has_offline_database(&self) -> bool {
        matches!(self.offline, OfflineSlot::Ready(_))
    }

    /// Resolve `ip` with `backend`, degrading every failure to an empty record.
    /// IPv6 input yields a record holding only the address.
    pub async fn resolve(&self, ip: &str, backend: Backend) -> LocationRecord {
        match self.try_resolve(ip, backend).await {
            Ok(record) => record,
            Err(ResolveError::UnsupportedAddressFamily(ip)) => {
                tracing::debug!(ip = %ip, %backend, "skipping IPv6 geolocation");
                LocationRecord::address_only(ip)
            }
            Err(e) => {
                self.sink.record(
                    DiagnosticEvent::new(LOG_LABEL, format!("lookup {} via {}", ip, backend))
                        .with_error(&e),
                );
                LocationRecord::empty()
            }
        }
    }

    /// Resolve keeping the failure cause
    pub async fn try_resolve(
        &self,
        ip: &str,
        backend: Backend,
    ) -> Result<LocationRecord, ResolveError> {
        let ip = ip.trim();
        let addr: IpAddr = ip
            .parse()
            .map_err(|_| ResolveError::InvalidAddress(ip.to_string()))?;

        let v4 = match addr {
            IpAddr::V6(_) => return Err(ResolveError::UnsupportedAddressFamily(ip.to_string())),
            IpAddr::V4(v4) => v4,
        };

        if is_reserved(v4) {
            return Err(ResolveError::ReservedAddress(v4.to_string()));
        }

        let source = match backend {
            Backend::OfflineDatabase => match &self.offline {
                OfflineSlot::Ready(source) => Arc::clone(source),
                OfflineSlot::Unavailable(reason) => {
                    return Err(ResolveError::BackendUnavailable(reason.clone()))
                }
            },
            Backend::InMemoryTable => Arc::clone(&self.table),
        };
        let timezones = Arc::clone(&self.timezones);

        let lookup = tokio::task::spawn_blocking(move || -> Result<LocationRecord, ResolveError> {
            let hit = source.locate(v4)?;
            Ok(build_record(v4, backend, hit, timezones.as_ref()))
        });

        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ResolveError::MalformedRecord(join_err.to_string())),
            Err(_) => Err(ResolveError::Timeout(self.lookup_timeout.as_millis() as u64)),
        }
    }
}

fn build_record(
    ip: Ipv4Addr,
    backend: Backend,
    hit: SourceHit,
    timezones: &dyn TimezoneLookup,
) -> LocationRecord {
    let coordinates = hit.coordinates();
    let timezone = match backend {
        // Zero in either axis is treated as "no data" and skips the lookup
        Backend::OfflineDatabase => coordinates
            .filter(|(lat, lon)| *lat != 0.0 && *lon != 0.0)
            .and_then(|(lat, lon)| timezones.first(lat, lon)),
        Backend::InMemoryTable => hit.timezone,
    };

    LocationRecord::located(ip.to_string(), hit.country, coordinates, timezone)
}

/// Ranges that are never looked up
fn is_reserved(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_unspecified()
        || ip.is_multicast()
        || octets[0] == 0
        || octets[0] >= 240
        // 100.64.0.0/10 carrier-grade NAT
        || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
}
