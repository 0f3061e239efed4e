//! In-memory IPv4 range table

use crate::error::ResolveError;
use crate::geo::source::{LocationSource, SourceHit};
use crate::Result;
use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

/// One table row, keyed by an IPv4 network in CIDR notation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub network: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, rename = "ll")]
    pub coordinates: Option<(f64, f64)>,
    #[serde(default, rename = "timeZone")]
    pub timezone: Option<String>,
}

impl TableEntry {
    pub fn new(network: &str, country: &str, coordinates: (f64, f64), timezone: &str) -> Self {
        Self {
            network: network.to_string(),
            country: Some(country.to_string()),
            coordinates: Some(coordinates),
            timezone: Some(timezone.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
struct Range {
    start: u32,
    end: u32,
    entry: TableEntry,
}

/// Sorted, non-overlapping IPv4 ranges searched by bisection
#[derive(Debug, Clone)]
pub struct InMemoryTable {
    ranges: Vec<Range>,
}

impl InMemoryTable {
    /// Build a table; fails on malformed or overlapping networks
    pub fn from_entries(entries: Vec<TableEntry>) -> Result<Self> {
        let mut ranges = entries
            .into_iter()
            .map(|entry| -> Result<Range> {
                let (start, end) = parse_cidr(&entry.network)?;
                Ok(Range { start, end, entry })
            })
            .collect::<Result<Vec<_>>>()?;

        ranges.sort_by_key(|r| r.start);

        for pair in ranges.windows(2) {
            if pair[1].start <= pair[0].end {
                bail!(
                    "overlapping networks {} and {}",
                    pair[0].entry.network,
                    pair[1].entry.network
                );
            }
        }

        Ok(Self { ranges })
    }

    /// Load entries from a JSON array file
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading table {}", path.display()))?;
        let entries: Vec<TableEntry> = serde_json::from_str(&content)
            .with_context(|| format!("parsing table {}", path.display()))?;
        let table = Self::from_entries(entries)?;
        tracing::info!(path = %path.display(), entries = table.len(), "loaded geolocation table");
        Ok(table)
    }

    /// Table seeded with a handful of well-known public resolver ranges
    pub fn builtin() -> Self {
        let ranges = builtin_entries()
            .into_iter()
            .filter_map(|entry| {
                let (start, end) = parse_cidr(&entry.network).ok()?;
                Some(Range { start, end, entry })
            })
            .collect::<Vec<_>>();
        let mut table = Self { ranges };
        table.ranges.sort_by_key(|r| r.start);
        table
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    fn find(&self, ip: Ipv4Addr) -> Option<&TableEntry> {
        let ip = u32::from(ip);
        let idx = self.ranges.partition_point(|r| r.start <= ip);
        let range = self.ranges.get(idx.checked_sub(1)?)?;
        (ip <= range.end).then_some(&range.entry)
    }
}

impl Default for InMemoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LocationSource for InMemoryTable {
    fn locate(&self, ip: Ipv4Addr) -> std::result::Result<SourceHit, ResolveError> {
        let entry = self
            .find(ip)
            .ok_or_else(|| ResolveError::LookupMiss(ip.to_string()))?;

        Ok(SourceHit {
            country: entry.country.clone(),
            latitude: entry.coordinates.map(|(lat, _)| lat),
            longitude: entry.coordinates.map(|(_, lon)| lon),
            timezone: entry.timezone.clone(),
        })
    }
}

/// Parse `a.b.c.d/len` (or a bare address) into an inclusive u32 range
fn parse_cidr(network: &str) -> Result<(u32, u32)> {
    let (addr, len) = match network.split_once('/') {
        Some((addr, len)) => (addr, len.trim()),
        None => (network, "32"),
    };

    let addr: Ipv4Addr = addr
        .trim()
        .parse()
        .map_err(|e| anyhow!("invalid network {}: {}", network, e))?;
    let len: u32 = len
        .parse()
        .map_err(|e| anyhow!("invalid prefix length in {}: {}", network, e))?;
    if len > 32 {
        bail!("invalid prefix length in {}: {}", network, len);
    }

    let mask = if len == 0 { 0 } else { u32::MAX << (32 - len) };
    let start = u32::from(addr) & mask;
    Ok((start, start | !mask))
}

fn builtin_entries() -> Vec<TableEntry> {
    vec![
        TableEntry::new("1.1.1.0/24", "AU", (-33.494, 143.2104), "Australia/Sydney"),
        TableEntry::new("8.8.4.0/24", "US", (37.751, -97.822), "America/Chicago"),
        TableEntry::new("8.8.8.0/24", "US", (37.751, -97.822), "America/Chicago"),
        TableEntry::new("9.9.9.0/24", "US", (37.751, -97.822), "America/Chicago"),
        TableEntry::new("114.114.114.0/24", "CN", (34.7732, 113.722), "Asia/Shanghai"),
        TableEntry::new("208.67.222.0/24", "US", (37.751, -97.822), "America/Chicago"),
        TableEntry::new("223.5.5.0/24", "CN", (30.2936, 120.1614), "Asia/Shanghai"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cidr() {
        assert_eq!(
            parse_cidr("10.0.0.0/8").unwrap(),
            (u32::from(Ipv4Addr::new(10, 0, 0, 0)), u32::from(Ipv4Addr::new(10, 255, 255, 255)))
        );
        let single = u32::from(Ipv4Addr::new(1, 2, 3, 4));
        assert_eq!(parse_cidr("1.2.3.4").unwrap(), (single, single));
        assert_eq!(parse_cidr("0.0.0.0/0").unwrap(), (0, u32::MAX));
    }

    #[test]
    fn test_parse_cidr_invalid() {
        assert!(parse_cidr("1.2.3/24").is_err());
        assert!(parse_cidr("1.2.3.4/33").is_err());
        assert!(parse_cidr("1.2.3.4/abc").is_err());
    }

    #[test]
    fn test_builtin_lookup() {
        let table = InMemoryTable::builtin();
        assert!(!table.is_empty());

        let hit = table.locate(Ipv4Addr::new(8, 8, 8, 8)).unwrap();
        assert_eq!(hit.country.as_deref(), Some("US"));
        assert_eq!(hit.coordinates(), Some((37.751, -97.822)));
        assert_eq!(hit.timezone.as_deref(), Some("America/Chicago"));
    }

    #[test]
    fn test_lookup_range_edges() {
        let table = InMemoryTable::from_entries(vec![TableEntry::new(
            "5.6.7.0/24",
            "DE",
            (51.0, 9.0),
            "Europe/Berlin",
        )])
        .unwrap();

        assert!(table.locate(Ipv4Addr::new(5, 6, 7, 0)).is_ok());
        assert!(table.locate(Ipv4Addr::new(5, 6, 7, 255)).is_ok());
        assert_eq!(
            table.locate(Ipv4Addr::new(5, 6, 8, 0)),
            Err(ResolveError::LookupMiss("5.6.8.0".to_string()))
        );
        assert!(table.locate(Ipv4Addr::new(5, 6, 6, 255)).is_err());
    }

    #[test]
    fn test_overlapping_entries_rejected() {
        let result = InMemoryTable::from_entries(vec![
            TableEntry::new("10.0.0.0/8", "US", (1.0, 1.0), "UTC"),
            TableEntry::new("10.1.0.0/16", "US", (1.0, 1.0), "UTC"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_entry_json_shape() {
        let json = r#"[{"network":"5.6.7.0/24","country":"DE","ll":[51.0,9.0],"timeZone":"Europe/Berlin"},
                       {"network":"5.6.9.0/24","country":"FR"}]"#;
        let entries: Vec<TableEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].coordinates, Some((51.0, 9.0)));
        assert_eq!(entries[1].coordinates, None);

        let table = InMemoryTable::from_entries(entries).unwrap();
        let hit = table.locate(Ipv4Addr::new(5, 6, 9, 1)).unwrap();
        assert_eq!(hit.country.as_deref(), Some("FR"));
        assert_eq!(hit.coordinates(), None);
    }
}
