//! Offline binary geolocation database (MMDB city format)

use crate::error::ResolveError;
use crate::geo::source::{LocationSource, SourceHit};
use maxminddb::{geoip2, Reader};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;

/// Read-only handle on an MMDB city database
///
/// The reader is never mutated after opening, so clones share it freely
/// across concurrent lookups.
pub struct OfflineDatabase {
    reader: Arc<Reader<Vec<u8>>>,
}

impl OfflineDatabase {
    /// Open the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let reader = Reader::open_readfile(path).map_err(|e| {
            ResolveError::BackendUnavailable(format!("{}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "opened offline geolocation database");
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    /// Wrap database bytes that are already in memory
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ResolveError> {
        let reader = Reader::from_source(bytes)
            .map_err(|e| ResolveError::BackendUnavailable(e.to_string()))?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }
}

impl LocationSource for OfflineDatabase {
    fn locate(&self, ip: Ipv4Addr) -> Result<SourceHit, ResolveError> {
        let lookup_result = self
            .reader
            .lookup(IpAddr::V4(ip))
            .map_err(|e| ResolveError::MalformedRecord(e.to_string()))?;

        let city: Option<geoip2::City> = lookup_result
            .decode()
            .map_err(|e| ResolveError::MalformedRecord(e.to_string()))?;

        let Some(city) = city else {
            return Err(ResolveError::LookupMiss(ip.to_string()));
        };

        Ok(SourceHit {
            country: city.country.iso_code.map(String::from),
            latitude: city.location.latitude,
            longitude: city.location.longitude,
            timezone: None,
        })
    }
}

impl Clone for OfflineDatabase {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
        }
    }
}
