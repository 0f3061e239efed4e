//! Seam between the resolver and its backends

use crate::error::ResolveError;
use std::net::Ipv4Addr;

/// Raw fields a backend returned for an address
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceHit {
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Only set by backends that carry timezones natively
    pub timezone: Option<String>,
}

impl SourceHit {
    /// Coordinates, only when both halves are present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// A geolocation backend that can be queried for IPv4 addresses
pub trait LocationSource: Send + Sync {
    fn locate(&self, ip: Ipv4Addr) -> Result<SourceHit, ResolveError>;
}
