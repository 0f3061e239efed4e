//! Location record returned by the resolver

use serde::{Deserialize, Serialize};
use std::fmt;

/// Best-effort geolocation for an IP address
///
/// Every field is optional so the record can express three states: empty
/// (resolution failed), address-only (IPv6) and located.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LocationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip: Option<String>,
    /// ISO 3166-1 alpha-2 country code (e.g., "US", "CN")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    /// Latitude and longitude
    #[serde(default, rename = "ll", skip_serializing_if = "Option::is_none")]
    coordinates: Option<(f64, f64)>,
    /// IANA timezone (e.g., "America/New_York")
    #[serde(default, rename = "timeZone", skip_serializing_if = "Option::is_none")]
    timezone: Option<String>,
}

impl LocationRecord {
    /// The "resolution failed" record, with no field set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Record carrying only the queried address
    pub fn address_only(ip: impl Into<String>) -> Self {
        Self {
            ip: Some(ip.into()),
            ..Default::default()
        }
    }

    /// Record for a located address. A timezone without coordinates is dropped.
    pub fn located(
        ip: impl Into<String>,
        country: Option<String>,
        coordinates: Option<(f64, f64)>,
        timezone: Option<String>,
    ) -> Self {
        let timezone = coordinates.and(timezone);
        Self {
            ip: Some(ip.into()),
            country: country.filter(|c| !c.is_empty()),
            coordinates,
            timezone: timezone.filter(|tz| !tz.is_empty()),
        }
    }

    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.coordinates
    }

    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    /// Check if no field is set
    pub fn is_empty(&self) -> bool {
        self.ip.is_none()
            && self.country.is_none()
            && self.coordinates.is_none()
            && self.timezone.is_none()
    }

    /// Check if the record has location data beyond the address
    pub fn is_located(&self) -> bool {
        self.country.is_some() || self.coordinates.is_some()
    }
}

impl fmt::Display for LocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(ip) = &self.ip else {
            return write!(f, "Unknown Location");
        };

        write!(f, "{}", ip)?;
        if let Some(country) = &self.country {
            write!(f, " {}", country)?;
        }
        if let Some((lat, lon)) = self.coordinates {
            write!(f, " ({:.4}, {:.4})", lat, lon)?;
        }
        if let Some(tz) = &self.timezone {
            write!(f, " {}", tz)?;
        }
        Ok(())
    }
}
