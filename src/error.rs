//! Error types for geolocation and probing
//!
//! None of these escape the public `resolve`/`probe` operations; they exist so
//! the internal steps (and their tests) can tell failure causes apart.

use thiserror::Error;

/// Why a geolocation lookup produced no (or only a partial) record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// The input is not an IP literal
    #[error("invalid IP address: {0}")]
    InvalidAddress(String),

    /// IPv6 input; neither backend handles it
    #[error("IPv6 address {0} is not supported by the geolocation backends")]
    UnsupportedAddressFamily(String),

    /// Private, loopback, documentation and other non-public ranges
    #[error("{0} is in a reserved address range")]
    ReservedAddress(String),

    /// Offline database missing, unreadable or corrupt
    #[error("geolocation backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend has no entry for the address
    #[error("no geolocation entry for {0}")]
    LookupMiss(String),

    /// The backend has an entry but it could not be decoded
    #[error("malformed geolocation record: {0}")]
    MalformedRecord(String),

    /// The lookup did not finish within the configured bound
    #[error("geolocation lookup timed out after {0}ms")]
    Timeout(u64),
}

/// Failure to set up a probe at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("proxy configuration has a host but no port")]
    MissingPort,

    #[error("proxy configuration has a port but no host")]
    MissingHost,

    #[error("unsupported proxy protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("invalid proxy address {0}")]
    InvalidAddress(String),

    #[error("no reference endpoints configured")]
    NoEndpoints,
}

/// Outcome of a single failed reachability check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckFailure {
    /// The check ran and the endpoint could not be reached through the route
    #[error("{0}")]
    Unreachable(String),

    /// The check could not be issued
    #[error("{0}")]
    Error(String),
}
