//! Proxy Identity - connectivity prober and exit-IP geolocation
//!
//! Checks that a proxy can reach a fixed set of reference endpoints and
//! resolves the location of an exit IP from an offline database or an
//! in-memory table. Both operations always return a value; failures degrade
//! to empty records or `error` entries and are reported to an event sink.

pub mod error;
pub mod events;
pub mod geo;
pub mod proxy;
pub mod service;

pub use error::{CheckFailure, ProbeError, ResolveError};
pub use events::{DiagnosticEvent, EventSink, MemorySink, NullSink, TracingSink};
pub use geo::{Backend, GeoResolver, LocationRecord, ResolverConfig};
pub use proxy::{ConnectivityProber, ConnectivityReport, ProberConfig, ProxyConfig};
pub use service::{MemoryProxyDirectory, NetworkIdentity, PingResponse, ProxyDirectory};

/// Application result type
pub type Result<T> = anyhow::Result<T>;
