//! Geolocation module for resolving exit-IP locations
//!
//! This module provides functionality for:
//! - Looking up IPv4 addresses in an offline MMDB database
//! - Looking up IPv4 addresses in an in-memory range table
//! - Deriving timezones from coordinates
//! - Normalizing results into a [`LocationRecord`]

pub mod offline;
pub mod record;
pub mod resolver;
pub mod source;
pub mod table;
pub mod timezone;

pub use offline::OfflineDatabase;
pub use record::LocationRecord;
pub use resolver::{Backend, GeoResolver, ResolverConfig};
pub use source::{LocationSource, SourceHit};
pub use table::{InMemoryTable, TableEntry};
pub use timezone::{TimezoneLookup, TzfLookup};
