//! Proxy module for probing connectivity through a proxy
//!
//! This module provides functionality for:
//! - Parsing proxies from various formats (IP:PORT, IP:PORT:USER:PASS, etc.)
//! - Validating persisted proxy records into a probe route
//! - Probing reference endpoints concurrently through the route

pub mod models;
pub mod parser;
pub mod prober;
pub mod reachability;
pub mod report;

pub use models::{Proxy, ProxyAuth, ProxyConfig, ProxyRoute, ProxyType};
pub use parser::ProxyParser;
pub use prober::{ConnectivityProber, ProberConfig, ReferenceEndpoint};
pub use reachability::{HttpReachability, ReachabilityCheck};
pub use report::{ConnectivityReport, TargetResult, TargetStatus};
