//! Connectivity prober for measuring reachability through a proxy

use crate::error::{CheckFailure, ProbeError};
use crate::events::{DiagnosticEvent, EventSink};
use crate::proxy::models::{ProxyConfig, ProxyRoute};
use crate::proxy::reachability::{HttpReachability, ReachabilityCheck};
use crate::proxy::report::{ConnectivityReport, TargetResult};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default timeout for each endpoint check in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default user agent for probe requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default reference endpoints as (name, url)
const DEFAULT_ENDPOINTS: &[(&str, &str)] = &[
    ("google", "https://www.google.com/generate_204"),
    ("cloudflare", "https://www.cloudflare.com/cdn-cgi/trace"),
    ("github", "https://github.com"),
    ("baidu", "https://www.baidu.com"),
];

const LOG_LABEL: &str = "probe";

/// A well-known destination used only to measure connectivity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEndpoint {
    pub name: String,
    pub url: String,
}

impl ReferenceEndpoint {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// Configuration for the connectivity prober
#[derive(Debug, Clone)]
pub struct ProberConfig {
    /// Timeout for each endpoint check
    pub timeout: Duration,
    /// Endpoints probed, in report order
    pub endpoints: Vec<ReferenceEndpoint>,
    /// User agent for probe requests
    pub user_agent: String,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            endpoints: DEFAULT_ENDPOINTS
                .iter()
                .map(|(name, url)| ReferenceEndpoint::new(name, url))
                .collect(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ProberConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Vec<ReferenceEndpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Probes every reference endpoint through a proxy, concurrently
#[derive(Clone)]
pub struct ConnectivityProber {
    config: ProberConfig,
    check: Arc<dyn ReachabilityCheck>,
    sink: Arc<dyn EventSink>,
}

impl ConnectivityProber {
    /// Create a prober with default configuration
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self::with_config(ProberConfig::default(), sink)
    }

    /// Create a prober with custom configuration and the HTTP check
    pub fn with_config(config: ProberConfig, sink: Arc<dyn EventSink>) -> Self {
        let check = Arc::new(HttpReachability::new(config.user_agent.clone()));
        Self {
            config,
            check,
            sink,
        }
    }

    /// Replace the reachability primitive
    pub fn with_check(mut self, check: Arc<dyn ReachabilityCheck>) -> Self {
        self.check = check;
        self
    }

    pub fn config(&self) -> &ProberConfig {
        &self.config
    }

    /// Probe all endpoints through `proxy`. Never fails: a configuration that
    /// cannot be probed yields a single `error` entry.
    pub async fn probe(&self, proxy: &ProxyConfig) -> ConnectivityReport {
        let route = match self.prepare(proxy) {
            Ok(route) => route,
            Err(e) => {
                self.sink.record(
                    DiagnosticEvent::new(LOG_LABEL, "cannot start connectivity probe")
                        .with_error(&e),
                );
                return ConnectivityReport::setup_failure(e.to_string());
            }
        };

        tracing::debug!(%route, endpoints = self.config.endpoints.len(), "probing connectivity");

        // Polled in place, not spawned: dropping the probe drops the checks.
        // join_all keeps the configured endpoint order.
        let checks = self.config.endpoints.iter().cloned().map(|endpoint| {
            check_endpoint(self.check.as_ref(), &route, endpoint, self.config.timeout)
        });
        let targets: Vec<TargetResult> = join_all(checks).await;

        for target in targets.iter().filter(|t| !t.is_reachable()) {
            let message = format!("{} via {} is {}", target.name, route, target.status);
            self.sink.record(
                DiagnosticEvent::new(LOG_LABEL, message)
                    .with_error(target.reason.as_deref().unwrap_or("unknown")),
            );
        }

        ConnectivityReport::new(targets)
    }

    fn prepare(&self, proxy: &ProxyConfig) -> Result<ProxyRoute, ProbeError> {
        let route = proxy.route()?;
        if self.config.endpoints.is_empty() {
            return Err(ProbeError::NoEndpoints);
        }
        Ok(route)
    }
}

async fn check_endpoint(
    check: &dyn ReachabilityCheck,
    route: &ProxyRoute,
    endpoint: ReferenceEndpoint,
    timeout: Duration,
) -> TargetResult {
    let start = Instant::now();
    let outcome = tokio::time::timeout(timeout, check.check(route, &endpoint, timeout)).await;
    let elapsed = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(())) => TargetResult::reachable(endpoint.name, elapsed),
        Ok(Err(CheckFailure::Unreachable(reason))) => {
            TargetResult::unreachable(endpoint.name, elapsed, reason)
        }
        Ok(Err(CheckFailure::Error(reason))) => TargetResult::error(endpoint.name, elapsed, reason),
        Err(_) => TargetResult::unreachable(
            endpoint.name,
            elapsed,
            format!("timeout after {}ms", timeout.as_millis()),
        ),
    }
}
