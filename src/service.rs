//! Boundary operations: locate an IP, ping a window's proxy

use crate::events::{DiagnosticEvent, EventSink};
use crate::geo::{Backend, GeoResolver, LocationRecord};
use crate::proxy::{ConnectivityProber, ProxyConfig, TargetResult};
use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Lookup of the proxy attached to a browsing window
#[async_trait]
pub trait ProxyDirectory: Send + Sync {
    /// `Ok(None)` when the window has no proxy configured
    async fn proxy_for_window(&self, window_id: u64) -> Result<Option<ProxyConfig>>;
}

/// Window to proxy mapping held in process
#[derive(Debug, Default)]
pub struct MemoryProxyDirectory {
    proxies: RwLock<HashMap<u64, ProxyConfig>>,
}

impl MemoryProxyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, window_id: u64, proxy: ProxyConfig) {
        self.proxies.write().insert(window_id, proxy);
    }

    pub fn remove(&self, window_id: u64) -> Option<ProxyConfig> {
        self.proxies.write().remove(&window_id)
    }
}

#[async_trait]
impl ProxyDirectory for MemoryProxyDirectory {
    async fn proxy_for_window(&self, window_id: u64) -> Result<Option<ProxyConfig>> {
        Ok(self.proxies.read().get(&window_id).cloned())
    }
}

/// Response body of the ping operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PingResponse {
    pub pings: Vec<TargetResult>,
}

/// Resolver, prober and directory wired together
#[derive(Clone)]
pub struct NetworkIdentity {
    resolver: GeoResolver,
    prober: ConnectivityProber,
    directory: Arc<dyn ProxyDirectory>,
    sink: Arc<dyn EventSink>,
}

impl NetworkIdentity {
    pub fn new(
        resolver: GeoResolver,
        prober: ConnectivityProber,
        directory: Arc<dyn ProxyDirectory>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            resolver,
            prober,
            directory,
            sink,
        }
    }

    pub fn resolver(&self) -> &GeoResolver {
        &self.resolver
    }

    pub fn prober(&self) -> &ConnectivityProber {
        &self.prober
    }

    /// `{ip, backend}` → record; a missing or blank address gives the empty record
    pub async fn locate(&self, ip: Option<&str>, backend: Backend) -> LocationRecord {
        match ip.map(str::trim).filter(|ip| !ip.is_empty()) {
            Some(ip) => self.resolver.resolve(ip, backend).await,
            None => LocationRecord::empty(),
        }
    }

    /// `{windowId}` → pings. Windows without a proxy, and directory failures,
    /// fall back to probing direct connectivity.
    pub async fn ping(&self, window_id: u64) -> PingResponse {
        let proxy = match self.directory.proxy_for_window(window_id).await {
            Ok(Some(proxy)) => proxy,
            Ok(None) => ProxyConfig::direct(),
            Err(e) => {
                self.sink.record(
                    DiagnosticEvent::new("probe", format!("loading proxy for window {}", window_id))
                        .with_error(format!("{:#}", e)),
                );
                ProxyConfig::direct()
            }
        };

        let report = self.prober.probe(&proxy).await;
        PingResponse {
            pings: report.targets,
        }
    }
}
