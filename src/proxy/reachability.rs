//! Reachability primitive used by the prober

use crate::error::CheckFailure;
use crate::proxy::models::{Proxy, ProxyRoute, ProxyType};
use crate::proxy::prober::ReferenceEndpoint;
use async_trait::async_trait;
use reqwest::{Client, Proxy as ReqwestProxy};
use std::fmt;
use std::time::Duration;

/// One connectivity check against one endpoint through one route
#[async_trait]
pub trait ReachabilityCheck: Send + Sync {
    async fn check(
        &self,
        route: &ProxyRoute,
        endpoint: &ReferenceEndpoint,
        timeout: Duration,
    ) -> Result<(), CheckFailure>;
}

/// HTTP GET through the route; any 2xx/3xx answer counts as reachable
#[derive(Debug, Clone)]
pub struct HttpReachability {
    user_agent: String,
}

impl HttpReachability {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    /// Create a reqwest client for the route
    fn create_client(&self, route: &ProxyRoute, timeout: Duration) -> Result<Client, CheckFailure> {
        let builder = Client::builder()
            .timeout(timeout)
            .user_agent(self.user_agent.as_str());

        let builder = match route {
            ProxyRoute::Direct => builder.no_proxy(),
            ProxyRoute::Via(proxy) => builder.proxy(client_proxy(proxy)?),
        };

        builder.build().map_err(setup_failed)
    }
}

/// Reference endpoints mix http and https, so proxy both schemes
fn client_proxy(proxy: &Proxy) -> Result<ReqwestProxy, CheckFailure> {
    match (&proxy.proxy_type, &proxy.auth) {
        // Basic credentials are sent as given, not round-tripped through the URL
        (ProxyType::Http | ProxyType::Https, Some(auth)) => {
            let url = proxy.address_url().map_err(setup_failed)?;
            Ok(ReqwestProxy::all(url)
                .map_err(setup_failed)?
                .basic_auth(&auth.username, &auth.password))
        }
        _ => ReqwestProxy::all(proxy.url().map_err(setup_failed)?).map_err(setup_failed),
    }
}

fn setup_failed(e: impl fmt::Display) -> CheckFailure {
    CheckFailure::Error(format!("client setup failed: {}", e))
}

#[async_trait]
impl ReachabilityCheck for HttpReachability {
    async fn check(
        &self,
        route: &ProxyRoute,
        endpoint: &ReferenceEndpoint,
        timeout: Duration,
    ) -> Result<(), CheckFailure> {
        let client = self.create_client(route, timeout)?;

        match client.get(&endpoint.url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() || status.is_redirection() {
                    Ok(())
                } else {
                    Err(CheckFailure::Unreachable(format!("HTTP status: {}", status)))
                }
            }
            Err(e) if e.is_builder() => Err(CheckFailure::Error(e.to_string())),
            Err(e) if e.is_timeout() => Err(CheckFailure::Unreachable("timeout".to_string())),
            Err(e) => Err(CheckFailure::Unreachable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::ProxyAuth;

    fn with_auth(proxy_type: ProxyType, username: &str, password: &str) -> ProxyRoute {
        let mut proxy = Proxy::new("127.0.0.1".to_string(), 8080, proxy_type);
        proxy.auth = Some(ProxyAuth::new(username.to_string(), password.to_string()));
        ProxyRoute::Via(proxy)
    }

    #[test]
    fn test_create_direct_client() {
        let check = HttpReachability::new("test-agent");
        assert!(check
            .create_client(&ProxyRoute::Direct, Duration::from_secs(1))
            .is_ok());
    }

    #[test]
    fn test_create_proxied_client() {
        let check = HttpReachability::new("test-agent");
        let route = ProxyRoute::Via(Proxy::new("127.0.0.1".to_string(), 1080, ProxyType::Socks5));
        assert!(check.create_client(&route, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_create_client_with_url_delimiters_in_password() {
        let check = HttpReachability::new("test-agent");
        for proxy_type in [ProxyType::Http, ProxyType::Https, ProxyType::Socks5] {
            for password in ["p/ss", "p#ss", "p?ss", "p/ss#?", "100%"] {
                let route = with_auth(proxy_type.clone(), "user", password);
                let client = check.create_client(&route, Duration::from_secs(1));
                assert!(client.is_ok(), "{} with {:?}: {:?}", proxy_type, password, client.err());
            }
        }
    }

    #[tokio::test]
    async fn test_invalid_endpoint_url_is_error() {
        let check = HttpReachability::new("test-agent");
        let endpoint = ReferenceEndpoint::new("broken", "not a url");
        let result = check
            .check(&ProxyRoute::Direct, &endpoint, Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(CheckFailure::Error(_))));
    }
}
