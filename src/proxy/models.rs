//! Proxy data models

use crate::error::ProbeError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

/// Proxy type enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    #[default]
    Http,
    Https,
    Socks4,
    Socks5,
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Http => write!(f, "http"),
            ProxyType::Https => write!(f, "https"),
            ProxyType::Socks4 => write!(f, "socks4"),
            ProxyType::Socks5 => write!(f, "socks5"),
        }
    }
}

impl FromStr for ProxyType {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(ProxyType::Http),
            "https" => Ok(ProxyType::Https),
            "socks4" => Ok(ProxyType::Socks4),
            "socks5" | "socks" => Ok(ProxyType::Socks5),
            _ => Err(ProbeError::UnsupportedProtocol(s.to_string())),
        }
    }
}

/// Proxy authentication credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

impl ProxyAuth {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

/// Validated proxy endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    pub proxy_type: ProxyType,
    pub auth: Option<ProxyAuth>,
}

impl Proxy {
    /// Create a new proxy without authentication
    pub fn new(host: String, port: u16, proxy_type: ProxyType) -> Self {
        Self {
            host,
            port,
            proxy_type,
            auth: None,
        }
    }

    /// Proxy URL with the credentials percent-encoded into the userinfo
    pub fn url(&self) -> Result<Url, ProbeError> {
        let mut url = self.address_url()?;
        if let Some(auth) = &self.auth {
            let invalid = |_| ProbeError::InvalidAddress(self.redacted_url());
            // '%' is left alone by the userinfo encode set
            url.set_username(&auth.username.replace('%', "%25")).map_err(invalid)?;
            url.set_password(Some(&auth.password.replace('%', "%25"))).map_err(invalid)?;
        }
        Ok(url)
    }

    /// Proxy URL without credentials
    pub fn address_url(&self) -> Result<Url, ProbeError> {
        let host = match self.host.parse::<Ipv6Addr>() {
            Ok(ip) => format!("[{}]", ip),
            Err(_) => self.host.clone(),
        };
        Url::parse(&format!("{}://{}:{}", self.proxy_type, host, self.port))
            .map_err(|e| ProbeError::InvalidAddress(format!("{}: {}", self.redacted_url(), e)))
    }

    /// URL with the password masked, for diagnostics
    pub fn redacted_url(&self) -> String {
        let auth_part = self
            .auth
            .as_ref()
            .map_or(String::new(), |auth| format!("{}:***@", auth.username));

        format!("{}://{}{}:{}", self.proxy_type, auth_part, self.host, self.port)
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted_url())
    }
}

/// Proxy record as persisted with a browsing profile
///
/// All fields empty means "no proxy": probes go out directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProxyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Where probe traffic goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyRoute {
    Direct,
    Via(Proxy),
}

impl fmt::Display for ProxyRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyRoute::Direct => write!(f, "direct"),
            ProxyRoute::Via(proxy) => write!(f, "{}", proxy),
        }
    }
}

impl ProxyConfig {
    /// The "no proxy" sentinel
    pub fn direct() -> Self {
        Self::default()
    }

    pub fn new(host: impl Into<String>, port: u16, proxy_type: ProxyType) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
            protocol: Some(proxy_type.to_string()),
            username: None,
            password: None,
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Check if every field is empty
    pub fn is_direct(&self) -> bool {
        fn blank(field: &Option<String>) -> bool {
            field.as_deref().map_or(true, |s| s.trim().is_empty())
        }

        blank(&self.host)
            && self.port.map_or(true, |p| p == 0)
            && blank(&self.protocol)
            && blank(&self.username)
            && blank(&self.password)
    }

    /// Validate into a route
    pub fn route(&self) -> Result<ProxyRoute, ProbeError> {
        if self.is_direct() {
            return Ok(ProxyRoute::Direct);
        }

        let host = self
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(ProbeError::MissingHost)?;
        let port = self.port.filter(|p| *p != 0).ok_or(ProbeError::MissingPort)?;
        let proxy_type = match self.protocol.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p.parse()?,
            _ => ProxyType::default(),
        };
        // reqwest only speaks SOCKS5
        if proxy_type == ProxyType::Socks4 {
            return Err(ProbeError::UnsupportedProtocol(proxy_type.to_string()));
        }

        let auth = match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), pass) if !user.is_empty() => Some(ProxyAuth::new(
                user.to_string(),
                pass.unwrap_or_default().to_string(),
            )),
            _ => None,
        };

        let proxy = Proxy {
            host: host.to_string(),
            port,
            proxy_type,
            auth,
        };
        proxy.url()?;
        Ok(ProxyRoute::Via(proxy))
    }
}
