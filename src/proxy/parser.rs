//! Proxy parser for proxy strings given on the command line or stored as text

use crate::proxy::models::{ProxyConfig, ProxyType};
use once_cell::sync::Lazy;
use regex::Regex;

static URL_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(https?|socks[45]?)://(?:([^:@]+):([^@]*)@)?([^:/@]+):(\d+)/?$")
        .expect("Invalid proxy URL regex")
});

static AUTH_AT_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^:@]+):([^@]*)@([^:@]+):(\d+)$").expect("Invalid user:pass@host regex")
});

/// Proxy parser for turning proxy strings into [`ProxyConfig`] records
pub struct ProxyParser;

impl ProxyParser {
    /// Parse a single proxy line
    ///
    /// Supports formats:
    /// - IP:PORT
    /// - IP:PORT:USER:PASS
    /// - USER:PASS@IP:PORT
    /// - scheme://IP:PORT
    /// - scheme://USER:PASS@IP:PORT
    pub fn parse_line(line: &str, default_type: ProxyType) -> Option<ProxyConfig> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        Self::parse_url_format(line)
            .or_else(|| Self::parse_auth_at_format(line, &default_type))
            .or_else(|| Self::parse_colon_format(line, &default_type))
    }

    /// Parse URL format proxy (e.g., http://ip:port or socks5://user:pass@ip:port)
    fn parse_url_format(line: &str) -> Option<ProxyConfig> {
        let caps = URL_FORMAT.captures(line)?;

        let proxy_type: ProxyType = caps[1].parse().ok()?;
        let port: u16 = caps[5].parse().ok()?;
        let config = ProxyConfig::new(&caps[4], port, proxy_type);

        match (caps.get(2), caps.get(3)) {
            (Some(user), Some(pass)) => Some(config.with_auth(user.as_str(), pass.as_str())),
            _ => Some(config),
        }
    }

    /// Parse user:pass@ip:port format
    fn parse_auth_at_format(line: &str, default_type: &ProxyType) -> Option<ProxyConfig> {
        let caps = AUTH_AT_FORMAT.captures(line)?;
        let port: u16 = caps[4].parse().ok()?;

        Some(ProxyConfig::new(&caps[3], port, default_type.clone()).with_auth(&caps[1], &caps[2]))
    }

    /// Parse ip:port or ip:port:user:pass format
    fn parse_colon_format(line: &str, default_type: &ProxyType) -> Option<ProxyConfig> {
        let parts: Vec<&str> = line.split(':').collect();

        match parts.as_slice() {
            [host, port] => {
                let port: u16 = port.parse().ok()?;
                Some(ProxyConfig::new(*host, port, default_type.clone()))
            }
            [host, port, username, password] => {
                let port: u16 = port.parse().ok()?;
                Some(
                    ProxyConfig::new(*host, port, default_type.clone())
                        .with_auth(*username, *password),
                )
            }
            _ => None,
        }
    }
}
