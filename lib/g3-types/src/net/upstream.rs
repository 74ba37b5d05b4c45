/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use anyhow::anyhow;

use super::Host;

/// A destination address, which may still need to be resolved.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct UpstreamAddr {
    host: Host,
    port: u16,
}

impl UpstreamAddr {
    pub fn new(host: Host, port: u16) -> Self {
        UpstreamAddr { host, port }
    }

    pub fn empty() -> Self {
        UpstreamAddr {
            host: Host::empty(),
            port: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }

    pub fn from_ip_and_port(ip: IpAddr, port: u16) -> Self {
        UpstreamAddr {
            host: Host::Ip(ip),
            port,
        }
    }

    pub fn from_host_str_and_port(host: &str, port: u16) -> anyhow::Result<Self> {
        let host = Host::from_str(host)?;
        Ok(UpstreamAddr { host, port })
    }

    pub fn from_url_host_and_port(host: url::Host, port: u16) -> Self {
        UpstreamAddr {
            host: Host::from(host),
            port,
        }
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn host_str(&self) -> String {
        self.host.to_string()
    }

    /// Return the socket address if the host is an ip address.
    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        match &self.host {
            Host::Ip(ip) => Some(SocketAddr::new(*ip, self.port)),
            Host::Domain(_) => None,
        }
    }
}

impl From<SocketAddr> for UpstreamAddr {
    fn from(addr: SocketAddr) -> Self {
        UpstreamAddr::from_ip_and_port(addr.ip(), addr.port())
    }
}

impl fmt::Display for UpstreamAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Host::Ip(IpAddr::V6(ip6)) => write!(f, "[{ip6}]:{}", self.port),
            host => write!(f, "{host}:{}", self.port),
        }
    }
}

impl FromStr for UpstreamAddr {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(p) = memrchr_colon(s) else {
            return Err(anyhow!("no port found"));
        };
        let host = &s[..p];
        let port =
            u16::from_str(&s[p + 1..]).map_err(|e| anyhow!("invalid port {}: {e}", &s[p + 1..]))?;
        if host.starts_with(':') || (host.contains(':') && !host.starts_with('[')) {
            // bare ipv6 without brackets is ambiguous
            return Err(anyhow!("ipv6 address should be enclosed in brackets"));
        }
        UpstreamAddr::from_host_str_and_port(host, port)
    }
}

fn memrchr_colon(s: &str) -> Option<usize> {
    s.as_bytes().iter().rposition(|b| *b == b':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn display() {
        let a = UpstreamAddr::from_ip_and_port(IpAddr::V6(Ipv6Addr::LOCALHOST), 80);
        assert_eq!(a.to_string(), "[::1]:80");
        let a = UpstreamAddr::from_host_str_and_port("example.net", 443).unwrap();
        assert_eq!(a.to_string(), "example.net:443");
    }

    #[test]
    fn parse() {
        let a = UpstreamAddr::from_str("127.0.0.1:1080").unwrap();
        assert_eq!(a.host(), &Host::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert_eq!(a.port(), 1080);
        assert_eq!(
            a.to_socket_addr(),
            Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 1080))
        );

        let a = UpstreamAddr::from_str("[::1]:8388").unwrap();
        assert_eq!(a.host(), &Host::Ip(IpAddr::V6(Ipv6Addr::LOCALHOST)));

        let a = UpstreamAddr::from_str("ss.example.org:8388").unwrap();
        assert_eq!(a.host(), &Host::Domain("ss.example.org".to_string()));
        assert!(a.to_socket_addr().is_none());

        assert!(UpstreamAddr::from_str("example.org").is_err());
        assert!(UpstreamAddr::from_str("example.org:http").is_err());
        assert!(UpstreamAddr::from_str("::1:80").is_err());
    }
}
