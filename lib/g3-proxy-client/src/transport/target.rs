/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use http::Uri;

use g3_types::net::UpstreamAddr;

use crate::error::ProxyClientError;

/// The server a request should be sent to.
#[derive(Debug)]
pub(super) struct RequestTarget {
    pub(super) addr: UpstreamAddr,
    pub(super) tls: bool,
    /// The value of the Host header.
    pub(super) host_header: String,
}

impl RequestTarget {
    pub(super) fn parse(uri: &Uri) -> Result<Self, ProxyClientError> {
        let tls = match uri.scheme_str() {
            Some(s) if s.eq_ignore_ascii_case("http") => false,
            Some(s) if s.eq_ignore_ascii_case("https") => true,
            Some(s) => {
                return Err(ProxyClientError::InvalidRequest(format!(
                    "unsupported scheme {s} in request uri"
                )));
            }
            None => {
                return Err(ProxyClientError::InvalidRequest(
                    "no scheme found in request uri".to_string(),
                ));
            }
        };
        let Some(authority) = uri.authority() else {
            return Err(ProxyClientError::InvalidRequest(
                "no host found in request uri".to_string(),
            ));
        };

        let host = authority.host();
        let port = authority.port_u16().unwrap_or(if tls { 443 } else { 80 });
        let addr = UpstreamAddr::from_host_str_and_port(host, port).map_err(|e| {
            ProxyClientError::InvalidRequest(format!("invalid host {host} in request uri: {e}"))
        })?;
        let host_header = match authority.port() {
            Some(p) => format!("{host}:{p}"),
            None => host.to_string(),
        };

        Ok(RequestTarget {
            addr,
            tls,
            host_header,
        })
    }
}

/// Strip the scheme and authority part.
pub(super) fn origin_form(uri: &Uri) -> Result<Uri, ProxyClientError> {
    let path = match uri.path_and_query() {
        Some(pq) if !pq.as_str().is_empty() => pq.as_str(),
        _ => "/",
    };
    Uri::builder()
        .path_and_query(path)
        .build()
        .map_err(|e| ProxyClientError::InvalidRequest(format!("invalid request path: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv6Addr};

    #[test]
    fn parse_http() {
        let uri = Uri::from_static("http://example.net/index.html");
        let t = RequestTarget::parse(&uri).unwrap();
        assert!(!t.tls);
        assert_eq!(t.addr.port(), 80);
        assert_eq!(t.host_header, "example.net");

        let uri = Uri::from_static("https://[::1]:8443/");
        let t = RequestTarget::parse(&uri).unwrap();
        assert!(t.tls);
        assert_eq!(
            t.addr,
            UpstreamAddr::from_ip_and_port(IpAddr::V6(Ipv6Addr::LOCALHOST), 8443)
        );
        assert_eq!(t.host_header, "[::1]:8443");
    }

    #[test]
    fn parse_invalid() {
        assert!(RequestTarget::parse(&Uri::from_static("/index.html")).is_err());
        assert!(RequestTarget::parse(&Uri::from_static("ftp://example.net/")).is_err());
    }

    #[test]
    fn to_origin_form() {
        let uri = Uri::from_static("http://example.net/a/b?c=d");
        assert_eq!(origin_form(&uri).unwrap(), "/a/b?c=d");
        let uri = Uri::from_static("http://example.net");
        assert_eq!(origin_form(&uri).unwrap(), "/");
    }
}
