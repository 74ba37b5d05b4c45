/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io;

use thiserror::Error;

use g3_http::connect::HttpConnectError;
use g3_socks::SocksConnectError;
use g3_socks::v4a::SocksV4Reply;
use g3_socks::v5::Socks5Reply;
use g3_types::net::ProxyParseError;

use crate::ss::SsUrlParseError;

/// The step of a SOCKS handshake with the upstream proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakePhase {
    Connect,
    Negotiate,
    Authenticate,
    Request,
    Reply,
}

impl HandshakePhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            HandshakePhase::Connect => "connect",
            HandshakePhase::Negotiate => "negotiate",
            HandshakePhase::Authenticate => "authenticate",
            HandshakePhase::Request => "request",
            HandshakePhase::Reply => "reply",
        }
    }
}

impl fmt::Display for HandshakePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DialError {
    #[error("connect to {0} failed: {1:?}")]
    ConnectFailed(String, io::Error),
    #[error("timeout to connect to {0}")]
    ConnectTimeout(String),
    #[error("failed to resolve {0}: {1:?}")]
    ResolveFailed(String, io::Error),
    #[error("socks handshake failed at {phase} phase: {source}")]
    Handshake {
        phase: HandshakePhase,
        source: SocksConnectError,
    },
    #[error("socks handshake timed out at {phase} phase")]
    HandshakeTimeout { phase: HandshakePhase },
    #[error("socks5 proxy rejected the request: {0}")]
    Socks5Rejected(Socks5Reply),
    #[error("socks4 proxy rejected the request: {0}")]
    Socks4Rejected(SocksV4Reply),
    #[error("tls handshake with {0} failed: {1:?}")]
    Tls(String, io::Error),
    #[error("timeout to tls handshake with {0}")]
    TlsTimeout(String),
    #[error("http connect failed: {0}")]
    HttpConnect(#[from] HttpConnectError),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl DialError {
    /// Map the error returned at a socks handshake phase.
    ///
    /// Rejection replies from the proxy are kept apart from io and protocol errors.
    pub(crate) fn from_socks(phase: HandshakePhase, e: SocksConnectError) -> Self {
        match e {
            SocksConnectError::Socks5Rejected(reply) => DialError::Socks5Rejected(reply),
            SocksConnectError::Socks4Rejected(reply) => DialError::Socks4Rejected(reply),
            source => DialError::Handshake { phase, source },
        }
    }

    pub fn phase(&self) -> Option<HandshakePhase> {
        match self {
            DialError::ConnectFailed(..)
            | DialError::ConnectTimeout(_)
            | DialError::ResolveFailed(..) => Some(HandshakePhase::Connect),
            DialError::Handshake { phase, .. } | DialError::HandshakeTimeout { phase } => {
                Some(*phase)
            }
            DialError::Socks5Rejected(_) | DialError::Socks4Rejected(_) => {
                Some(HandshakePhase::Reply)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to allocate local port: {0:?}")]
    PortAllocation(io::Error),
    #[error("no tokio runtime available")]
    NoRuntime,
    #[error("invalid server address: {0}")]
    InvalidServer(String),
    #[error("unsupported cipher method {0}")]
    UnsupportedMethod(String),
    #[error("plugin {0} is not supported")]
    PluginNotSupported(String),
}

#[derive(Debug, Error)]
pub enum ProxyClientError {
    #[error("unsupported proxy scheme {0}")]
    UnsupportedScheme(String),
    #[error("invalid proxy url: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("invalid proxy: {0}")]
    InvalidProxy(#[from] ProxyParseError),
    #[error("invalid proxy option {0}: {1}")]
    InvalidProxyOption(&'static str, String),
    #[error("invalid tunnel url: {0}")]
    InvalidTunnelUrl(#[from] SsUrlParseError),
    #[error("invalid tls config: {0:?}")]
    InvalidTlsConfig(anyhow::Error),
    #[error("dial failed: {0}")]
    Dial(#[from] DialError),
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("http error: {0}")]
    Http(#[from] hyper::Error),
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    #[test]
    fn socks_rejection() {
        let e = DialError::from_socks(
            HandshakePhase::Reply,
            SocksConnectError::Socks5Rejected(Socks5Reply::ConnectionRefused),
        );
        assert!(matches!(
            e,
            DialError::Socks5Rejected(Socks5Reply::ConnectionRefused)
        ));
        assert_eq!(e.phase(), Some(HandshakePhase::Reply));

        let e = DialError::from_socks(
            HandshakePhase::Reply,
            SocksConnectError::Socks4Rejected(SocksV4Reply::RequestRejectedOrFailed),
        );
        assert!(matches!(e, DialError::Socks4Rejected(_)));
    }

    #[test]
    fn socks_phase() {
        let e = DialError::from_socks(HandshakePhase::Authenticate, SocksConnectError::AuthFailed);
        assert_eq!(e.phase(), Some(HandshakePhase::Authenticate));
        assert!(e.to_string().contains("authenticate"));

        let e = DialError::ConnectFailed(
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 1).to_string(),
            io::ErrorKind::ConnectionRefused.into(),
        );
        assert_eq!(e.phase(), Some(HandshakePhase::Connect));

        let e = DialError::ResolveFailed(
            "internal.invalid".to_string(),
            io::ErrorKind::NotFound.into(),
        );
        assert_eq!(e.phase(), Some(HandshakePhase::Connect));
    }
}
