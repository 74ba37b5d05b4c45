/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use g3_socks::SocksConnectError;
use g3_types::net::{Host, UpstreamAddr};

use crate::error::{DialError, HandshakePhase};

mod direct;
pub use direct::DirectDialer;

mod socks4;
pub use socks4::Socks4Dialer;

mod socks5;
pub use socks5::Socks5Dialer;

/// A connected duplex byte stream, maybe wrapped in some tunnel protocol.
pub trait TunnelStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> TunnelStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

pub type BoxTunnelStream = Box<dyn TunnelStream>;

/// Open a stream that reaches the target address.
#[async_trait]
pub trait StreamDialer: Send + Sync {
    async fn dial(&self, target: &UpstreamAddr) -> Result<BoxTunnelStream, DialError>;
}

pub(crate) async fn connect_tcp(
    peer: &UpstreamAddr,
    timeout: Duration,
) -> Result<TcpStream, DialError> {
    let connect = async {
        match peer.host() {
            Host::Ip(ip) => TcpStream::connect(SocketAddr::new(*ip, peer.port())).await,
            Host::Domain(domain) => TcpStream::connect((domain.as_str(), peer.port())).await,
        }
    };
    match tokio::time::timeout(timeout, connect).await {
        Ok(Ok(stream)) => {
            let _ = stream.set_nodelay(true);
            Ok(stream)
        }
        Ok(Err(e)) => Err(DialError::ConnectFailed(peer.to_string(), e)),
        Err(_) => Err(DialError::ConnectTimeout(peer.to_string())),
    }
}

/// Resolve the domain in `addr` to an ip address locally.
///
/// Only ipv4 addresses are accepted if `ipv4_only` is set.
pub(crate) async fn resolve_locally(
    addr: &UpstreamAddr,
    timeout: Duration,
    ipv4_only: bool,
) -> Result<UpstreamAddr, DialError> {
    let domain = match addr.host() {
        Host::Ip(_) => return Ok(addr.clone()),
        Host::Domain(domain) => domain.as_str(),
    };

    let ips = match tokio::time::timeout(timeout, tokio::net::lookup_host((domain, addr.port())))
        .await
    {
        Ok(Ok(ips)) => ips,
        Ok(Err(e)) => return Err(DialError::ResolveFailed(domain.to_string(), e)),
        Err(_) => {
            return Err(DialError::ResolveFailed(
                domain.to_string(),
                io::ErrorKind::TimedOut.into(),
            ));
        }
    };

    let found = ips
        .map(|sa| sa.ip())
        .find(|ip| !ipv4_only || matches!(ip, IpAddr::V4(_)));
    match found {
        Some(ip) => Ok(UpstreamAddr::from_ip_and_port(ip, addr.port())),
        None => Err(DialError::ResolveFailed(
            domain.to_string(),
            io::Error::new(io::ErrorKind::NotFound, "no usable address found"),
        )),
    }
}

/// Run one socks handshake phase within `timeout`.
pub(crate) async fn run_phase<F, T>(
    phase: HandshakePhase,
    timeout: Duration,
    fut: F,
) -> Result<T, DialError>
where
    F: Future<Output = Result<T, SocksConnectError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(DialError::from_socks(phase, e)),
        Err(_) => Err(DialError::HandshakeTimeout { phase }),
    }
}
