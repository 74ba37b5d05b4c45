/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use async_trait::async_trait;
use tokio::net::TcpStream;

use g3_types::net::UpstreamAddr;

use super::SsServerDescriptor;
use crate::dial::BoxTunnelStream;

/// Encrypt a stream to the tunnel server.
#[async_trait]
pub trait TunnelCipher: Send + Sync {
    /// Whether the cipher method is supported.
    fn supports(&self, method: &str) -> bool;

    /// Wrap the connection to `server`, and request it to connect to `target`.
    async fn wrap(
        &self,
        stream: TcpStream,
        server: &SsServerDescriptor,
        target: &UpstreamAddr,
    ) -> io::Result<BoxTunnelStream>;
}

#[cfg(feature = "shadowsocks")]
mod shadowsocks_impl {
    use std::net::SocketAddr;
    use std::str::FromStr;

    use shadowsocks::ProxyClientStream;
    use shadowsocks::config::{ServerAddr, ServerConfig, ServerType};
    use shadowsocks::context::{Context, SharedContext};
    use shadowsocks::crypto::CipherKind;
    use shadowsocks::relay::socks5::Address;

    use g3_types::net::Host;

    use super::*;

    /// The cipher suites of the `shadowsocks` crate.
    pub struct ShadowsocksCipher {
        context: SharedContext,
    }

    impl Default for ShadowsocksCipher {
        fn default() -> Self {
            ShadowsocksCipher {
                context: Context::new_shared(ServerType::Local),
            }
        }
    }

    fn server_config(server: &SsServerDescriptor) -> io::Result<ServerConfig> {
        let kind = CipherKind::from_str(&server.method).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported cipher method {}", server.method),
            )
        })?;
        let port = server.server.port();
        let addr = match server.server.host() {
            Host::Ip(ip) => ServerAddr::SocketAddr(SocketAddr::new(*ip, port)),
            Host::Domain(domain) => ServerAddr::DomainName(domain.clone(), port),
        };
        ServerConfig::new(addr, server.password.clone(), kind)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))
    }

    #[async_trait]
    impl TunnelCipher for ShadowsocksCipher {
        fn supports(&self, method: &str) -> bool {
            CipherKind::from_str(method).is_ok()
        }

        async fn wrap(
            &self,
            stream: TcpStream,
            server: &SsServerDescriptor,
            target: &UpstreamAddr,
        ) -> io::Result<BoxTunnelStream> {
            let svr_cfg = server_config(server)?;
            let addr = match target.host() {
                Host::Ip(ip) => Address::SocketAddress(SocketAddr::new(*ip, target.port())),
                Host::Domain(domain) => Address::DomainNameAddress(domain.clone(), target.port()),
            };
            let stream = ProxyClientStream::from_stream(self.context.clone(), stream, &svr_cfg, addr);
            Ok(Box::new(stream))
        }
    }

}

#[cfg(feature = "shadowsocks")]
pub use shadowsocks_impl::ShadowsocksCipher;
