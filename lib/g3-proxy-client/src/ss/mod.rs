/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use g3_types::net::{SocksAuth, Socks5Proxy, UpstreamAddr};

use crate::dial::{BoxTunnelStream, StreamDialer};
use crate::error::{DialError, ProxyClientError, RelayError};
use crate::options::BuildOptions;
use crate::registry::{ProtocolRegistry, TransportConstructor};
use crate::relay::RelayRegistry;
use crate::transport::RoundTripper;

mod descriptor;
pub use descriptor::{SsServerDescriptor, SsUrlParseError};

mod cipher;
pub use cipher::TunnelCipher;
#[cfg(feature = "shadowsocks")]
pub use cipher::ShadowsocksCipher;

/// How requests reach the shadowsocks server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShadowsocksMode {
    /// Through a local socks5 relay server shared by all clients of the same url.
    #[default]
    Relay,
    /// Wrap each connection to the server directly.
    Direct,
}

/// Register the `ss` scheme.
pub fn register_shadowsocks(
    registry: &mut ProtocolRegistry,
    relays: Arc<RelayRegistry>,
    cipher: Arc<dyn TunnelCipher>,
    mode: ShadowsocksMode,
) {
    let ctor = ShadowsocksConstructor {
        relays,
        cipher,
        mode,
    };
    registry.register("ss", Arc::new(ctor));
}

struct ShadowsocksConstructor {
    relays: Arc<RelayRegistry>,
    cipher: Arc<dyn TunnelCipher>,
    mode: ShadowsocksMode,
}

impl ShadowsocksConstructor {
    fn parse_server(&self, url: &Url) -> Result<SsServerDescriptor, ProxyClientError> {
        let server = SsServerDescriptor::from_str(url.as_str())?;
        if let Some(plugin) = &server.plugin {
            return Err(RelayError::PluginNotSupported(plugin.clone()).into());
        }
        if !self.cipher.supports(&server.method) {
            return Err(RelayError::UnsupportedMethod(server.method.clone()).into());
        }
        Ok(server)
    }
}

impl TransportConstructor for ShadowsocksConstructor {
    fn construct(
        &self,
        url: &Url,
        opts: &BuildOptions,
    ) -> Result<Arc<dyn RoundTripper>, ProxyClientError> {
        let server = self.parse_server(url)?;
        match self.mode {
            ShadowsocksMode::Relay => {
                let relay = self
                    .relays
                    .get_or_start(url.as_str(), &server, &self.cipher)?;
                let peer = UpstreamAddr::from_ip_and_port(
                    IpAddr::V4(Ipv4Addr::LOCALHOST),
                    relay.local_addr().port(),
                );
                let proxy = Socks5Proxy::new(peer, SocksAuth::None);
                crate::builtin::socks5_proxy_transport(proxy, opts)
            }
            ShadowsocksMode::Direct => {
                let mut config = opts.new_transport_config();
                let dialer =
                    ShadowsocksDialer::new(server, self.cipher.clone(), config.connect_timeout());
                config.set_proxy(None);
                config.set_dialer(Some(Arc::new(dialer)));
                let transport = config.build()?;
                Ok(Arc::new(transport))
            }
        }
    }
}

/// Connect to targets by wrapping connections to the shadowsocks server.
pub struct ShadowsocksDialer {
    server: SsServerDescriptor,
    cipher: Arc<dyn TunnelCipher>,
    connect_timeout: Duration,
}

impl ShadowsocksDialer {
    pub fn new(
        server: SsServerDescriptor,
        cipher: Arc<dyn TunnelCipher>,
        connect_timeout: Duration,
    ) -> Self {
        ShadowsocksDialer {
            server,
            cipher,
            connect_timeout,
        }
    }
}

#[async_trait]
impl StreamDialer for ShadowsocksDialer {
    async fn dial(&self, target: &UpstreamAddr) -> Result<BoxTunnelStream, DialError> {
        let stream = crate::dial::connect_tcp(&self.server.server, self.connect_timeout).await?;
        match tokio::time::timeout(
            self.connect_timeout,
            self.cipher.wrap(stream, &self.server, target),
        )
        .await
        {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(DialError::ConnectFailed(self.server.server.to_string(), e)),
            Err(_) => Err(DialError::ConnectTimeout(self.server.server.to_string())),
        }
    }
}
