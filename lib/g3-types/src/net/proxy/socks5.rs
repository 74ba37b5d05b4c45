/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use url::Url;

use super::ProxyParseError;
use crate::net::SocksAuth;
use crate::net::UpstreamAddr;

#[derive(Clone, Debug)]
pub struct Socks5Proxy {
    peer: UpstreamAddr,
    local_resolve: bool,
    pub auth: SocksAuth,
}

impl Socks5Proxy {
    pub fn peer(&self) -> &UpstreamAddr {
        &self.peer
    }

    /// Whether target domains are resolved before sending to the proxy.
    ///
    /// Off by default for both `socks5` and `socks5h`, the proxy gets the domain as is.
    pub fn local_resolve(&self) -> bool {
        self.local_resolve
    }

    pub fn set_local_resolve(&mut self, enable: bool) {
        self.local_resolve = enable;
    }

    pub fn new(peer: UpstreamAddr, auth: SocksAuth) -> Self {
        Socks5Proxy {
            peer,
            local_resolve: false,
            auth,
        }
    }

    pub(super) fn from_url_authority(url: &Url) -> Result<Self, ProxyParseError> {
        let host = url.host().ok_or(ProxyParseError::NoHostFound)?;
        let port = url.port().unwrap_or(1080);

        let peer = UpstreamAddr::from_url_host_and_port(host.to_owned(), port);

        let auth = SocksAuth::try_from(url)?;

        Ok(Socks5Proxy::new(peer, auth))
    }
}
