/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use url::Url;

use super::ProxyParseError;
use crate::net::{HttpAuth, UpstreamAddr};

#[derive(Clone, Debug)]
pub struct HttpProxy {
    peer: UpstreamAddr,
    tls: bool,
    pub auth: HttpAuth,
}

impl HttpProxy {
    pub fn peer(&self) -> &UpstreamAddr {
        &self.peer
    }

    /// Whether the proxy itself should be reached over tls.
    pub fn tls(&self) -> bool {
        self.tls
    }

    pub(super) fn from_url_authority(url: &Url, tls: bool) -> Result<Self, ProxyParseError> {
        let host = url.host().ok_or(ProxyParseError::NoHostFound)?;
        let port = url
            .port_or_known_default()
            .unwrap_or(if tls { 443 } else { 80 });

        let peer = UpstreamAddr::from_url_host_and_port(host.to_owned(), port);

        let auth = HttpAuth::try_from(url)?;

        Ok(HttpProxy { peer, tls, auth })
    }
}
