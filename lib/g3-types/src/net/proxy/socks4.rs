/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use url::Url;

use super::ProxyParseError;
use crate::auth::AuthParseError;
use crate::net::UpstreamAddr;

#[derive(Clone, Debug)]
pub struct Socks4Proxy {
    peer: UpstreamAddr,
    remote_resolve: bool,
    user_id: String,
}

impl Socks4Proxy {
    pub fn peer(&self) -> &UpstreamAddr {
        &self.peer
    }

    /// Whether domain names are sent to the proxy (`socks4a`).
    pub fn remote_resolve(&self) -> bool {
        self.remote_resolve
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub(super) fn from_url_authority(
        url: &Url,
        remote_resolve: bool,
    ) -> Result<Self, ProxyParseError> {
        let host = url.host().ok_or(ProxyParseError::NoHostFound)?;
        let port = url.port().unwrap_or(1080);

        let peer = UpstreamAddr::from_url_host_and_port(host.to_owned(), port);

        let user_id = percent_encoding::percent_decode_str(url.username())
            .decode_utf8()
            .map_err(|_| AuthParseError::InvalidUtf8Encoding)?;
        if user_id.contains('\0') {
            return Err(AuthParseError::InvalidUsername.into());
        }

        Ok(Socks4Proxy {
            peer,
            remote_resolve,
            user_id: user_id.into_owned(),
        })
    }
}
