/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;

use g3_socks::SocksCommand;
use g3_socks::v4a::{SocksV4aRequest, client};
use g3_types::net::{Host, Socks4Proxy, UpstreamAddr};

use super::{BoxTunnelStream, StreamDialer};
use crate::error::{DialError, HandshakePhase};

/// Reach the target through a SOCKS4 or SOCKS4A proxy.
#[derive(Clone, Debug)]
pub struct Socks4Dialer {
    proxy: Socks4Proxy,
    dial_timeout: Duration,
}

impl Socks4Dialer {
    pub fn new(proxy: Socks4Proxy, dial_timeout: Duration) -> Self {
        Socks4Dialer {
            proxy,
            dial_timeout,
        }
    }

    #[inline]
    pub fn proxy(&self) -> &Socks4Proxy {
        &self.proxy
    }

    async fn request_addr(&self, target: &UpstreamAddr) -> Result<UpstreamAddr, DialError> {
        match target.host() {
            Host::Ip(IpAddr::V4(_)) => Ok(target.clone()),
            Host::Ip(IpAddr::V6(_)) => Err(DialError::Unsupported(format!(
                "ipv6 target address {target} over socks4"
            ))),
            Host::Domain(_) => {
                if self.proxy.remote_resolve() {
                    Ok(target.clone())
                } else {
                    super::resolve_locally(target, self.dial_timeout, true).await
                }
            }
        }
    }
}

#[async_trait]
impl StreamDialer for Socks4Dialer {
    async fn dial(&self, target: &UpstreamAddr) -> Result<BoxTunnelStream, DialError> {
        let timeout = self.dial_timeout;
        let target = self.request_addr(target).await?;

        let mut stream = super::connect_tcp(self.proxy.peer(), timeout).await?;
        {
            let (mut r, mut w) = stream.split();

            super::run_phase(
                HandshakePhase::Request,
                timeout,
                SocksV4aRequest::send(
                    &mut w,
                    SocksCommand::TcpConnect,
                    &target,
                    self.proxy.user_id(),
                ),
            )
            .await?;
            super::run_phase(
                HandshakePhase::Reply,
                timeout,
                client::socks4_recv_connect_reply(&mut r),
            )
            .await?;
        }

        Ok(Box::new(stream))
    }
}
