/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use async_trait::async_trait;

use g3_socks::SocksCommand;
use g3_socks::v5::{Socks5Request, auth, client};
use g3_types::net::{Socks5Proxy, UpstreamAddr};

use super::{BoxTunnelStream, StreamDialer};
use crate::error::{DialError, HandshakePhase};

/// Reach the target through a SOCKS5 proxy with a CONNECT request.
///
/// Every step of the handshake is bounded by the dial timeout on its own.
#[derive(Clone, Debug)]
pub struct Socks5Dialer {
    proxy: Socks5Proxy,
    dial_timeout: Duration,
}

impl Socks5Dialer {
    pub fn new(proxy: Socks5Proxy, dial_timeout: Duration) -> Self {
        Socks5Dialer {
            proxy,
            dial_timeout,
        }
    }

    #[inline]
    pub fn proxy(&self) -> &Socks5Proxy {
        &self.proxy
    }
}

#[async_trait]
impl StreamDialer for Socks5Dialer {
    async fn dial(&self, target: &UpstreamAddr) -> Result<BoxTunnelStream, DialError> {
        let timeout = self.dial_timeout;
        let target = if self.proxy.local_resolve() {
            super::resolve_locally(target, timeout, false).await?
        } else {
            target.clone()
        };

        let mut stream = super::connect_tcp(self.proxy.peer(), timeout).await?;
        {
            let (mut r, mut w) = stream.split();
            let auth = &self.proxy.auth;

            let method = super::run_phase(
                HandshakePhase::Negotiate,
                timeout,
                auth::send_and_recv_method(&mut r, &mut w, auth),
            )
            .await?;
            super::run_phase(
                HandshakePhase::Authenticate,
                timeout,
                client::socks5_authenticate(&mut r, &mut w, method, auth),
            )
            .await?;
            super::run_phase(
                HandshakePhase::Request,
                timeout,
                Socks5Request::send(&mut w, SocksCommand::TcpConnect, &target),
            )
            .await?;
            super::run_phase(
                HandshakePhase::Reply,
                timeout,
                client::socks5_recv_connect_reply(&mut r),
            )
            .await?;
        }

        Ok(Box::new(stream))
    }
}
