/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use g3_io_ext::StreamCopyConfig;

const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayServerConfig {
    listen_port: u16,
    negotiation_timeout: Duration,
    connect_timeout: Duration,
    drain_timeout: Duration,
    copy: StreamCopyConfig,
}

impl Default for RelayServerConfig {
    fn default() -> Self {
        RelayServerConfig {
            listen_port: 0,
            negotiation_timeout: DEFAULT_NEGOTIATION_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            copy: StreamCopyConfig::default(),
        }
    }
}

impl RelayServerConfig {
    /// Set the port on loopback to listen on, 0 means an ephemeral port.
    pub fn set_listen_port(&mut self, port: u16) {
        self.listen_port = port;
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.listen_port)
    }

    /// Set the timeout for the local socks5 handshake.
    pub fn set_negotiation_timeout(&mut self, timeout: Duration) {
        self.negotiation_timeout = timeout;
    }

    #[inline]
    pub fn negotiation_timeout(&self) -> Duration {
        self.negotiation_timeout
    }

    /// Set the timeout to connect to the tunnel server.
    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Set how long the other direction may go on after one direction has finished.
    pub fn set_drain_timeout(&mut self, timeout: Duration) {
        self.drain_timeout = timeout;
    }

    #[inline]
    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    pub fn set_copy_config(&mut self, copy: StreamCopyConfig) {
        self.copy = copy;
    }

    #[inline]
    pub fn copy_config(&self) -> &StreamCopyConfig {
        &self.copy
    }
}
