/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::transport::TransportConfig;

/// A callback to modify the transport config of a new client.
pub type TransportHook = Arc<dyn Fn(&mut TransportConfig) + Send + Sync>;

/// Default settings applied to every request sent by a client.
#[derive(Clone, Debug, Default)]
pub struct ClientTemplate {
    headers: HeaderMap,
}

impl ClientTemplate {
    /// Set a header which will be added to requests that don't have it.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Options to build a proxy client.
///
/// The transport config is a template, it is cloned for every new client.
#[derive(Clone, Default)]
pub struct BuildOptions {
    transport: TransportConfig,
    client: ClientTemplate,
    timeout: Option<Duration>,
    dial_timeout: Option<Duration>,
    hooks: Vec<TransportHook>,
}

impl BuildOptions {
    pub fn set_transport(&mut self, transport: TransportConfig) {
        self.transport = transport;
    }

    #[inline]
    pub fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    pub fn set_client_template(&mut self, client: ClientTemplate) {
        self.client = client;
    }

    #[inline]
    pub fn client_template(&self) -> &ClientTemplate {
        &self.client
    }

    /// Set the timeout for a whole request, including reading the response body.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Set the timeout to establish a connection, including the proxy handshake.
    ///
    /// It overrides the connect timeout of the transport template.
    pub fn set_dial_timeout(&mut self, timeout: Duration) {
        self.dial_timeout = Some(timeout);
    }

    pub fn dial_timeout(&self) -> Duration {
        self.dial_timeout
            .unwrap_or_else(|| self.transport.connect_timeout())
    }

    pub fn add_transport_hook<F>(&mut self, hook: F)
    where
        F: Fn(&mut TransportConfig) + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
    }

    #[inline]
    pub fn transport_hooks(&self) -> &[TransportHook] {
        &self.hooks
    }

    /// Get a new transport config for a client.
    ///
    /// The template is cloned, the dial timeout is applied, then all hooks in the order they were added.
    pub fn new_transport_config(&self) -> TransportConfig {
        let mut config = self.transport.clone();
        if let Some(timeout) = self.dial_timeout {
            config.set_connect_timeout(timeout);
        }
        for hook in &self.hooks {
            hook(&mut config);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hooks_in_order() {
        let mut opts = BuildOptions::default();
        opts.set_dial_timeout(Duration::from_secs(3));
        opts.add_transport_hook(|c| c.set_max_header_size(1000));
        opts.add_transport_hook(|c| {
            assert_eq!(c.max_header_size(), 1000);
            c.set_max_header_size(c.max_header_size() * 2);
        });

        let config = opts.new_transport_config();
        assert_eq!(config.max_header_size(), 2000);
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));

        // the template is not changed
        assert_ne!(opts.transport().max_header_size(), 2000);
        assert_ne!(opts.transport().connect_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn dial_timeout() {
        let mut opts = BuildOptions::default();
        assert_eq!(opts.dial_timeout(), opts.transport().connect_timeout());
        opts.set_dial_timeout(Duration::from_secs(1));
        assert_eq!(opts.dial_timeout(), Duration::from_secs(1));
    }
}
