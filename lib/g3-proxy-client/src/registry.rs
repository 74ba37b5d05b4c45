/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

use crate::client::ProxyClient;
use crate::error::ProxyClientError;
use crate::options::BuildOptions;
use crate::transport::RoundTripper;

/// Build a transport for a parsed proxy url.
pub trait TransportConstructor: Send + Sync {
    fn construct(
        &self,
        url: &Url,
        opts: &BuildOptions,
    ) -> Result<Arc<dyn RoundTripper>, ProxyClientError>;
}

impl<F> TransportConstructor for F
where
    F: Fn(&Url, &BuildOptions) -> Result<Arc<dyn RoundTripper>, ProxyClientError> + Send + Sync,
{
    fn construct(
        &self,
        url: &Url,
        opts: &BuildOptions,
    ) -> Result<Arc<dyn RoundTripper>, ProxyClientError> {
        self(url, opts)
    }
}

/// Map of lower-cased url scheme to transport constructor.
#[derive(Clone, Default)]
pub struct ProtocolRegistry {
    inner: HashMap<String, Arc<dyn TransportConstructor>>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        ProtocolRegistry::default()
    }

    /// A registry with http, https, socks4, socks4a, socks5 and socks5h registered.
    pub fn with_builtin() -> Self {
        let mut registry = ProtocolRegistry::default();
        registry.register("http", Arc::new(crate::builtin::http_transport));
        registry.register("https", Arc::new(crate::builtin::http_transport));
        registry.register("socks4", Arc::new(crate::builtin::socks4_transport));
        registry.register("socks4a", Arc::new(crate::builtin::socks4_transport));
        registry.register("socks5", Arc::new(crate::builtin::socks5_transport));
        registry.register("socks5h", Arc::new(crate::builtin::socks5_transport));
        registry
    }

    /// Register the constructor for the scheme, the old one will be returned if existed.
    pub fn register(
        &mut self,
        scheme: &str,
        ctor: Arc<dyn TransportConstructor>,
    ) -> Option<Arc<dyn TransportConstructor>> {
        self.inner.insert(scheme.to_ascii_lowercase(), ctor)
    }

    pub fn lookup(&self, scheme: &str) -> Result<Arc<dyn TransportConstructor>, ProxyClientError> {
        self.inner
            .get(&scheme.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| ProxyClientError::UnsupportedScheme(scheme.to_string()))
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.inner.contains_key(&scheme.to_ascii_lowercase())
    }

    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.inner.keys().map(|s| s.as_str()).collect();
        schemes.sort_unstable();
        schemes
    }

    pub fn build_transport(
        &self,
        url: &Url,
        opts: &BuildOptions,
    ) -> Result<Arc<dyn RoundTripper>, ProxyClientError> {
        let ctor = self.lookup(url.scheme())?;
        ctor.construct(url, opts)
    }

    pub fn new_client(
        &self,
        proxy_url: &str,
        opts: &BuildOptions,
    ) -> Result<ProxyClient, ProxyClientError> {
        new_client(self, proxy_url, opts)
    }
}

/// Create a http client that sends requests through the proxy in `proxy_url`.
///
/// Errors in the url or an unregistered scheme are returned before any connection is made.
pub fn new_client(
    registry: &ProtocolRegistry,
    proxy_url: &str,
    opts: &BuildOptions,
) -> Result<ProxyClient, ProxyClientError> {
    let url = Url::parse(proxy_url)?;
    let transport = registry.build_transport(&url, opts)?;
    Ok(ProxyClient::new(transport, opts))
}
