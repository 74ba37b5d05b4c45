/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use rustls_pki_types::ServerName;

use g3_types::net::{HttpProxy, RustlsClientConfigBuilder};

use crate::dial::StreamDialer;
use crate::error::ProxyClientError;

mod http1;
mod target;

mod round_trip;
pub use round_trip::HttpTransport;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_HEADER_SIZE: usize = 4096;

/// Send one request and get back the full response.
#[async_trait]
pub trait RoundTripper: Send + Sync {
    async fn round_trip(&self, req: Request<Bytes>) -> Result<Response<Bytes>, ProxyClientError>;
}

/// How a transport reaches the target server.
///
/// A forward proxy set here takes precedence over the dialer, which is then only used to
/// reach the proxy itself.
#[derive(Clone)]
pub struct TransportConfig {
    tls_client: RustlsClientConfigBuilder,
    tls_name: Option<ServerName<'static>>,
    connect_timeout: Duration,
    max_header_size: usize,
    proxy: Option<HttpProxy>,
    dialer: Option<Arc<dyn StreamDialer>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            tls_client: RustlsClientConfigBuilder::default(),
            tls_name: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            proxy: None,
            dialer: None,
        }
    }
}

impl TransportConfig {
    pub fn set_tls_client(&mut self, tls: RustlsClientConfigBuilder) {
        self.tls_client = tls;
    }

    #[inline]
    pub fn tls_client(&self) -> &RustlsClientConfigBuilder {
        &self.tls_client
    }

    #[inline]
    pub fn tls_client_mut(&mut self) -> &mut RustlsClientConfigBuilder {
        &mut self.tls_client
    }

    /// Use a fixed tls server name instead of the host of the target.
    pub fn set_tls_name(&mut self, name: ServerName<'static>) {
        self.tls_name = Some(name);
    }

    #[inline]
    pub fn tls_name(&self) -> Option<&ServerName<'static>> {
        self.tls_name.as_ref()
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Set the max header size of the response to CONNECT requests.
    pub fn set_max_header_size(&mut self, size: usize) {
        self.max_header_size = size;
    }

    #[inline]
    pub fn max_header_size(&self) -> usize {
        self.max_header_size
    }

    pub fn set_proxy(&mut self, proxy: Option<HttpProxy>) {
        self.proxy = proxy;
    }

    #[inline]
    pub fn proxy(&self) -> Option<&HttpProxy> {
        self.proxy.as_ref()
    }

    pub fn set_dialer(&mut self, dialer: Option<Arc<dyn StreamDialer>>) {
        self.dialer = dialer;
    }

    #[inline]
    pub fn dialer(&self) -> Option<&Arc<dyn StreamDialer>> {
        self.dialer.as_ref()
    }

    pub fn build(&self) -> Result<HttpTransport, ProxyClientError> {
        let tls_client = self
            .tls_client
            .build()
            .map_err(ProxyClientError::InvalidTlsConfig)?;
        Ok(HttpTransport::new(self, tls_client))
    }
}
