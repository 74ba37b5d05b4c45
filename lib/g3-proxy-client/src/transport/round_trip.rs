/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HOST, PROXY_AUTHORIZATION};
use http::{HeaderValue, Request, Response};
use rustls_pki_types::ServerName;
use tokio::io::BufReader;

use g3_http::connect::http_connect_to;
use g3_types::net::{HttpAuth, HttpProxy, RustlsClientConfig};

use super::target::{RequestTarget, origin_form};
use super::{RoundTripper, TransportConfig};
use crate::dial::{BoxTunnelStream, DirectDialer, StreamDialer};
use crate::error::{DialError, ProxyClientError};
use crate::tls::tls_connect;

/// The HTTP/1.1 transport built from a [`TransportConfig`].
pub struct HttpTransport {
    tls_client: RustlsClientConfig,
    tls_name: Option<ServerName<'static>>,
    connect_timeout: Duration,
    max_header_size: usize,
    proxy: Option<HttpProxy>,
    dialer: Arc<dyn StreamDialer>,
}

impl HttpTransport {
    pub(super) fn new(config: &TransportConfig, tls_client: RustlsClientConfig) -> Self {
        let dialer = match config.dialer() {
            Some(dialer) => Arc::clone(dialer),
            None => Arc::new(DirectDialer::new(config.connect_timeout())),
        };
        HttpTransport {
            tls_client,
            tls_name: config.tls_name().cloned(),
            connect_timeout: config.connect_timeout(),
            max_header_size: config.max_header_size(),
            proxy: config.proxy().cloned(),
            dialer,
        }
    }

    #[inline]
    pub fn proxy(&self) -> Option<&HttpProxy> {
        self.proxy.as_ref()
    }

    #[inline]
    pub fn dialer(&self) -> &Arc<dyn StreamDialer> {
        &self.dialer
    }

    fn tls_handshake_timeout(&self) -> Duration {
        self.connect_timeout.min(self.tls_client.handshake_timeout)
    }

    async fn connect_direct(&self, target: &RequestTarget) -> Result<BoxTunnelStream, DialError> {
        let stream = self.dialer.dial(&target.addr).await?;
        if target.tls {
            tls_connect(
                stream,
                &target.addr,
                &self.tls_client,
                self.tls_name.as_ref(),
                self.tls_handshake_timeout(),
            )
            .await
        } else {
            Ok(stream)
        }
    }

    /// Connect to the target through the http proxy.
    ///
    /// Plain http requests are forwarded by the proxy, so the stream to the proxy is returned.
    /// Tls targets are reached by a CONNECT tunnel.
    async fn connect_via_proxy(
        &self,
        proxy: &HttpProxy,
        target: &RequestTarget,
    ) -> Result<BoxTunnelStream, DialError> {
        let stream = crate::dial::connect_tcp(proxy.peer(), self.connect_timeout).await?;
        let mut stream: BoxTunnelStream = Box::new(stream);
        if proxy.tls() {
            stream = tls_connect(
                stream,
                proxy.peer(),
                &self.tls_client,
                None,
                self.tls_handshake_timeout(),
            )
            .await?;
        }
        if !target.tls {
            return Ok(stream);
        }

        let mut buf_stream = BufReader::new(stream);
        match tokio::time::timeout(
            self.connect_timeout,
            http_connect_to(
                &mut buf_stream,
                &proxy.auth,
                &target.addr,
                self.max_header_size,
            ),
        )
        .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(DialError::ConnectTimeout(target.addr.to_string())),
        }
        if !buf_stream.buffer().is_empty() {
            return Err(DialError::Tls(
                target.addr.to_string(),
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    "unexpected data received before tls handshake",
                ),
            ));
        }

        tls_connect(
            buf_stream.into_inner(),
            &target.addr,
            &self.tls_client,
            self.tls_name.as_ref(),
            self.tls_handshake_timeout(),
        )
        .await
    }
}

#[async_trait]
impl RoundTripper for HttpTransport {
    async fn round_trip(
        &self,
        mut req: Request<Bytes>,
    ) -> Result<Response<Bytes>, ProxyClientError> {
        let target = RequestTarget::parse(req.uri())?;

        let absolute_form = match &self.proxy {
            Some(proxy) if !target.tls => Some(proxy),
            _ => None,
        };
        let stream = match &self.proxy {
            Some(proxy) => self.connect_via_proxy(proxy, &target).await?,
            None => self.connect_direct(&target).await?,
        };

        if !req.headers().contains_key(HOST) {
            let host = HeaderValue::from_str(&target.host_header).map_err(|e| {
                ProxyClientError::InvalidRequest(format!("invalid host header value: {e}"))
            })?;
            req.headers_mut().insert(HOST, host);
        }
        match absolute_form {
            Some(proxy) => {
                if let HttpAuth::Basic(auth) = &proxy.auth {
                    let value = format!("Basic {}", auth.encoded_value());
                    let value = HeaderValue::from_str(&value).map_err(|e| {
                        ProxyClientError::InvalidRequest(format!(
                            "invalid proxy authorization value: {e}"
                        ))
                    })?;
                    req.headers_mut().insert(PROXY_AUTHORIZATION, value);
                }
            }
            None => {
                *req.uri_mut() = origin_form(req.uri())?;
            }
        }

        super::http1::send_request(stream, req).await
    }
}
