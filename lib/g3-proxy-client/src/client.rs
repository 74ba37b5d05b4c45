/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Request, Response};

use crate::error::ProxyClientError;
use crate::options::BuildOptions;
use crate::transport::RoundTripper;

/// A http client with its transport fully configured.
#[derive(Clone)]
pub struct ProxyClient {
    transport: Arc<dyn RoundTripper>,
    timeout: Option<Duration>,
    headers: HeaderMap,
}

impl ProxyClient {
    pub fn new(transport: Arc<dyn RoundTripper>, opts: &BuildOptions) -> Self {
        ProxyClient {
            transport,
            timeout: opts.timeout(),
            headers: opts.client_template().headers().clone(),
        }
    }

    #[inline]
    pub fn transport(&self) -> &Arc<dyn RoundTripper> {
        &self.transport
    }

    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn send(&self, mut req: Request<Bytes>) -> Result<Response<Bytes>, ProxyClientError> {
        for name in self.headers.keys() {
            if req.headers().contains_key(name) {
                continue;
            }
            for value in self.headers.get_all(name) {
                req.headers_mut().append(name.clone(), value.clone());
            }
        }

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.transport.round_trip(req))
                .await
                .map_err(|_| ProxyClientError::Timeout(timeout))?,
            None => self.transport.round_trip(req).await,
        }
    }

    pub async fn get(&self, uri: &str) -> Result<Response<Bytes>, ProxyClientError> {
        let req = Request::get(uri)
            .body(Bytes::new())
            .map_err(|e| ProxyClientError::InvalidRequest(e.to_string()))?;
        self.send(req).await
    }
}
