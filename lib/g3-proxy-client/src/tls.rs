/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::time::Duration;

use rustls_pki_types::ServerName;
use tokio_rustls::TlsConnector;

use g3_types::net::{RustlsClientConfig, UpstreamAddr};

use crate::dial::BoxTunnelStream;
use crate::error::DialError;

/// Run a tls client handshake over an established stream.
///
/// The server name is the explicit `tls_name` if set, or the host of `target`.
/// The handshake is bounded by `timeout`, and the stream is dropped on failure.
pub async fn tls_connect(
    stream: BoxTunnelStream,
    target: &UpstreamAddr,
    tls_client: &RustlsClientConfig,
    tls_name: Option<&ServerName<'static>>,
    timeout: Duration,
) -> Result<BoxTunnelStream, DialError> {
    let tls_name = match tls_name {
        Some(name) => name.clone(),
        None => ServerName::try_from(target.host()).map_err(|e| {
            DialError::Tls(
                target.to_string(),
                io::Error::new(io::ErrorKind::InvalidInput, e),
            )
        })?,
    };

    let tls_connector = TlsConnector::from(tls_client.driver.clone());
    match tokio::time::timeout(timeout, tls_connector.connect(tls_name, stream)).await {
        Ok(Ok(tls_stream)) => Ok(Box::new(tls_stream)),
        Ok(Err(e)) => Err(DialError::Tls(target.to_string(), e)),
        Err(_) => Err(DialError::TlsTimeout(target.to_string())),
    }
}
