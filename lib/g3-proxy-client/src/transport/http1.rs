/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use log::debug;

use crate::dial::BoxTunnelStream;
use crate::error::ProxyClientError;

/// Run a single HTTP/1.1 exchange on the connection and read the whole response body.
pub(super) async fn send_request(
    stream: BoxTunnelStream,
    req: Request<Bytes>,
) -> Result<Response<Bytes>, ProxyClientError> {
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!("http connection ended with error: {e}");
        }
    });

    let rsp = sender.send_request(req.map(Full::new)).await?;
    let (parts, body) = rsp.into_parts();
    let body = body.collect().await?.to_bytes();
    Ok(Response::from_parts(parts, body))
}
