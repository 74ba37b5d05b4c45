/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use tokio::io::AsyncWrite;

use g3_io_ext::LimitedWriteExt;
use g3_types::net::UpstreamAddr;

pub struct HttpConnectRequest<'a> {
    host: &'a UpstreamAddr,
    extra_headers: Vec<String>,
}

impl<'a> HttpConnectRequest<'a> {
    pub fn new(host: &'a UpstreamAddr) -> Self {
        HttpConnectRequest {
            host,
            extra_headers: Vec::new(),
        }
    }

    /// The header line should end with \r\n, or it will be ignored.
    pub fn append_header_line(&mut self, line: String) {
        if line.ends_with("\r\n") {
            self.extra_headers.push(line);
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128);
        buf.extend_from_slice(format!("CONNECT {} HTTP/1.1\r\n", self.host).as_bytes());
        buf.extend_from_slice(format!("Host: {}\r\n", self.host).as_bytes());
        buf.extend_from_slice(b"Connection: keep-alive\r\n");
        for line in &self.extra_headers {
            buf.extend_from_slice(line.as_bytes());
        }
        buf.extend_from_slice(b"\r\n");
        buf
    }

    pub async fn send<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let buf = self.encode();
        writer.write_all_flush(&buf).await
    }
}
