/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use http::{HeaderMap, HeaderName, HeaderValue};
use tokio::io::AsyncBufRead;

use g3_io_ext::LimitedBufReadExt;

use super::{HttpConnectError, HttpConnectResponseError};
use crate::{HttpHeaderLine, HttpLineParseError, HttpStatusLine};

#[derive(Debug)]
pub struct HttpConnectResponse {
    pub code: u16,
    pub reason: String,
    pub headers: HeaderMap,
}

impl HttpConnectResponse {
    fn new(code: u16, reason: String) -> Self {
        HttpConnectResponse {
            code,
            reason,
            headers: HeaderMap::new(),
        }
    }

    async fn parse<R>(reader: &mut R, max_header_size: usize) -> Result<Self, HttpConnectError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line_buf = Vec::<u8>::with_capacity(1024);
        let mut header_size: usize = 0;

        let (found, nr) = reader
            .limited_read_until(b'\n', max_header_size, &mut line_buf)
            .await
            .map_err(HttpConnectError::ReadFailed)?;
        if nr == 0 {
            return Err(HttpConnectError::RemoteClosed);
        }
        if !found {
            return if nr < max_header_size {
                Err(HttpConnectError::RemoteClosed)
            } else {
                Err(HttpConnectResponseError::TooLargeHeader(max_header_size).into())
            };
        }
        header_size += nr;

        let mut rsp = HttpConnectResponse::build_from_status_line(line_buf.as_ref())?;

        loop {
            if header_size >= max_header_size {
                return Err(HttpConnectResponseError::TooLargeHeader(max_header_size).into());
            }
            line_buf.clear();
            let max_len = max_header_size - header_size;
            let (found, nr) = reader
                .limited_read_until(b'\n', max_len, &mut line_buf)
                .await
                .map_err(HttpConnectError::ReadFailed)?;
            if nr == 0 {
                return Err(HttpConnectError::RemoteClosed);
            }
            if !found {
                return if nr < max_len {
                    Err(HttpConnectError::RemoteClosed)
                } else {
                    Err(HttpConnectResponseError::TooLargeHeader(max_header_size).into())
                };
            }
            header_size += nr;
            if (line_buf.len() == 1 && line_buf[0] == b'\n')
                || (line_buf.len() == 2 && line_buf[0] == b'\r' && line_buf[1] == b'\n')
            {
                // header end line
                break;
            }

            rsp.parse_header_line(line_buf.as_ref())?;
        }

        Ok(rsp)
    }

    fn build_from_status_line(line_buf: &[u8]) -> Result<Self, HttpConnectResponseError> {
        let rsp =
            HttpStatusLine::parse(line_buf).map_err(HttpConnectResponseError::InvalidStatusLine)?;
        Ok(HttpConnectResponse::new(rsp.code, rsp.reason.to_string()))
    }

    fn parse_header_line(&mut self, line_buf: &[u8]) -> Result<(), HttpConnectResponseError> {
        let header =
            HttpHeaderLine::parse(line_buf).map_err(HttpConnectResponseError::InvalidHeaderLine)?;
        let name = HeaderName::from_str(header.name).map_err(|_| {
            HttpConnectResponseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderName)
        })?;
        let value = HeaderValue::from_str(header.value).map_err(|_| {
            HttpConnectResponseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderValue)
        })?;
        self.headers.append(name, value);
        Ok(())
    }

    fn detect_error(&self) -> Result<(), HttpConnectError> {
        if self.code >= 200 && self.code < 300 {
            Ok(())
        } else if self.code == 504 || self.code == 522 || self.code == 524 {
            // Peer tells us it timeout
            Err(HttpConnectError::PeerTimeout(self.code))
        } else {
            Err(HttpConnectError::UnexpectedStatusCode(
                self.code,
                self.reason.to_string(),
            ))
        }
    }

    /// Receive the response header of a CONNECT request.
    ///
    /// The connection should be dropped on error, as the body of a failure response is not read.
    pub async fn recv<R>(r: &mut R, max_header_size: usize) -> Result<Self, HttpConnectError>
    where
        R: AsyncBufRead + Unpin,
    {
        let rsp = HttpConnectResponse::parse(r, max_header_size).await?;
        rsp.detect_error()?;
        Ok(rsp)
    }
}
