/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr};

use bytes::{BufMut, BytesMut};
use tokio::io::AsyncWrite;

use g3_io_ext::LimitedWriteExt;
use g3_types::net::{Host, UpstreamAddr};

use super::{SocksCommand, SocksConnectError, SocksNegotiationError, SocksVersion};

/// The invalid ip which tells the server to read the domain after the user id.
const SOCKS4A_DOMAIN_MARKER: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 1);

pub struct SocksV4aRequest;

impl SocksV4aRequest {
    /// Encode a SOCKS4 request for an ipv4 destination, or a SOCKS4A one for a domain.
    pub fn encode(
        buf: &mut BytesMut,
        command: SocksCommand,
        addr: &UpstreamAddr,
        user_id: &str,
    ) -> Result<(), SocksNegotiationError> {
        if user_id.as_bytes().contains(&0) {
            return Err(SocksNegotiationError::InvalidUserIdString);
        }

        buf.put_u8(SocksVersion::V4a.code());
        buf.put_u8(command.code());
        buf.put_u16(addr.port());
        match addr.host() {
            Host::Ip(IpAddr::V4(ip4)) => {
                buf.put_slice(&ip4.octets());
                buf.put_slice(user_id.as_bytes());
                buf.put_u8(0);
            }
            Host::Ip(IpAddr::V6(_)) => return Err(SocksNegotiationError::InvalidAddrType),
            Host::Domain(domain) => {
                if domain.is_empty() {
                    return Err(SocksNegotiationError::InvalidDomainString);
                }
                buf.put_slice(&SOCKS4A_DOMAIN_MARKER.octets());
                buf.put_slice(user_id.as_bytes());
                buf.put_u8(0);
                buf.put_slice(domain.as_bytes());
                buf.put_u8(0);
            }
        }
        Ok(())
    }

    pub async fn send<W>(
        writer: &mut W,
        command: SocksCommand,
        addr: &UpstreamAddr,
        user_id: &str,
    ) -> Result<(), SocksConnectError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(9 + user_id.len() + 256);
        SocksV4aRequest::encode(&mut buf, command, addr, user_id)?;
        writer
            .write_all_flush(buf.as_ref())
            .await
            .map_err(SocksConnectError::WriteFailed)
    }
}
