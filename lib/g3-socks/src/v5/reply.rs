/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use g3_io_ext::LimitedWriteExt;
use g3_types::net::UpstreamAddr;

use super::{SocksFrameError, SocksNegotiationError, SocksReplyParseError, addr};

const HEAD_LEN: usize = 3;
const PEEK_LEN: usize = HEAD_LEN + 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Socks5Reply {
    Succeeded(SocketAddr),
    GeneralServerFailure,
    ForbiddenByRule,
    NetworkUnreachable,
    HostUnreachable,
    ConnectionRefused,
    TtlExpired,
    CommandNotSupported,
    AddressTypeNotSupported,
    ConnectionTimedOut,
    Unassigned(u8),
}

impl Socks5Reply {
    fn new(code: u8, addr: SocketAddr) -> Self {
        match code {
            0x00 => Socks5Reply::Succeeded(addr),
            0x01 => Socks5Reply::GeneralServerFailure,
            0x02 => Socks5Reply::ForbiddenByRule,
            0x03 => Socks5Reply::NetworkUnreachable,
            0x04 => Socks5Reply::HostUnreachable,
            0x05 => Socks5Reply::ConnectionRefused,
            0x06 => Socks5Reply::TtlExpired,
            0x07 => Socks5Reply::CommandNotSupported,
            0x08 => Socks5Reply::AddressTypeNotSupported,
            0x09 => Socks5Reply::ConnectionTimedOut,
            n => Socks5Reply::Unassigned(n),
        }
    }

    /// A success reply with the unspecified bind address `0.0.0.0:0`.
    pub fn succeeded_unspecified() -> Self {
        Socks5Reply::Succeeded(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0))
    }

    pub const fn code(&self) -> u8 {
        match self {
            Socks5Reply::Succeeded(_) => 0x00,
            Socks5Reply::GeneralServerFailure => 0x01,
            Socks5Reply::ForbiddenByRule => 0x02,
            Socks5Reply::NetworkUnreachable => 0x03,
            Socks5Reply::HostUnreachable => 0x04,
            Socks5Reply::ConnectionRefused => 0x05,
            Socks5Reply::TtlExpired => 0x06,
            Socks5Reply::CommandNotSupported => 0x07,
            Socks5Reply::AddressTypeNotSupported => 0x08,
            Socks5Reply::ConnectionTimedOut => 0x09,
            Socks5Reply::Unassigned(n) => *n,
        }
    }

    pub const fn error_message(&self) -> &'static str {
        match self {
            // message from rfc1928
            Socks5Reply::Succeeded(_) => "Succeeded",
            Socks5Reply::GeneralServerFailure => "General SOCKS server failure",
            Socks5Reply::ForbiddenByRule => "Connection not allowed by ruleset",
            Socks5Reply::NetworkUnreachable => "Network unreachable",
            Socks5Reply::HostUnreachable => "Host unreachable",
            Socks5Reply::ConnectionRefused => "Connection refused",
            Socks5Reply::TtlExpired => "TTL expired",
            Socks5Reply::CommandNotSupported => "Command not supported",
            Socks5Reply::AddressTypeNotSupported => "Address type not supported",
            // message from socks-6-09
            Socks5Reply::ConnectionTimedOut => "Connection attempt timed out",
            Socks5Reply::Unassigned(_) => "unassigned reply code",
        }
    }

    /// Get the total length of the reply frame from its first 5 bytes.
    pub fn frame_len(buf: &[u8]) -> Result<usize, SocksFrameError> {
        SocksFrameError::check_len(buf, PEEK_LEN)?;
        if buf[0] != 0x05 {
            return Err(SocksNegotiationError::InvalidVersion.into());
        }
        let addr_len = addr::encoded_len(&buf[HEAD_LEN..])?;
        Ok(HEAD_LEN + addr_len)
    }

    pub fn decode(buf: &[u8]) -> Result<(Self, usize), SocksFrameError> {
        let len = Socks5Reply::frame_len(buf)?;
        SocksFrameError::check_len(buf, len)?;

        let (bind, _) = addr::decode(&buf[HEAD_LEN..len])?;
        // a domain bind address is useless for a connect request
        let bind = bind
            .to_socket_addr()
            .unwrap_or_else(|| SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), bind.port()));
        Ok((Socks5Reply::new(buf[1], bind), len))
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(0x05);
        buf.put_u8(self.code());
        buf.put_u8(0x00);
        let bind = match self {
            Socks5Reply::Succeeded(addr) => match addr.ip() {
                IpAddr::V6(ip6) => match ip6.to_ipv4_mapped() {
                    Some(ip4) => SocketAddr::new(IpAddr::V4(ip4), addr.port()),
                    None => *addr,
                },
                IpAddr::V4(_) => *addr,
            },
            _ => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        };
        // ip addresses never fail to encode
        let _ = addr::encode(buf, &UpstreamAddr::from(bind));
    }

    pub async fn recv<R>(reader: &mut R) -> Result<Self, SocksReplyParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 3 + 1 + 1 + u8::MAX as usize + 2];
        reader.read_exact(&mut buf[..PEEK_LEN]).await?;
        let len = Socks5Reply::frame_len(&buf[..PEEK_LEN])?;
        reader.read_exact(&mut buf[PEEK_LEN..len]).await?;
        let (reply, _) = Socks5Reply::decode(&buf[..len])?;
        Ok(reply)
    }

    pub async fn send<W>(&self, clt_w: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(22);
        self.encode(&mut buf);
        clt_w.write_all_flush(buf.as_ref()).await
    }
}

impl fmt::Display for Socks5Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.error_message(), self.code())
    }
}
