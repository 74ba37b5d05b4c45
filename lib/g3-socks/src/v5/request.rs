/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use g3_io_ext::LimitedWriteExt;
use g3_types::net::UpstreamAddr;

use super::{
    SocksCommand, SocksConnectError, SocksFrameError, SocksNegotiationError,
    SocksRequestParseError, addr,
};

/// The fixed part before the address: VER CMD RSV.
const HEAD_LEN: usize = 3;
/// Enough to know the length of every kind of request frame.
const PEEK_LEN: usize = HEAD_LEN + 2;

#[derive(Debug)]
pub struct Socks5Request {
    pub command: SocksCommand,
    pub upstream: UpstreamAddr,
}

impl Socks5Request {
    /// Get the total length of the request frame from its first 5 bytes.
    pub fn frame_len(buf: &[u8]) -> Result<usize, SocksFrameError> {
        SocksFrameError::check_len(buf, PEEK_LEN)?;
        if buf[0] != 0x05 {
            return Err(SocksNegotiationError::InvalidVersion.into());
        }
        let addr_len = addr::encoded_len(&buf[HEAD_LEN..])?;
        Ok(HEAD_LEN + addr_len)
    }

    /// Decode a complete request frame, return the request and the consumed length.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), SocksFrameError> {
        let len = Socks5Request::frame_len(buf)?;
        SocksFrameError::check_len(buf, len)?;

        let command = SocksCommand::try_from(buf[1])?;
        let (upstream, _) = addr::decode(&buf[HEAD_LEN..len])?;
        Ok((Socks5Request { command, upstream }, len))
    }

    pub fn encode(
        buf: &mut BytesMut,
        command: SocksCommand,
        upstream: &UpstreamAddr,
    ) -> Result<(), SocksNegotiationError> {
        buf.put_u8(0x05);
        buf.put_u8(command.code());
        buf.put_u8(0x00);
        addr::encode(buf, upstream)
    }

    pub async fn recv<R>(clt_r: &mut R) -> Result<Self, SocksRequestParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 3 + 1 + 1 + u8::MAX as usize + 2];
        clt_r.read_exact(&mut buf[..PEEK_LEN]).await?;
        let len = Socks5Request::frame_len(&buf[..PEEK_LEN])?;
        clt_r.read_exact(&mut buf[PEEK_LEN..len]).await?;
        let (req, _) = Socks5Request::decode(&buf[..len])?;
        Ok(req)
    }

    pub async fn send<W>(
        writer: &mut W,
        command: SocksCommand,
        upstream: &UpstreamAddr,
    ) -> Result<(), SocksConnectError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(PEEK_LEN + u8::MAX as usize + 2);
        Socks5Request::encode(&mut buf, command, upstream)?;
        writer
            .write_all_flush(buf.as_ref())
            .await
            .map_err(SocksConnectError::WriteFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
    use tokio_test::io::Builder;

    #[test]
    fn decode_ipv4() {
        let frame = [0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1, 0x1F, 0x90];
        let (req, len) = Socks5Request::decode(&frame).unwrap();
        assert_eq!(len, 10);
        assert_eq!(req.command, SocksCommand::TcpConnect);
        assert_eq!(
            req.upstream,
            UpstreamAddr::from_ip_and_port(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080)
        );
    }

    #[test]
    fn decode_truncated() {
        let frame = [0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1, 0x1F];
        assert_eq!(
            Socks5Request::decode(&frame).unwrap_err(),
            SocksFrameError::Truncated { need: 10, have: 9 }
        );
        assert_eq!(
            Socks5Request::frame_len(&frame[..4]).unwrap_err(),
            SocksFrameError::Truncated { need: 5, have: 4 }
        );
    }

    #[test]
    fn decode_malformed() {
        let frame = [0x04, 0x01, 0x00, 0x01, 127, 0, 0, 1, 0x1F, 0x90];
        assert_eq!(
            Socks5Request::decode(&frame).unwrap_err(),
            SocksFrameError::Invalid(SocksNegotiationError::InvalidVersion)
        );

        let frame = [0x05, 0x09, 0x00, 0x01, 127, 0, 0, 1, 0x1F, 0x90];
        assert_eq!(
            Socks5Request::decode(&frame).unwrap_err(),
            SocksFrameError::Invalid(SocksNegotiationError::InvalidCommand)
        );

        let frame = [0x05, 0x01, 0x00, 0x05, 127, 0, 0, 1, 0x1F, 0x90];
        assert_eq!(
            Socks5Request::decode(&frame).unwrap_err(),
            SocksFrameError::Invalid(SocksNegotiationError::InvalidAddrType)
        );
    }

    #[test]
    fn encode_ipv6() {
        let upstream = UpstreamAddr::from_ip_and_port(IpAddr::V6(Ipv6Addr::LOCALHOST), 443);
        let mut buf = BytesMut::new();
        Socks5Request::encode(&mut buf, SocksCommand::TcpConnect, &upstream).unwrap();
        assert_eq!(buf.len(), 22);
        assert_eq!(&buf[..4], &[0x05, 0x01, 0x00, 0x04]);
        assert_eq!(&buf[20..], &[0x01, 0xBB]);
    }

    #[tokio::test]
    async fn recv_domain() {
        let mut stream = Builder::new()
            .read(&[0x05, 0x01, 0x00, 0x03, 0x0B])
            .read(b"example.com")
            .read(&[0x00, 0x50])
            .build();
        let req = Socks5Request::recv(&mut stream).await.unwrap();
        assert_eq!(req.command, SocksCommand::TcpConnect);
        assert_eq!(
            req.upstream,
            UpstreamAddr::from_host_str_and_port("example.com", 80).unwrap()
        );
    }

    #[tokio::test]
    async fn recv_closed() {
        let mut stream = Builder::new().read(&[0x05, 0x01, 0x00]).build();
        let r = Socks5Request::recv(&mut stream).await;
        assert!(matches!(r, Err(SocksRequestParseError::ClientClosed)));
    }

    #[tokio::test]
    async fn send_domain() {
        let upstream = UpstreamAddr::from_host_str_and_port("a.b", 443).unwrap();
        let mut stream = Builder::new()
            .write(&[0x05, 0x01, 0x00, 0x03, 0x03, b'a', b'.', b'b', 0x01, 0xBB])
            .build();
        Socks5Request::send(&mut stream, SocksCommand::TcpConnect, &upstream)
            .await
            .unwrap();
    }
}
