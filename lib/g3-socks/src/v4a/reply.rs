/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::io::{AsyncRead, AsyncReadExt};

use super::{SocksFrameError, SocksNegotiationError, SocksReplyParseError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocksV4Reply {
    RequestGranted(SocketAddr), // the socket address is only meaningful for tcp bind
    RequestRejectedOrFailed,
    ClientIdentDNotConnected,
    UserIdNotMatch,
    Unassigned(u8),
}

impl SocksV4Reply {
    pub const FRAME_LEN: usize = 8;

    fn new(code: u8, addr: SocketAddr) -> Self {
        match code {
            90 => SocksV4Reply::RequestGranted(addr),
            91 => SocksV4Reply::RequestRejectedOrFailed,
            92 => SocksV4Reply::ClientIdentDNotConnected,
            93 => SocksV4Reply::UserIdNotMatch,
            _ => SocksV4Reply::Unassigned(code),
        }
    }

    pub const fn code(&self) -> u8 {
        match self {
            SocksV4Reply::RequestGranted(_) => 90,
            SocksV4Reply::RequestRejectedOrFailed => 91,
            SocksV4Reply::ClientIdentDNotConnected => 92,
            SocksV4Reply::UserIdNotMatch => 93,
            SocksV4Reply::Unassigned(code) => *code,
        }
    }

    pub const fn error_message(&self) -> &'static str {
        match self {
            SocksV4Reply::RequestGranted(_) => "request granted",
            SocksV4Reply::RequestRejectedOrFailed => "request rejected or failed",
            SocksV4Reply::ClientIdentDNotConnected => {
                "request rejected because SOCKS server cannot connect to identd on the client"
            }
            SocksV4Reply::UserIdNotMatch => {
                "request rejected because the client program and identd report different user-ids"
            }
            SocksV4Reply::Unassigned(_) => "unassigned reply code",
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self, SocksFrameError> {
        SocksFrameError::check_len(buf, Self::FRAME_LEN)?;

        let version = buf[0];
        if version != 0x00 {
            return Err(SocksNegotiationError::InvalidVersion.into());
        }

        let code = buf[1];
        let port = u16::from_be_bytes([buf[2], buf[3]]);
        let ip4 = Ipv4Addr::new(buf[4], buf[5], buf[6], buf[7]);
        let addr = SocketAddr::new(IpAddr::V4(ip4), port);

        Ok(SocksV4Reply::new(code, addr))
    }

    pub async fn recv<R>(reader: &mut R) -> Result<Self, SocksReplyParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; Self::FRAME_LEN];
        reader.read_exact(&mut buf).await?;
        let reply = SocksV4Reply::decode(&buf)?;
        Ok(reply)
    }
}

impl fmt::Display for SocksV4Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.error_message(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode() {
        let reply = SocksV4Reply::decode(&[0, 90, 0x1F, 0x90, 127, 0, 0, 1]).unwrap();
        assert_eq!(
            reply,
            SocksV4Reply::RequestGranted(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080))
        );

        let reply = SocksV4Reply::decode(&[0, 91, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(reply, SocksV4Reply::RequestRejectedOrFailed);
        assert_eq!(reply.code(), 91);

        let reply = SocksV4Reply::decode(&[0, 7, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(reply, SocksV4Reply::Unassigned(7));
    }

    #[test]
    fn malformed() {
        assert_eq!(
            SocksV4Reply::decode(&[0, 90, 0, 0]).unwrap_err(),
            SocksFrameError::Truncated { need: 8, have: 4 }
        );
        assert_eq!(
            SocksV4Reply::decode(&[4, 90, 0, 0, 0, 0, 0, 0]).unwrap_err(),
            SocksFrameError::Invalid(SocksNegotiationError::InvalidVersion)
        );
    }
}
