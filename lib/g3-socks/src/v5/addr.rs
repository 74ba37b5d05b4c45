/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, BytesMut};

use g3_types::net::{Host, UpstreamAddr};

use super::{SocksFrameError, SocksNegotiationError};

const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// Length of the encoded address, starting from the address type byte.
///
/// At least 2 bytes are needed to get the length of a domain address.
pub(super) fn encoded_len(buf: &[u8]) -> Result<usize, SocksFrameError> {
    SocksFrameError::check_len(buf, 2)?;
    match buf[0] {
        ATYP_IPV4 => Ok(1 + 4 + 2),
        ATYP_DOMAIN => {
            let domain_len = buf[1] as usize;
            if domain_len == 0 {
                return Err(SocksNegotiationError::InvalidDomainString.into());
            }
            Ok(1 + 1 + domain_len + 2)
        }
        ATYP_IPV6 => Ok(1 + 16 + 2),
        _ => Err(SocksNegotiationError::InvalidAddrType.into()),
    }
}

pub(super) fn decode(buf: &[u8]) -> Result<(UpstreamAddr, usize), SocksFrameError> {
    let len = encoded_len(buf)?;
    SocksFrameError::check_len(buf, len)?;

    let port = u16::from_be_bytes([buf[len - 2], buf[len - 1]]);
    let addr = match buf[0] {
        ATYP_IPV4 => {
            let ip4 = Ipv4Addr::new(buf[1], buf[2], buf[3], buf[4]);
            UpstreamAddr::from_ip_and_port(IpAddr::V4(ip4), port)
        }
        ATYP_DOMAIN => {
            let domain = std::str::from_utf8(&buf[2..len - 2])
                .map_err(|_| SocksNegotiationError::InvalidDomainString)?;
            UpstreamAddr::from_host_str_and_port(domain, port)
                .map_err(|_| SocksNegotiationError::InvalidDomainString)?
        }
        _ => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&buf[1..17]);
            UpstreamAddr::from_ip_and_port(IpAddr::V6(Ipv6Addr::from(octets)), port)
        }
    };
    Ok((addr, len))
}

pub(super) fn encode(buf: &mut BytesMut, addr: &UpstreamAddr) -> Result<(), SocksNegotiationError> {
    match addr.host() {
        Host::Domain(domain) => {
            let len = u8::try_from(domain.len())
                .map_err(|_| SocksNegotiationError::InvalidDomainString)?;
            if len == 0 {
                return Err(SocksNegotiationError::InvalidDomainString);
            }
            buf.put_u8(ATYP_DOMAIN);
            buf.put_u8(len);
            buf.put_slice(domain.as_bytes());
        }
        Host::Ip(IpAddr::V4(ip4)) => {
            buf.put_u8(ATYP_IPV4);
            buf.put_slice(&ip4.octets());
        }
        Host::Ip(IpAddr::V6(ip6)) => {
            // No need to do ipv4 mapped address check here
            buf.put_u8(ATYP_IPV6);
            buf.put_slice(&ip6.octets());
        }
    }
    buf.put_u16(addr.port());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain() {
        let addr = UpstreamAddr::from_host_str_and_port("example.com", 443).unwrap();
        let mut buf = BytesMut::new();
        encode(&mut buf, &addr).unwrap();
        assert_eq!(&buf[..2], &[0x03, 11]);
        assert_eq!(encoded_len(&buf).unwrap(), 15);

        let (decoded, len) = decode(&buf).unwrap();
        assert_eq!(decoded, addr);
        assert_eq!(len, 15);
    }

    #[test]
    fn truncated() {
        assert_eq!(
            encoded_len(&[0x01]),
            Err(SocksFrameError::Truncated { need: 2, have: 1 })
        );
        assert_eq!(
            decode(&[0x04, 0, 0, 0]).unwrap_err(),
            SocksFrameError::Truncated { need: 19, have: 4 }
        );
        assert_eq!(
            decode(&[0x03, 4, b'a', b'b']).unwrap_err(),
            SocksFrameError::Truncated { need: 8, have: 4 }
        );
    }

    #[test]
    fn invalid() {
        assert_eq!(
            encoded_len(&[0x02, 0]).unwrap_err(),
            SocksFrameError::Invalid(SocksNegotiationError::InvalidAddrType)
        );
        assert_eq!(
            encoded_len(&[0x03, 0]).unwrap_err(),
            SocksFrameError::Invalid(SocksNegotiationError::InvalidDomainString)
        );
        assert_eq!(
            decode(&[0x03, 2, 0xFF, 0xFE, 0, 80]).unwrap_err(),
            SocksFrameError::Invalid(SocksNegotiationError::InvalidDomainString)
        );

        let long = UpstreamAddr::from_host_str_and_port(&"a.".repeat(128), 80).unwrap();
        let mut buf = BytesMut::new();
        assert_eq!(
            encode(&mut buf, &long),
            Err(SocksNegotiationError::InvalidDomainString)
        );
    }
}
