/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use base64::prelude::*;
use thiserror::Error;
use url::Url;

use g3_types::net::UpstreamAddr;

#[derive(Debug, Error)]
pub enum SsUrlParseError {
    #[error("not a ss url")]
    InvalidScheme,
    #[error("invalid base64 encoding")]
    InvalidBase64Encoding,
    #[error("invalid utf-8 encoding")]
    InvalidUtf8Encoding,
    #[error("invalid user info")]
    InvalidUserInfo,
    #[error("invalid server address: {0}")]
    InvalidServer(String),
    #[error("no port found")]
    NoPortFound,
}

/// The remote server of a shadowsocks tunnel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SsServerDescriptor {
    pub server: UpstreamAddr,
    pub method: String,
    pub password: String,
    pub plugin: Option<String>,
    pub plugin_opts: Option<String>,
    pub name: Option<String>,
}

fn decode_base64(s: &str) -> Result<String, SsUrlParseError> {
    let data = BASE64_URL_SAFE_NO_PAD
        .decode(s.trim_end_matches('='))
        .or_else(|_| BASE64_STANDARD.decode(s))
        .map_err(|_| SsUrlParseError::InvalidBase64Encoding)?;
    String::from_utf8(data).map_err(|_| SsUrlParseError::InvalidUtf8Encoding)
}

fn split_method_password(s: &str) -> Result<(String, String), SsUrlParseError> {
    let Some((method, password)) = s.split_once(':') else {
        return Err(SsUrlParseError::InvalidUserInfo);
    };
    if method.is_empty() {
        return Err(SsUrlParseError::InvalidUserInfo);
    }
    Ok((method.to_string(), password.to_string()))
}

impl SsServerDescriptor {
    /// `method:password` is plain (percent encoded) or base64 encoded in user info.
    fn parse_sip002(user_info: &str, server: &str) -> Result<Self, SsUrlParseError> {
        let user_info = if user_info.contains(':') {
            percent_encoding::percent_decode_str(user_info)
                .decode_utf8()
                .map_err(|_| SsUrlParseError::InvalidUtf8Encoding)?
                .into_owned()
        } else {
            decode_base64(user_info)?
        };
        let (method, password) = split_method_password(&user_info)?;

        let url = Url::parse(&format!("ss://{server}"))
            .map_err(|e| SsUrlParseError::InvalidServer(e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| SsUrlParseError::InvalidServer("no host found".to_string()))?;
        let port = url.port().ok_or(SsUrlParseError::NoPortFound)?;
        let server = UpstreamAddr::from_host_str_and_port(host, port)
            .map_err(|e| SsUrlParseError::InvalidServer(e.to_string()))?;

        let mut plugin = None;
        let mut plugin_opts = None;
        if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "plugin") {
            match v.split_once(';') {
                Some((name, opts)) => {
                    plugin = Some(name.to_string());
                    plugin_opts = Some(opts.to_string());
                }
                None if !v.is_empty() => plugin = Some(v.into_owned()),
                None => {}
            }
        }

        Ok(SsServerDescriptor {
            server,
            method,
            password,
            plugin,
            plugin_opts,
            name: None,
        })
    }

    /// The whole `method:password@host:port` is base64 encoded.
    fn parse_legacy(encoded: &str) -> Result<Self, SsUrlParseError> {
        let decoded = decode_base64(encoded)?;
        let Some((user_info, server)) = decoded.rsplit_once('@') else {
            return Err(SsUrlParseError::InvalidUserInfo);
        };
        let (method, password) = split_method_password(user_info)?;
        if !server.contains(':') {
            return Err(SsUrlParseError::NoPortFound);
        }
        let server = UpstreamAddr::from_str(server)
            .map_err(|e| SsUrlParseError::InvalidServer(e.to_string()))?;

        Ok(SsServerDescriptor {
            server,
            method,
            password,
            plugin: None,
            plugin_opts: None,
            name: None,
        })
    }
}

impl FromStr for SsServerDescriptor {
    type Err = SsUrlParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(encoded) = s
            .get(..5)
            .filter(|p| p.eq_ignore_ascii_case("ss://"))
            .map(|_| &s[5..])
        else {
            return Err(SsUrlParseError::InvalidScheme);
        };

        let (encoded, name) = match encoded.rsplit_once('#') {
            Some((left, tag)) => {
                let name = percent_encoding::percent_decode_str(tag)
                    .decode_utf8()
                    .ok()
                    .filter(|s| !s.is_empty())
                    .map(|s| s.into_owned());
                (left, name)
            }
            None => (encoded, None),
        };

        let mut descriptor = match encoded.split_once('@') {
            Some((user_info, server)) => SsServerDescriptor::parse_sip002(user_info, server)?,
            None => SsServerDescriptor::parse_legacy(encoded)?,
        };
        descriptor.name = name;
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn sip002_plain() {
        let d = SsServerDescriptor::from_str(
            "ss://aes-256-gcm:p%40ss@192.168.100.1:8888#Example%20Server",
        )
        .unwrap();
        assert_eq!(d.method, "aes-256-gcm");
        assert_eq!(d.password, "p@ss");
        assert_eq!(
            d.server,
            UpstreamAddr::from_ip_and_port(IpAddr::V4(Ipv4Addr::new(192, 168, 100, 1)), 8888)
        );
        assert_eq!(d.name.as_deref(), Some("Example Server"));
        assert!(d.plugin.is_none());
    }

    #[test]
    fn sip002_base64() {
        // chacha20-ietf-poly1305:test
        let d = SsServerDescriptor::from_str(
            "ss://Y2hhY2hhMjAtaWV0Zi1wb2x5MTMwNTp0ZXN0@ss.example.net:8388/",
        )
        .unwrap();
        assert_eq!(d.method, "chacha20-ietf-poly1305");
        assert_eq!(d.password, "test");
        assert_eq!(d.server.to_string(), "ss.example.net:8388");
        assert!(d.name.is_none());

        // aes-128-gcm:test with padding
        let d = SsServerDescriptor::from_str("ss://YWVzLTEyOC1nY206dGVzdA==@127.0.0.1:8388")
            .unwrap();
        assert_eq!(d.method, "aes-128-gcm");
        assert_eq!(d.password, "test");
    }

    #[test]
    fn sip002_plugin() {
        let d = SsServerDescriptor::from_str(
            "ss://YWVzLTEyOC1nY206dGVzdA@192.168.100.1:8888/?plugin=obfs-local%3Bobfs%3Dhttp#Example",
        )
        .unwrap();
        assert_eq!(d.plugin.as_deref(), Some("obfs-local"));
        assert_eq!(d.plugin_opts.as_deref(), Some("obfs=http"));
        assert_eq!(d.name.as_deref(), Some("Example"));
    }

    #[test]
    fn legacy() {
        // aes-256-cfb:password@192.168.1.1:8388
        let d = SsServerDescriptor::from_str(
            "ss://YWVzLTI1Ni1jZmI6cGFzc3dvcmRAMTkyLjE2OC4xLjE6ODM4OA#legacy",
        )
        .unwrap();
        assert_eq!(d.method, "aes-256-cfb");
        assert_eq!(d.password, "password");
        assert_eq!(d.server.to_string(), "192.168.1.1:8388");
        assert_eq!(d.name.as_deref(), Some("legacy"));
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            SsServerDescriptor::from_str("socks5://127.0.0.1:1080"),
            Err(SsUrlParseError::InvalidScheme)
        ));
        assert!(matches!(
            SsServerDescriptor::from_str("ss://!!!"),
            Err(SsUrlParseError::InvalidBase64Encoding)
        ));
        assert!(matches!(
            SsServerDescriptor::from_str("ss://aes-128-gcm:test@127.0.0.1"),
            Err(SsUrlParseError::NoPortFound)
        ));
        // YWVzLTEyOC1nY20 = aes-128-gcm
        assert!(matches!(
            SsServerDescriptor::from_str("ss://YWVzLTEyOC1nY20@127.0.0.1:8388"),
            Err(SsUrlParseError::InvalidUserInfo)
        ));
    }
}
