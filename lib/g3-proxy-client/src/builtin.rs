/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use g3_types::net::{Proxy, Socks5Proxy};

use crate::dial::{Socks4Dialer, Socks5Dialer, StreamDialer};
use crate::error::ProxyClientError;
use crate::options::BuildOptions;
use crate::transport::{RoundTripper, TransportConfig};

fn build(config: TransportConfig) -> Result<Arc<dyn RoundTripper>, ProxyClientError> {
    let transport = config.build()?;
    Ok(Arc::new(transport))
}

fn with_dialer(
    mut config: TransportConfig,
    dialer: Arc<dyn StreamDialer>,
) -> Result<Arc<dyn RoundTripper>, ProxyClientError> {
    config.set_proxy(None);
    config.set_dialer(Some(dialer));
    build(config)
}

fn parse_proxy(url: &Url) -> Result<Proxy, ProxyClientError> {
    Proxy::try_from(url).map_err(ProxyClientError::from)
}

fn wrong_scheme(url: &Url) -> ProxyClientError {
    ProxyClientError::UnsupportedScheme(url.scheme().to_string())
}

/// Get the dial timeout set in the `timeout` query parameter.
fn query_timeout(url: &Url) -> Result<Option<Duration>, ProxyClientError> {
    let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "timeout") else {
        return Ok(None);
    };
    let timeout = humanize_rs::duration::parse(&v)
        .map_err(|e| ProxyClientError::InvalidProxyOption("timeout", format!("{v}: {e:?}")))?;
    Ok(Some(timeout))
}

/// Construct a transport that sends requests through a http(s) forward proxy.
pub fn http_transport(
    url: &Url,
    opts: &BuildOptions,
) -> Result<Arc<dyn RoundTripper>, ProxyClientError> {
    let Proxy::Http(proxy) = parse_proxy(url)? else {
        return Err(wrong_scheme(url));
    };
    let mut config = opts.new_transport_config();
    config.set_dialer(None);
    config.set_proxy(Some(proxy));
    build(config)
}

/// Check the `resolve` query parameter, only `local` and `remote` are allowed.
fn query_local_resolve(url: &Url) -> Result<bool, ProxyClientError> {
    let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "resolve") else {
        return Ok(false);
    };
    match v.as_ref() {
        "local" => Ok(true),
        "remote" => Ok(false),
        _ => Err(ProxyClientError::InvalidProxyOption(
            "resolve",
            v.into_owned(),
        )),
    }
}

/// Construct a transport that connects to targets through a socks5 proxy.
///
/// Target domains are sent to the proxy as is for both `socks5` and `socks5h`,
/// unless `resolve=local` is set in the url query.
pub fn socks5_transport(
    url: &Url,
    opts: &BuildOptions,
) -> Result<Arc<dyn RoundTripper>, ProxyClientError> {
    let Proxy::Socks5(mut proxy) = parse_proxy(url)? else {
        return Err(wrong_scheme(url));
    };
    proxy.set_local_resolve(query_local_resolve(url)?);
    socks5_proxy_transport(proxy, opts)
}

pub(crate) fn socks5_proxy_transport(
    proxy: Socks5Proxy,
    opts: &BuildOptions,
) -> Result<Arc<dyn RoundTripper>, ProxyClientError> {
    let config = opts.new_transport_config();
    let dialer = Socks5Dialer::new(proxy, config.connect_timeout());
    with_dialer(config, Arc::new(dialer))
}

/// Construct a transport that connects to targets through a socks4 or socks4a proxy.
///
/// The `timeout` query parameter in the url overrides the dial timeout.
pub fn socks4_transport(
    url: &Url,
    opts: &BuildOptions,
) -> Result<Arc<dyn RoundTripper>, ProxyClientError> {
    let Proxy::Socks4(proxy) = parse_proxy(url)? else {
        return Err(wrong_scheme(url));
    };
    let mut config = opts.new_transport_config();
    if let Some(timeout) = query_timeout(url)? {
        config.set_connect_timeout(timeout);
    }
    let dialer = Socks4Dialer::new(proxy, config.connect_timeout());
    with_dialer(config, Arc::new(dialer))
}
