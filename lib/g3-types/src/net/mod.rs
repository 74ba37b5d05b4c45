/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod host;
mod proxy;
mod socks;
mod upstream;

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "rustls")]
mod rustls;

pub use host::Host;
pub use proxy::{Proxy, ProxyParseError, Socks4Proxy, Socks5Proxy};
pub use socks::SocksAuth;
pub use upstream::UpstreamAddr;

#[cfg(feature = "http")]
pub use self::http::{HttpAuth, HttpBasicAuth};
#[cfg(feature = "http")]
pub use proxy::HttpProxy;

#[cfg(feature = "rustls")]
pub use self::rustls::*;
