/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::{Arc, LazyLock};

mod builtin;
pub use builtin::{http_transport, socks4_transport, socks5_transport};

mod client;
pub use client::ProxyClient;

pub mod dial;
pub mod probe;
pub mod relay;
pub mod ss;
pub mod tls;
pub mod transport;

mod error;
pub use error::{DialError, HandshakePhase, ProxyClientError, RelayError};

mod options;
pub use options::{BuildOptions, ClientTemplate, TransportHook};

mod registry;
pub use registry::{ProtocolRegistry, TransportConstructor, new_client};

#[cfg(feature = "yaml")]
mod yaml;

static DEFAULT_RELAY_REGISTRY: LazyLock<Arc<relay::RelayRegistry>> =
    LazyLock::new(|| Arc::new(relay::RelayRegistry::default()));

static DEFAULT_REGISTRY: LazyLock<ProtocolRegistry> = LazyLock::new(|| {
    #[allow(unused_mut)]
    let mut registry = ProtocolRegistry::with_builtin();
    #[cfg(feature = "shadowsocks")]
    ss::register_shadowsocks(
        &mut registry,
        DEFAULT_RELAY_REGISTRY.clone(),
        Arc::new(ss::ShadowsocksCipher::default()),
        ss::ShadowsocksMode::Relay,
    );
    registry
});

/// The relay servers started by the default registry.
pub fn default_relay_registry() -> &'static Arc<relay::RelayRegistry> {
    &DEFAULT_RELAY_REGISTRY
}

/// A registry with all builtin schemes, and `ss` if the `shadowsocks` feature is enabled.
pub fn default_registry() -> &'static ProtocolRegistry {
    &DEFAULT_REGISTRY
}
