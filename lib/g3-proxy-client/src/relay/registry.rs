/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;

use super::{RelayServer, RelayServerConfig};
use crate::error::RelayError;
use crate::ss::{SsServerDescriptor, TunnelCipher};

type RelaySlot = Arc<OnceCell<Arc<RelayServer>>>;

/// Running relay servers, at most one for each key.
#[derive(Default)]
pub struct RelayRegistry {
    config: RelayServerConfig,
    inner: Mutex<HashMap<String, RelaySlot>>,
}

impl RelayRegistry {
    /// All relay servers will be started with this config.
    pub fn new(config: RelayServerConfig) -> Self {
        RelayRegistry {
            config,
            inner: Mutex::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn config(&self) -> &RelayServerConfig {
        &self.config
    }

    /// Get the relay server for the key, or start a new one if not existed.
    pub fn get_or_start(
        &self,
        key: &str,
        server: &SsServerDescriptor,
        cipher: &Arc<dyn TunnelCipher>,
    ) -> Result<Arc<RelayServer>, RelayError> {
        let slot = {
            let mut map = self.inner.lock().unwrap();
            map.entry(key.to_string()).or_default().clone()
        };

        let r = slot.get_or_try_init(|| {
            RelayServer::start(self.config.clone(), server.clone(), cipher.clone()).map(Arc::new)
        });
        match r {
            Ok(relay) => Ok(relay.clone()),
            Err(e) => {
                let mut map = self.inner.lock().unwrap();
                if let Some(cur) = map.get(key)
                    && Arc::ptr_eq(cur, &slot)
                    && cur.get().is_none()
                {
                    map.remove(key);
                }
                Err(e)
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<RelayServer>> {
        let map = self.inner.lock().unwrap();
        map.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Get the number of running relay servers.
    pub fn len(&self) -> usize {
        let map = self.inner.lock().unwrap();
        map.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shutdown and remove the relay server for the key.
    ///
    /// Return false if no relay server found.
    pub async fn shutdown(&self, key: &str) -> bool {
        let slot = self.inner.lock().unwrap().remove(key);
        match slot.and_then(|slot| slot.get().cloned()) {
            Some(relay) => {
                relay.shutdown().await;
                true
            }
            None => false,
        }
    }

    pub async fn shutdown_all(&self) {
        let slots: Vec<RelaySlot> = {
            let mut map = self.inner.lock().unwrap();
            map.drain().map(|(_, slot)| slot).collect()
        };
        for slot in slots {
            if let Some(relay) = slot.get() {
                relay.shutdown().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::str::FromStr;

    use async_trait::async_trait;
    use tokio::net::TcpStream;

    use g3_types::net::UpstreamAddr;

    use crate::dial::BoxTunnelStream;

    struct Plain;

    #[async_trait]
    impl TunnelCipher for Plain {
        fn supports(&self, _method: &str) -> bool {
            true
        }

        async fn wrap(
            &self,
            stream: TcpStream,
            _server: &SsServerDescriptor,
            _target: &UpstreamAddr,
        ) -> io::Result<BoxTunnelStream> {
            Ok(Box::new(stream))
        }
    }

    #[tokio::test]
    async fn reuse() {
        let registry = RelayRegistry::default();
        let cipher: Arc<dyn TunnelCipher> = Arc::new(Plain);
        let url = "ss://plain:secret@127.0.0.1:8388";
        let server = SsServerDescriptor::from_str(url).unwrap();

        let r1 = registry.get_or_start(url, &server, &cipher).unwrap();
        let r2 = registry.get_or_start(url, &server, &cipher).unwrap();
        assert!(Arc::ptr_eq(&r1, &r2));
        assert_eq!(r1.local_addr(), r2.local_addr());
        assert_eq!(registry.len(), 1);

        let other = "ss://plain:secret@127.0.0.1:8389";
        let r3 = registry.get_or_start(other, &server, &cipher).unwrap();
        assert_ne!(r1.local_addr(), r3.local_addr());
        assert_eq!(registry.len(), 2);

        assert!(registry.shutdown(url).await);
        assert!(!registry.shutdown(url).await);
        assert!(r1.is_shutdown());
        assert!(registry.get(url).is_none());
        assert!(registry.get(other).is_some());

        registry.shutdown_all().await;
        assert!(registry.is_empty());
        assert!(r3.is_shutdown());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_start() {
        const TASKS: usize = 16;

        let registry = Arc::new(RelayRegistry::default());
        let cipher: Arc<dyn TunnelCipher> = Arc::new(Plain);
        let url = "ss://plain:secret@127.0.0.1:8388";
        let server = SsServerDescriptor::from_str(url).unwrap();
        let barrier = Arc::new(tokio::sync::Barrier::new(TASKS));

        let mut handles = Vec::with_capacity(TASKS);
        for _ in 0..TASKS {
            let registry = registry.clone();
            let cipher = cipher.clone();
            let server = server.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                registry.get_or_start(url, &server, &cipher).unwrap()
            }));
        }
        let mut relays = Vec::with_capacity(TASKS);
        for h in handles {
            relays.push(h.await.unwrap());
        }

        let first = &relays[0];
        assert!(relays.iter().all(|r| Arc::ptr_eq(r, first)));
        assert_eq!(registry.len(), 1);
        assert!(first.stats().is_running());
        // the registry and the collected handles are the only owners
        assert_eq!(Arc::strong_count(first), TASKS + 1);

        registry.shutdown_all().await;
        assert!(!first.stats().is_running());
    }

    #[tokio::test]
    async fn start_failed() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = RelayServerConfig::default();
        config.set_listen_port(listener.local_addr().unwrap().port());
        let registry = RelayRegistry::new(config);

        let cipher: Arc<dyn TunnelCipher> = Arc::new(Plain);
        let url = "ss://plain:secret@127.0.0.1:8388";
        let server = SsServerDescriptor::from_str(url).unwrap();
        assert!(matches!(
            registry.get_or_start(url, &server, &cipher),
            Err(RelayError::PortAllocation(_))
        ));
        assert!(registry.is_empty());
        assert!(registry.get(url).is_none());
    }
}
