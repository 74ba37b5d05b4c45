/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use log::{info, warn};
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::RelayError;
use crate::ss::{SsServerDescriptor, TunnelCipher};

mod config;
pub use config::RelayServerConfig;

mod stats;
pub use stats::RelayServerStats;
use stats::RelayAliveGuard;

mod registry;
pub use registry::RelayRegistry;

mod task;
use task::RelayTask;

pub(crate) struct RelayContext {
    local_addr: SocketAddr,
    config: RelayServerConfig,
    server: SsServerDescriptor,
    cipher: Arc<dyn TunnelCipher>,
    stats: Arc<RelayServerStats>,
}

/// A local socks5 server which relays all connections into the tunnel to a fixed server.
pub struct RelayServer {
    ctx: Arc<RelayContext>,
    cancel: CancellationToken,
    accept_loop: Mutex<Option<JoinHandle<()>>>,
}

impl RelayServer {
    /// Bind the listen port and spawn the accept loop in the current tokio runtime.
    pub fn start(
        config: RelayServerConfig,
        server: SsServerDescriptor,
        cipher: Arc<dyn TunnelCipher>,
    ) -> Result<Self, RelayError> {
        let rt = Handle::try_current().map_err(|_| RelayError::NoRuntime)?;

        let listener =
            std::net::TcpListener::bind(config.listen_addr()).map_err(RelayError::PortAllocation)?;
        listener
            .set_nonblocking(true)
            .map_err(RelayError::PortAllocation)?;
        let local_addr = listener.local_addr().map_err(RelayError::PortAllocation)?;
        let listener = {
            let _guard = rt.enter();
            TcpListener::from_std(listener).map_err(RelayError::PortAllocation)?
        };

        let ctx = Arc::new(RelayContext {
            local_addr,
            config,
            server,
            cipher,
            stats: Arc::new(RelayServerStats::default()),
        });
        let cancel = CancellationToken::new();
        info!("relay {local_addr} started to {}", ctx.server.server);
        let alive = ctx.stats.add_accept_loop();
        let handle = rt.spawn(accept_loop(listener, ctx.clone(), cancel.clone(), alive));

        Ok(RelayServer {
            ctx,
            cancel,
            accept_loop: Mutex::new(Some(handle)),
        })
    }

    #[inline]
    pub fn local_addr(&self) -> SocketAddr {
        self.ctx.local_addr
    }

    #[inline]
    pub fn server(&self) -> &SsServerDescriptor {
        &self.ctx.server
    }

    #[inline]
    pub fn stats(&self) -> &Arc<RelayServerStats> {
        &self.ctx.stats
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop accepting new connections, and wait until the listener is closed.
    ///
    /// Connections already accepted are not affected.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.accept_loop.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn accept_loop(
    listener: TcpListener,
    ctx: Arc<RelayContext>,
    cancel: CancellationToken,
    _alive: RelayAliveGuard,
) {
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                info!("relay {} stopped", ctx.local_addr);
                break;
            }
            r = listener.accept() => {
                match r {
                    Ok((stream, peer_addr)) => {
                        ctx.stats.add_accepted();
                        let _ = stream.set_nodelay(true);
                        let task = RelayTask::new(ctx.clone(), peer_addr);
                        tokio::spawn(task.into_running(stream));
                    }
                    Err(e) => {
                        ctx.stats.add_accept_failed();
                        warn!("relay {} accept: {e:?}", ctx.local_addr);
                    }
                }
            }
        }
    }
}
