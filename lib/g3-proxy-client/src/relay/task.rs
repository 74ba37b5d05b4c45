/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use log::debug;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use g3_io_ext::{StreamCopy, StreamCopyError};
use g3_socks::v5::{self, Socks5Reply, Socks5Request};
use g3_socks::{SocksAuthMethod, SocksCommand, SocksNegotiationError, SocksRequestParseError};
use g3_types::net::UpstreamAddr;

use super::RelayContext;
use crate::dial::BoxTunnelStream;
use crate::error::DialError;

#[derive(Debug, Error)]
pub(super) enum RelayTaskError {
    #[error("client closed")]
    ClientClosed,
    #[error("client read failed: {0:?}")]
    ClientReadFailed(io::Error),
    #[error("client write failed: {0:?}")]
    ClientWriteFailed(io::Error),
    #[error("invalid client protocol: {0}")]
    InvalidClientProtocol(SocksNegotiationError),
    #[error("unsupported command {0}")]
    UnsupportedCommand(SocksCommand),
    #[error("negotiation timeout")]
    NegotiationTimeout,
    #[error("upstream connect failed: {0}")]
    UpstreamConnectFailed(#[from] DialError),
    #[error("tunnel setup failed: {0:?}")]
    TunnelSetupFailed(io::Error),
    #[error("tunnel setup timeout")]
    TunnelSetupTimeout,
    #[error("upstream read failed: {0:?}")]
    UpstreamReadFailed(io::Error),
    #[error("upstream write failed: {0:?}")]
    UpstreamWriteFailed(io::Error),
}

impl From<SocksRequestParseError> for RelayTaskError {
    fn from(e: SocksRequestParseError) -> Self {
        match e {
            SocksRequestParseError::ClientClosed => RelayTaskError::ClientClosed,
            SocksRequestParseError::ReadFailed(e) => RelayTaskError::ClientReadFailed(e),
            SocksRequestParseError::InvalidProtocol(e) => RelayTaskError::InvalidClientProtocol(e),
        }
    }
}

impl RelayTaskError {
    fn is_handshake(&self) -> bool {
        matches!(
            self,
            RelayTaskError::ClientClosed
                | RelayTaskError::ClientReadFailed(_)
                | RelayTaskError::ClientWriteFailed(_)
                | RelayTaskError::InvalidClientProtocol(_)
                | RelayTaskError::UnsupportedCommand(_)
                | RelayTaskError::NegotiationTimeout
        )
    }

    fn is_upstream_setup(&self) -> bool {
        matches!(
            self,
            RelayTaskError::UpstreamConnectFailed(_)
                | RelayTaskError::TunnelSetupFailed(_)
                | RelayTaskError::TunnelSetupTimeout
        )
    }
}

/// One local socks5 connection relayed into the tunnel.
pub(super) struct RelayTask {
    ctx: Arc<RelayContext>,
    client_addr: SocketAddr,
}

impl RelayTask {
    pub(super) fn new(ctx: Arc<RelayContext>, client_addr: SocketAddr) -> Self {
        RelayTask { ctx, client_addr }
    }

    pub(super) async fn into_running(self, stream: TcpStream) {
        let _alive = self.ctx.stats.add_task();
        if let Err(e) = self.run(stream).await {
            if e.is_handshake() {
                self.ctx.stats.add_handshake_failed();
            } else if e.is_upstream_setup() {
                self.ctx.stats.add_upstream_failed();
            } else {
                self.ctx.stats.add_relay_failed();
            }
            debug!(
                "relay {} client {}: {e}",
                self.ctx.local_addr, self.client_addr
            );
        }
    }

    async fn run(&self, mut clt: TcpStream) -> Result<(), RelayTaskError> {
        let timeout = self.ctx.config.negotiation_timeout();
        let target = match tokio::time::timeout(timeout, self.negotiate(&mut clt)).await {
            Ok(r) => r?,
            Err(_) => return Err(RelayTaskError::NegotiationTimeout),
        };

        let ups = self.connect_upstream(&target).await?;
        debug!(
            "relay {} client {} connected to {target} via {}",
            self.ctx.local_addr, self.client_addr, self.ctx.server.server
        );

        let (mut clt_r, mut clt_w) = clt.split();
        let (mut ups_r, mut ups_w) = tokio::io::split(ups);
        self.transit(&mut clt_r, &mut clt_w, &mut ups_r, &mut ups_w)
            .await
    }

    /// Run the socks5 handshake, and get the target address.
    async fn negotiate(&self, clt: &mut TcpStream) -> Result<UpstreamAddr, RelayTaskError> {
        let (mut clt_r, mut clt_w) = clt.split();

        // no error frame is defined before method selection
        let _methods = v5::auth::recv_methods_from_client(&mut clt_r).await?;
        v5::auth::send_method_to_client(&mut clt_w, SocksAuthMethod::None)
            .await
            .map_err(RelayTaskError::ClientWriteFailed)?;

        let req = match Socks5Request::recv(&mut clt_r).await {
            Ok(req) => req,
            Err(SocksRequestParseError::InvalidProtocol(e)) => {
                let reply = match e {
                    SocksNegotiationError::InvalidCommand => Socks5Reply::CommandNotSupported,
                    SocksNegotiationError::InvalidAddrType => Socks5Reply::AddressTypeNotSupported,
                    _ => Socks5Reply::GeneralServerFailure,
                };
                let _ = reply.send(&mut clt_w).await;
                return Err(RelayTaskError::InvalidClientProtocol(e));
            }
            Err(e) => return Err(e.into()),
        };
        if req.command != SocksCommand::TcpConnect {
            let _ = Socks5Reply::CommandNotSupported.send(&mut clt_w).await;
            return Err(RelayTaskError::UnsupportedCommand(req.command));
        }

        Socks5Reply::succeeded_unspecified()
            .send(&mut clt_w)
            .await
            .map_err(RelayTaskError::ClientWriteFailed)?;
        Ok(req.upstream)
    }

    async fn connect_upstream(
        &self,
        target: &UpstreamAddr,
    ) -> Result<BoxTunnelStream, RelayTaskError> {
        let timeout = self.ctx.config.connect_timeout();
        let stream = crate::dial::connect_tcp(&self.ctx.server.server, timeout).await?;
        match tokio::time::timeout(
            timeout,
            self.ctx.cipher.wrap(stream, &self.ctx.server, target),
        )
        .await
        {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(RelayTaskError::TunnelSetupFailed(e)),
            Err(_) => Err(RelayTaskError::TunnelSetupTimeout),
        }
    }

    async fn transit<CR, CW, UR, UW>(
        &self,
        clt_r: &mut CR,
        clt_w: &mut CW,
        ups_r: &mut UR,
        ups_w: &mut UW,
    ) -> Result<(), RelayTaskError>
    where
        CR: AsyncRead + Unpin,
        CW: AsyncWrite + Unpin,
        UR: AsyncRead + Unpin,
        UW: AsyncWrite + Unpin,
    {
        let copy_config = self.ctx.config.copy_config();
        let drain_timeout = self.ctx.config.drain_timeout();
        let mut clt_to_ups = StreamCopy::new(clt_r, ups_w, copy_config);
        let mut ups_to_clt = StreamCopy::new(ups_r, clt_w, copy_config);

        // half close the finished direction, and give the other one a bounded time to finish,
        // both ends are closed when the task returns
        tokio::select! {
            r = &mut clt_to_ups => {
                r.map_err(map_clt_to_ups_error)?;
                let _ = clt_to_ups.writer().shutdown().await;
                match tokio::time::timeout(drain_timeout, ups_to_clt).await {
                    Ok(r) => r.map(|_| ()).map_err(map_ups_to_clt_error),
                    Err(_) => Ok(()),
                }
            }
            r = &mut ups_to_clt => {
                r.map_err(map_ups_to_clt_error)?;
                let _ = ups_to_clt.writer().shutdown().await;
                match tokio::time::timeout(drain_timeout, clt_to_ups).await {
                    Ok(r) => r.map(|_| ()).map_err(map_clt_to_ups_error),
                    Err(_) => Ok(()),
                }
            }
        }
    }
}

fn map_clt_to_ups_error(e: StreamCopyError) -> RelayTaskError {
    match e {
        StreamCopyError::ReadFailed(e) => RelayTaskError::ClientReadFailed(e),
        StreamCopyError::WriteFailed(e) => RelayTaskError::UpstreamWriteFailed(e),
    }
}

fn map_ups_to_clt_error(e: StreamCopyError) -> RelayTaskError {
    match e {
        StreamCopyError::ReadFailed(e) => RelayTaskError::UpstreamReadFailed(e),
        StreamCopyError::WriteFailed(e) => RelayTaskError::ClientWriteFailed(e),
    }
}
