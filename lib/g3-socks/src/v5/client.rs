/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};

use g3_types::net::{SocksAuth, UpstreamAddr};

use super::{Socks5Reply, Socks5Request, SocksAuthMethod, SocksCommand, SocksConnectError, auth};

/// Run the sub-negotiation required by the method the server selected.
pub async fn socks5_authenticate<R, W>(
    reader: &mut R,
    writer: &mut W,
    method: SocksAuthMethod,
    auth: &SocksAuth,
) -> Result<(), SocksConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match (method, auth) {
        (SocksAuthMethod::None, _) => Ok(()),
        (SocksAuthMethod::User, SocksAuth::User(username, password)) => {
            auth::proceed_with_user(reader, writer, username, password).await
        }
        _ => Err(SocksConnectError::NoAuthMethodAvailable),
    }
}

/// Receive the reply of a connect request.
///
/// Return the local bind address at the server side.
pub async fn socks5_recv_connect_reply<R>(reader: &mut R) -> Result<SocketAddr, SocksConnectError>
where
    R: AsyncRead + Unpin,
{
    match Socks5Reply::recv(reader).await? {
        Socks5Reply::Succeeded(addr) => Ok(addr),
        rsp => Err(SocksConnectError::Socks5Rejected(rsp)),
    }
}

/// tcp connect to a socks5 proxy
///
/// return the local bind address at the server side
pub async fn socks5_connect_to<R, W>(
    reader: &mut R,
    writer: &mut W,
    auth: &SocksAuth,
    addr: &UpstreamAddr,
) -> Result<SocketAddr, SocksConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let method = auth::send_and_recv_method(reader, writer, auth).await?;
    socks5_authenticate(reader, writer, method, auth).await?;
    Socks5Request::send(writer, SocksCommand::TcpConnect, addr).await?;
    socks5_recv_connect_reply(reader).await
}
