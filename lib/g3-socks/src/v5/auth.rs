/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use g3_io_ext::LimitedWriteExt;
use g3_types::auth::{Password, Username};
use g3_types::net::SocksAuth;

use super::{
    SocksAuthMethod, SocksConnectError, SocksFrameError, SocksNegotiationError,
    SocksRequestParseError, SocksVersion,
};

const USER_AUTH_VERSION: u8 = 0x01;

pub fn encode_methods(buf: &mut BytesMut, methods: &[SocksAuthMethod]) {
    buf.put_u8(SocksVersion::V5.code());
    buf.put_u8(methods.len() as u8);
    for m in methods {
        buf.put_u8(m.code());
    }
}

/// Decode the method selection message sent by the client.
pub fn decode_methods(buf: &[u8]) -> Result<(Vec<SocksAuthMethod>, usize), SocksFrameError> {
    SocksFrameError::check_len(buf, 2)?;
    if SocksVersion::try_from(buf[0])? != SocksVersion::V5 {
        return Err(SocksNegotiationError::InvalidVersion.into());
    }
    let count = buf[1] as usize;
    if count == 0 {
        return Err(SocksNegotiationError::NoAuthMethod.into());
    }
    SocksFrameError::check_len(buf, 2 + count)?;
    let methods = buf[2..2 + count]
        .iter()
        .map(|v| SocksAuthMethod::from(*v))
        .collect();
    Ok((methods, 2 + count))
}

/// Decode the method chosen by the server.
pub fn decode_method_selection(buf: &[u8]) -> Result<SocksAuthMethod, SocksFrameError> {
    SocksFrameError::check_len(buf, 2)?;
    if buf[0] != SocksVersion::V5.code() {
        return Err(SocksNegotiationError::InvalidVersion.into());
    }
    Ok(SocksAuthMethod::from(buf[1]))
}

pub fn encode_user_auth(buf: &mut BytesMut, username: &Username, password: &Password) {
    buf.put_u8(USER_AUTH_VERSION);
    buf.put_u8(username.len());
    buf.put_slice(username.as_original().as_bytes());
    buf.put_u8(password.len());
    buf.put_slice(password.as_original().as_bytes());
}

pub async fn send_and_recv_method<R, W>(
    reader: &mut R,
    writer: &mut W,
    auth: &SocksAuth,
) -> Result<SocksAuthMethod, SocksConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let offered: &[SocksAuthMethod] = match auth {
        SocksAuth::None => &[SocksAuthMethod::None],
        SocksAuth::User(_, _) => &[SocksAuthMethod::None, SocksAuthMethod::User],
    };

    let mut buf = BytesMut::with_capacity(4);
    encode_methods(&mut buf, offered);
    writer
        .write_all_flush(buf.as_ref())
        .await
        .map_err(SocksConnectError::WriteFailed)?;

    let mut rsp = [0u8; 2];
    reader
        .read_exact(&mut rsp)
        .await
        .map_err(SocksConnectError::ReadFailed)?;
    let method = decode_method_selection(&rsp).map_err(|e| match e {
        SocksFrameError::Invalid(e) => SocksConnectError::InvalidProtocol(e),
        SocksFrameError::Truncated { .. } => {
            SocksConnectError::ReadFailed(io::ErrorKind::UnexpectedEof.into())
        }
    })?;
    if method == SocksAuthMethod::NoAcceptable {
        return Err(SocksConnectError::NoAuthMethodAvailable);
    }
    if !offered.contains(&method) {
        return Err(SocksNegotiationError::InvalidAuthMethod.into());
    }
    Ok(method)
}

pub async fn proceed_with_user<R, W>(
    reader: &mut R,
    writer: &mut W,
    username: &Username,
    password: &Password,
) -> Result<(), SocksConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(3 + username.len() as usize + password.len() as usize);
    encode_user_auth(&mut buf, username, password);
    writer
        .write_all_flush(buf.as_ref())
        .await
        .map_err(SocksConnectError::WriteFailed)?;

    let mut rsp = [0u8; 2];
    reader
        .read_exact(&mut rsp)
        .await
        .map_err(SocksConnectError::ReadFailed)?;
    if rsp[0] != USER_AUTH_VERSION {
        return Err(SocksConnectError::UnsupportedAuthVersion);
    }
    if rsp[1] != 0x00 {
        return Err(SocksConnectError::AuthFailed);
    }
    Ok(())
}

pub async fn recv_methods_from_client<R>(
    clt_r: &mut R,
) -> Result<Vec<SocksAuthMethod>, SocksRequestParseError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 2 + u8::MAX as usize];
    clt_r.read_exact(&mut buf[..2]).await?;
    let count = buf[1] as usize;
    // check the version before waiting for more data
    if let Err(SocksFrameError::Invalid(e)) = decode_methods(&buf[..2]) {
        return Err(e.into());
    }
    clt_r.read_exact(&mut buf[2..2 + count]).await?;
    let (methods, _) = decode_methods(&buf[..2 + count])?;
    Ok(methods)
}

pub async fn send_method_to_client<W>(clt_w: &mut W, method: SocksAuthMethod) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let buf = [SocksVersion::V5.code(), method.code()];
    clt_w.write_all_flush(&buf).await
}
