/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::AsyncRead;

use super::{SocksConnectError, SocksV4Reply};

/// Receive the 8 bytes reply of a connect request.
pub async fn socks4_recv_connect_reply<R>(reader: &mut R) -> Result<(), SocksConnectError>
where
    R: AsyncRead + Unpin,
{
    match SocksV4Reply::recv(reader).await? {
        SocksV4Reply::RequestGranted(_) => Ok(()),
        rsp => Err(SocksConnectError::Socks4Rejected(rsp)),
    }
}
