/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use log::debug;

use g3_types::net::UpstreamAddr;

/// Check whether a tcp connection to `addr` can be established within `timeout`.
pub async fn tcp_ping(addr: &UpstreamAddr, timeout: Duration) -> bool {
    match crate::dial::connect_tcp(addr, timeout).await {
        Ok(_stream) => true,
        Err(e) => {
            debug!("ping {addr}: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn reachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let addr = UpstreamAddr::from_str(&format!("127.0.0.1:{port}")).unwrap();
        assert!(tcp_ping(&addr, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let addr = UpstreamAddr::from_str(&format!("127.0.0.1:{port}")).unwrap();
        assert!(!tcp_ping(&addr, Duration::from_secs(1)).await);
    }
}
