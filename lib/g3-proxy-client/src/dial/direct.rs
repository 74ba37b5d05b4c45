/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use async_trait::async_trait;

use g3_types::net::UpstreamAddr;

use super::{BoxTunnelStream, StreamDialer};
use crate::error::DialError;

/// Connect to the target over plain tcp.
#[derive(Clone, Debug)]
pub struct DirectDialer {
    connect_timeout: Duration,
}

impl DirectDialer {
    pub fn new(connect_timeout: Duration) -> Self {
        DirectDialer { connect_timeout }
    }
}

#[async_trait]
impl StreamDialer for DirectDialer {
    async fn dial(&self, target: &UpstreamAddr) -> Result<BoxTunnelStream, DialError> {
        let stream = super::connect_tcp(target, self.connect_timeout).await?;
        Ok(Box::new(stream))
    }
}
