/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use super::types::*;

mod addr;

mod reply;
mod request;

pub use reply::Socks5Reply;
pub use request::Socks5Request;

pub mod auth;
pub mod client;
