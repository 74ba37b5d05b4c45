/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use crate::v4a::SocksV4Reply;
use crate::v5::Socks5Reply;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksNegotiationError {
    #[error("invalid version code")]
    InvalidVersion,
    #[error("no auth method set in request")]
    NoAuthMethod,
    #[error("invalid auth method")]
    InvalidAuthMethod,
    #[error("invalid command code")]
    InvalidCommand,
    #[error("invalid user id string")]
    InvalidUserIdString,
    #[error("invalid domain string")]
    InvalidDomainString,
    #[error("invalid addr type")]
    InvalidAddrType,
    #[error("invalid user auth message")]
    InvalidUserAuthMsg,
}

/// Error of the buffer level codecs.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksFrameError {
    #[error("truncated frame: need {need} bytes but only {have} available")]
    Truncated { need: usize, have: usize },
    #[error("invalid frame: {0}")]
    Invalid(#[from] SocksNegotiationError),
}

impl SocksFrameError {
    pub(crate) fn check_len(buf: &[u8], need: usize) -> Result<(), SocksFrameError> {
        if buf.len() < need {
            Err(SocksFrameError::Truncated {
                need,
                have: buf.len(),
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Error, Debug)]
pub enum SocksRequestParseError {
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("invalid socks protocol: {0}")]
    InvalidProtocol(#[from] SocksNegotiationError),
    #[error("client closed")]
    ClientClosed,
}

impl From<io::Error> for SocksRequestParseError {
    fn from(e: io::Error) -> Self {
        if matches!(e.kind(), io::ErrorKind::UnexpectedEof) {
            SocksRequestParseError::ClientClosed
        } else {
            SocksRequestParseError::ReadFailed(e)
        }
    }
}

impl From<SocksFrameError> for SocksRequestParseError {
    fn from(e: SocksFrameError) -> Self {
        match e {
            // the frame length is always checked before decoding
            SocksFrameError::Truncated { .. } => SocksRequestParseError::ClientClosed,
            SocksFrameError::Invalid(e) => SocksRequestParseError::InvalidProtocol(e),
        }
    }
}

#[derive(Error, Debug)]
pub enum SocksReplyParseError {
    #[error("read failed: {0:?}")]
    ReadFailed(#[from] io::Error),
    #[error("invalid socks protocol: {0}")]
    InvalidProtocol(#[from] SocksNegotiationError),
}

impl From<SocksFrameError> for SocksReplyParseError {
    fn from(e: SocksFrameError) -> Self {
        match e {
            SocksFrameError::Truncated { .. } => {
                SocksReplyParseError::ReadFailed(io::ErrorKind::UnexpectedEof.into())
            }
            SocksFrameError::Invalid(e) => SocksReplyParseError::InvalidProtocol(e),
        }
    }
}

#[derive(Error, Debug)]
pub enum SocksConnectError {
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
    #[error("no auth method available")]
    NoAuthMethodAvailable,
    #[error("unsupported auth version")]
    UnsupportedAuthVersion,
    #[error("auth failed")]
    AuthFailed,
    #[error("invalid socks protocol: {0}")]
    InvalidProtocol(#[from] SocksNegotiationError),
    #[error("socks5 request rejected: {0}")]
    Socks5Rejected(Socks5Reply),
    #[error("socks4 request rejected: {0}")]
    Socks4Rejected(SocksV4Reply),
}

impl From<SocksReplyParseError> for SocksConnectError {
    fn from(e: SocksReplyParseError) -> Self {
        match e {
            SocksReplyParseError::ReadFailed(e) => SocksConnectError::ReadFailed(e),
            SocksReplyParseError::InvalidProtocol(e) => SocksConnectError::InvalidProtocol(e),
        }
    }
}
