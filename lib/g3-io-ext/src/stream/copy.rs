/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

const DEFAULT_COPY_BUFFER_SIZE: usize = 16 * 1024; // 16KB
const MINIMAL_COPY_BUFFER_SIZE: usize = 4 * 1024; // 4KB
const DEFAULT_COPY_YIELD_SIZE: usize = 1024 * 1024; // 1MB
const MINIMAL_COPY_YIELD_SIZE: usize = 256 * 1024; // 256KB

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StreamCopyConfig {
    buffer_size: usize,
    yield_size: usize,
}

impl Default for StreamCopyConfig {
    fn default() -> Self {
        StreamCopyConfig {
            buffer_size: DEFAULT_COPY_BUFFER_SIZE,
            yield_size: DEFAULT_COPY_YIELD_SIZE,
        }
    }
}

impl StreamCopyConfig {
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        self.buffer_size = buffer_size.max(MINIMAL_COPY_BUFFER_SIZE);
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn set_yield_size(&mut self, yield_size: usize) {
        self.yield_size = yield_size.max(MINIMAL_COPY_YIELD_SIZE);
    }

    #[inline]
    pub fn yield_size(&self) -> usize {
        self.yield_size
    }
}

#[derive(Error, Debug)]
pub enum StreamCopyError {
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
}

/// One-directional copy from `reader` to `writer` until EOF.
///
/// The writer is flushed whenever the reader has no more data ready, and at the end.
/// Resolves to the total number of bytes written.
#[derive(Debug)]
pub struct StreamCopy<'a, R: ?Sized, W: ?Sized> {
    reader: &'a mut R,
    writer: &'a mut W,
    buf: Box<[u8]>,
    yield_size: usize,
    r_off: usize,
    w_off: usize,
    read_done: bool,
    need_flush: bool,
    total_read: u64,
    total_write: u64,
}

impl<'a, R, W> StreamCopy<'a, R, W>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    pub fn new(reader: &'a mut R, writer: &'a mut W, config: &StreamCopyConfig) -> Self {
        StreamCopy {
            reader,
            writer,
            buf: vec![0; config.buffer_size].into_boxed_slice(),
            yield_size: config.yield_size,
            r_off: 0,
            w_off: 0,
            read_done: false,
            need_flush: false,
            total_read: 0,
            total_write: 0,
        }
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.read_done && self.r_off == self.w_off
    }

    #[inline]
    pub fn read_size(&self) -> u64 {
        self.total_read
    }

    #[inline]
    pub fn copied_size(&self) -> u64 {
        self.total_write
    }

    /// Get the writer back, to shutdown it after the copy finished.
    pub fn writer(&mut self) -> &mut W {
        &mut *self.writer
    }
}

impl<R, W> Future for StreamCopy<'_, R, W>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    type Output = Result<u64, StreamCopyError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = &mut *self;
        let mut copy_this_round = 0usize;

        loop {
            while me.w_off < me.r_off {
                let n = ready!(
                    Pin::new(&mut *me.writer).poll_write(cx, &me.buf[me.w_off..me.r_off])
                )
                .map_err(StreamCopyError::WriteFailed)?;
                if n == 0 {
                    return Poll::Ready(Err(StreamCopyError::WriteFailed(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "write zero byte into writer",
                    ))));
                }
                me.w_off += n;
                me.total_write += n as u64;
                me.need_flush = true;
                copy_this_round += n;
            }
            me.w_off = 0;
            me.r_off = 0;

            if me.read_done {
                if me.need_flush {
                    ready!(Pin::new(&mut *me.writer).poll_flush(cx))
                        .map_err(StreamCopyError::WriteFailed)?;
                    me.need_flush = false;
                }
                return Poll::Ready(Ok(me.total_write));
            }

            if copy_this_round >= me.yield_size {
                cx.waker().wake_by_ref();
                return Poll::Pending;
            }

            let mut read_buf = ReadBuf::new(&mut me.buf[..]);
            match Pin::new(&mut *me.reader).poll_read(cx, &mut read_buf) {
                Poll::Ready(Ok(())) => {
                    let nr = read_buf.filled().len();
                    if nr == 0 {
                        me.read_done = true;
                    } else {
                        me.r_off = nr;
                        me.total_read += nr as u64;
                    }
                }
                Poll::Ready(Err(e)) => return Poll::Ready(Err(StreamCopyError::ReadFailed(e))),
                Poll::Pending => {
                    if me.need_flush {
                        ready!(Pin::new(&mut *me.writer).poll_flush(cx))
                            .map_err(StreamCopyError::WriteFailed)?;
                        me.need_flush = false;
                    }
                    return Poll::Pending;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn copy_until_eof() {
        let mut reader = Builder::new().read(b"hello ").read(b"world").build();
        let mut writer = Builder::new().write(b"hello ").write(b"world").build();

        let config = StreamCopyConfig::default();
        let mut copy = StreamCopy::new(&mut reader, &mut writer, &config);
        let n = (&mut copy).await.unwrap();
        assert_eq!(n, 11);
        assert!(copy.finished());
        assert_eq!(copy.read_size(), 11);
        assert_eq!(copy.copied_size(), 11);
    }

    #[tokio::test]
    async fn read_error() {
        let mut reader = Builder::new()
            .read(b"abc")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let mut writer = Builder::new().write(b"abc").build();

        let config = StreamCopyConfig::default();
        let r = StreamCopy::new(&mut reader, &mut writer, &config).await;
        assert!(matches!(r, Err(StreamCopyError::ReadFailed(_))));
    }

    #[test]
    fn config_minimal() {
        let mut config = StreamCopyConfig::default();
        config.set_buffer_size(16);
        assert_eq!(config.buffer_size(), MINIMAL_COPY_BUFFER_SIZE);
        config.set_yield_size(1);
        assert_eq!(config.yield_size(), MINIMAL_COPY_YIELD_SIZE);
    }
}
