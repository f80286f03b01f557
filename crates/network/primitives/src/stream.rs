use core::pin::Pin;
use core::task::{Context, Poll};
use std::io;

use libp2p::Stream as P2pStream;
use tokio::io::{AsyncRead, AsyncWrite, BufStream, ReadBuf};
use tokio_util::compat::{Compat, FuturesAsyncReadCompatExt};

/// One req/resp stream, buffered and bridged onto tokio's io traits.
#[derive(Debug)]
pub struct Stream {
    inner: BufStream<Compat<P2pStream>>,
}

impl Stream {
    #[must_use]
    pub fn new(stream: P2pStream) -> Self {
        Self {
            inner: BufStream::new(stream.compat()),
        }
    }

    /// Abandons the stream; the remote observes a reset.
    pub fn reset(self) {
        drop(self);
    }
}

impl AsyncRead for Stream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
