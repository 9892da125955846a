use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::timer::PhaseTimer;

/// Any connected transport the prober can speak HTTP over.
pub trait Io: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Io for T {}

/// Transport wrapper firing the request-written and first-response-byte
/// hooks of a [`PhaseTimer`].
///
/// The request counts as written when the transport is flushed after
/// carrying request bytes. The first read that yields data marks the first
/// response byte. Both fire at most once per stream.
pub struct TimedStream<S> {
    inner: S,
    timer: PhaseTimer,
    unflushed: bool,
    written: bool,
    first_byte: bool,
}

impl<S> TimedStream<S> {
    pub fn new(inner: S, timer: PhaseTimer) -> Self {
        Self {
            inner,
            timer,
            unflushed: false,
            written: false,
            first_byte: false,
        }
    }

    fn wrote(&mut self, poll: &Poll<io::Result<usize>>) {
        if let Poll::Ready(Ok(n)) = poll {
            if *n > 0 {
                self.unflushed = true;
            }
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TimedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = poll {
            if !this.first_byte && buf.filled().len() > before {
                this.first_byte = true;
                this.timer.first_response_byte();
            }
        }
        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TimedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        this.wrote(&poll);
        poll
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write_vectored(cx, bufs);
        this.wrote(&poll);
        poll
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_flush(cx);
        if let Poll::Ready(Ok(())) = poll {
            if this.unflushed && !this.written {
                this.written = true;
                this.timer.request_written();
            }
            this.unflushed = false;
        }
        poll
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    #[tokio::test]
    async fn test_hooks_fire_once_in_order() {
        let timer = PhaseTimer::new();
        timer.start("duplex", "http://duplex/");
        let (client, mut server) = duplex(64);
        let mut stream = TimedStream::new(client, timer.clone());

        // Flushing with nothing written is not a sent request
        stream.flush().await.expect("flush");
        assert!(!stream.written);

        stream.write_all(b"GET / HTTP/1.1\r\n\r\n").await.expect("write");
        assert!(!stream.written);
        stream.flush().await.expect("flush");
        assert!(stream.written);

        let mut request = [0u8; 18];
        server.read_exact(&mut request).await.expect("server read");
        server.write_all(b"HTTP/1.1 200 OK\r\n").await.expect("server write");

        let mut response = [0u8; 4];
        stream.read_exact(&mut response).await.expect("read");
        assert!(stream.first_byte);
        assert_eq!(&response, b"HTTP");
    }
}
