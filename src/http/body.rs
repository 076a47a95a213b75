//! Response body types
//!
//! Small responses are buffered in memory; file payloads above the
//! configured threshold and all range responses stream from the open file
//! handle in fixed-size chunks, so memory use stays bounded regardless of
//! file size. The handle is dropped with the body on every exit path.

use bytes::BytesMut;
use http_body_util::Full;
use hyper::body::{Body, Bytes, Frame, SizeHint};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::time::{Instant, Sleep};

/// Chunk size for streamed file responses
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Body of every response produced by this server
pub enum ResponseBody {
    /// Fully buffered payload (error pages, listings, small files)
    Full(Full<Bytes>),
    /// File contents streamed incrementally
    File(FileStreamBody),
}

impl ResponseBody {
    /// Empty body (HEAD responses, 304)
    pub fn empty() -> Self {
        Self::Full(Full::new(Bytes::new()))
    }

    /// Buffered body
    pub fn full(data: Bytes) -> Self {
        Self::Full(Full::new(data))
    }

    /// Streaming body over an open file
    pub fn file(body: FileStreamBody) -> Self {
        Self::File(body)
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, io::Error>>> {
        match self.get_mut() {
            Self::Full(full) => match Pin::new(full).poll_frame(cx) {
                Poll::Ready(Some(Ok(frame))) => Poll::Ready(Some(Ok(frame))),
                Poll::Ready(Some(Err(never))) => match never {},
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            },
            Self::File(file) => file.poll_chunk(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Full(full) => full.is_end_stream(),
            Self::File(file) => file.remaining == 0,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Full(full) => full.size_hint(),
            Self::File(file) => SizeHint::with_exact(file.remaining),
        }
    }
}

/// Streams `length` bytes from an open file in chunks.
///
/// Each delivered chunk rearms a write deadline; when the peer stops
/// draining the response and no chunk is consumed within the deadline the
/// stream errors out, which makes hyper tear the connection down. A file
/// that shrinks mid-stream also errors: the status line and Content-Length
/// are already on the wire, so the only correct move is to abort.
pub struct FileStreamBody {
    file: File,
    remaining: u64,
    chunk_size: usize,
    write_timeout: Duration,
    deadline: Pin<Box<Sleep>>,
}

impl FileStreamBody {
    pub fn new(file: File, length: u64, chunk_size: usize, write_timeout: Duration) -> Self {
        Self {
            file,
            remaining: length,
            chunk_size,
            write_timeout,
            deadline: Box::pin(tokio::time::sleep(write_timeout)),
        }
    }

    fn poll_chunk(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, io::Error>>> {
        if self.remaining == 0 {
            return Poll::Ready(None);
        }

        if self.deadline.as_mut().poll(cx).is_ready() {
            return Poll::Ready(Some(Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "response write stalled",
            ))));
        }

        let want = usize::try_from(self.remaining)
            .map_or(self.chunk_size, |r| r.min(self.chunk_size));
        let mut buf = BytesMut::zeroed(want);
        let mut read_buf = ReadBuf::new(&mut buf);

        match Pin::new(&mut self.file).poll_read(cx, &mut read_buf) {
            Poll::Ready(Ok(())) => {
                let n = read_buf.filled().len();
                if n == 0 {
                    return Poll::Ready(Some(Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "file ended before the promised length",
                    ))));
                }
                self.remaining -= n as u64;
                let next = Instant::now() + self.write_timeout;
                self.deadline.as_mut().reset(next);
                buf.truncate(n);
                Poll::Ready(Some(Ok(Frame::data(buf.freeze()))))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
            Poll::Pending => Poll::Pending,
        }
    }
}
