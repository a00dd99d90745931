use crate::pool::Pools;
use bytes::{BufMut, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

/// A raw connection paired with a read buffer and a write buffer.
///
/// The read side is only filled on behalf of the caller's request parser. The write side
/// collects status line, headers and body frames and spills them to the connection when
/// the buffer would grow beyond its capacity, or on [`BufConn::flush`].
#[derive(Debug)]
pub struct BufConn<C> {
    io: C,
    read_buf: BytesMut,
    write_buf: BytesMut,
    io_buffer_size: usize,
    closed: bool,
}

impl<C> BufConn<C>
where
    C: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps `io` with read and write buffers drawn from `pools`.
    pub fn new(io: C, pools: &Pools) -> Self {
        let mut conn = Self::with_buffers(io, pools.get_io_buffer(), pools.get_io_buffer());
        conn.io_buffer_size = pools.config().io_buffer_size();
        conn
    }

    /// Wraps `io` with caller supplied buffers, e.g. a read buffer that already holds the
    /// next pipelined request.
    pub fn with_buffers(io: C, read_buf: BytesMut, mut write_buf: BytesMut) -> Self {
        write_buf.clear();
        let io_buffer_size = write_buf.capacity().max(1);
        Self { io, read_buf, write_buf, io_buffer_size, closed: false }
    }

    /// Reads more bytes from the connection into the read buffer.
    ///
    /// Returns the number of bytes read, `0` meaning the peer closed its side.
    pub async fn fill(&mut self) -> io::Result<usize> {
        if self.read_buf.capacity() == self.read_buf.len() {
            self.read_buf.reserve(self.io_buffer_size);
        }
        self.io.read_buf(&mut self.read_buf).await
    }

    #[inline]
    pub fn read_buf(&self) -> &BytesMut {
        &self.read_buf
    }

    #[inline]
    pub fn read_buf_mut(&mut self) -> &mut BytesMut {
        &mut self.read_buf
    }

    /// Bytes written but not yet flushed to the connection.
    #[inline]
    pub fn buffered(&self) -> &[u8] {
        &self.write_buf
    }

    #[inline]
    pub(crate) fn write_buf_mut(&mut self) -> &mut BytesMut {
        &mut self.write_buf
    }

    /// Writes `data` through the write buffer.
    ///
    /// Payloads that do not fit next to the buffered bytes flush the buffer first; payloads
    /// at least as large as the whole buffer bypass it. A failed write closes the connection.
    pub async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if self.write_buf.len() + data.len() > self.io_buffer_size {
            self.flush_buf().await?;
        }

        if data.len() >= self.io_buffer_size {
            trace!(size = data.len(), "write through to connection");
            let result = self.io.write_all(data).await;
            return self.close_on_error(result).await;
        }

        self.write_buf.put_slice(data);
        Ok(())
    }

    async fn flush_buf(&mut self) -> io::Result<()> {
        if self.write_buf.is_empty() {
            return Ok(());
        }
        let result = self.io.write_all(&self.write_buf).await;
        self.close_on_error(result).await?;
        self.write_buf.clear();
        Ok(())
    }

    /// Writes all buffered bytes to the connection and flushes it.
    ///
    /// On failure the connection is closed and the unsent bytes are dropped.
    pub async fn flush(&mut self) -> io::Result<()> {
        self.flush_buf().await?;
        let result = self.io.flush().await;
        self.close_on_error(result).await
    }

    async fn close_on_error<T>(&mut self, result: io::Result<T>) -> io::Result<T> {
        if let Err(e) = &result {
            debug!(cause = %e, buffered = self.write_buf.len(), "connection write error, close connection");
            self.close().await;
        }
        result
    }

    /// Shuts the connection down without flushing the write buffer.
    ///
    /// Buffered bytes are discarded: this is only used when the stream is already in a state
    /// the peer cannot parse.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.write_buf.clear();
        if let Err(e) = self.io.shutdown().await {
            debug!(cause = %e, "shutdown connection error");
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn get_ref(&self) -> &C {
        &self.io
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.io
    }

    /// Splits into the raw connection, the read buffer and the unflushed write buffer.
    pub fn into_parts(self) -> (C, BytesMut, BytesMut) {
        (self.io, self.read_buf, self.write_buf)
    }

    /// Returns both buffers to `pools` and yields the raw connection.
    ///
    /// Unread and unflushed bytes are discarded.
    pub fn release(self, pools: &Pools) -> C {
        pools.put_io_buffer(self.read_buf);
        pools.put_io_buffer(self.write_buf);
        self.io
    }
}
