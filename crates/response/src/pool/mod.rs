//! Object pools shared by every exchange of a server.
//!
//! A server builds one [`Pools`] at startup and hands an `Arc` of it to each
//! [`Response`](crate::response::Response). Everything a response needs per request is drawn
//! from here and returned at the end of the exchange:
//!
//! - body buffers, keyed by size class ([`BufferPool`])
//! - read/write buffers of [`BufConn`](crate::connection::BufConn)
//! - header maps
//! - response state objects
//!
//! Every object is reset before it goes back, so nothing of one request is visible to the next.

mod buffer_pool;
mod free_list;

pub use buffer_pool::BufferPool;
pub use free_list::FreeList;

use crate::config::ResponseConfig;
use crate::response::ResponseState;
use bytes::BytesMut;
use http::{HeaderMap, HeaderValue};
use tracing::warn;

#[derive(Debug)]
pub struct Pools {
    config: ResponseConfig,
    default_content_type: Option<HeaderValue>,
    buffers: BufferPool,
    io_buffers: FreeList<BytesMut>,
    headers: FreeList<HeaderMap>,
    states: FreeList<Box<ResponseState>>,
}

impl Default for Pools {
    fn default() -> Self {
        Self::new(ResponseConfig::default())
    }
}

impl Pools {
    pub fn new(config: ResponseConfig) -> Self {
        let default_content_type = config.default_content_type().and_then(|mime| {
            HeaderValue::from_str(mime.as_ref())
                .inspect_err(|e| warn!(content_type = %mime, cause = %e, "ignore invalid default content type"))
                .ok()
        });
        let max_idle = config.max_idle();

        Self {
            config,
            default_content_type,
            buffers: BufferPool::new(max_idle),
            io_buffers: FreeList::new(max_idle),
            headers: FreeList::new(max_idle),
            states: FreeList::new(max_idle),
        }
    }

    #[inline]
    pub fn config(&self) -> &ResponseConfig {
        &self.config
    }

    #[inline]
    pub(crate) fn default_content_type(&self) -> Option<&HeaderValue> {
        self.default_content_type.as_ref()
    }

    /// The size-keyed buffer pool, for callers that need buffers of other sizes.
    #[inline]
    pub fn buffers(&self) -> &BufferPool {
        &self.buffers
    }

    /// Claims a response body buffer of the configured size.
    #[inline]
    pub fn get_buffer(&self) -> BytesMut {
        self.buffers.get(self.config.buffer_size())
    }

    #[inline]
    pub fn put_buffer(&self, buf: BytesMut) {
        self.buffers.put(self.config.buffer_size(), buf);
    }

    /// Claims a connection read or write buffer.
    pub fn get_io_buffer(&self) -> BytesMut {
        let size = self.config.io_buffer_size();
        self.io_buffers.get_or_else(|| BytesMut::with_capacity(size))
    }

    pub fn put_io_buffer(&self, mut buf: BytesMut) {
        buf.clear();
        if buf.capacity() >= self.config.io_buffer_size() {
            self.io_buffers.put(buf);
        }
    }

    #[inline]
    pub fn get_headers(&self) -> HeaderMap {
        self.headers.get_or_else(HeaderMap::new)
    }

    /// Returns a header map; it is cleared but keeps its allocation.
    pub fn put_headers(&self, mut headers: HeaderMap) {
        headers.clear();
        self.headers.put(headers);
    }

    #[inline]
    pub(crate) fn get_state(&self) -> Box<ResponseState> {
        self.states.get_or_else(Box::default)
    }

    pub(crate) fn put_state(&self, mut state: Box<ResponseState>) {
        state.reset();
        self.states.put(state);
    }

    /// Number of idle objects per pool, as `(buffers, io_buffers, headers, states)`.
    pub fn idle(&self) -> (usize, usize, usize, usize) {
        (
            self.buffers.idle(self.config.buffer_size()),
            self.io_buffers.idle(),
            self.headers.idle(),
            self.states.idle(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::ACCESS_CONTROL_ALLOW_ORIGIN;

    #[test]
    fn test_headers_are_cleared() {
        let pools = Pools::default();
        let mut headers = pools.get_headers();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        pools.put_headers(headers);

        let headers = pools.get_headers();
        assert!(headers.is_empty());
        assert_eq!(pools.idle().2, 0);
    }

    #[test]
    fn test_io_buffers() {
        let pools = Pools::new(ResponseConfig::new().with_io_buffer_size(1024));
        let mut buf = pools.get_io_buffer();
        assert!(buf.capacity() >= 1024);
        buf.extend_from_slice(b"GET / HTTP/1.1\r\n");
        pools.put_io_buffer(buf);

        let buf = pools.get_io_buffer();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_default_content_type() {
        let pools = Pools::default();
        assert_eq!(pools.default_content_type().unwrap(), "text/plain; charset=utf-8");

        let pools = Pools::new(ResponseConfig::new().with_default_content_type(None));
        assert!(pools.default_content_type().is_none());
    }
}
