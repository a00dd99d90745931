//! Sizing and defaults of the response writer.

use mime::Mime;

/// Bytes a response buffers before it gives up on computing `Content-Length` and switches to
/// chunked transfer encoding. Must stay `>= 512` so content sniffing sees a full sample.
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

/// Size of the read and write buffers of a [`BufConn`](crate::connection::BufConn).
pub const DEFAULT_IO_BUFFER_SIZE: usize = 4 * 1024;

/// Upper bound of idle objects kept by each free list.
pub const DEFAULT_MAX_IDLE: usize = 1024;

/// Configuration of the [`Pools`](crate::pool::Pools) and of every response drawn from them.
#[derive(Debug, Clone)]
pub struct ResponseConfig {
    buffer_size: usize,
    io_buffer_size: usize,
    max_idle: usize,
    default_content_type: Option<Mime>,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            io_buffer_size: DEFAULT_IO_BUFFER_SIZE,
            max_idle: DEFAULT_MAX_IDLE,
            default_content_type: Some(mime::TEXT_PLAIN_UTF_8),
        }
    }
}

impl ResponseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the response body buffer size, values below 512 are raised to 512.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(crate::codec::SNIFF_LEN);
        self
    }

    #[must_use]
    pub fn with_io_buffer_size(mut self, io_buffer_size: usize) -> Self {
        self.io_buffer_size = io_buffer_size.max(1);
        self
    }

    #[must_use]
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Content type used when the handler set none and none could be sniffed.
    /// `None` leaves such responses without a `Content-Type` header.
    #[must_use]
    pub fn with_default_content_type(mut self, content_type: Option<Mime>) -> Self {
        self.default_content_type = content_type;
        self
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    #[inline]
    pub fn io_buffer_size(&self) -> usize {
        self.io_buffer_size
    }

    #[inline]
    pub fn max_idle(&self) -> usize {
        self.max_idle
    }

    #[inline]
    pub fn default_content_type(&self) -> Option<&Mime> {
        self.default_content_type.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = ResponseConfig::default();
        assert_eq!(config.buffer_size(), 2048);
        assert_eq!(config.io_buffer_size(), 4096);
        assert_eq!(config.default_content_type(), Some(&mime::TEXT_PLAIN_UTF_8));
    }

    #[test]
    fn test_buffer_size_keeps_room_for_sniffing() {
        let config = ResponseConfig::new().with_buffer_size(16);
        assert_eq!(config.buffer_size(), 512);

        let config = ResponseConfig::new().with_buffer_size(8192).with_default_content_type(None);
        assert_eq!(config.buffer_size(), 8192);
        assert!(config.default_content_type().is_none());
    }
}
