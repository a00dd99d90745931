use crate::codec::header_finalize::{HeaderFinalize, encode_handler_headers, encode_status_line};
use crate::codec::sniff::sniff;
use crate::connection::BufConn;
use crate::protocol::status::body_allowed_for_status;
use bytes::{BufMut, BytesMut};
use http::header::{CONNECTION, CONTENT_TYPE, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue, StatusCode};
use std::borrow::Cow;
use std::io;
use std::io::{ErrorKind, Write};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error};

const CHUNKED: &[u8] = b"chunked";
const COMMA_SPACE_CHUNKED: &[u8] = b", chunked";
const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// What the chunk writer knows about the exchange at the moment it finalizes the header.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub status: StatusCode,
    pub headers: &'a HeaderMap,
    /// Content-Length accepted from the handler.
    pub declared_length: Option<u64>,
    /// The response outgrew its buffer or was flushed before the handler finished.
    pub streaming: bool,
    pub handler_done: bool,
    /// The request method is `HEAD`.
    pub head: bool,
    pub default_content_type: Option<&'a HeaderValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireState {
    /// Nothing is on the wire yet.
    Pending { chunked_requested: bool },
    /// The header section is written; the framing is fixed.
    Emitted { chunking: bool },
    /// The body is terminated.
    Closed,
}

/// Sink between a response and its connection.
///
/// Writes the header section exactly once, on the first write, flush or close, and frames
/// body bytes as chunks when chunked transfer encoding was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWriter {
    state: WireState,
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self { state: WireState::Pending { chunked_requested: false } }
    }

    /// Locks chunked framing in before the header is written. Has no effect afterwards.
    pub fn request_chunked(&mut self) {
        if let WireState::Pending { chunked_requested } = &mut self.state {
            *chunked_requested = true;
        }
    }

    #[inline]
    pub fn is_emitted(&self) -> bool {
        !matches!(self.state, WireState::Pending { .. })
    }

    #[inline]
    pub fn is_chunking(&self) -> bool {
        match self.state {
            WireState::Pending { chunked_requested } => chunked_requested,
            WireState::Emitted { chunking } => chunking,
            WireState::Closed => false,
        }
    }

    /// Writes status line and headers into `dst` unless that already happened.
    ///
    /// `sample` is the first body data; when the handler is done it is the whole body.
    pub fn emit_header(&mut self, frame: &Frame<'_>, sample: Option<&[u8]>, dst: &mut BytesMut) {
        let WireState::Pending { chunked_requested } = self.state else {
            return;
        };

        let body_allowed = body_allowed_for_status(frame.status);
        let sample = sample.filter(|s| !s.is_empty());
        let handler_te = frame.headers.get(TRANSFER_ENCODING).map(HeaderValue::as_bytes).filter(|v| !v.is_empty());

        let mut chunking = false;
        let mut content_length: Option<HeaderValue> = None;
        let mut transfer_encoding: Option<Cow<'_, [u8]>> = None;

        if let Some(declared) = frame.declared_length {
            content_length = Some(HeaderValue::from(declared));
        } else if !body_allowed {
            // no framing at all
        } else if chunked_requested {
            chunking = true;
            transfer_encoding = Some(handler_te.map_or(Cow::Borrowed(CHUNKED), Cow::Borrowed));
        } else if frame.streaming {
            chunking = true;
            transfer_encoding = Some(merge_chunked(handler_te));
        } else if frame.handler_done && (sample.is_some() || !frame.head) {
            content_length = Some(HeaderValue::from(sample.map_or(0, <[u8]>::len)));
        }

        let content_type = match frame.headers.get(CONTENT_TYPE).filter(|v| !v.is_empty()) {
            Some(explicit) => Some(explicit.as_bytes()),
            None => match sample {
                Some(sample) if !chunking => Some(sniff(sample).as_bytes()),
                _ if body_allowed => frame.default_content_type.map(HeaderValue::as_bytes),
                _ => None,
            },
        };

        let mut date = faf_http_date::get_date_buff_no_key();
        faf_http_date::get_date_no_key(&mut date);

        let finalize = HeaderFinalize {
            date: Some(&date[..]),
            content_length: content_length.as_ref().map(HeaderValue::as_bytes),
            content_type,
            connection: frame.headers.get(CONNECTION).map(HeaderValue::as_bytes),
            transfer_encoding: transfer_encoding.as_deref(),
        };

        debug!(
            status = frame.status.as_u16(),
            chunking,
            content_length = ?content_length,
            "write response header"
        );

        encode_status_line(frame.status, dst);
        finalize.encode(dst);
        encode_handler_headers(frame.headers, dst);

        self.state = WireState::Emitted { chunking };
    }

    /// Writes body bytes, emitting the header first if needed.
    ///
    /// Bytes of a `HEAD` response are discarded but reported as written. An I/O error shuts
    /// the connection down: a partially written frame cannot be repaired.
    pub async fn write<C>(&mut self, frame: &Frame<'_>, data: &[u8], conn: &mut BufConn<C>) -> io::Result<usize>
    where
        C: AsyncRead + AsyncWrite + Unpin,
    {
        if conn.is_closed() {
            return Err(io::Error::from(ErrorKind::NotConnected));
        }

        self.emit_header(frame, Some(data), conn.write_buf_mut());

        if frame.head || data.is_empty() {
            return Ok(data.len());
        }

        let result = if self.is_chunking() { write_chunk(data, conn).await } else { conn.write_all(data).await };

        if let Err(e) = result {
            error!(cause = %e, chunking = self.is_chunking(), "write response body error, close connection");
            conn.close().await;
            return Err(e);
        }

        Ok(data.len())
    }

    /// Emits the header if needed and flushes the connection.
    pub async fn flush<C>(&mut self, frame: &Frame<'_>, conn: &mut BufConn<C>) -> io::Result<()>
    where
        C: AsyncRead + AsyncWrite + Unpin,
    {
        if conn.is_closed() {
            return Err(io::Error::from(ErrorKind::NotConnected));
        }
        self.emit_header(frame, None, conn.write_buf_mut());
        conn.flush().await
    }

    /// Emits the header if needed and terminates a chunked body.
    pub fn close(&mut self, frame: &Frame<'_>, dst: &mut BytesMut) {
        self.emit_header(frame, None, dst);
        if self.is_chunking() && !frame.head {
            dst.put_slice(LAST_CHUNK);
        }
        self.state = WireState::Closed;
    }
}

async fn write_chunk<C>(data: &[u8], conn: &mut BufConn<C>) -> io::Result<()>
where
    C: AsyncRead + AsyncWrite + Unpin,
{
    write!(helper::Writer(conn.write_buf_mut()), "{:X}\r\n", data.len())?;
    conn.write_all(data).await?;
    conn.write_all(b"\r\n").await
}

/// Adds the `chunked` token to a handler supplied Transfer-Encoding value, unless present.
fn merge_chunked(value: Option<&[u8]>) -> Cow<'_, [u8]> {
    match value {
        None => Cow::Borrowed(CHUNKED),
        Some(value) if has_chunked_token(value) => Cow::Borrowed(value),
        Some(value) => {
            let mut merged = Vec::with_capacity(value.len() + COMMA_SPACE_CHUNKED.len());
            merged.extend_from_slice(value);
            merged.extend_from_slice(COMMA_SPACE_CHUNKED);
            Cow::Owned(merged)
        }
    }
}

/// Reports whether a comma separated Transfer-Encoding value contains `chunked`.
pub fn has_chunked_token(value: &[u8]) -> bool {
    value.split(|b| *b == b',').any(|token| token.trim_ascii().eq_ignore_ascii_case(CHUNKED))
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
