use crate::codec::{Frame, has_chunked_token};
use crate::connection::BufConn;
use crate::ensure;
use crate::pool::Pools;
use crate::protocol::status::{body_allowed_for_status, check_write_header_code};
use crate::protocol::{RequestInfo, ResponseError};
use crate::response::state::{Phase, ResponseState};
use bytes::BytesMut;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use std::mem;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

/// The response writer a handler receives for one exchange.
///
/// Body bytes are collected in a fixed size buffer first. If the handler finishes before the
/// buffer overflows, the response goes out with an exact `Content-Length` and a sniffed
/// `Content-Type`. Once the buffer overflows, or the handler flushes early, the response
/// switches to chunked transfer encoding for the rest of the exchange.
#[derive(Debug)]
pub struct Response<C> {
    state: Box<ResponseState>,
    buf: BytesMut,
    headers: HeaderMap,
    conn: Option<BufConn<C>>,
    request: RequestInfo,
    pools: Arc<Pools>,
}

impl<C> Response<C>
where
    C: AsyncRead + AsyncWrite + Unpin,
{
    /// Assembles a response from pooled parts.
    pub fn new(pools: &Arc<Pools>, request: RequestInfo, conn: BufConn<C>) -> Self {
        Self {
            state: pools.get_state(),
            buf: pools.get_buffer(),
            headers: pools.get_headers(),
            conn: Some(conn),
            request,
            pools: Arc::clone(pools),
        }
    }

    /// The headers that will be sent with the response.
    ///
    /// Changes made after the header section was written have no effect.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.state.status
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Body bytes the handler attempted to write so far.
    #[inline]
    pub fn written(&self) -> u64 {
        self.state.written
    }

    /// The Content-Length accepted from the handler, if any.
    #[inline]
    pub fn declared_length(&self) -> Option<u64> {
        self.state.declared_length
    }

    #[inline]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    #[inline]
    pub fn is_header_sent(&self) -> bool {
        self.state.is_header_sent()
    }

    #[inline]
    pub fn is_hijacked(&self) -> bool {
        self.state.phase == Phase::Hijacked
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state.phase == Phase::Finished
    }

    /// Accepts the response status. Only the first call has an effect.
    ///
    /// A valid Content-Length header set by the handler at this point becomes the declared
    /// length of the body; otherwise `Transfer-Encoding: chunked` locks chunked framing in.
    ///
    /// # Panics
    ///
    /// Panics if `code` is not a three digit status code.
    pub fn write_header(&mut self, code: u16) {
        match self.state.phase {
            Phase::Idle => {}
            Phase::Hijacked => return,
            _ => {
                warn!(code, status = self.state.status.as_u16(), "ignore superfluous write_header call");
                return;
            }
        }

        let status = check_write_header_code(code);
        self.state.status = status;
        self.state.phase = Phase::Buffering;

        if let Some(value) = self.headers.get(CONTENT_LENGTH) {
            match parse_content_length(value) {
                Some(length) => {
                    self.state.declared_length = Some(length);
                    return;
                }
                None => warn!(content_length = ?value, "ignore invalid Content-Length header"),
            }
        }

        if body_allowed_for_status(status)
            && self.headers.get_all(TRANSFER_ENCODING).iter().any(|v| has_chunked_token(v.as_bytes()))
        {
            self.state.chunk_writer.request_chunked();
        }
    }

    /// Writes body bytes, accepting status 200 first if no status was set.
    ///
    /// # Errors
    ///
    /// - [`ResponseError::Hijacked`] / [`ResponseError::Finished`] when the exchange is over
    /// - [`ResponseError::BodyNotAllowed`] for 1xx, 204 and 304 responses
    /// - [`ResponseError::ContentLengthExceeded`] when the bytes would pass the declared length;
    ///   the attempted bytes are still counted by [`Response::written`]
    /// - [`ResponseError::Io`] when the connection fails
    pub async fn write(&mut self, data: &[u8]) -> Result<usize, ResponseError> {
        match self.state.phase {
            Phase::Hijacked => return Err(ResponseError::Hijacked),
            Phase::Finished => {
                warn!(size = data.len(), "write after the response was finished");
                return Err(ResponseError::Finished);
            }
            Phase::Idle => self.write_header(StatusCode::OK.as_u16()),
            Phase::Buffering | Phase::Streaming => {}
        }

        if data.is_empty() {
            return Ok(0);
        }

        let status = self.state.status;
        ensure!(body_allowed_for_status(status), ResponseError::body_not_allowed(status));

        self.state.written += data.len() as u64;
        if let Some(declared) = self.state.declared_length {
            let written = self.state.written;
            ensure!(written <= declared, ResponseError::content_length_exceeded(declared, written));
        }

        if self.state.phase == Phase::Buffering {
            if self.buf.len() + data.len() <= self.pools.config().buffer_size() {
                self.buf.extend_from_slice(data);
                return Ok(data.len());
            }

            trace!(buffered = self.buf.len(), size = data.len(), "response buffer overflow, start streaming");
            self.state.phase = Phase::Streaming;
            self.drain().await?;
        }

        self.write_through(data).await
    }

    /// Sends everything written so far, including the header section.
    ///
    /// Flushing before the handler is done means the body length is unknown, so a response
    /// without a declared length switches to chunked framing.
    pub async fn flush(&mut self) -> Result<(), ResponseError> {
        match self.state.phase {
            Phase::Hijacked | Phase::Finished => return Ok(()),
            Phase::Idle => self.write_header(StatusCode::OK.as_u16()),
            Phase::Buffering | Phase::Streaming => {}
        }

        if self.state.phase == Phase::Buffering
            && self.state.declared_length.is_none()
            && !self.state.chunk_writer.is_emitted()
        {
            self.state.phase = Phase::Streaming;
        }

        self.flush_wire().await
    }

    /// Hands the connection over to the caller.
    ///
    /// If a status was already accepted, buffered bytes and the header section are flushed
    /// first, framed as they would be at this point: a buffered body without a declared length
    /// goes out raw, so the caller continues a plain byte stream. Afterwards every write fails
    /// with [`ResponseError::Hijacked`].
    pub async fn hijack(&mut self) -> Result<BufConn<C>, ResponseError> {
        match self.state.phase {
            Phase::Hijacked => return Err(ResponseError::Hijacked),
            Phase::Finished => return Err(ResponseError::Finished),
            Phase::Idle => {}
            Phase::Buffering | Phase::Streaming => self.flush_wire().await?,
        }

        self.state.phase = Phase::Hijacked;
        debug!("connection hijacked");
        self.conn.take().ok_or(ResponseError::Hijacked)
    }

    /// Completes the exchange once the handler returned.
    ///
    /// Writes whatever is still buffered (with an exact Content-Length if it is the whole
    /// body), terminates chunked framing, flushes the connection, closes the request body,
    /// runs the form cleanup hook and returns the header map and the body buffer to the pools.
    /// All of these steps run even if an earlier one failed; the first error is returned.
    pub async fn finish_request(&mut self) -> Result<(), ResponseError> {
        match self.state.phase {
            Phase::Hijacked | Phase::Finished => return Ok(()),
            Phase::Idle => self.write_header(StatusCode::OK.as_u16()),
            Phase::Buffering | Phase::Streaming => {}
        }

        let wire = self.finish_wire().await;
        let closed = self.request.close().await.map_err(ResponseError::io);

        self.pools.put_headers(mem::take(&mut self.headers));
        self.pools.put_buffer(mem::take(&mut self.buf));

        wire.and(closed)
    }

    async fn finish_wire(&mut self) -> Result<(), ResponseError> {
        let frame = frame(&self.state, &self.headers, &self.request, &self.pools, true);
        self.state.phase = Phase::Finished;

        let Some(conn) = self.conn.as_mut() else {
            return Ok(());
        };
        if conn.is_closed() {
            return Ok(());
        }

        if !self.buf.is_empty() {
            let result = self.state.chunk_writer.write(&frame, &self.buf, conn).await;
            self.buf.clear();
            result?;
        }
        self.state.chunk_writer.close(&frame, conn.write_buf_mut());
        conn.flush().await?;

        if let Some(declared) = self.state.declared_length
            && self.state.written < declared
            && !frame.head
            && body_allowed_for_status(frame.status)
        {
            warn!(declared, written = self.state.written, "response body shorter than Content-Length, close connection");
            conn.close().await;
        }
        Ok(())
    }

    /// Ends the exchange and returns the pooled parts.
    ///
    /// Yields the connection for the next request, or `None` if it was hijacked or had to be
    /// closed.
    pub fn release(self) -> Option<BufConn<C>> {
        let Response { state, buf, headers, conn, request: _, pools } = self;

        if headers.capacity() > 0 {
            pools.put_headers(headers);
        }
        pools.put_buffer(buf);
        pools.put_state(state);

        conn.filter(|conn| !conn.is_closed())
    }

    /// Drains the buffer and forces the header section out, without touching the phase.
    async fn flush_wire(&mut self) -> Result<(), ResponseError> {
        self.drain().await?;

        let Some(conn) = self.conn.as_mut() else {
            return Err(ResponseError::Hijacked);
        };
        let frame = frame(&self.state, &self.headers, &self.request, &self.pools, false);
        self.state.chunk_writer.flush(&frame, conn).await?;
        Ok(())
    }

    async fn drain(&mut self) -> Result<(), ResponseError> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let Some(conn) = self.conn.as_mut() else {
            return Err(ResponseError::Hijacked);
        };

        let frame = frame(&self.state, &self.headers, &self.request, &self.pools, false);
        let result = self.state.chunk_writer.write(&frame, &self.buf, conn).await;
        self.buf.clear();
        result?;
        Ok(())
    }

    async fn write_through(&mut self, data: &[u8]) -> Result<usize, ResponseError> {
        let Some(conn) = self.conn.as_mut() else {
            return Err(ResponseError::Hijacked);
        };

        let frame = frame(&self.state, &self.headers, &self.request, &self.pools, false);
        Ok(self.state.chunk_writer.write(&frame, data, conn).await?)
    }
}

fn frame<'a>(
    state: &ResponseState,
    headers: &'a HeaderMap,
    request: &RequestInfo,
    pools: &'a Pools,
    handler_done: bool,
) -> Frame<'a> {
    Frame {
        status: state.status,
        headers,
        declared_length: state.declared_length,
        streaming: state.phase == Phase::Streaming,
        handler_done,
        head: request.is_head(),
        default_content_type: pools.default_content_type(),
    }
}

fn parse_content_length(value: &HeaderValue) -> Option<u64> {
    value.to_str().ok()?.trim().parse().ok()
}
