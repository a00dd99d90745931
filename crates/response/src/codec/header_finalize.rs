//! Serialization of the response header section.
//!
//! The handful of headers whose values are only known when the header section is written
//! (Date, Content-Length, Content-Type, Connection, Transfer-Encoding) are collected in a
//! [`HeaderFinalize`] value that borrows its data from the stack of the caller. Everything else
//! the handler set is passed through unchanged.

use bytes::{BufMut, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, DATE, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, StatusCode};

/// Initial buffer size reserved for header serialization
const INIT_HEADER_SIZE: usize = 1024;

const CRLF: &[u8] = b"\r\n";
const COLON_SPACE: &[u8] = b": ";

/// Headers emitted by [`HeaderFinalize`] and therefore skipped when passing through handler
/// headers.
const RESERVED: [HeaderName; 5] = [DATE, CONTENT_LENGTH, CONTENT_TYPE, CONNECTION, TRANSFER_ENCODING];

/// Late computed header values. A field is written only if it is present and non-empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderFinalize<'a> {
    pub date: Option<&'a [u8]>,
    pub content_length: Option<&'a [u8]>,
    pub content_type: Option<&'a [u8]>,
    pub connection: Option<&'a [u8]>,
    pub transfer_encoding: Option<&'a [u8]>,
}

impl HeaderFinalize<'_> {
    /// Writes the fixed header set in the order Date, Content-Length, Content-Type,
    /// Connection, Transfer-Encoding.
    pub fn encode(&self, dst: &mut BytesMut) {
        let fields = [
            (&b"Date"[..], self.date),
            (&b"Content-Length"[..], self.content_length),
            (&b"Content-Type"[..], self.content_type),
            (&b"Connection"[..], self.connection),
            (&b"Transfer-Encoding"[..], self.transfer_encoding),
        ];

        for (name, value) in fields {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                write_header_line(name, value, dst);
            }
        }
    }
}

/// Writes `HTTP/1.1 <code> <reason>\r\n`. Codes without a canonical reason get an empty one.
pub fn encode_status_line(status: StatusCode, dst: &mut BytesMut) {
    dst.reserve(INIT_HEADER_SIZE);
    dst.put_slice(b"HTTP/1.1 ");
    dst.put_slice(status.as_str().as_bytes());
    dst.put_u8(b' ');
    dst.put_slice(status.canonical_reason().unwrap_or("").as_bytes());
    dst.put_slice(CRLF);
}

/// Writes every handler header except the reserved ones, followed by the blank line that
/// terminates the header section.
pub fn encode_handler_headers(headers: &HeaderMap, dst: &mut BytesMut) {
    for (name, value) in headers {
        if value.is_empty() || RESERVED.contains(name) {
            continue;
        }
        write_header_line(name.as_str().as_bytes(), value.as_bytes(), dst);
    }
    dst.put_slice(CRLF);
}

#[inline]
fn write_header_line(name: &[u8], value: &[u8], dst: &mut BytesMut) {
    dst.put_slice(name);
    dst.put_slice(COLON_SPACE);
    dst.put_slice(value);
    dst.put_slice(CRLF);
}
