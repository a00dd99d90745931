//! Wire encoding of a response.
//!
//! - [`ChunkWriter`]: decides the body framing, writes the header section exactly once and
//!   frames body bytes as chunks when needed
//! - [`HeaderFinalize`]: the late computed headers and their serialization
//! - [`sniff()`]: content type detection from the leading body bytes
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use http::{HeaderMap, StatusCode};
//! use micro_response::codec::{ChunkWriter, Frame};
//!
//! let headers = HeaderMap::new();
//! let frame = Frame {
//!     status: StatusCode::OK,
//!     headers: &headers,
//!     declared_length: None,
//!     streaming: false,
//!     handler_done: true,
//!     head: false,
//!     default_content_type: None,
//! };
//!
//! let mut dst = BytesMut::new();
//! ChunkWriter::new().emit_header(&frame, Some(b"Hello World!\r\n"), &mut dst);
//! assert!(dst.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

mod chunk_writer;
mod header_finalize;
mod sniff;

pub use chunk_writer::ChunkWriter;
pub use chunk_writer::Frame;
pub use chunk_writer::has_chunked_token;
pub use header_finalize::HeaderFinalize;
pub use header_finalize::{encode_handler_headers, encode_status_line};
pub use sniff::{SNIFF_LEN, sniff};
