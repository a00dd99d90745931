//! A buffering HTTP/1.1 response writer
//!
//! This crate implements the part of an HTTP/1.1 server that sits between a request handler
//! and the connection: it collects what the handler writes, decides how the body is framed and
//! puts the response on the wire. Parsing requests and routing them is left to the caller.
//!
//! # Features
//!
//! - Small bodies are buffered and sent with an exact `Content-Length`
//! - Large or flushed bodies switch to chunked transfer encoding on the fly
//! - `Content-Type` sniffing from the first body bytes
//! - Declared `Content-Length` enforcement
//! - `HEAD` requests and bodyless status codes (1xx, 204, 304) handled per RFC 9112
//! - Connection hijacking
//! - Pooled buffers, header maps and response state, reset between requests
//!
//! # Example
//!
//! ```no_run
//! use http::Method;
//! use micro_response::connection::BufConn;
//! use micro_response::pool::Pools;
//! use micro_response::protocol::RequestInfo;
//! use micro_response::response::Response;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info};
//!
//! #[tokio::main]
//! async fn main() {
//!     let pools = Arc::new(Pools::default());
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = listener.accept().await.unwrap();
//!         let pools = Arc::clone(&pools);
//!
//!         tokio::spawn(async move {
//!             let conn = BufConn::new(tcp_stream, &pools);
//!             // request parsing omitted, see the `server` demo of this crate
//!             let mut response = Response::new(&pools, RequestInfo::new(Method::GET), conn);
//!
//!             if let Err(e) = response.write(b"Hello World!\r\n").await {
//!                 error!(cause = %e, "write response error");
//!             }
//!             match response.finish_request().await {
//!                 Ok(()) => info!("response finished"),
//!                 Err(e) => error!(cause = %e, "finish response error"),
//!             }
//!             let _conn = response.release();
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`response`]: the [`Response`](response::Response) writer handed to handlers
//! - [`codec`]: header finalization, body framing and content sniffing
//! - [`connection`]: the buffered connection a response writes to
//! - [`pool`]: object pools shared by all exchanges
//! - [`protocol`]: error type, request descriptor and status code rules
//! - [`config`]: buffer sizes and other tunables
//!
//! # Body framing
//!
//! | situation                                   | framing                            |
//! |---------------------------------------------|------------------------------------|
//! | handler declared a valid `Content-Length`   | that length                        |
//! | status is 1xx, 204 or 304                   | none                               |
//! | handler set `Transfer-Encoding: chunked`    | chunked                            |
//! | body overflowed the buffer, or was flushed  | chunked                            |
//! | handler finished with everything buffered   | `Content-Length` of the buffer     |
//!
//! # Limitations
//!
//! - HTTP/1.1 only
//! - No trailers
//! - No TLS support (use a reverse proxy for HTTPS)

pub mod codec;
pub mod config;
pub mod connection;
pub mod pool;
pub mod protocol;
pub mod response;

mod utils;
pub(crate) use utils::ensure;
