//! Buffered access to the raw connection of an exchange.
//!
//! - [`BufConn`]: a raw `AsyncRead + AsyncWrite` connection paired with pooled read and write
//!   buffers. It is lent to a [`Response`](crate::response::Response) for one exchange, handed
//!   back by [`Response::release`](crate::response::Response::release), or taken over
//!   entirely by [`Response::hijack`](crate::response::Response::hijack).

mod buf_conn;

pub use buf_conn::BufConn;
