//! The response writer handed to request handlers.
//!
//! A [`Response`] lives for exactly one exchange:
//!
//! 1. the server builds it from the shared [`Pools`](crate::pool::Pools), a
//!    [`RequestInfo`](crate::protocol::RequestInfo) and a [`BufConn`](crate::connection::BufConn)
//! 2. the handler sets headers, calls `write_header`, `write` and `flush`
//! 3. the server calls `finish_request` and then `release` to get the connection back
//!
//! A handler may also `hijack` the connection, after which the response refuses all writes.

mod state;
mod writer;

pub use state::Phase;
pub(crate) use state::ResponseState;
pub use writer::Response;
