use http::StatusCode;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("connection has been hijacked")]
    Hijacked,

    #[error("response has already been finished")]
    Finished,

    #[error("request method or response status code {status} does not allow body")]
    BodyNotAllowed { status: StatusCode },

    #[error("wrote more than the declared Content-Length, declared: {declared}, written: {written}")]
    ContentLengthExceeded { declared: u64, written: u64 },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ResponseError {
    pub fn body_not_allowed(status: StatusCode) -> Self {
        Self::BodyNotAllowed { status }
    }

    pub fn content_length_exceeded(declared: u64, written: u64) -> Self {
        Self::ContentLengthExceeded { declared, written }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true if the error comes from the underlying connection rather than from misuse of
    /// the writer.
    #[inline]
    pub fn is_io(&self) -> bool {
        matches!(self, ResponseError::Io { .. })
    }
}
