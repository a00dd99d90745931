use crate::codec::ChunkWriter;
use http::StatusCode;

/// Where a response is in its life.
///
/// ```text
/// Idle ──write_header──▶ Buffering ──overflow / flush──▶ Streaming
///   │                        │                               │
///   └────────────────────────┴──────── finish_request ───────┴──▶ Finished
///   └────────────────────────┴────────────── hijack ─────────┴──▶ Hijacked
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No status accepted yet.
    #[default]
    Idle,
    /// Status accepted, body bytes collect in the response buffer.
    Buffering,
    /// Body bytes go straight to the chunk writer.
    Streaming,
    /// The handler is done and the body is terminated.
    Finished,
    /// The connection belongs to someone else.
    Hijacked,
}

/// The pooled, per-exchange part of a response.
#[derive(Debug)]
pub struct ResponseState {
    pub(crate) phase: Phase,
    pub(crate) status: StatusCode,
    pub(crate) declared_length: Option<u64>,
    /// Attempted body bytes, including those of a write that failed.
    pub(crate) written: u64,
    pub(crate) chunk_writer: ChunkWriter,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            status: StatusCode::OK,
            declared_length: None,
            written: 0,
            chunk_writer: ChunkWriter::new(),
        }
    }
}

impl ResponseState {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub(crate) fn is_header_sent(&self) -> bool {
        self.phase != Phase::Idle
    }
}
