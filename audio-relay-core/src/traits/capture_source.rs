use crate::models::error::RelayError;
use crate::models::format::StreamFormat;
use crate::models::grant::CaptureGrant;

/// Interface for platform-specific capture backends.
///
/// The platform's builder/callback API is bridged inside the adapter; the
/// core consumes a narrow, pull-based seam. Implemented by
/// `CpalCaptureSource` (audio-relay-cpal) and by scripted sources in tests.
pub trait CaptureSource: Send {
    type Stream: CaptureStream;

    /// Open the capture stream.
    ///
    /// Consumes the grant (single-use). `min_buffer_bytes` is a buffering
    /// hint: the source should hold at least this many bytes internally so
    /// it does not overflow while the relay blocks in send. An expired or
    /// invalid grant fails with `RelayError::Authorization`.
    fn open(
        &mut self,
        grant: CaptureGrant,
        format: StreamFormat,
        min_buffer_bytes: usize,
    ) -> Result<Self::Stream, RelayError>;
}

/// A live capture stream, owned by the relay worker for the session's
/// lifetime.
pub trait CaptureStream {
    /// Blocking read of up to `buf.len()` bytes of interleaved PCM.
    ///
    /// `Ok(0)` means the source is exhausted (or the platform revoked the
    /// capture authorization); `Ok(n)` with `n < buf.len()` is a valid
    /// partial read.
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize, RelayError>;

    /// Release the underlying capture resources. Idempotent.
    fn close(&mut self);

    /// Liveness query, used to verify teardown.
    fn is_open(&self) -> bool;
}
