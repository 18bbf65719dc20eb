use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::models::frame::FrameBuffer;
use crate::models::state::SessionOutcome;
use crate::net::connection::RelayConnection;
use crate::session::controller::SessionShared;
use crate::traits::capture_source::CaptureStream;

/// Frames between periodic stats log lines.
const STATS_INTERVAL: u64 = 1000;

/// The relay cycle: blocking read of one frame, blocking send, repeat.
///
/// Single-threaded by design — the capture read is hardware-paced and
/// already bounds the cycle time to one frame's duration, so a
/// producer/consumer split would only add jitter and a backpressure
/// problem. Frames go out in exact capture order.
///
/// Exit conditions, checked in cycle order:
/// - shutdown flag set at the top of a cycle → `Shutdown`
/// - zero-length read → `SourceExhausted` (nothing sent that cycle)
/// - read error → `Failed(Capture)`
/// - send error → `Failed(Transport)` (no further reads)
pub(crate) fn run<S: CaptureStream>(
    stream: &mut S,
    connection: &mut RelayConnection,
    frame: &mut FrameBuffer,
    shutdown: &AtomicBool,
    shared: &Mutex<SessionShared>,
) -> SessionOutcome {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return SessionOutcome::Shutdown;
        }

        let read = match stream.read_frame(frame.as_mut_slice()) {
            Ok(0) => return SessionOutcome::SourceExhausted,
            Ok(read) => read,
            Err(err) => return SessionOutcome::Failed(err),
        };

        // Partial frames are forwarded with their actual length, never
        // padded and never buffered into the next cycle.
        if let Err(err) = connection.send(frame.filled(read)) {
            return SessionOutcome::Failed(err);
        }

        let mut s = shared.lock();
        s.diagnostics.frames_relayed += 1;
        s.diagnostics.bytes_sent += read as u64;
        if read < frame.capacity() {
            s.diagnostics.partial_frames += 1;
        }
        if s.diagnostics.frames_relayed % STATS_INTERVAL == 0 {
            log::debug!(
                "session {}: {} frames relayed, {} bytes sent, {} partial",
                s.diagnostics.session_id,
                s.diagnostics.frames_relayed,
                s.diagnostics.bytes_sent,
                s.diagnostics.partial_frames
            );
        }
    }
}
