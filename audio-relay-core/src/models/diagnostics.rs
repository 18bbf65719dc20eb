use uuid::Uuid;

/// Running counters for one relay session.
///
/// Updated by the worker thread under the session mutex; readable at any
/// time through `RelaySession::diagnostics()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayDiagnostics {
    /// Identity of the session, carried in log lines.
    pub session_id: Uuid,
    /// Connect attempts consumed before the socket opened (or the budget ran out).
    pub connect_attempts: u32,
    /// Frames pushed through the socket.
    pub frames_relayed: u64,
    /// Total payload bytes sent.
    pub bytes_sent: u64,
    /// Frames forwarded with fewer bytes than the frame capacity.
    pub partial_frames: u64,
}

impl RelayDiagnostics {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            connect_attempts: 0,
            frames_relayed: 0,
            bytes_sent: 0,
            partial_frames: 0,
        }
    }
}

impl Default for RelayDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}
