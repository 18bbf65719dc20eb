use super::error::RelayError;

/// Relay session state machine.
///
/// State transitions:
/// ```text
/// idle → connecting → streaming → stopping → stopped
///             ↓            ↓
///           failed ←───────┘
/// ```
///
/// `Streaming` implies a live connection and an open capture stream;
/// `Idle` and `Stopped` hold neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Streaming,
    Stopping,
    Stopped,
    Failed(RelayError),
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed(_))
    }

    /// Returns the failure reason if the session has failed.
    pub fn failure(&self) -> Option<&RelayError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Why the relay worker exited.
///
/// Recorded exactly once, at worker exit, and retained across a later
/// `stop()` so diagnostics survive the normalization to `Stopped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The shutdown flag was observed at a cycle boundary.
    Shutdown,
    /// The capture source returned a zero-length read.
    SourceExhausted,
    /// A terminal error ended the session.
    Failed(RelayError),
}
