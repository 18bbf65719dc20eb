use crate::models::error::RelayError;
use crate::models::state::{SessionOutcome, SessionState};

/// Event delegate for relay session notifications.
///
/// Methods are called from the relay worker thread, except for the
/// transitions driven directly by `start()`/`stop()`, which arrive on the
/// control thread. `on_state_changed` is delivered while a session-internal
/// lock is held so transitions arrive in order; implementations must not
/// call back into `RelaySession` from that callback and should marshal to
/// their own context if needed.
pub trait SessionDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &SessionState);

    /// Called when a terminal error ends the session.
    fn on_error(&self, error: &RelayError);

    /// Called exactly once, after teardown, with the worker's exit reason.
    fn on_session_ended(&self, outcome: &SessionOutcome);
}
