use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::config::SessionConfig;
use crate::models::diagnostics::RelayDiagnostics;
use crate::models::error::RelayError;
use crate::models::frame::FrameBuffer;
use crate::models::grant::CaptureGrant;
use crate::models::state::{SessionOutcome, SessionState};
use crate::net::connection::{ConnectFailure, RelayConnection, SocketTuning};
use crate::session::relay;
use crate::traits::capture_source::{CaptureSource, CaptureStream};
use crate::traits::session_delegate::SessionDelegate;

/// Internal mutable session state, protected by `parking_lot::Mutex`.
pub(crate) struct SessionShared {
    pub(crate) state: SessionState,
    pub(crate) diagnostics: RelayDiagnostics,
    pub(crate) outcome: Option<SessionOutcome>,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            diagnostics: RelayDiagnostics::new(),
            outcome: None,
        }
    }
}

/// Top-level relay session: the start/stop surface exposed to embedders.
///
/// Generic over the capture backend via the `CaptureSource` trait. `start`
/// spawns one dedicated worker thread that synchronously runs connect →
/// capture open → relay loop → teardown; the control surface communicates
/// with it only through the shutdown flag, the state mutex, and delegate
/// callbacks. Capture and connection handles never leave the worker.
///
/// One-shot lifecycle: a session that has left `Idle` never returns there.
/// A new relay means a new `RelaySession` (and a fresh capture grant).
pub struct RelaySession<S: CaptureSource> {
    source: Option<S>,
    config: SessionConfig,
    shared: Arc<Mutex<SessionShared>>,
    delegate: Option<Arc<dyn SessionDelegate>>,
    shutdown: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl<S: CaptureSource + 'static> RelaySession<S> {
    pub fn new(source: S, config: SessionConfig) -> Result<Self, RelayError> {
        config.validate().map_err(RelayError::Config)?;
        Ok(Self {
            source: Some(source),
            config,
            shared: Arc::new(Mutex::new(SessionShared::new())),
            delegate: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().state.clone()
    }

    pub fn diagnostics(&self) -> RelayDiagnostics {
        self.shared.lock().diagnostics.clone()
    }

    /// The worker's exit reason, once it has exited.
    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.shared.lock().outcome.clone()
    }

    /// Begin relaying to the loopback destination on `port`.
    ///
    /// Valid only from `Idle`. Transitions to `Connecting` and returns
    /// immediately; connection outcome is observable through `state()` and
    /// the delegate, never by blocking the caller.
    pub fn start(&mut self, grant: CaptureGrant, port: u16) -> Result<(), RelayError> {
        {
            let s = self.shared.lock();
            if !s.state.is_idle() {
                return Err(RelayError::InvalidState(format!(
                    "start requires idle state, session is {:?}",
                    s.state
                )));
            }
        }

        let source = self.source.take().ok_or_else(|| {
            RelayError::InvalidState("capture source already consumed".into())
        })?;

        set_state(
            &self.shared,
            self.delegate.as_ref(),
            SessionState::Connecting,
            |s| s.is_idle(),
        );

        let config = self.config.clone();
        let shared = Arc::clone(&self.shared);
        let delegate = self.delegate.clone();
        let shutdown = Arc::clone(&self.shutdown);

        let spawned = thread::Builder::new()
            .name("audio-relay-worker".into())
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    run_worker(
                        source,
                        grant,
                        port,
                        &config,
                        &shared,
                        delegate.as_ref(),
                        &shutdown,
                    )
                }));

                // Unwinding has already dropped the worker's resources; all
                // that is left is to record the final state and outcome.
                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        log::error!("relay worker panicked");
                        SessionOutcome::Failed(RelayError::Capture(
                            "relay worker panicked".into(),
                        ))
                    }
                };

                match &outcome {
                    SessionOutcome::Failed(err) => {
                        log::error!(
                            "session {} failed: {}",
                            shared.lock().diagnostics.session_id,
                            err
                        );
                        if let Some(ref d) = delegate {
                            d.on_error(err);
                        }
                        set_state(
                            &shared,
                            delegate.as_ref(),
                            SessionState::Failed(err.clone()),
                            |s| !s.is_terminal(),
                        );
                    }
                    _ => {
                        set_state(&shared, delegate.as_ref(), SessionState::Stopped, |s| {
                            !s.is_terminal()
                        });
                    }
                }

                shared.lock().outcome = Some(outcome.clone());
                if let Some(ref d) = delegate {
                    d.on_session_ended(&outcome);
                }
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                let err = RelayError::Config(format!("failed to spawn relay worker: {}", err));
                set_state(
                    &self.shared,
                    self.delegate.as_ref(),
                    SessionState::Failed(err.clone()),
                    |s| !s.is_terminal(),
                );
                Err(err)
            }
        }
    }

    /// Stop the session. Valid from any state, idempotent, infallible.
    ///
    /// Sets the shutdown flag (observed by the relay loop at the next
    /// cycle boundary), joins the worker, then normalizes the state to
    /// `Stopped`. Because the worker owns both handles and is joined here,
    /// no capture or connection resource remains open after `stop` returns.
    ///
    /// The `Stopping` transition is decided under the shared lock, only
    /// from a live non-terminal state; if the worker has already recorded
    /// its final state, `stop` does not move the session backwards.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);

        if let Some(handle) = self.worker.take() {
            set_state(&self.shared, self.delegate.as_ref(), SessionState::Stopping, |s| {
                !s.is_idle() && !s.is_terminal()
            });
            let _ = handle.join();
        }

        set_state(
            &self.shared,
            self.delegate.as_ref(),
            SessionState::Stopped,
            |_| true,
        );
    }
}

impl<S: CaptureSource> Drop for RelaySession<S> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

/// Record a state transition and notify the delegate.
///
/// The transition is applied only when `allowed` holds for the current
/// state; the check and the write share one critical section, so the
/// control thread and the worker cannot interleave transitions out of
/// order (`Stopping` never follows a terminal state, `Streaming` never
/// follows `Stopping`). The notification is delivered inside the same
/// critical section, so the delegate observes transitions in the order
/// they were applied. A transition to the current state is a no-op, so
/// repeated `stop()` calls do not replay the `Stopped` notification.
fn set_state(
    shared: &Mutex<SessionShared>,
    delegate: Option<&Arc<dyn SessionDelegate>>,
    new_state: SessionState,
    allowed: impl FnOnce(&SessionState) -> bool,
) {
    let mut s = shared.lock();
    if s.state == new_state || !allowed(&s.state) {
        return;
    }
    s.state = new_state.clone();
    if let Some(d) = delegate {
        d.on_state_changed(&new_state);
    }
}

/// The worker body: connect with bounded retry, open capture, relay until
/// a terminal condition, tear down in reverse acquisition order.
fn run_worker<S: CaptureSource>(
    mut source: S,
    grant: CaptureGrant,
    port: u16,
    config: &SessionConfig,
    shared: &Mutex<SessionShared>,
    delegate: Option<&Arc<dyn SessionDelegate>>,
    shutdown: &AtomicBool,
) -> SessionOutcome {
    if let Some(ref hook) = config.scheduling_hook {
        hook(config.scheduling);
    }

    let tuning = SocketTuning {
        connect_timeout: config.connect_timeout,
        send_buffer_bytes: config.send_buffer_bytes,
    };

    let (mut connection, attempts) = match RelayConnection::connect(
        config.destination_host,
        port,
        &config.retry,
        &tuning,
        shutdown,
    ) {
        Ok(connected) => connected,
        Err(ConnectFailure::Cancelled) => return SessionOutcome::Shutdown,
        Err(ConnectFailure::Exhausted { attempts }) => {
            shared.lock().diagnostics.connect_attempts = attempts;
            return SessionOutcome::Failed(RelayError::ConnectionExhausted { attempts });
        }
    };
    shared.lock().diagnostics.connect_attempts = attempts;

    let mut stream = match source.open(grant, config.format, config.source_buffer_bytes()) {
        Ok(stream) => stream,
        Err(err) => {
            connection.close();
            return SessionOutcome::Failed(err);
        }
    };

    // Only from Connecting: a Stopping recorded by the control thread is
    // never overwritten, the relay loop just observes the flag and exits.
    set_state(shared, delegate, SessionState::Streaming, |s| {
        matches!(s, SessionState::Connecting)
    });

    let mut frame = FrameBuffer::new(config.frame_capacity);
    let outcome = relay::run(&mut stream, &mut connection, &mut frame, shutdown, shared);

    // Teardown in reverse acquisition order.
    stream.close();
    connection.close();

    outcome
}
