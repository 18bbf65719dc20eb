//! Shared helpers for the relay integration tests: a scripted capture
//! source, a collecting delegate, and loopback TCP listeners.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Read};
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use audio_relay_core::{
    CaptureGrant, CaptureSource, CaptureStream, RelayError, RetryPolicy, SchedulingPolicy,
    SessionConfig, SessionDelegate, SessionOutcome, SessionState, StreamFormat,
};

/// One scripted relay cycle.
pub enum Step {
    /// Deliver these bytes (a full or partial frame).
    Frame(Vec<u8>),
    /// Report source exhaustion (zero-length read).
    Eof,
    /// Fail the read.
    Fail(&'static str),
}

/// Capture source that replays a fixed script, optionally followed by an
/// endless repeated frame for tests that stop the session externally.
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    repeat: Option<Vec<u8>>,
    pace: Duration,
    open_flag: Arc<AtomicBool>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            repeat: None,
            pace: Duration::from_millis(1),
            open_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A source that delivers `frame` forever, paced like real hardware.
    pub fn endless(frame: Vec<u8>, pace: Duration) -> Self {
        Self {
            steps: VecDeque::new(),
            repeat: Some(frame),
            pace,
            open_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for asserting open/closed after teardown.
    pub fn open_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.open_flag)
    }
}

impl CaptureSource for ScriptedSource {
    type Stream = ScriptedStream;

    fn open(
        &mut self,
        grant: CaptureGrant,
        _format: StreamFormat,
        _min_buffer_bytes: usize,
    ) -> Result<ScriptedStream, RelayError> {
        if grant.is_expired() {
            return Err(RelayError::Authorization("capture grant expired".into()));
        }
        self.open_flag.store(true, Ordering::SeqCst);
        Ok(ScriptedStream {
            steps: std::mem::take(&mut self.steps),
            repeat: self.repeat.clone(),
            pace: self.pace,
            open: Arc::clone(&self.open_flag),
        })
    }
}

pub struct ScriptedStream {
    steps: VecDeque<Step>,
    repeat: Option<Vec<u8>>,
    pace: Duration,
    open: Arc<AtomicBool>,
}

impl CaptureStream for ScriptedStream {
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize, RelayError> {
        thread::sleep(self.pace);
        let bytes = match self.steps.pop_front() {
            Some(Step::Frame(bytes)) => bytes,
            Some(Step::Eof) => return Ok(0),
            Some(Step::Fail(reason)) => return Err(RelayError::Capture(reason.into())),
            None => match &self.repeat {
                Some(frame) => frame.clone(),
                None => return Ok(0),
            },
        };
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        Ok(n)
    }

    fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Delegate that records every callback for later assertions.
#[derive(Default)]
pub struct CollectingDelegate {
    pub states: Mutex<Vec<SessionState>>,
    pub errors: Mutex<Vec<RelayError>>,
    pub outcomes: Mutex<Vec<SessionOutcome>>,
}

impl SessionDelegate for CollectingDelegate {
    fn on_state_changed(&self, state: &SessionState) {
        self.states.lock().push(state.clone());
    }

    fn on_error(&self, error: &RelayError) {
        self.errors.lock().push(error.clone());
    }

    fn on_session_ended(&self, outcome: &SessionOutcome) {
        self.outcomes.lock().push(outcome.clone());
    }
}

/// A config with short timeouts suitable for tests.
pub fn test_config() -> SessionConfig {
    SessionConfig {
        retry: RetryPolicy::new(5, Duration::from_millis(20)),
        connect_timeout: Duration::from_millis(500),
        scheduling: SchedulingPolicy::Inherit,
        ..Default::default()
    }
}

/// Bind a loopback listener on an ephemeral port; the spawned thread
/// accepts one connection and reads it to EOF.
///
/// Accept is bounded by a deadline so a session that never connects
/// (for example one stopped during `Connecting`) cannot hang the test
/// binary in `join()`; the thread then returns an empty byte vector.
pub fn spawn_listener() -> (u16, thread::JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        listener
            .set_nonblocking(true)
            .expect("nonblocking listener");
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut peer = loop {
            match listener.accept() {
                Ok((peer, _)) => break peer,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Vec::new();
                    }
                    thread::sleep(Duration::from_millis(5));
                }
                Err(err) => panic!("accept relay connection: {}", err),
            }
        };
        peer.set_nonblocking(false).expect("blocking peer socket");
        let mut bytes = Vec::new();
        let _ = peer.read_to_end(&mut bytes);
        bytes
    });
    (port, handle)
}

/// Listener that appears only after `delay`, to exercise connect retry.
pub fn spawn_late_listener(port: u16, delay: Duration) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        thread::sleep(delay);
        let listener = TcpListener::bind(("127.0.0.1", port)).expect("bind late listener");
        let (mut peer, _) = listener.accept().expect("accept relay connection");
        let mut bytes = Vec::new();
        let _ = peer.read_to_end(&mut bytes);
        bytes
    })
}

/// Listener that reads `read_at_least` bytes and then drops the
/// connection, simulating a peer going away mid-stream.
pub fn spawn_dropping_listener(read_at_least: usize) -> (u16, thread::JoinHandle<usize>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut peer, _) = listener.accept().expect("accept relay connection");
        let mut total = 0usize;
        let mut buf = [0u8; 4096];
        while total < read_at_least {
            match peer.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => total += n,
            }
        }
        total
        // peer dropped here; subsequent sends fail
    });
    (port, handle)
}

/// A loopback port with no listener bound.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    listener.local_addr().unwrap().port()
}

/// Poll `pred` until it holds or `timeout` elapses.
pub fn wait_for(timeout: Duration, mut pred: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if pred() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    pred()
}
