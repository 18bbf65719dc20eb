//! # audio-relay-core
//!
//! Platform-agnostic capture-to-socket audio relay core.
//!
//! Turns a live, platform-supplied audio source into a sequence of
//! fixed-size PCM frames relayed, in capture order, over a persistent TCP
//! connection to a loopback-reachable destination. Covers connection
//! establishment with bounded retry, the single-threaded read-then-send
//! relay cycle, and graceful/abrupt shutdown. Platform capture backends
//! (cpal, test doubles) implement the `CaptureSource` trait and plug into
//! the generic `RelaySession`.
//!
//! ## Architecture
//!
//! ```text
//! audio-relay-core (this crate)
//! ├── traits/    ← CaptureSource, CaptureStream, SessionDelegate
//! ├── models/    ← RelayError, SessionState, SessionConfig, StreamFormat, …
//! ├── net/       ← RelayConnection (retry, tuning, send, close), RetryPolicy
//! └── session/   ← RelaySession (controller) + the relay loop
//! ```
//!
//! The wire protocol is deliberately bare: concatenated raw PCM frames, no
//! framing header and no handshake beyond the TCP connect. The receiver
//! knows the fixed sample format out of band.

pub mod models;
pub mod net;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{SchedulingHook, SchedulingPolicy, SessionConfig, DEFAULT_PORT};
pub use models::diagnostics::RelayDiagnostics;
pub use models::error::RelayError;
pub use models::format::StreamFormat;
pub use models::frame::FrameBuffer;
pub use models::grant::CaptureGrant;
pub use models::state::{SessionOutcome, SessionState};
pub use net::connection::RelayConnection;
pub use net::retry::RetryPolicy;
pub use session::controller::RelaySession;
pub use traits::capture_source::{CaptureSource, CaptureStream};
pub use traits::session_delegate::SessionDelegate;
