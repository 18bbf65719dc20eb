use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use super::format::StreamFormat;
use crate::net::retry::RetryPolicy;

/// Default destination port when the launcher does not specify one.
pub const DEFAULT_PORT: u16 = 28200;

/// Scheduling class requested for the relay worker thread.
///
/// The core never touches OS priority constants; an embedder that wants
/// real-time scheduling installs a `SchedulingHook` that applies the
/// platform call on the worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingPolicy {
    /// Inherit the spawning thread's scheduling.
    Inherit,
    /// Elevate to the host's real-time/audio class.
    RealtimeAudio,
}

/// Invoked on the worker thread, before connecting, to apply the
/// configured scheduling policy.
pub type SchedulingHook = Arc<dyn Fn(SchedulingPolicy) + Send + Sync + 'static>;

/// Configuration for a relay session.
#[derive(Clone)]
pub struct SessionConfig {
    /// Destination host; always a loopback-reachable address.
    pub destination_host: IpAddr,

    /// Frame capacity in bytes (default: 1920, 10 ms at the default format).
    pub frame_capacity: usize,

    /// Connect retry budget.
    pub retry: RetryPolicy,

    /// Timeout for a single connect attempt.
    pub connect_timeout: Duration,

    /// Socket send buffer size, or None to keep the OS default.
    pub send_buffer_bytes: Option<usize>,

    /// Source-side buffering hint, as a multiple of the frame capacity.
    /// Must be at least 2 so the source can absorb one frame while the
    /// relay blocks in send.
    pub source_buffer_frames: usize,

    /// Scheduling class for the worker thread.
    pub scheduling: SchedulingPolicy,

    /// Optional platform hook that applies `scheduling` on the worker.
    pub scheduling_hook: Option<SchedulingHook>,

    /// The fixed PCM configuration.
    pub format: StreamFormat,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_capacity == 0 {
            return Err("frame capacity must be positive".into());
        }
        if self.source_buffer_frames < 2 {
            return Err("source buffer must cover at least 2 frames".into());
        }
        if self.connect_timeout.is_zero() {
            return Err("connect timeout must be positive".into());
        }
        self.format.validate()
    }

    /// Buffering requested from the capture source at open time.
    pub fn source_buffer_bytes(&self) -> usize {
        self.frame_capacity * self.source_buffer_frames
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            destination_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            frame_capacity: 1920,
            retry: RetryPolicy::default(),
            connect_timeout: Duration::from_secs(5),
            send_buffer_bytes: Some(256 * 1024),
            source_buffer_frames: 8,
            scheduling: SchedulingPolicy::RealtimeAudio,
            scheduling_hook: None,
            format: StreamFormat::default(),
        }
    }
}
