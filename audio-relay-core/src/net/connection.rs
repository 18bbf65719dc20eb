use std::io::Write;
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use socket2::SockRef;

use crate::models::error::RelayError;
use crate::net::retry::RetryPolicy;

/// Socket options applied to a freshly connected stream.
#[derive(Debug, Clone, Copy)]
pub struct SocketTuning {
    /// Timeout for a single connect attempt.
    pub connect_timeout: Duration,
    /// Send buffer size, or None to keep the OS default.
    pub send_buffer_bytes: Option<usize>,
}

/// Why `RelayConnection::connect` returned without a live socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectFailure {
    /// Every attempt in the budget failed.
    Exhausted { attempts: u32 },
    /// The shutdown flag was observed between attempts.
    Cancelled,
}

/// The live transport to the destination.
///
/// Exists only between a successful connect and `close` (or a fatal I/O
/// error); exclusively owned by the relay worker. Send failures are
/// terminal — reconnecting mid-stream would lose frame alignment, so a new
/// connection means a new session.
#[derive(Debug)]
pub struct RelayConnection {
    stream: Option<TcpStream>,
}

impl RelayConnection {
    /// Attempt a blocking connect up to `retry.attempts()` times, sleeping
    /// `retry.delay` between failures (no sleep after the final failure).
    ///
    /// Returns the connection and the number of attempts consumed. The
    /// shutdown flag is checked before each attempt so `stop()` during
    /// `Connecting` is bounded by one attempt plus one delay.
    pub fn connect(
        host: IpAddr,
        port: u16,
        retry: &RetryPolicy,
        tuning: &SocketTuning,
        shutdown: &AtomicBool,
    ) -> Result<(Self, u32), ConnectFailure> {
        let addr = SocketAddr::new(host, port);
        let budget = retry.attempts();

        for attempt in 1..=budget {
            if shutdown.load(Ordering::SeqCst) {
                return Err(ConnectFailure::Cancelled);
            }

            match TcpStream::connect_timeout(&addr, tuning.connect_timeout) {
                Ok(stream) => {
                    Self::tune(&stream, tuning);
                    log::info!("connected to {} on attempt {}/{}", addr, attempt, budget);
                    return Ok((
                        Self {
                            stream: Some(stream),
                        },
                        attempt,
                    ));
                }
                Err(err) => {
                    log::debug!("connect attempt {}/{} to {} failed: {}", attempt, budget, addr, err);
                    if attempt < budget {
                        thread::sleep(retry.delay);
                    }
                }
            }
        }

        log::warn!("connection to {} exhausted after {} attempts", addr, budget);
        Err(ConnectFailure::Exhausted { attempts: budget })
    }

    fn tune(stream: &TcpStream, tuning: &SocketTuning) {
        if let Err(err) = stream.set_nodelay(true) {
            log::warn!("failed to set TCP_NODELAY: {}", err);
        }
        if let Some(bytes) = tuning.send_buffer_bytes {
            if let Err(err) = SockRef::from(stream).set_send_buffer_size(bytes) {
                log::warn!("failed to set send buffer to {} bytes: {}", bytes, err);
            }
        }
    }

    /// Blocking full-length write of `frame`.
    ///
    /// A short write surfaces as an error: partial delivery is never
    /// reported as success. Any failure is terminal for the session.
    pub fn send(&mut self, frame: &[u8]) -> Result<(), RelayError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| RelayError::Transport("connection closed".into()))?;
        stream
            .write_all(frame)
            .map_err(|err| RelayError::Transport(err.to_string()))
    }

    /// Idempotent close: shuts down and releases the socket. Safe to call
    /// repeatedly or after a send failure.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::{Ipv4Addr, TcpListener};
    use std::time::Instant;

    fn tuning() -> SocketTuning {
        SocketTuning {
            connect_timeout: Duration::from_secs(1),
            send_buffer_bytes: Some(256 * 1024),
        }
    }

    #[test]
    fn connects_first_attempt_when_listener_bound() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let shutdown = AtomicBool::new(false);

        let (conn, attempts) = RelayConnection::connect(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            &RetryPolicy::default(),
            &tuning(),
            &shutdown,
        )
        .unwrap();

        assert_eq!(attempts, 1);
        assert!(conn.is_open());
    }

    #[test]
    fn exhausts_budget_against_dead_port() {
        // Bind then drop to find a port with no listener.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let shutdown = AtomicBool::new(false);
        let retry = RetryPolicy::new(3, Duration::from_millis(10));

        let err = RelayConnection::connect(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            &retry,
            &tuning(),
            &shutdown,
        )
        .unwrap_err();

        assert_eq!(err, ConnectFailure::Exhausted { attempts: 3 });
    }

    #[test]
    fn shutdown_flag_cancels_before_first_attempt() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let shutdown = AtomicBool::new(true);

        let start = Instant::now();
        let err = RelayConnection::connect(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            &RetryPolicy::new(50, Duration::from_millis(100)),
            &tuning(),
            &shutdown,
        )
        .unwrap_err();

        assert_eq!(err, ConnectFailure::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn send_then_close_is_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let shutdown = AtomicBool::new(false);

        let (mut conn, _) = RelayConnection::connect(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            &RetryPolicy::default(),
            &tuning(),
            &shutdown,
        )
        .unwrap();

        let (mut peer, _) = listener.accept().unwrap();
        conn.send(&[1, 2, 3, 4]).unwrap();

        conn.close();
        conn.close();
        assert!(!conn.is_open());

        let mut received = Vec::new();
        peer.read_to_end(&mut received).unwrap();
        assert_eq!(received, vec![1, 2, 3, 4]);
    }

    #[test]
    fn close_without_connect_is_safe() {
        let mut conn = RelayConnection { stream: None };
        conn.close();
        assert!(!conn.is_open());
        assert!(conn.send(&[0]).is_err());
    }
}
