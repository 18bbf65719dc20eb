//! Minimal relay demo: captures the default input device and streams raw
//! PCM to a loopback destination until Enter is pressed.
//!
//! Usage: relay-demo [port]   (default 28200)

use audio_relay_core::{CaptureGrant, RelayError, RelaySession, SessionConfig, DEFAULT_PORT};
use audio_relay_cpal::CpalCaptureSource;

fn main() {
    env_logger::init();

    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    if let Err(err) = run(port) {
        eprintln!("relay-demo: {}", err);
        std::process::exit(1);
    }
}

fn run(port: u16) -> Result<(), RelayError> {
    let source = CpalCaptureSource::with_defaults();
    let mut session = RelaySession::new(source, SessionConfig::default())?;

    session.start(CaptureGrant::issue(), port)?;
    println!("relaying default input to 127.0.0.1:{} (press Enter to stop)", port);

    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);

    session.stop();

    let diag = session.diagnostics();
    println!(
        "session {}: {} frames relayed, {} bytes sent, {} partial, {} connect attempts",
        diag.session_id,
        diag.frames_relayed,
        diag.bytes_sent,
        diag.partial_frames,
        diag.connect_attempts
    );
    if let Some(outcome) = session.outcome() {
        println!("outcome: {:?}", outcome);
    }
    Ok(())
}
