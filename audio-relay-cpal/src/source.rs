use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use audio_relay_core::{CaptureGrant, CaptureSource, CaptureStream, RelayError, StreamFormat};

use crate::convert;
use crate::ring::ByteRing;

type SharedRing = Arc<(Mutex<ByteRing>, Condvar)>;

/// Options for the cpal capture backend.
#[derive(Debug, Clone)]
pub struct CpalSourceOptions {
    /// Input device name, or None for the system default.
    pub device_name: Option<String>,
    /// How long a blocking read waits for a full frame before the stream
    /// is considered stalled. Keeps `stop()` latency bounded when the
    /// backend dies without reporting an error.
    pub read_stall_timeout: Duration,
}

impl Default for CpalSourceOptions {
    fn default() -> Self {
        Self {
            device_name: None,
            read_stall_timeout: Duration::from_secs(5),
        }
    }
}

/// Capture source backed by cpal.
///
/// Bridges cpal's push-style audio callback to the core's pull-based
/// `CaptureStream` through a byte ring. Sample format and channel layout
/// are adapted in the callback; the ring always holds wire-format bytes
/// (stereo interleaved s16le).
pub struct CpalCaptureSource {
    options: CpalSourceOptions,
}

impl CpalCaptureSource {
    pub fn new(options: CpalSourceOptions) -> Self {
        Self { options }
    }

    pub fn with_defaults() -> Self {
        Self::new(CpalSourceOptions::default())
    }
}

impl CaptureSource for CpalCaptureSource {
    type Stream = CpalCaptureStream;

    fn open(
        &mut self,
        grant: CaptureGrant,
        format: StreamFormat,
        min_buffer_bytes: usize,
    ) -> Result<CpalCaptureStream, RelayError> {
        if grant.is_expired() {
            return Err(RelayError::Authorization("capture grant expired".into()));
        }

        let host = cpal::default_host();
        let device = resolve_device(&host, self.options.device_name.as_deref())?;
        let (config, sample_format) = select_config(&device, format)?;

        let ring: SharedRing = Arc::new((Mutex::new(ByteRing::new(min_buffer_bytes.max(1))), Condvar::new()));
        let (error_tx, error_rx) = bounded::<RelayError>(16);

        let stream = build_stream(&device, &config, sample_format, Arc::clone(&ring), error_tx)?;
        stream
            .play()
            .map_err(|err| RelayError::Capture(format!("failed to start input stream: {}", err)))?;

        log::info!(
            "capturing '{}' at {} Hz, {} ch, {:?}",
            device.name().unwrap_or_else(|_| "<unnamed>".into()),
            config.sample_rate.0,
            config.channels,
            sample_format
        );

        Ok(CpalCaptureStream {
            stream: Some(stream),
            ring,
            errors: error_rx,
            stall_timeout: self.options.read_stall_timeout,
        })
    }
}

/// A live cpal input stream plus the ring it feeds.
///
/// Stays on the relay worker thread for its whole life: created there by
/// `open`, read there, closed there.
pub struct CpalCaptureStream {
    stream: Option<Stream>,
    ring: SharedRing,
    errors: Receiver<RelayError>,
    stall_timeout: Duration,
}

impl CaptureStream for CpalCaptureStream {
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize, RelayError> {
        let (lock, cvar) = &*self.ring;
        let mut ring = lock.lock();

        if self.stream.is_none() {
            // Closed: drain the remainder, then report exhaustion.
            return Ok(ring.read_into(buf));
        }

        let deadline = Instant::now() + self.stall_timeout;
        loop {
            if let Ok(err) = self.errors.try_recv() {
                return Err(err);
            }
            if ring.count() >= buf.len() {
                return Ok(ring.read_into(buf));
            }
            if cvar.wait_until(&mut ring, deadline).timed_out() {
                // Forward whatever arrived; an empty ring after the full
                // timeout means the backend is dead.
                if !ring.is_empty() {
                    return Ok(ring.read_into(buf));
                }
                return Err(RelayError::Capture(format!(
                    "capture stalled: no audio for {:?}",
                    self.stall_timeout
                )));
            }
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            let (_, cvar) = &*self.ring;
            cvar.notify_all();
            log::debug!("cpal capture stream closed");
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for CpalCaptureStream {
    fn drop(&mut self) {
        self.close();
    }
}

fn resolve_device(host: &cpal::Host, name: Option<&str>) -> Result<Device, RelayError> {
    match name {
        Some(wanted) => host
            .input_devices()
            .map_err(|err| RelayError::Capture(format!("failed to enumerate input devices: {}", err)))?
            .find(|device| device.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| RelayError::Capture(format!("input device '{}' not found", wanted))),
        None => host
            .default_input_device()
            .ok_or_else(|| RelayError::Capture("no default input device available".into())),
    }
}

/// Pick a stream config at the wire sample rate.
///
/// Preference order: native i16 with the wire channel count, then any i16
/// layout, then f32 (converted in the callback). The sample rate is never
/// adapted; a device that cannot run at the wire rate is rejected.
fn select_config(
    device: &Device,
    format: StreamFormat,
) -> Result<(StreamConfig, SampleFormat), RelayError> {
    let rate = SampleRate(format.sample_rate);
    let ranges: Vec<_> = device
        .supported_input_configs()
        .map_err(|err| RelayError::Capture(format!("failed to query input configs: {}", err)))?
        .collect();

    let picked = ranges
        .iter()
        .filter(|r| r.sample_format() == SampleFormat::I16 && r.channels() == format.channels)
        .find_map(|r| r.clone().try_with_sample_rate(rate))
        .or_else(|| {
            ranges
                .iter()
                .filter(|r| r.sample_format() == SampleFormat::I16)
                .find_map(|r| r.clone().try_with_sample_rate(rate))
        })
        .or_else(|| {
            ranges
                .iter()
                .filter(|r| r.sample_format() == SampleFormat::F32)
                .find_map(|r| r.clone().try_with_sample_rate(rate))
        });

    match picked {
        Some(supported) => Ok((supported.config(), supported.sample_format())),
        None => Err(RelayError::Capture(format!(
            "no supported {} Hz input configuration",
            format.sample_rate
        ))),
    }
}

fn build_stream(
    device: &Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    ring: SharedRing,
    error_tx: Sender<RelayError>,
) -> Result<Stream, RelayError> {
    let channels = config.channels;
    let make_err_cb = |tx: Sender<RelayError>| {
        move |err: cpal::StreamError| {
            let _ = tx.try_send(RelayError::Capture(err.to_string()));
        }
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            config,
            {
                let ring = Arc::clone(&ring);
                let mut pcm = Vec::new();
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    pcm.clear();
                    convert::i16_interleaved_to_stereo_le(data, channels, &mut pcm);
                    push_bytes(&ring, &pcm);
                }
            },
            make_err_cb(error_tx),
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            config,
            {
                let ring = Arc::clone(&ring);
                let mut pcm = Vec::new();
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    pcm.clear();
                    convert::f32_interleaved_to_stereo_s16le(data, channels, &mut pcm);
                    push_bytes(&ring, &pcm);
                }
            },
            make_err_cb(error_tx),
            None,
        ),
        other => {
            return Err(RelayError::Capture(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    }
    .map_err(|err| RelayError::Capture(format!("failed to build input stream: {}", err)))?;

    Ok(stream)
}

fn push_bytes(ring: &SharedRing, bytes: &[u8]) {
    let (lock, cvar) = &**ring;
    lock.lock().write(bytes);
    cvar.notify_one();
}
