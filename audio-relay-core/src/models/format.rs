use std::time::Duration;

/// The fixed PCM configuration carried on the wire.
///
/// The relay does not negotiate formats: the receiver knows the layout
/// out of band. Defaults to 48 kHz, stereo, signed 16-bit little-endian
/// interleaved, which makes the default 1920-byte frame exactly 10 ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

impl StreamFormat {
    /// Bytes per sample per channel (s16le).
    pub const BYTES_PER_SAMPLE: usize = 2;

    pub fn bytes_per_second(&self) -> usize {
        self.sample_rate as usize * self.channels as usize * Self::BYTES_PER_SAMPLE
    }

    /// Number of bytes covering `window` of audio, rounded down to a
    /// whole interleaved sample frame.
    pub fn frame_bytes(&self, window: Duration) -> usize {
        let raw = (self.bytes_per_second() as f64 * window.as_secs_f64()) as usize;
        let frame = self.channels as usize * Self::BYTES_PER_SAMPLE;
        raw - raw % frame
    }

    /// Duration of audio represented by `bytes` at this format.
    pub fn frame_duration(&self, bytes: usize) -> Duration {
        Duration::from_secs_f64(bytes as f64 / self.bytes_per_second() as f64)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.channels == 0 {
            return Err("channel count must be positive".into());
        }
        Ok(())
    }
}

impl Default for StreamFormat {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
        }
    }
}
