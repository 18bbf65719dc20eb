//! Sample conversion from cpal's delivery formats to the wire format
//! (stereo interleaved s16le).
//!
//! Channel adaptation: mono is duplicated to both channels, layouts wider
//! than stereo are reduced to the first two channels.

/// Clamp and scale one f32 sample to i16.
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Convert interleaved f32 frames with `channels` channels to stereo
/// s16le bytes, appending to `out`.
pub fn f32_interleaved_to_stereo_s16le(samples: &[f32], channels: u16, out: &mut Vec<u8>) {
    let stride = channels.max(1) as usize;
    out.reserve(samples.len() / stride * 4);
    for frame in samples.chunks(stride) {
        let left = f32_to_i16(frame[0]);
        let right = frame.get(1).map(|&s| f32_to_i16(s)).unwrap_or(left);
        out.extend_from_slice(&left.to_le_bytes());
        out.extend_from_slice(&right.to_le_bytes());
    }
}

/// Convert interleaved i16 frames with `channels` channels to stereo
/// little-endian bytes, appending to `out`.
pub fn i16_interleaved_to_stereo_le(samples: &[i16], channels: u16, out: &mut Vec<u8>) {
    let stride = channels.max(1) as usize;
    out.reserve(samples.len() / stride * 4);
    for frame in samples.chunks(stride) {
        let left = frame[0];
        let right = frame.get(1).copied().unwrap_or(left);
        out.extend_from_slice(&left.to_le_bytes());
        out.extend_from_slice(&right.to_le_bytes());
    }
}
