//! # audio-relay-cpal
//!
//! cpal capture backend for `audio-relay-core`.
//!
//! Implements the core's `CaptureSource`/`CaptureStream` seam on top of
//! cpal's callback-driven input streams: the audio callback converts
//! samples to the wire format and appends them to a byte ring, and the
//! relay worker pulls whole frames out with blocking reads.

pub mod convert;
pub mod ring;
pub mod source;

pub use ring::ByteRing;
pub use source::{CpalCaptureSource, CpalCaptureStream, CpalSourceOptions};
