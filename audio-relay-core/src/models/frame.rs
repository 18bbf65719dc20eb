/// Fixed-capacity byte region holding one relay cycle's worth of PCM.
///
/// Allocated once per session and reused across every read/send cycle;
/// contents are undefined before the first successful read and overwritten
/// on each cycle. No history is retained.
#[derive(Debug)]
pub struct FrameBuffer {
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The full writable region, handed to the capture read.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The first `len` bytes, as filled by the most recent read.
    pub fn filled(&self, len: usize) -> &[u8] {
        &self.data[..len]
    }
}
