/// Circular byte buffer bridging the cpal push callback to the relay's
/// pull-based reads. Wrap in `Mutex` + `Condvar` for cross-thread use.
///
/// Overflow behavior: drops oldest bytes and counts them, so a reader that
/// falls behind loses the stalest audio rather than blocking the callback.
#[derive(Debug)]
pub struct ByteRing {
    buffer: Vec<u8>,
    write_index: usize,
    read_index: usize,
    available: usize,
    capacity: usize,
    dropped: u64,
}

impl ByteRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            write_index: 0,
            read_index: 0,
            available: 0,
            capacity,
            dropped: 0,
        }
    }

    /// Write bytes into the ring, dropping the oldest on overflow.
    ///
    /// If `bytes` is larger than the capacity, only the tail is kept.
    pub fn write(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let bytes = if bytes.len() > self.capacity {
            self.dropped += (bytes.len() - self.capacity) as u64;
            &bytes[bytes.len() - self.capacity..]
        } else {
            bytes
        };

        let overflow = (self.available + bytes.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.read_index = (self.read_index + overflow) % self.capacity;
            self.available -= overflow;
            self.dropped += overflow as u64;
        }

        for &byte in bytes {
            self.buffer[self.write_index] = byte;
            self.write_index = (self.write_index + 1) % self.capacity;
        }
        self.available += bytes.len();
    }

    /// Read and remove up to `out.len()` bytes. Returns the count copied.
    pub fn read_into(&mut self, out: &mut [u8]) -> usize {
        let to_read = out.len().min(self.available);
        for slot in out.iter_mut().take(to_read) {
            *slot = self.buffer[self.read_index];
            self.read_index = (self.read_index + 1) % self.capacity;
        }
        self.available -= to_read;
        to_read
    }

    pub fn count(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total bytes dropped to overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
