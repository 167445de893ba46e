//! Encoded audio chunks as they arrive from a streaming session.

/// Opaque run of raw PCM bytes, immutable once received.
///
/// Chunks carry the arrival sequence assigned by the session so that
/// reassembly can be checked against delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    data: Vec<u8>,
    sequence: u64,
}

impl AudioChunk {
    /// Create a new audio chunk with the given data and arrival index.
    pub fn new(data: Vec<u8>, sequence: u64) -> Self {
        Self { data, sequence }
    }

    /// Get the audio data as bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Arrival index within its session, starting at zero.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Convert this audio chunk into raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for AudioChunk {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
