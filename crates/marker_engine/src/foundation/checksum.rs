//! Geometry checksum used as a cheap change signal
//!
//! A streaming BLAKE3 hash truncated to 32 bits. The value only has to change
//! when the fed bytes change; it is never persisted or compared across
//! processes.

use blake3::Hasher;

/// Streaming geometry checksum
#[derive(Debug, Clone, Default)]
pub struct GeometryChecksum {
    hasher: Hasher,
}

impl GeometryChecksum {
    /// Create an empty checksum
    pub fn new() -> Self {
        Self { hasher: Hasher::new() }
    }

    /// Feed raw bytes
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Feed an unsigned integer in little-endian byte order
    pub fn put_u32(&mut self, value: u32) {
        self.put_bytes(&value.to_le_bytes());
    }

    /// Feed a float by its exact bit pattern
    pub fn put_f64(&mut self, value: f64) {
        self.put_bytes(&value.to_le_bytes());
    }

    /// Current checksum value, the first four digest bytes
    pub fn finish(&self) -> u32 {
        let digest = self.hasher.finalize();
        let bytes = digest.as_bytes();
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}
