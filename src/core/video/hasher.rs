use std::fmt;

use sha2::{Digest as _, Sha256};

use super::frame::PixelBuffer;

/// Fixed-length fingerprint of a frame's normalized pixels.
///
/// Equal digests are treated as equal frames; there is no second-stage
/// byte comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

/// Stateless content hasher. Safe to call from any number of workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameHasher;

impl FrameHasher {
    pub fn new() -> Self {
        Self
    }

    /// Assumes `buffer` was already normalized to the configured hash size.
    pub fn digest(&self, buffer: &PixelBuffer) -> Digest {
        self.digest_bytes(&buffer.data)
    }

    pub fn digest_bytes(&self, bytes: &[u8]) -> Digest {
        let out = Sha256::digest(bytes);
        let mut raw = [0u8; Digest::LEN];
        raw.copy_from_slice(&out);
        Digest(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    fn buffer(fill: u8) -> PixelBuffer {
        PixelBuffer::new(64, 64, vec![fill; 64 * 64 * 3])
    }

    #[test]
    fn test_digest_deterministic() {
        let hasher = FrameHasher::new();
        let b = buffer(7);
        assert_eq!(hasher.digest(&b), hasher.digest(&b));
        assert_eq!(hasher.digest(&b), FrameHasher::new().digest(&b.clone()));
    }

    #[test]
    fn test_digest_distinguishes_content() {
        let hasher = FrameHasher::new();
        let a = buffer(0);
        let mut b = buffer(0);
        b.data[100] = 1;
        assert_ne!(hasher.digest(&a), hasher.digest(&b));
    }

    #[test]
    fn test_digest_stable_under_concurrency() {
        let hasher = FrameHasher::new();
        let b = buffer(42);
        let expected = hasher.digest(&b);
        let all: Vec<Digest> = (0..64).into_par_iter().map(|_| hasher.digest(&b)).collect();
        assert!(all.iter().all(|d| *d == expected));
    }

    #[test]
    fn test_display_is_hex() {
        let digest = FrameHasher::new().digest_bytes(b"");
        assert_eq!(
            digest.to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
