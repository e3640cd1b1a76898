//! Hashing backend abstraction. The default backend is a plain software
//! SHA-1; the `hw-sha1` feature swaps in the `sha1` crate's `asm`
//! implementation without changing any call site in `hasher`.

use sha1::{Digest, Sha1};

pub trait PieceHasher: Default {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> [u8; 20];
}

#[derive(Default)]
pub struct GenericSha1(Sha1);

impl PieceHasher for GenericSha1 {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self) -> [u8; 20] {
        let digest = Digest::finalize(self.0);
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest);
        out
    }
}

/// The backend used throughout `hasher`. Enabling the `hw-sha1` feature
/// changes the compression function `sha1::Sha1` runs under the hood; this
/// type alias does not need to change.
pub type DefaultHasher = GenericSha1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_sha1_of_the_empty_string() {
        let hasher = DefaultHasher::default();
        let digest = hasher.finalize();
        assert_eq!(digest, [
            0xda, 0x39, 0xa3, 0xee, 0x5e, 0x6b, 0x4b, 0x0d, 0x32, 0x55, 0xbf, 0xef, 0x95, 0x60, 0x18, 0x90, 0xaf,
            0xd8, 0x07, 0x09,
        ]);
    }

    #[test]
    fn update_then_finalize_matches_one_shot() {
        let mut hasher = DefaultHasher::default();
        hasher.update(b"hello ");
        hasher.update(b"world");
        let streamed = hasher.finalize();

        let mut one_shot = DefaultHasher::default();
        one_shot.update(b"hello world");
        assert_eq!(streamed, one_shot.finalize());
    }
}
