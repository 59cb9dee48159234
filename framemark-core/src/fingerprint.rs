//! Perceptual fingerprints of decoded frames.
//!
//! A fingerprint is a 64-bit perceptual hash rendered as 16 lowercase hex
//! characters. It stays stable across light re-encoding and small resizes but
//! changes when a region of the frame is replaced.
//!
//! # Algorithm
//!
//! The default is a DCT-based pHash: the frame is reduced to grayscale,
//! downscaled, transformed with a 2D DCT and the 8x8 low-frequency block is
//! thresholded against its mean. Hashing itself is delegated to
//! `image_hasher`.
//!
//! Before hashing, the least significant bit of every channel is cleared.
//! Watermark codecs that write into that bit plane therefore never move the
//! fingerprint of the frame they mark.
//!
//! # Usage
//!
//! ```
//! use framemark_core::frame::Frame;
//! use framemark_core::fingerprint::{HashAlgorithm, PerceptualHasher};
//!
//! let frame = Frame::new(0, 2, 2, vec![0, 64, 128, 255, 32, 16, 8, 4, 2, 1, 0, 200]).unwrap();
//! let hasher = PerceptualHasher::new(HashAlgorithm::PHash);
//! let fp = hasher.fingerprint(&frame).unwrap();
//! assert_eq!(fp.to_hex().len(), 16);
//! ```

use image::{DynamicImage, RgbImage};
use image_hasher::{HashAlg, HasherConfig};
use serde::{Deserialize, Serialize};

use crate::error::{FramemarkError, Result};
use crate::frame::Frame;

/// Fixed fingerprint size in bytes (64 bits).
pub const FINGERPRINT_SIZE: usize = 8;

/// Hash grid edge; `HASH_GRID * HASH_GRID` bits per fingerprint.
const HASH_GRID: u32 = 8;

/// Bit plane cleared before hashing.
const LSB_MASK: u8 = 0xFE;

/// Perceptual hash algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// DCT mean hash. Most tolerant of compression; recommended.
    #[default]
    PHash,
    /// Average hash over the downscaled grayscale frame.
    Mean,
    /// Horizontal gradient (dHash).
    Gradient,
    /// Grid-based Blockhash.
    Blockhash,
}

impl HashAlgorithm {
    fn hasher_config(self) -> HasherConfig {
        let config = HasherConfig::new().hash_size(HASH_GRID, HASH_GRID);
        match self {
            Self::PHash => config.hash_alg(HashAlg::Mean).preproc_dct(),
            Self::Mean => config.hash_alg(HashAlg::Mean),
            Self::Gradient => config.hash_alg(HashAlg::Gradient),
            Self::Blockhash => config.hash_alg(HashAlg::Blockhash),
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = FramemarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "phash" => Ok(Self::PHash),
            "mean" | "ahash" => Ok(Self::Mean),
            "gradient" | "dhash" => Ok(Self::Gradient),
            "blockhash" => Ok(Self::Blockhash),
            other => Err(FramemarkError::InvalidConfig(format!(
                "unknown hash algorithm: {other}"
            ))),
        }
    }
}

/// A frame's perceptual fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    bytes: Vec<u8>,
    algorithm: HashAlgorithm,
}

impl Fingerprint {
    pub fn from_bytes(bytes: Vec<u8>, algorithm: HashAlgorithm) -> Self {
        Self { bytes, algorithm }
    }

    /// Parse a fingerprint previously rendered with [`Fingerprint::to_hex`].
    pub fn from_hex(hex_str: &str, algorithm: HashAlgorithm) -> Result<Self> {
        let bytes = hex::decode(hex_str).map_err(|e| {
            FramemarkError::InvalidConfig(format!("invalid fingerprint hex: {e}"))
        })?;
        Ok(Self::from_bytes(bytes, algorithm))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Lowercase hex rendering. This string is what auth codes are keyed over.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Number of differing bits, or `None` when the fingerprints are not comparable.
    pub fn hamming_distance(&self, other: &Self) -> Option<u32> {
        if self.algorithm != other.algorithm {
            return None;
        }
        hamming_distance(&self.bytes, &other.bytes)
    }

    /// Whether two fingerprints are within `threshold` bits of each other.
    pub fn is_similar(&self, other: &Self, threshold: u32) -> bool {
        self.hamming_distance(other)
            .map(|distance| distance <= threshold)
            .unwrap_or(false)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Perceptual hasher configuration and computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerceptualHasher {
    algorithm: HashAlgorithm,
}

impl PerceptualHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Compute the fingerprint of a frame.
    ///
    /// Fails with [`FramemarkError::InvalidFrame`] for zero-sized frames.
    pub fn fingerprint(&self, frame: &Frame) -> Result<Fingerprint> {
        if frame.is_empty() || frame.width() == 0 || frame.height() == 0 {
            return Err(FramemarkError::InvalidFrame(format!(
                "frame {} has no pixels ({}x{})",
                frame.index(),
                frame.width(),
                frame.height()
            )));
        }

        let masked: Vec<u8> = frame.pixels().iter().map(|p| p & LSB_MASK).collect();
        let image = RgbImage::from_raw(frame.width(), frame.height(), masked).ok_or_else(|| {
            FramemarkError::InvalidFrame(format!(
                "frame {} pixel buffer does not match its dimensions",
                frame.index()
            ))
        })?;

        Ok(self.fingerprint_image(&DynamicImage::ImageRgb8(image)))
    }

    /// Fingerprint an already-decoded image as-is (no bit-plane masking).
    pub fn fingerprint_image(&self, image: &DynamicImage) -> Fingerprint {
        let hasher = self.algorithm.hasher_config().to_hasher();
        let hash = hasher.hash_image(image);
        Fingerprint::from_bytes(hash.as_bytes().to_vec(), self.algorithm)
    }

    /// Decode image bytes (PNG or JPEG) and fingerprint them as frame 0.
    pub fn fingerprint_bytes(&self, image_data: &[u8]) -> Result<Fingerprint> {
        let image = image::load_from_memory(image_data)?;
        self.fingerprint(&Frame::from_dynamic_image(0, &image))
    }
}

/// Fingerprint a frame with the default algorithm.
pub fn fingerprint(frame: &Frame) -> Result<Fingerprint> {
    PerceptualHasher::default().fingerprint(frame)
}

/// Count differing bits between two equally sized hashes.
///
/// Returns `None` if either side is empty or the sizes differ.
pub fn hamming_distance(hash1: &[u8], hash2: &[u8]) -> Option<u32> {
    if hash1.is_empty() || hash1.len() != hash2.len() {
        return None;
    }

    Some(
        hash1
            .iter()
            .zip(hash2.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(index: u64, width: u32, height: u32) -> Frame {
        let image = RgbImage::from_fn(width, height, |x, y| {
            let r = (x * 255 / width) as u8;
            let g = (y * 255 / height) as u8;
            let b = if (x / 8 + y / 8) % 2 == 0 { 200 } else { 40 };
            image::Rgb([r, g, b])
        });
        Frame::from_rgb_image(index, image)
    }

    fn inverted(frame: &Frame) -> Frame {
        let pixels = frame.pixels().iter().map(|p| 255 - p).collect();
        frame.with_pixels(pixels).unwrap()
    }

    #[test]
    fn test_hash_algorithm_default() {
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::PHash);
        assert_eq!(PerceptualHasher::default().algorithm(), HashAlgorithm::PHash);
    }

    #[test]
    fn test_hash_algorithm_from_str() {
        assert_eq!("pHash".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::PHash);
        assert_eq!("dhash".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Gradient);
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_fingerprint_is_16_lowercase_hex_chars() {
        let fp = fingerprint(&gradient_frame(0, 64, 48)).unwrap();
        let hex = fp.to_hex();
        assert_eq!(fp.as_bytes().len(), FINGERPRINT_SIZE);
        assert_eq!(hex.len(), 16);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_identical_content_identical_fingerprint() {
        let a = gradient_frame(0, 64, 48);
        let b = gradient_frame(9, 64, 48);
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_lsb_plane_is_ignored() {
        let frame = gradient_frame(0, 64, 48);
        let flipped = frame.with_pixels(frame.pixels().iter().map(|p| p ^ 1).collect()).unwrap();
        assert_eq!(fingerprint(&frame).unwrap(), fingerprint(&flipped).unwrap());
    }

    #[test]
    fn test_inverted_content_changes_fingerprint() {
        let frame = gradient_frame(0, 64, 48);
        let fp1 = fingerprint(&frame).unwrap();
        let fp2 = fingerprint(&inverted(&frame)).unwrap();
        assert_ne!(fp1, fp2);
        assert!(fp1.hamming_distance(&fp2).unwrap() > 0);
    }

    #[test]
    fn test_empty_frame_is_invalid() {
        let frame = Frame::new(3, 0, 0, Vec::new()).unwrap();
        assert!(matches!(
            fingerprint(&frame),
            Err(FramemarkError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_hamming_distance_identical() {
        let hash = [0x00, 0xFF, 0xAA, 0x55, 0x00, 0xFF, 0xAA, 0x55];
        assert_eq!(hamming_distance(&hash, &hash), Some(0));
    }

    #[test]
    fn test_hamming_distance_all_bits() {
        assert_eq!(hamming_distance(&[0x00; 8], &[0xFF; 8]), Some(64));
    }

    #[test]
    fn test_hamming_distance_rejects_size_mismatch_and_empty() {
        assert_eq!(hamming_distance(&[0x00; 5], &[0x00; 8]), None);
        assert_eq!(hamming_distance(&[], &[]), None);
    }

    #[test]
    fn test_fingerprint_hex_roundtrip() {
        let original = Fingerprint::from_bytes(
            vec![0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE, 0xBA, 0xBE],
            HashAlgorithm::PHash,
        );
        assert_eq!(original.to_string(), "deadbeefcafebabe");
        let restored = Fingerprint::from_hex("deadbeefcafebabe", HashAlgorithm::PHash).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_similarity_threshold() {
        let a = Fingerprint::from_bytes(vec![0x00; 8], HashAlgorithm::PHash);
        let b = Fingerprint::from_bytes(vec![0x01, 0, 0, 0, 0, 0, 0, 0], HashAlgorithm::PHash);
        assert!(a.is_similar(&b, 1));
        assert!(!a.is_similar(&b, 0));

        let other_alg = Fingerprint::from_bytes(vec![0x00; 8], HashAlgorithm::Mean);
        assert!(!a.is_similar(&other_alg, 64));
    }
}
