//! Keyed per-frame authentication codes.
//!
//! An auth code is `HMAC-SHA256(secret_key, fingerprint_hex)` rendered as
//! lowercase hex and truncated to the configured length. Embedding and
//! verification must agree on the key and on the length.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{FramemarkError, Result};
use crate::fingerprint::{Fingerprint, PerceptualHasher};
use crate::frame::Frame;

type HmacSha256 = Hmac<Sha256>;

/// Default auth code length in hex characters (64 bits).
pub const DEFAULT_AUTH_LEN: usize = 16;

/// Hex length of a full HMAC-SHA256 digest.
pub const MAX_AUTH_LEN: usize = 64;

/// Secret key material for auth codes.
///
/// Wiped from memory on drop and never printed: `Debug` shows `[REDACTED]`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: Vec<u8>,
}

impl SecretKey {
    /// Wrap raw key bytes. Empty keys are rejected.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(FramemarkError::InvalidKey("secret key is empty".into()));
        }
        Ok(Self { bytes })
    }

    /// Read a key file. Trailing line breaks are stripped so keys written with
    /// `echo` behave like keys written with `printf`.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let mut bytes = std::fs::read(path)?;
        while matches!(bytes.last(), Some(b'\n' | b'\r')) {
            bytes.pop();
        }
        Self::new(bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn expose(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A truncated lowercase-hex HMAC of a frame fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthCode(String);

impl AuthCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for AuthCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for AuthCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AuthCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Derives auth codes from frames under one secret key.
///
/// Cheap to clone; the key is shared read-only between clones, so one
/// generator can be handed to several worker threads.
#[derive(Debug, Clone)]
pub struct AuthCodeGenerator {
    key: Arc<SecretKey>,
    hasher: PerceptualHasher,
}

impl AuthCodeGenerator {
    pub fn new(key: SecretKey) -> Self {
        Self::with_hasher(key, PerceptualHasher::default())
    }

    pub fn with_hasher(key: SecretKey, hasher: PerceptualHasher) -> Self {
        Self {
            key: Arc::new(key),
            hasher,
        }
    }

    pub fn hasher(&self) -> &PerceptualHasher {
        &self.hasher
    }

    /// Fingerprint `frame` and derive its auth code of `len` hex characters.
    pub fn generate(&self, frame: &Frame, len: usize) -> Result<AuthCode> {
        validate_len(len)?;
        let fingerprint = self.hasher.fingerprint(frame)?;
        self.code_for_fingerprint(&fingerprint, len)
    }

    /// Derive the auth code for a fingerprint that is already computed.
    pub fn code_for_fingerprint(&self, fingerprint: &Fingerprint, len: usize) -> Result<AuthCode> {
        validate_len(len)?;

        // HMAC accepts keys of any length, so this cannot fail for a non-empty key.
        let mut mac = HmacSha256::new_from_slice(self.key.expose())
            .map_err(|e| FramemarkError::InvalidKey(e.to_string()))?;
        mac.update(fingerprint.to_hex().as_bytes());
        let digest = hex::encode(mac.finalize().into_bytes());

        Ok(AuthCode(digest[..len].to_string()))
    }
}

fn validate_len(len: usize) -> Result<()> {
    if len == 0 || len > MAX_AUTH_LEN {
        return Err(FramemarkError::InvalidLength {
            requested: len,
            max: MAX_AUTH_LEN,
        });
    }
    Ok(())
}
