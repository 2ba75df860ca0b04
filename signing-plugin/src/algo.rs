//! Signing algorithms and the digest they operate on
//!
//! Both algorithms sign a SHA-256 digest. The digest is computed by the host
//! (typically over a group of frame hashes) and only the 32-byte result crosses
//! the plugin boundary.

use crate::error::{Result, SignerError};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// Size of the digest that gets signed
pub const HASH_DIGEST_SIZE: usize = 32;

/// Upper bound of a DER encoded ECDSA P-256 signature
pub const ECDSA_P256_MAX_SIGNATURE_SIZE: usize = 72;

/// Signing algorithm, fixed when the signing session is created
///
/// The discriminants match the values hosts pass over a raw interface:
/// `0` for RSA and `1` for ECDSA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum SignAlgo {
    /// RSA PKCS#1 v1.5 with SHA-256
    Rsa = 0,
    /// ECDSA over NIST P-256 with SHA-256, DER encoded
    Ecdsa = 1,
}

impl SignAlgo {
    pub const ALL: [SignAlgo; 2] = [SignAlgo::Rsa, SignAlgo::Ecdsa];

    pub fn name(self) -> &'static str {
        match self {
            SignAlgo::Rsa => "RSA",
            SignAlgo::Ecdsa => "ECDSA",
        }
    }
}

impl fmt::Display for SignAlgo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for SignAlgo {
    type Error = SignerError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(SignAlgo::Rsa),
            1 => Ok(SignAlgo::Ecdsa),
            other => Err(SignerError::UnsupportedAlgorithm(format!(
                "unknown algorithm value {}",
                other
            ))),
        }
    }
}

/// A SHA-256 digest, the object actually signed
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; HASH_DIGEST_SIZE]);

impl Digest {
    pub const fn new(bytes: [u8; HASH_DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Digest from a slice received from the host
    ///
    /// # Errors
    /// - Returns `InvalidArgument` if the slice is not exactly
    ///   [`HASH_DIGEST_SIZE`] bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; HASH_DIGEST_SIZE] = bytes.try_into().map_err(|_| {
            SignerError::InvalidArgument(format!(
                "Invalid hash size: expected {} bytes, got {}",
                HASH_DIGEST_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(self.0))
    }
}

/// SHA-256 of `data`
pub fn hash_data(data: &[u8]) -> Digest {
    Digest(Sha256::digest(data).into())
}
