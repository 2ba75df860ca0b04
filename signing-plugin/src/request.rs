//! The record handed from host to backend for one signing operation

use crate::algo::{Digest, SignAlgo};
use crate::error::{Result, SignerError};
use crate::keys::{PrivateKey, PublicKey};
use std::fmt;

/// Identifier of an accepted signing request, unique per backend instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything a backend needs to sign one hash
///
/// One request is built per hash and moved into the backend, which drops it
/// (and the key material it carries) once the signature is produced.
#[derive(Clone, Debug)]
pub struct SignatureRequest {
    hash: Digest,
    private_key: PrivateKey,
    public_key: Option<PublicKey>,
}

impl SignatureRequest {
    /// Build a request; the algorithm follows from the key variant
    pub fn new(hash: Digest, private_key: PrivateKey) -> Self {
        Self {
            hash,
            private_key,
            public_key: None,
        }
    }

    /// Attach the public key used for validating the signature
    ///
    /// # Errors
    /// - Returns `Key` if the public key does not belong to the private key
    pub fn with_public_key(mut self, public_key: PublicKey) -> Result<Self> {
        if public_key != self.private_key.public_key() {
            return Err(SignerError::Key(format!(
                "{} public key does not match the {} private key",
                public_key.algo(),
                self.private_key.algo()
            )));
        }
        self.public_key = Some(public_key);
        Ok(self)
    }

    /// Build a request from the raw values a C style host passes
    ///
    /// # Parameters
    /// - `hash`: Digest bytes, must be 32 bytes
    /// - `algo`: `0` for RSA, `1` for ECDSA
    /// - `private_key_pem`: PEM encoded private key
    /// - `public_key_pem`: Optional PEM encoded public key
    ///
    /// # Errors
    /// - `UnsupportedAlgorithm` for any other `algo` value
    /// - `InvalidArgument` for a hash of the wrong size
    /// - `Key` for unparsable or mismatching key material
    pub fn from_raw(
        hash: &[u8],
        algo: u32,
        private_key_pem: &[u8],
        public_key_pem: Option<&[u8]>,
    ) -> Result<Self> {
        let algo = SignAlgo::try_from(algo)?;
        let hash = Digest::from_slice(hash)?;
        let private_key = PrivateKey::from_pem(algo, private_key_pem)?;

        let request = Self::new(hash, private_key);
        match public_key_pem {
            Some(pem) => request.with_public_key(PublicKey::from_pem(algo, pem)?),
            None => Ok(request),
        }
    }

    pub fn hash(&self) -> &Digest {
        &self.hash
    }

    pub fn algo(&self) -> SignAlgo {
        self.private_key.algo()
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.public_key.as_ref()
    }

    /// Largest signature the request can produce
    pub fn max_signature_size(&self) -> usize {
        self.private_key.max_signature_size()
    }
}
