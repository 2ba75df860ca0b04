//! Validating signatures produced by a signing backend
use crate::algo::{Digest, SignAlgo};
use crate::error::{Result, SignerError};
use crate::keys::PublicKey;

/// Verify `signature` over `hash`
///
/// # Returns
/// - `Ok(true)`: Signature is valid
/// - `Ok(false)`: Signature is invalid
pub fn verify_hash(public_key: &PublicKey, hash: &Digest, signature: &[u8]) -> Result<bool> {
    if signature.is_empty() {
        return Err(SignerError::InvalidArgument("Empty signature".to_string()));
    }
    public_key.verify_digest(hash, signature)
}

/// Verify from the raw values stored alongside a signed stream
///
/// # Errors
/// - `UnsupportedAlgorithm` for an unknown `algo` value
/// - `InvalidArgument` for a hash of the wrong size or an empty signature
/// - `Key` if the public key cannot be parsed
pub fn verify_raw(hash: &[u8], algo: u32, public_key_pem: &[u8], signature: &[u8]) -> Result<bool> {
    let algo = SignAlgo::try_from(algo)?;
    let hash = Digest::from_slice(hash)?;
    let public_key = PublicKey::from_pem(algo, public_key_pem)?;

    verify_hash(&public_key, &hash, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::hash_data;
    use crate::keys::generate_key_pair;

    #[test]
    fn test_verify_raw_round_trip() {
        let (private_key, public_key) = generate_key_pair(SignAlgo::Ecdsa).unwrap();
        let hash = hash_data(b"SEI payload");
        let signature = private_key.sign_digest(&hash).unwrap();
        let public_pem = public_key.to_pem().unwrap();

        assert!(verify_raw(hash.as_bytes(), 1, public_pem.as_bytes(), &signature).unwrap());

        let mut tampered = signature.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        assert!(!verify_raw(hash.as_bytes(), 1, public_pem.as_bytes(), &tampered).unwrap());
    }

    #[test]
    fn test_verify_raw_rejects_bad_input() {
        let (_, public_key) = generate_key_pair(SignAlgo::Ecdsa).unwrap();
        let public_pem = public_key.to_pem().unwrap();

        assert!(matches!(
            verify_raw(&[0u8; 32], 5, public_pem.as_bytes(), &[1]),
            Err(SignerError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            verify_raw(&[0u8; 16], 1, public_pem.as_bytes(), &[1]),
            Err(SignerError::InvalidArgument(_))
        ));
        assert!(matches!(
            verify_raw(&[0u8; 32], 1, public_pem.as_bytes(), &[]),
            Err(SignerError::InvalidArgument(_))
        ));
        assert!(matches!(
            verify_raw(&[0u8; 32], 0, public_pem.as_bytes(), &[1]),
            Err(SignerError::Key(_))
        ));
    }
}
