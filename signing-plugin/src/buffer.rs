//! Owned signature buffers
//!
//! A [`SignatureBuffer`] has a fixed capacity (`max_signature_size`) chosen at
//! allocation time and a used length (`signature_size`) that never exceeds it.
//! Memory is returned when the buffer is dropped.

use crate::error::{Result, SignerError};
use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct SignatureBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl SignatureBuffer {
    /// Allocate a zeroed buffer of exactly `capacity` bytes
    ///
    /// Returns `None` instead of aborting when the allocator cannot satisfy
    /// the request.
    pub fn try_with_capacity(capacity: usize) -> Option<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity).ok()?;
        data.resize(capacity, 0u8);

        Some(Self {
            data: data.into_boxed_slice(),
            len: 0,
        })
    }

    /// Allocation as done by the reference backends: sizes above `limit`
    /// are refused rather than attempted
    pub fn allocate_within(size: usize, limit: usize) -> Option<Self> {
        if size > limit {
            tracing::warn!(
                "Refusing signature buffer of {} bytes (limit {} bytes)",
                size,
                limit
            );
            return None;
        }
        Self::try_with_capacity(size)
    }

    /// `max_signature_size`
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// `signature_size`
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Replace the content with `signature`
    ///
    /// # Errors
    /// - Returns `InvalidArgument` if `signature` does not fit; the buffer is
    ///   left unchanged in that case
    pub fn write(&mut self, signature: &[u8]) -> Result<()> {
        if signature.len() > self.capacity() {
            return Err(SignerError::InvalidArgument(format!(
                "Signature of {} bytes exceeds buffer capacity of {} bytes",
                signature.len(),
                self.capacity()
            )));
        }

        self.data[..signature.len()].copy_from_slice(signature);
        self.data[signature.len()..].fill(0);
        self.len = signature.len();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
        self.len = 0;
    }
}

impl AsRef<[u8]> for SignatureBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for SignatureBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureBuffer")
            .field("signature_size", &self.len)
            .field("max_signature_size", &self.capacity())
            .finish()
    }
}
