//! Host side of the signing boundary
//!
//! [`SigningSession`] drives a [`SigningPlugin`] through its lifecycle the way
//! a signed video session does: the algorithm and keys are fixed when the
//! session is created, hashes are handed over one at a time, and signatures
//! are collected by polling so the media pipeline never blocks on the signer.
//!
//! ```text
//! Uninitialized --setup--> Ready --sign_hash--> Signing
//!       ^                    ^                     |
//!       |                    +--- last result -----+
//!       |                         retrieved
//!       +--setup-- Terminated <--teardown-- (any state)
//! ```

use crate::algo::{hash_data, Digest, SignAlgo};
use crate::buffer::SignatureBuffer;
use crate::error::{Result, SignerError};
use crate::keys::{PrivateKey, PublicKey};
use crate::request::{RequestId, SignatureRequest};
use crate::traits::SigningPlugin;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    /// At least one accepted request has not been retrieved
    Signing,
    Terminated,
}

pub struct SigningSession<P: SigningPlugin> {
    plugin: P,
    state: SessionState,
    private_key: PrivateKey,
    public_key: PublicKey,
    outstanding: usize,
}

impl<P: SigningPlugin> SigningSession<P> {
    /// Session signing with `private_key`; the algorithm is the key's
    pub fn new(plugin: P, private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self {
            plugin,
            state: SessionState::Uninitialized,
            private_key,
            public_key,
            outstanding: 0,
        }
    }

    /// Session from PEM key material as provisioned by the host
    pub fn from_pem(plugin: P, algo: SignAlgo, private_key_pem: &[u8]) -> Result<Self> {
        let private_key = PrivateKey::from_pem(algo, private_key_pem)?;
        Ok(Self::new(plugin, private_key))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn algo(&self) -> SignAlgo {
        self.private_key.algo()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Capacity every signature buffer of this session needs
    pub fn max_signature_size(&self) -> usize {
        self.private_key.max_signature_size()
    }

    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    /// Set up the backend
    ///
    /// Allowed on a new session and after `teardown`. A failed backend setup
    /// is cleaned up with `teardown` and leaves the session `Uninitialized`.
    pub fn setup(&mut self) -> Result<()> {
        match self.state {
            SessionState::Uninitialized | SessionState::Terminated => {}
            state => {
                return Err(SignerError::InvalidState(format!(
                    "setup called in state {:?}",
                    state
                )))
            }
        }

        if let Err(e) = self.plugin.setup() {
            tracing::error!("{} backend setup failed: {}", self.plugin.name(), e);
            self.plugin.teardown();
            self.state = SessionState::Uninitialized;
            return Err(e);
        }

        self.outstanding = 0;
        self.state = SessionState::Ready;
        tracing::info!(
            "Signing session ready: backend={}, algo={}, max_signature_size={}",
            self.plugin.name(),
            self.algo(),
            self.max_signature_size()
        );
        Ok(())
    }

    /// Buffer large enough for any signature of this session
    ///
    /// # Errors
    /// - Returns `Memory` if the backend cannot provide it
    pub fn allocate_signature_buffer(&self) -> Result<SignatureBuffer> {
        let size = self.max_signature_size();
        self.plugin.allocate(size).ok_or_else(|| {
            SignerError::Memory(format!("backend could not allocate {} bytes", size))
        })
    }

    pub fn release_signature_buffer(&self, buffer: SignatureBuffer) {
        self.plugin.release(Some(buffer));
    }

    /// Hand `hash` to the backend for signing
    pub fn sign_hash(&mut self, hash: Digest) -> Result<RequestId> {
        self.ensure_active("sign_hash")?;

        let request =
            SignatureRequest::new(hash, self.private_key.clone()).with_public_key(self.public_key.clone())?;
        let id = self.plugin.sign_hash(request)?;

        self.outstanding += 1;
        self.state = SessionState::Signing;
        Ok(id)
    }

    /// Hash `data` with SHA-256 and sign the digest
    pub fn sign_data(&mut self, data: &[u8]) -> Result<RequestId> {
        self.sign_hash(hash_data(data))
    }

    /// Retrieve the next finished signature into `output`
    ///
    /// # Returns
    /// - `Ok(Some(id))`: `output` holds the signature of request `id`
    /// - `Ok(None)`: nothing finished yet, `output` is untouched
    /// - `Err(_)`: the backend failed the oldest outstanding request, or the
    ///   session is not set up
    ///
    /// A signature larger than `output` is left with the backend and reported
    /// as `InvalidArgument`; retry with a larger buffer.
    pub fn get_signature(&mut self, output: &mut SignatureBuffer) -> Result<Option<RequestId>> {
        self.ensure_active("get_signature")?;

        let Some(outcome) = self.plugin.poll_signature() else {
            return Ok(None);
        };

        if let Ok(signature) = &outcome.result {
            if signature.len() > output.capacity() {
                let err = SignerError::InvalidArgument(format!(
                    "signature of request {} is {} bytes, buffer holds {}",
                    outcome.id,
                    signature.len(),
                    output.capacity()
                ));
                self.plugin.put_back(outcome);
                return Err(err);
            }
        }

        self.outstanding = self.outstanding.saturating_sub(1);
        if self.outstanding == 0 {
            self.state = SessionState::Ready;
        }

        let signature = outcome.result?;
        output.write(&signature)?;

        tracing::debug!("Retrieved signature of request {}: {} bytes", outcome.id, output.len());
        Ok(Some(outcome.id))
    }

    /// Poll [`get_signature`](Self::get_signature) until a signature arrives
    /// or `timeout` passes
    ///
    /// A timeout too large to represent as a deadline (e.g. `Duration::MAX`)
    /// waits without limit.
    pub fn wait_for_signature(
        &mut self,
        output: &mut SignatureBuffer,
        timeout: Duration,
    ) -> Result<Option<RequestId>> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if let Some(id) = self.get_signature(output)? {
                return Ok(Some(id));
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                tracing::warn!("No signature within {:?}", timeout);
                return Ok(None);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Check a signature against this session's public key
    pub fn verify(&self, hash: &Digest, signature: &[u8]) -> Result<bool> {
        self.public_key.verify_digest(hash, signature)
    }

    /// Terminate the session; safe in every state
    pub fn teardown(&mut self) {
        self.plugin.teardown();
        if self.outstanding > 0 {
            tracing::warn!("Session torn down with {} signatures outstanding", self.outstanding);
        }
        self.outstanding = 0;
        self.state = SessionState::Terminated;
    }

    fn ensure_active(&self, operation: &str) -> Result<()> {
        match self.state {
            SessionState::Ready | SessionState::Signing => Ok(()),
            state => Err(SignerError::InvalidState(format!(
                "{} called in state {:?}",
                operation, state
            ))),
        }
    }
}

impl<P: SigningPlugin> Drop for SigningSession<P> {
    fn drop(&mut self) {
        if matches!(self.state, SessionState::Ready | SessionState::Signing) {
            self.teardown();
        }
    }
}
