//! Synchronous software backend
//!
//! Signs inside `sign_hash` on the caller's thread and parks the result in a
//! bounded FIFO until the host polls for it. Useful when signing latency is
//! small compared to the frame interval, and as the baseline for tests.

use crate::buffer::SignatureBuffer;
use crate::config::PluginConfig;
use crate::error::{Result, SignerError};
use crate::request::{RequestId, SignatureRequest};
use crate::traits::{SignatureOutcome, SigningPlugin};
use std::collections::VecDeque;

/// Software signer backed by the `rsa` and `p256` crates
///
/// # Example
///
/// ```rust
/// use signing_plugin::{Digest, PrivateKey, SignAlgo, SignatureRequest, SigningPlugin};
/// use signing_plugin::software::SoftwareSigner;
///
/// let mut signer = SoftwareSigner::new();
/// signer.setup().unwrap();
///
/// let key = PrivateKey::generate(SignAlgo::Ecdsa).unwrap();
/// let request = SignatureRequest::new(Digest::new([0u8; 32]), key);
/// signer.sign_hash(request).unwrap();
///
/// let mut output = signer.allocate(72).unwrap();
/// assert!(signer.get_signature(&mut output));
/// signer.teardown();
/// ```
pub struct SoftwareSigner {
    max_pending: usize,
    max_allocation: usize,
    initialized: bool,
    next_id: u64,
    completed: VecDeque<SignatureOutcome>,
}

impl SoftwareSigner {
    pub fn new() -> Self {
        Self::with_config(&PluginConfig::default())
    }

    pub fn with_config(config: &PluginConfig) -> Self {
        Self {
            max_pending: config.max_pending,
            max_allocation: config.max_allocation,
            initialized: false,
            next_id: 0,
            completed: VecDeque::new(),
        }
    }
}

impl Default for SoftwareSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl SigningPlugin for SoftwareSigner {
    fn name(&self) -> &str {
        "software"
    }

    fn setup(&mut self) -> Result<()> {
        if self.initialized {
            return Err(SignerError::InvalidState(
                "setup called twice without teardown".to_string(),
            ));
        }

        self.completed = VecDeque::with_capacity(self.max_pending);
        self.initialized = true;

        tracing::info!("Software signer set up: max_pending={}", self.max_pending);
        Ok(())
    }

    fn teardown(&mut self) {
        if !self.initialized && self.completed.is_empty() {
            return;
        }

        let dropped = self.completed.len();
        self.completed.clear();
        self.initialized = false;

        tracing::info!("Software signer torn down: dropped {} unretrieved results", dropped);
    }

    fn sign_hash(&mut self, request: SignatureRequest) -> Result<RequestId> {
        if !self.initialized {
            return Err(SignerError::InvalidState(
                "sign_hash called before setup".to_string(),
            ));
        }

        if self.completed.len() >= self.max_pending {
            tracing::warn!("Rejecting sign request: {} results pending", self.completed.len());
            return Err(SignerError::Busy(format!(
                "{} signatures waiting to be retrieved",
                self.completed.len()
            )));
        }

        let signature = request.private_key().sign_digest(request.hash())?;

        let id = RequestId(self.next_id);
        self.next_id += 1;

        tracing::debug!(
            "Signed request {}: algo={}, hash={}, sig_len={} bytes",
            id,
            request.algo(),
            hex::encode(request.hash()),
            signature.len()
        );

        self.completed.push_back(SignatureOutcome {
            id,
            result: Ok(signature),
        });
        Ok(id)
    }

    fn poll_signature(&mut self) -> Option<SignatureOutcome> {
        self.completed.pop_front()
    }

    fn put_back(&mut self, outcome: SignatureOutcome) {
        self.completed.push_front(outcome);
    }

    fn pending(&self) -> usize {
        self.completed.len()
    }

    fn allocate(&self, size: usize) -> Option<SignatureBuffer> {
        SignatureBuffer::allocate_within(size, self.max_allocation)
    }
}
