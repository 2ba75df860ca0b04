//! The contract every signing backend implements
use crate::buffer::SignatureBuffer;
use crate::error::Result;
use crate::request::{RequestId, SignatureRequest};

/// A finished signing operation
#[derive(Debug)]
pub struct SignatureOutcome {
    pub id: RequestId,
    pub result: Result<Vec<u8>>,
}

/// Signing backend plugged into a signed video session
///
/// Calls on one instance are serialized by the caller (`&mut self`); the
/// backend may still do its work on other threads.
///
/// Lifecycle: `setup` once, any number of `sign_hash` / `get_signature`
/// rounds, then `teardown`. `teardown` is always safe to call and leaves the
/// backend ready for another `setup`.
pub trait SigningPlugin: Send {
    /// Backend name, for logs
    fn name(&self) -> &str;

    /// Initialize backend resources
    ///
    /// # Errors
    /// - Returns `InvalidState` if already set up
    /// - Returns `Backend` if resources cannot be acquired
    fn setup(&mut self) -> Result<()>;

    /// Release every backend resource, dropping unretrieved results
    fn teardown(&mut self);

    /// Sign the request's hash, now or in the background
    ///
    /// On success the signature is retrieved later through
    /// [`SigningPlugin::poll_signature`] or [`SigningPlugin::get_signature`],
    /// in the order requests were accepted.
    ///
    /// # Errors
    /// - `InvalidState` before `setup` or after `teardown`
    /// - `Busy` when `max_pending` results are outstanding
    /// - `Backend` when signing fails synchronously
    fn sign_hash(&mut self, request: SignatureRequest) -> Result<RequestId>;

    /// Next finished request, if any. Never blocks.
    fn poll_signature(&mut self) -> Option<SignatureOutcome>;

    /// Return an outcome taken by `poll_signature` to the front of the queue
    ///
    /// Used when the caller could not accept it, so the next poll yields it
    /// again.
    fn put_back(&mut self, outcome: SignatureOutcome);

    /// Accepted requests not yet returned by `poll_signature`
    fn pending(&self) -> usize;

    /// Buffer able to hold `size` bytes, or `None` when it cannot be provided
    fn allocate(&self, size: usize) -> Option<SignatureBuffer>;

    /// Return a buffer obtained from `allocate`; `None` is a no-op
    fn release(&self, buffer: Option<SignatureBuffer>) {
        drop(buffer);
    }

    /// Copy the next finished signature into `output`
    ///
    /// Returns `true` if `output` was updated. A request that failed in the
    /// background is consumed and reported as `false`; use
    /// [`SigningPlugin::poll_signature`] to observe the error itself. A
    /// signature that does not fit `output` stays queued.
    fn get_signature(&mut self, output: &mut SignatureBuffer) -> bool {
        let Some(outcome) = self.poll_signature() else {
            return false;
        };

        match &outcome.result {
            Ok(signature) if signature.len() > output.capacity() => {
                tracing::warn!(
                    "{}: signature of request {} needs {} bytes, buffer holds {}",
                    self.name(),
                    outcome.id,
                    signature.len(),
                    output.capacity()
                );
                self.put_back(outcome);
                false
            }
            Ok(signature) => output.write(signature).is_ok(),
            Err(e) => {
                tracing::warn!("{}: request {} produced no signature: {}", self.name(), outcome.id, e);
                false
            }
        }
    }
}

impl<P: SigningPlugin + ?Sized> SigningPlugin for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn setup(&mut self) -> Result<()> {
        (**self).setup()
    }

    fn teardown(&mut self) {
        (**self).teardown()
    }

    fn sign_hash(&mut self, request: SignatureRequest) -> Result<RequestId> {
        (**self).sign_hash(request)
    }

    fn poll_signature(&mut self) -> Option<SignatureOutcome> {
        (**self).poll_signature()
    }

    fn put_back(&mut self, outcome: SignatureOutcome) {
        (**self).put_back(outcome)
    }

    fn pending(&self) -> usize {
        (**self).pending()
    }

    fn allocate(&self, size: usize) -> Option<SignatureBuffer> {
        (**self).allocate(size)
    }

    fn release(&self, buffer: Option<SignatureBuffer>) {
        (**self).release(buffer)
    }

    fn get_signature(&mut self, output: &mut SignatureBuffer) -> bool {
        (**self).get_signature(output)
    }
}
