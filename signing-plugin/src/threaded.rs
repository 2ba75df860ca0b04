//! Threaded backend
//!
//! `sign_hash` only enqueues the request; a dedicated worker thread signs it
//! and posts the outcome on a channel that `poll_signature` drains without
//! blocking. This keeps RSA signing (milliseconds per hash) off the media
//! pipeline thread.

use crate::buffer::SignatureBuffer;
use crate::config::PluginConfig;
use crate::error::{Result, SignerError};
use crate::request::{RequestId, SignatureRequest};
use crate::traits::{SignatureOutcome, SigningPlugin};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

struct Job {
    id: RequestId,
    request: SignatureRequest,
}

struct Worker {
    jobs: mpsc::Sender<Job>,
    results: mpsc::UnboundedReceiver<SignatureOutcome>,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub struct ThreadedSigner {
    max_pending: usize,
    max_allocation: usize,
    worker: Option<Worker>,
    /// Outcomes handed back through `put_back`, served before the channel
    deferred: VecDeque<SignatureOutcome>,
    next_id: u64,
    in_flight: usize,
}

impl ThreadedSigner {
    pub fn new() -> Self {
        Self::with_config(&PluginConfig::default())
    }

    pub fn with_config(config: &PluginConfig) -> Self {
        Self {
            max_pending: config.max_pending,
            max_allocation: config.max_allocation,
            worker: None,
            deferred: VecDeque::new(),
            next_id: 0,
            in_flight: 0,
        }
    }
}

impl Default for ThreadedSigner {
    fn default() -> Self {
        Self::new()
    }
}

fn run_worker(
    mut jobs: mpsc::Receiver<Job>,
    results: mpsc::UnboundedSender<SignatureOutcome>,
    stop: Arc<AtomicBool>,
) {
    tracing::debug!("Signing worker started");

    while let Some(Job { id, request }) = jobs.blocking_recv() {
        if stop.load(Ordering::Acquire) {
            break;
        }

        let result = request.private_key().sign_digest(request.hash());
        match &result {
            Ok(signature) => tracing::debug!(
                "Signed request {}: algo={}, hash={}, sig_len={} bytes",
                id,
                request.algo(),
                hex::encode(request.hash()),
                signature.len()
            ),
            Err(e) => tracing::warn!("Signing request {} failed: {}", id, e),
        }
        // Key material goes away with the request before the result is posted
        drop(request);

        if results.send(SignatureOutcome { id, result }).is_err() {
            break;
        }
    }

    tracing::debug!("Signing worker stopped");
}

impl SigningPlugin for ThreadedSigner {
    fn name(&self) -> &str {
        "threaded"
    }

    fn setup(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(SignerError::InvalidState(
                "setup called twice without teardown".to_string(),
            ));
        }

        let (jobs_tx, jobs_rx) = mpsc::channel(self.max_pending.max(1));
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));

        let worker_stop = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("sv-signing-worker".to_string())
            .spawn(move || run_worker(jobs_rx, results_tx, worker_stop))
            .map_err(|e| SignerError::Backend(format!("Failed to spawn signing worker: {}", e)))?;

        self.worker = Some(Worker {
            jobs: jobs_tx,
            results: results_rx,
            stop,
            handle,
        });
        self.in_flight = 0;

        tracing::info!("Threaded signer set up: max_pending={}", self.max_pending);
        Ok(())
    }

    fn teardown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        let Worker {
            jobs,
            results,
            stop,
            handle,
        } = worker;

        stop.store(true, Ordering::Release);
        // Closing the job channel wakes the worker if it is idle
        drop(jobs);
        if handle.join().is_err() {
            tracing::error!("Signing worker panicked");
        }
        drop(results);
        self.deferred.clear();

        tracing::info!(
            "Threaded signer torn down: dropped {} unretrieved results",
            self.in_flight
        );
        self.in_flight = 0;
    }

    fn sign_hash(&mut self, request: SignatureRequest) -> Result<RequestId> {
        let Some(worker) = self.worker.as_ref() else {
            return Err(SignerError::InvalidState(
                "sign_hash called before setup".to_string(),
            ));
        };

        if self.in_flight >= self.max_pending {
            tracing::warn!("Rejecting sign request: {} results pending", self.in_flight);
            return Err(SignerError::Busy(format!(
                "{} signatures waiting to be retrieved",
                self.in_flight
            )));
        }

        let id = RequestId(self.next_id);
        match worker.jobs.try_send(Job { id, request }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                return Err(SignerError::Busy("signing queue is full".to_string()));
            }
            Err(TrySendError::Closed(_)) => {
                return Err(SignerError::Backend("signing worker is gone".to_string()));
            }
        }

        self.next_id += 1;
        self.in_flight += 1;
        tracing::debug!("Queued request {}: {} in flight", id, self.in_flight);
        Ok(id)
    }

    fn poll_signature(&mut self) -> Option<SignatureOutcome> {
        let worker = self.worker.as_mut()?;

        if let Some(outcome) = self.deferred.pop_front() {
            self.in_flight = self.in_flight.saturating_sub(1);
            return Some(outcome);
        }

        match worker.results.try_recv() {
            Ok(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if self.in_flight > 0 {
                    tracing::error!(
                        "Signing worker exited with {} requests outstanding",
                        self.in_flight
                    );
                    self.in_flight = 0;
                }
                None
            }
        }
    }

    fn put_back(&mut self, outcome: SignatureOutcome) {
        if self.worker.is_none() {
            return;
        }
        self.deferred.push_front(outcome);
        self.in_flight += 1;
    }

    fn pending(&self) -> usize {
        self.in_flight
    }

    fn allocate(&self, size: usize) -> Option<SignatureBuffer> {
        SignatureBuffer::allocate_within(size, self.max_allocation)
    }
}

impl Drop for ThreadedSigner {
    fn drop(&mut self) {
        self.teardown();
    }
}
