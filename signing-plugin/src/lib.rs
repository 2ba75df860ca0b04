//! Signing backend plugins for signed video
//!
//! A signed video session hashes the stream and delegates signing of each
//! digest to a swappable backend implementing [`SigningPlugin`]. Backends may
//! sign synchronously or in the background; the host collects signatures by
//! polling so the media pipeline never waits on the signer.
//!
//! # Quick Start
//!
//! ```rust
//! use signing_plugin::{hash_data, PrivateKey, SignAlgo, SigningSession};
//! use signing_plugin::software::SoftwareSigner;
//!
//! let key = PrivateKey::generate(SignAlgo::Ecdsa).unwrap();
//! let mut session = SigningSession::new(SoftwareSigner::new(), key);
//! session.setup().unwrap();
//!
//! let hash = hash_data(b"GOP 0 frame hashes");
//! session.sign_hash(hash).unwrap();
//!
//! let mut signature = session.allocate_signature_buffer().unwrap();
//! assert!(session.get_signature(&mut signature).unwrap().is_some());
//! assert!(session.verify(&hash, signature.as_slice()).unwrap());
//! ```

pub mod algo;
pub mod buffer;
pub mod config;
pub mod error;
pub mod keys;
pub mod request;
pub mod session;
pub mod software;
pub mod threaded;
pub mod traits;
pub mod verify;

// Re-export commonly used types
pub use algo::{hash_data, Digest, SignAlgo, HASH_DIGEST_SIZE};
pub use buffer::SignatureBuffer;
pub use config::{BackendKind, PluginConfig};
pub use error::{Result, ReturnCode, SignerError};
pub use keys::{generate_key_pair, PrivateKey, PublicKey};
pub use request::{RequestId, SignatureRequest};
pub use session::{SessionState, SigningSession};
pub use traits::{SignatureOutcome, SigningPlugin};
pub use verify::verify_hash;

/// Instantiate the backend selected by `config`
pub fn create_plugin(config: &PluginConfig) -> Box<dyn SigningPlugin> {
    tracing::debug!("Creating {:?} signing backend", config.backend);
    match config.backend {
        BackendKind::Software => Box::new(software::SoftwareSigner::with_config(config)),
        BackendKind::Threaded => Box::new(threaded::ThreadedSigner::with_config(config)),
    }
}
