//! Error and status code definitions for the signing boundary
//!
//! Every plugin operation reports failure through its return value. Hosts that
//! need a flat status (the way a C host would read it) can map any
//! [`SignerError`] to a [`ReturnCode`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignerError {
    /// Malformed request, e.g. a digest of the wrong length
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Key material could not be parsed or does not match the algorithm
    #[error("Key error: {0}")]
    Key(String),

    /// The backend failed while signing (library error, worker gone, I/O)
    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("Out of memory: {0}")]
    Memory(String),

    /// An operation was called in a lifecycle state that does not permit it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The pending queue is full; the request was not accepted
    #[error("Backend busy: {0}")]
    Busy(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SignerError>;

/// Closed set of status codes shared between host and backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ReturnCode {
    Ok = 0,
    InvalidArgument = 1,
    UnsupportedAlgorithm = 2,
    KeyError = 3,
    BackendFailure = 4,
    Memory = 5,
    NotInitialized = 6,
    Busy = 7,
    /// Plugin configuration could not be loaded or failed validation
    Config = 8,
}

impl ReturnCode {
    pub fn is_ok(self) -> bool {
        self == ReturnCode::Ok
    }

    /// Status of an operation result
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => ReturnCode::Ok,
            Err(e) => e.into(),
        }
    }
}

impl From<&SignerError> for ReturnCode {
    fn from(err: &SignerError) -> Self {
        match err {
            SignerError::InvalidArgument(_) => ReturnCode::InvalidArgument,
            SignerError::UnsupportedAlgorithm(_) => ReturnCode::UnsupportedAlgorithm,
            SignerError::Key(_) => ReturnCode::KeyError,
            SignerError::Backend(_) => ReturnCode::BackendFailure,
            SignerError::Memory(_) => ReturnCode::Memory,
            SignerError::InvalidState(_) => ReturnCode::NotInitialized,
            SignerError::Busy(_) => ReturnCode::Busy,
            SignerError::Config(_) => ReturnCode::Config,
        }
    }
}

impl SignerError {
    pub fn code(&self) -> ReturnCode {
        self.into()
    }
}

impl From<rsa::Error> for SignerError {
    fn from(err: rsa::Error) -> Self {
        use rsa::Error as E;

        match err {
            // The key cannot serve this request, e.g. the modulus is too small
            // for a PKCS#1 v1.5 SHA-256 signature
            E::MessageTooLong
            | E::InvalidModulus
            | E::InvalidExponent
            | E::InvalidCoefficient
            | E::InvalidPrime
            | E::ModulusTooLarge
            | E::PublicExponentTooSmall
            | E::PublicExponentTooLarge
            | E::NprimesTooSmall
            | E::TooFewPrimes
            | E::Pkcs1(_)
            | E::Pkcs8(_) => SignerError::Key(format!("RSA key: {}", err)),
            _ => SignerError::Backend(format!("RSA: {}", err)),
        }
    }
}

impl From<p256::ecdsa::Error> for SignerError {
    fn from(err: p256::ecdsa::Error) -> Self {
        SignerError::Backend(format!("ECDSA: {}", err))
    }
}
