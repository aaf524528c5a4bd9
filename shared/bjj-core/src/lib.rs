//! BJJ Core - Shared catalog logic for the Jiujitsuteria video library
//!
//! Everything in this crate is free of network and database I/O: CloudFront
//! URL signing, tag matching for search queries, storage key naming and the
//! category kinds videos are filed under.

pub mod category;
pub mod clock;
pub mod naming;
pub mod signing;
pub mod tags;
pub mod vocabulary;

pub use category::{CategoryKind, CategoryRef};
pub use clock::{Clock, FixedClock, SystemClock};
pub use signing::{CloudFrontSigner, SignedUrlVerifier, DEFAULT_EXPIRY_SECS};
pub use tags::TagMatcher;
pub use vocabulary::{TagGroup, TagVocabulary};

/// Result type for BJJ Core operations
pub type Result<T> = std::result::Result<T, BJJCoreError>;

/// Error types for BJJ Core operations
#[derive(thiserror::Error, Debug)]
pub enum BJJCoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required setting is missing or blank
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The private key could not be loaded or the signature failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// A signed URL was rejected (bad signature, wrong resource, expired)
    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
