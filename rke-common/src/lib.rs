//! Common types shared between the RKE provider and its provisioning engine
//!
//! Holds the typed cluster configuration, the certificate bundle codec and the
//! host classifier. Nothing in this crate performs I/O.

pub mod cluster;
pub mod config;
pub mod hosts;
pub mod pki;

pub use cluster::Cluster;
pub use config::*;
pub use hosts::{Host, HostGroups};
pub use pki::{Certificate, CertificatePki, KeyAlgorithm, KeyFormat, PrivateKey};

/// Conversion and codec errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value for {key}: expected {expected}")]
    InvalidType { key: String, expected: &'static str },

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid port {port:?} for node {address}")]
    InvalidPort { address: String, port: String },

    #[error("failed to set {key}: {message}")]
    State { key: String, message: String },

    #[error("failed to decode PEM: {0}")]
    Pem(#[from] ::pem::PemError),

    #[error("expected a single PEM block, found {found}")]
    PemBlockCount { found: usize },

    #[error("unexpected PEM block {found:?}, expected {expected}")]
    UnexpectedPemTag { found: String, expected: &'static str },

    #[error("failed to parse certificate: {0}")]
    Certificate(String),

    #[error("failed to parse private key: {0}")]
    PrivateKey(String),
}

impl Error {
    pub fn invalid_type(key: &str, expected: &'static str) -> Self {
        Self::InvalidType {
            key: key.to_string(),
            expected,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
