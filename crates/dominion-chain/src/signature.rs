//! Event signature verification contract.

use std::fmt::Debug;

use dominion_types::{EventBody, Signature};

/// Raised when a signature does not authorise an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The signature bytes are malformed.
    #[error("malformed signature: {reason}")]
    Malformed {
        /// What is wrong with the bytes.
        reason: String,
    },

    /// The signature does not match any authorised key.
    #[error("signature rejected")]
    Rejected,
}

/// Decides whether a signature authorises an event body.
pub trait SignatureVerifier: Send + Sync + Debug {
    /// Accept or reject `signature` for `body`.
    fn verify(&self, signature: &Signature, body: &EventBody) -> Result<(), SignatureError>;
}

/// Verifier that accepts every signature, including an empty one.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllSignatures;

impl SignatureVerifier for AcceptAllSignatures {
    fn verify(&self, _signature: &Signature, _body: &EventBody) -> Result<(), SignatureError> {
        Ok(())
    }
}
