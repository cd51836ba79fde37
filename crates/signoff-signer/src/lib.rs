// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = "Signer backends for the content-signing workflow engine."]
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! A [`Signer`] turns a canonical payload into a [`SignatureBundle`] and
//! can check one back. [`local_ecdsa`] signs with a locally-held P-384 key;
//! [`autograph`] delegates to a remote HAWK-authenticated signing service.
//! [`registry`] resolves which backend a given source collection should use.

mod autograph;
mod hawk;
mod local_ecdsa;
mod registry;

pub use autograph::AutographSigner;
pub use local_ecdsa::LocalEcdsaSigner;
pub use registry::{SignerBackendKind, SignerRegistry, SignerSettings};

use signoff_core::SignatureBundle;

/// The content-signature prefix Autograph (and this crate) prepend to a
/// payload before signing or verifying it, so that a signed blob can never
/// be confused with an unrelated signed message of the same bytes.
pub const CONTENT_SIGNATURE_PREFIX: &[u8] = b"Content-Signature:\x00";

/// Errors a signer backend can raise.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The bundle lacked a mandatory field, or a field had an unsupported value.
    #[error("invalid signature bundle: {0}")]
    InvalidBundle(String),
    /// Signature verification failed.
    #[error("bad signature: {0}")]
    BadSignature(String),
    /// The key material could not be loaded or parsed.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// The backend (usually remote) could not be reached or returned an error.
    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

/// Turns a canonical payload into a signature, and can check one back.
///
/// Implementations are expected to be cheap to call repeatedly and safe to
/// share across threads (see [`SignerRegistry`]).
pub trait Signer: Send + Sync {
    /// Sign `payload`, returning a bundle with at least the mandatory
    /// verification fields (`signature`, `hash_algorithm`, `signature_encoding`).
    fn sign(&self, payload: &[u8]) -> Result<SignatureBundle, SignerError>;

    /// Verify that `bundle` is a valid signature over `payload`.
    fn verify(&self, payload: &[u8], bundle: &SignatureBundle) -> Result<(), SignerError>;

    /// Sign a small fixed probe and check the result carries the mandatory
    /// fields. Used to report backend health without touching real data.
    fn heartbeat(&self) -> bool {
        match self.sign(b"TEST") {
            Ok(bundle) => bundle.has_mandatory_fields(),
            Err(err) => {
                tracing::warn!(error = %err, "signer heartbeat failed");
                false
            }
        }
    }
}

pub(crate) fn prefixed(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(CONTENT_SIGNATURE_PREFIX.len() + payload.len());
    buf.extend_from_slice(CONTENT_SIGNATURE_PREFIX);
    buf.extend_from_slice(payload);
    buf
}
