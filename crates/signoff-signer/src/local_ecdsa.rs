use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use ecdsa::signature::{Signer as _, SignatureEncoding, Verifier as _};
use p384::ecdsa::{Signature, SigningKey, VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rand_core::OsRng;
use serde_json::Map;
use signoff_core::SignatureBundle;

use crate::{Signer, SignerError, prefixed};

/// PEM text for an ECDSA private key.
pub type SigningKeyPem = String;
/// PEM text for an ECDSA public key.
pub type VerifyingKeyPem = String;

/// Signs and verifies with a P-384 key held locally, producing a raw
/// (non-DER) `r || s` signature over SHA-384, the same scheme Autograph
/// uses for its own `p384ecdsa` signatures.
pub struct LocalEcdsaSigner {
    signing_key: Option<SigningKey>,
    verifying_key: VerifyingKey,
}

impl LocalEcdsaSigner {
    /// Build a signer able to both sign and verify, from a PKCS#8 PEM
    /// private key.
    pub fn from_private_key_pem(pem: &str) -> Result<Self, SignerError> {
        let signing_key = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        let verifying_key = *signing_key.verifying_key();
        Ok(Self {
            signing_key: Some(signing_key),
            verifying_key,
        })
    }

    /// Build a verify-only signer from an SPKI PEM public key.
    pub fn from_public_key_pem(pem: &str) -> Result<Self, SignerError> {
        let verifying_key = VerifyingKey::from_public_key_pem(pem)
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        Ok(Self {
            signing_key: None,
            verifying_key,
        })
    }

    /// Generate a fresh P-384 keypair, PEM-encoded (PKCS#8 private, SPKI
    /// public). Used by the `keygen` CLI subcommand, never over the wire.
    pub fn generate_keypair() -> Result<(SigningKeyPem, VerifyingKeyPem), SignerError> {
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        let private_pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?
            .to_string();
        let public_pem = verifying_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        Ok((private_pem, public_pem))
    }
}

impl Signer for LocalEcdsaSigner {
    fn sign(&self, payload: &[u8]) -> Result<SignatureBundle, SignerError> {
        let signing_key = self
            .signing_key
            .as_ref()
            .ok_or_else(|| SignerError::InvalidKey("no private key loaded".to_string()))?;

        let signature: Signature = signing_key.sign(&prefixed(payload));
        let encoded = STANDARD.encode(signature.to_bytes());

        let mut bundle = Map::new();
        bundle.insert("signature".into(), encoded.clone().into());
        bundle.insert("hash_algorithm".into(), "sha384".into());
        bundle.insert("signature_encoding".into(), "rs_base64".into());
        bundle.insert("x5u".into(), "".into());
        bundle.insert(
            "content-signature".into(),
            format!("x5u=;p384ecdsa={encoded}").into(),
        );
        Ok(SignatureBundle::new(bundle))
    }

    fn verify(&self, payload: &[u8], bundle: &SignatureBundle) -> Result<(), SignerError> {
        let signature_b64 = bundle
            .get_str("signature")
            .ok_or_else(|| SignerError::InvalidBundle("missing 'signature'".to_string()))?;
        let hash_algorithm = bundle
            .get_str("hash_algorithm")
            .ok_or_else(|| SignerError::InvalidBundle("missing 'hash_algorithm'".to_string()))?;
        let signature_encoding = bundle
            .get_str("signature_encoding")
            .ok_or_else(|| SignerError::InvalidBundle("missing 'signature_encoding'".to_string()))?;

        if hash_algorithm != "sha384" {
            return Err(SignerError::InvalidBundle(format!(
                "unsupported hash_algorithm: {hash_algorithm}"
            )));
        }

        let raw = match signature_encoding {
            "rs_base64" => STANDARD
                .decode(signature_b64)
                .map_err(|e| SignerError::InvalidBundle(e.to_string()))?,
            "rs_base64url" => URL_SAFE
                .decode(signature_b64)
                .map_err(|e| SignerError::InvalidBundle(e.to_string()))?,
            other => {
                return Err(SignerError::InvalidBundle(format!(
                    "unsupported signature_encoding: {other}"
                )));
            }
        };

        let signature =
            Signature::from_slice(&raw).map_err(|e| SignerError::BadSignature(e.to_string()))?;

        self.verifying_key
            .verify(&prefixed(payload), &signature)
            .map_err(|e| SignerError::BadSignature(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let (private_pem, public_pem) = LocalEcdsaSigner::generate_keypair().unwrap();
        let signer = LocalEcdsaSigner::from_private_key_pem(&private_pem).unwrap();
        let verifier = LocalEcdsaSigner::from_public_key_pem(&public_pem).unwrap();

        let payload = br#"{"data":[],"last_modified":"1"}"#;
        let bundle = signer.sign(payload).unwrap();
        assert!(bundle.has_mandatory_fields());
        assert_eq!(bundle.get_str("hash_algorithm"), Some("sha384"));

        verifier.verify(payload, &bundle).unwrap();
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let (private_pem, _) = LocalEcdsaSigner::generate_keypair().unwrap();
        let signer = LocalEcdsaSigner::from_private_key_pem(&private_pem).unwrap();

        let bundle = signer.sign(b"original").unwrap();
        assert!(signer.verify(b"tampered", &bundle).is_err());
    }

    #[test]
    fn heartbeat_succeeds_with_valid_key() {
        let (private_pem, _) = LocalEcdsaSigner::generate_keypair().unwrap();
        let signer = LocalEcdsaSigner::from_private_key_pem(&private_pem).unwrap();
        assert!(signer.heartbeat());
    }

    #[test]
    fn verify_only_signer_cannot_sign() {
        let (_, public_pem) = LocalEcdsaSigner::generate_keypair().unwrap();
        let verifier = LocalEcdsaSigner::from_public_key_pem(&public_pem).unwrap();
        assert!(verifier.sign(b"x").is_err());
    }

    #[test]
    fn unsupported_hash_algorithm_is_rejected() {
        let (private_pem, _) = LocalEcdsaSigner::generate_keypair().unwrap();
        let signer = LocalEcdsaSigner::from_private_key_pem(&private_pem).unwrap();
        let mut bundle = signer.sign(b"x").unwrap();
        bundle.0.insert("hash_algorithm".into(), "sha256".into());
        assert!(signer.verify(b"x", &bundle).is_err());
    }
}
