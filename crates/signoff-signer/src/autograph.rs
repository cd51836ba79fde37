use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value, json};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::hawk::{HawkCredentials, HawkRequest};
use crate::{Signer, SignerError};

/// Signs by delegating to a remote Autograph instance over HAWK-authenticated
/// HTTP, `POST {server_url}/sign/data`.
///
/// [`Signer::sign`] is synchronous at the trait boundary (every other
/// backend is CPU-bound), so this backend drives its own request through a
/// [`tokio::runtime::Handle`] captured at construction rather than exposing
/// an async method on the trait itself.
pub struct AutographSigner {
    server_url: String,
    credentials: HawkCredentials,
    client: reqwest::Client,
    runtime: tokio::runtime::Handle,
}

impl AutographSigner {
    /// Build a client bound to `server_url`, authenticating with `hawk_id`/`hawk_secret`.
    ///
    /// # Errors
    /// Returns [`SignerError::Unavailable`] if called outside a Tokio runtime.
    pub fn new(server_url: impl Into<String>, hawk_id: impl Into<String>, hawk_secret: impl Into<String>) -> Result<Self, SignerError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SignerError::Unavailable(format!("no tokio runtime available: {e}")))?;
        Ok(Self {
            server_url: server_url.into(),
            credentials: HawkCredentials {
                id: hawk_id.into(),
                key: hawk_secret.into(),
            },
            client: reqwest::Client::new(),
            runtime,
        })
    }

    async fn sign_remote(&self, payload: &[u8]) -> Result<Map<String, Value>, SignerError> {
        let body = json!([{ "input": STANDARD.encode(payload) }]);
        let body_bytes = serde_json::to_vec(&body)
            .map_err(|e| SignerError::Unavailable(format!("failed to encode request: {e}")))?;

        let url = format!("{}/sign/data", self.server_url.trim_end_matches('/'));
        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| SignerError::Unavailable(format!("invalid server_url: {e}")))?;
        let host = parsed.host_str().unwrap_or_default().to_string();
        let port = parsed.port_or_known_default().unwrap_or(443);
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SignerError::Unavailable(e.to_string()))?
            .as_secs();
        let nonce = format!("{ts:x}{}", self.credentials.id.len());

        let auth_header = self.credentials.authorization_header(
            &HawkRequest {
                method: "POST",
                host: &host,
                port,
                path: parsed.path(),
                body: &body_bytes,
            },
            ts,
            &nonce,
        );

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth_header)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body_bytes)
            .send()
            .await
            .map_err(|e| SignerError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SignerError::Unavailable(format!(
                "autograph returned HTTP {}",
                response.status()
            )));
        }

        let results: Vec<Map<String, Value>> = response
            .json()
            .await
            .map_err(|e| SignerError::Unavailable(format!("invalid autograph response: {e}")))?;

        results
            .into_iter()
            .next()
            .ok_or_else(|| SignerError::Unavailable("empty autograph response".to_string()))
    }
}

impl Signer for AutographSigner {
    fn sign(&self, payload: &[u8]) -> Result<signoff_core::SignatureBundle, SignerError> {
        let fields = tokio::task::block_in_place(|| self.runtime.block_on(self.sign_remote(payload)))?;
        Ok(signoff_core::SignatureBundle::new(fields))
    }

    fn verify(&self, _payload: &[u8], _bundle: &signoff_core::SignatureBundle) -> Result<(), SignerError> {
        Err(SignerError::Unavailable(
            "Autograph backend does not support local verification".to_string(),
        ))
    }
}
