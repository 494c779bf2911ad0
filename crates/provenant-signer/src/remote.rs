//! Remote web-service signer.
//!
//! The service publishes its configuration at a URL:
//!
//! ```text
//! GET  <config url>   -> { "algorithm", "timestamp_url", "signing_url",
//!                          "certificate_chain": base64(PEM) }
//! POST <signing_url>  { "claim": base64(data) } -> { "signature": base64(bytes) }
//! ```
//!
//! Both requests carry the bearer token when one is configured. The
//! configuration is fetched once at construction; each sign call is one
//! round trip. Timeouts come from [`RemoteSignerConfig`] and surface as
//! [`SignerError::Transport`].

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use provenant_core::{SignatureFormat, SigningAlgorithm};
use serde::{Deserialize, Serialize};

use crate::certs::CertificateChain;
use crate::error::{Result, SignerError};
use crate::signer::{default_max_signature_len, BackendKind, Signer};

/// Connection settings for a remote signer.
#[derive(Clone)]
pub struct RemoteSignerConfig {
    /// Configuration endpoint.
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` on every request.
    pub bearer_token: Option<String>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Encoding of the signatures the service returns.
    pub signature_format: SignatureFormat,
}

impl RemoteSignerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bearer_token: None,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            signature_format: SignatureFormat::Raw,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    pub fn with_signature_format(mut self, format: SignatureFormat) -> Self {
        self.signature_format = format;
        self
    }
}

impl std::fmt::Debug for RemoteSignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSignerConfig")
            .field("url", &self.url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("signature_format", &self.signature_format)
            .finish()
    }
}

/// Configuration document served by the remote signer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfiguration {
    pub algorithm: String,
    #[serde(default)]
    pub timestamp_url: Option<String>,
    pub signing_url: String,
    /// Base64 of the PEM certificate chain.
    pub certificate_chain: String,
}

#[derive(Serialize)]
struct SignRequest {
    claim: String,
}

#[derive(Deserialize)]
struct SignResponse {
    signature: String,
}

impl Signer {
    /// Fetch the remote configuration and build a signer that round-trips
    /// every sign call to the service.
    pub fn remote(config: RemoteSignerConfig) -> Result<Self> {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout_read(config.read_timeout)
            .build();
        let auth = config.bearer_token.as_ref().map(|t| format!("Bearer {t}"));

        let mut request = agent.get(&config.url);
        if let Some(auth) = &auth {
            request = request.set("Authorization", auth);
        }
        let remote: RemoteConfiguration = request
            .call()
            .map_err(transport_error)?
            .into_json()
            .map_err(|e| SignerError::Transport(format!("invalid configuration response: {e}")))?;

        let algorithm: SigningAlgorithm = remote
            .algorithm
            .parse()
            .map_err(|e| SignerError::config(format!("remote signer: {e}")))?;
        let pem = BASE64
            .decode(remote.certificate_chain.trim())
            .map_err(|e| SignerError::config(format!("certificate chain is not base64: {e}")))?;
        let pem = String::from_utf8(pem)
            .map_err(|_| SignerError::config("certificate chain is not UTF-8 PEM"))?;
        let chain = CertificateChain::from_pem(&pem)?;
        let tsa_url = remote.timestamp_url.filter(|u| !u.is_empty());

        tracing::debug!(
            url = %config.url,
            signing_url = %remote.signing_url,
            %algorithm,
            "fetched remote signer configuration"
        );

        let signing_url = remote.signing_url;
        let sign_fn = move |data: &[u8]| -> anyhow::Result<Vec<u8>> {
            let mut request = agent.post(&signing_url);
            if let Some(auth) = &auth {
                request = request.set("Authorization", auth);
            }
            let response: SignResponse = request
                .send_json(SignRequest {
                    claim: BASE64.encode(data),
                })
                .map_err(transport_error)?
                .into_json()
                .map_err(|e| SignerError::Transport(format!("invalid signing response: {e}")))?;
            let signature = BASE64
                .decode(response.signature.trim())
                .map_err(|e| SignerError::Transport(format!("signature is not base64: {e}")))?;
            Ok(signature)
        };

        Self::from_parts(
            algorithm,
            chain,
            tsa_url,
            config.signature_format,
            default_max_signature_len(algorithm),
            BackendKind::Remote,
            Box::new(sign_fn),
        )
    }
}

fn transport_error(err: ureq::Error) -> SignerError {
    match err {
        ureq::Error::Status(code, response) => {
            tracing::warn!(code, url = %response.get_url(), "remote signer returned an error status");
            SignerError::Transport(format!(
                "remote signer returned {code} {}",
                response.status_text()
            ))
        }
        ureq::Error::Transport(t) => {
            tracing::warn!(error = %t, "remote signer unreachable");
            SignerError::Transport(t.to_string())
        }
    }
}
