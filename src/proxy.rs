//! Upload proxy to a third-party hosting API.
//!
//! Proxied uploads bypass the registry entirely: the bytes are forwarded
//! as a multipart `files[]` field and the upstream's plain-text reply is the
//! public URL. Nothing is stored locally.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use thiserror::Error;
use url::Url;

use crate::config::ProxyConfig;
use crate::{Result, TempdropError};

/// Multipart field name used both by clients and by the upstream API.
pub const UPLOAD_FIELD: &str = "files[]";

/// Failure while forwarding an upload.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Rejected {
        /// HTTP status code returned by the upstream.
        status: u16,
        /// Response body returned by the upstream.
        body: String,
    },

    /// The request could not be completed.
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<ProxyError> for TempdropError {
    fn from(err: ProxyError) -> Self {
        TempdropError::Upstream(err.to_string())
    }
}

/// Client for the upstream hosting API.
#[derive(Debug, Clone)]
pub struct UploadProxy {
    client: reqwest::Client,
    endpoint: Url,
    advertised_ttl: Duration,
}

impl UploadProxy {
    /// Build a proxy client from configuration.
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            TempdropError::Config(format!("invalid proxy.endpoint {:?}: {e}", config.endpoint))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("tempdrop/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TempdropError::Config(format!("proxy client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            advertised_ttl: Duration::from_secs(config.advertised_ttl_secs),
        })
    }

    /// Upstream endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// How long proxied files are reported to live.
    pub fn advertised_ttl(&self) -> Duration {
        self.advertised_ttl
    }

    /// Forward one file and return the URL the upstream assigned to it.
    pub async fn forward(
        &self,
        file_name: &str,
        content: Vec<u8>,
    ) -> std::result::Result<String, ProxyError> {
        let part = Part::bytes(content).file_name(file_name.to_string());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body.trim().to_string())
        } else {
            Err(ProxyError::Rejected {
                status: status.as_u16(),
                body: body.trim().to_string(),
            })
        }
    }
}
