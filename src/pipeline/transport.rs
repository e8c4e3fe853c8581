//! HTTP transport: the last stage of the pipeline.

use super::message::{Request, Response};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Identity};
use std::time::Duration;

/// Sends a fully prepared request and returns the raw response.
///
/// Non-success statuses are *not* errors at this level; they are turned into
/// faults by [`super::FaultPolicy`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::build(timeout, None)
    }

    /// Transport that presents a management certificate (PKCS#12) on every connection.
    pub fn with_certificate(timeout: Duration, pkcs12: &[u8], password: &str) -> Result<Self> {
        let identity = Identity::from_pkcs12_der(pkcs12, password)
            .map_err(|e| Error::auth(format!("Invalid management certificate: {e}")))?;
        Self::build(timeout, Some(identity))
    }

    fn build(timeout: Duration, identity: Option<Identity>) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10));
        if let Some(identity) = identity {
            builder = builder.identity(identity);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(ReqwestTransport { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &Request) -> Result<Response> {
        log::debug!("{} {}", request.method, request.url);

        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        let resp = builder.send().await.map_err(|e| {
            log::error!("{} {} failed: {e}", request.method, request.url);
            Error::Transport(e.to_string())
        })?;

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        log::debug!("{} {} -> {status}", request.method, request.url);

        // Some statuses arrive with the body stream already closed; losing the
        // body only costs diagnostic detail.
        let (body, body_error) = match resp.bytes().await {
            Ok(bytes) => (bytes.to_vec(), None),
            Err(e) => {
                log::warn!("Could not read response body (HTTP {status}): {e}");
                (Vec::new(), Some(e.to_string()))
            }
        };

        Ok(Response {
            status,
            headers,
            body,
            body_error,
        })
    }
}
