//! Request/response policies.
//!
//! Policies run in order on the way out and in reverse order on the way
//! back. Each one sees the request it belongs to and a shared
//! [`PipelineContext`].

use super::message::{Request, Response, CLIENT_REQUEST_ID_HEADER, VERSION_HEADER};
use crate::azure::TokenSource;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Per-request state shared by the policies.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    /// Correlation token sent with the request.
    pub client_request_id: Option<String>,
}

#[async_trait]
pub trait Policy: Send + Sync {
    async fn on_request(&self, _request: &mut Request, _ctx: &mut PipelineContext) -> Result<()> {
        Ok(())
    }

    fn on_response(
        &self,
        _request: &Request,
        response: Response,
        _ctx: &PipelineContext,
    ) -> Result<Response> {
        Ok(response)
    }
}

/// Adds `x-ms-version` unless the caller already set one.
#[derive(Debug, Clone)]
pub struct VersionHeaderPolicy {
    version: String,
}

impl VersionHeaderPolicy {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

#[async_trait]
impl Policy for VersionHeaderPolicy {
    async fn on_request(&self, request: &mut Request, _ctx: &mut PipelineContext) -> Result<()> {
        if request.headers.contains_key(VERSION_HEADER) {
            log::trace!(
                "keeping caller {VERSION_HEADER}={:?}",
                request.header(VERSION_HEADER)
            );
        } else {
            request.set_header(VERSION_HEADER, &self.version);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct UserAgentPolicy {
    user_agent: String,
}

impl UserAgentPolicy {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl Policy for UserAgentPolicy {
    async fn on_request(&self, request: &mut Request, _ctx: &mut PipelineContext) -> Result<()> {
        if !request.headers.contains_key("user-agent") {
            request.set_header("user-agent", &self.user_agent);
        }
        Ok(())
    }
}

/// Sends `x-ms-client-request-id` and records it as the correlation token.
#[derive(Debug, Clone, Default)]
pub struct ClientRequestIdPolicy;

#[async_trait]
impl Policy for ClientRequestIdPolicy {
    async fn on_request(&self, request: &mut Request, ctx: &mut PipelineContext) -> Result<()> {
        let id = match request.header(CLIENT_REQUEST_ID_HEADER) {
            Some(existing) => existing.to_string(),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                request.set_header(CLIENT_REQUEST_ID_HEADER, &id);
                id
            }
        };
        log::trace!("{} {} client-request-id={id}", request.method, request.url);
        ctx.client_request_id = Some(id);
        Ok(())
    }
}

/// Adds `Authorization: Bearer ...` from a [`TokenSource`].
pub struct BearerTokenPolicy {
    source: Arc<dyn TokenSource>,
}

impl BearerTokenPolicy {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Policy for BearerTokenPolicy {
    async fn on_request(&self, request: &mut Request, _ctx: &mut PipelineContext) -> Result<()> {
        let token = self.source.token().await?;
        request.set_header("authorization", &format!("Bearer {}", token.access_token));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn request() -> Request {
        Request::new(Method::GET, "https://management.test/sub/services/hostedservices")
    }

    #[tokio::test]
    async fn test_version_added_when_missing() {
        let mut req = request();
        let mut ctx = PipelineContext::default();
        VersionHeaderPolicy::new("2014-06-01")
            .on_request(&mut req, &mut ctx)
            .await
            .unwrap();
        assert_eq!(req.header(VERSION_HEADER), Some("2014-06-01"));
    }

    #[tokio::test]
    async fn test_version_not_overwritten() {
        let mut req = request().with_header(VERSION_HEADER, "2012-03-01");
        let mut ctx = PipelineContext::default();
        VersionHeaderPolicy::new("2014-06-01")
            .on_request(&mut req, &mut ctx)
            .await
            .unwrap();
        assert_eq!(req.header(VERSION_HEADER), Some("2012-03-01"));
    }

    #[tokio::test]
    async fn test_client_request_id_recorded() {
        let mut req = request();
        let mut ctx = PipelineContext::default();
        ClientRequestIdPolicy.on_request(&mut req, &mut ctx).await.unwrap();
        let sent = req.header(CLIENT_REQUEST_ID_HEADER).map(str::to_string);
        assert!(sent.is_some());
        assert_eq!(ctx.client_request_id, sent);
    }

    #[tokio::test]
    async fn test_client_request_id_kept_when_set() {
        let mut req = request().with_header(CLIENT_REQUEST_ID_HEADER, "mine");
        let mut ctx = PipelineContext::default();
        ClientRequestIdPolicy.on_request(&mut req, &mut ctx).await.unwrap();
        assert_eq!(ctx.client_request_id.as_deref(), Some("mine"));
    }

    #[tokio::test]
    async fn test_user_agent() {
        let mut req = request();
        let mut ctx = PipelineContext::default();
        UserAgentPolicy::new("azsm/0.1")
            .on_request(&mut req, &mut ctx)
            .await
            .unwrap();
        assert_eq!(req.header("user-agent"), Some("azsm/0.1"));
    }
}
