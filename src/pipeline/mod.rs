//! HTTP request pipeline.
//!
//! - [`message`] - request/response values
//! - [`policy`] - header injection and auth policies
//! - [`fault`] - fault translation of 4xx/5xx responses
//! - [`transport`] - the `reqwest` transport

mod fault;
mod message;
mod policy;
mod transport;

pub use fault::{is_fault_status, parse_error_body, translate_fault, FaultPolicy};
pub use message::{Request, Response, CLIENT_REQUEST_ID_HEADER, REQUEST_ID_HEADER, VERSION_HEADER};
pub use policy::{
    BearerTokenPolicy, ClientRequestIdPolicy, PipelineContext, Policy, UserAgentPolicy,
    VersionHeaderPolicy,
};
pub use transport::{ReqwestTransport, Transport};

use crate::azure::TokenSource;
use crate::error::Result;
use std::sync::Arc;

/// An ordered list of policies in front of a transport.
#[derive(Clone)]
pub struct Pipeline {
    policies: Vec<Arc<dyn Policy>>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    /// Pipeline with no policies.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Pipeline {
            policies: Vec::new(),
            transport,
        }
    }

    /// The usual chain: version, user agent, client request id, optional bearer
    /// auth, fault translation.
    pub fn standard(
        transport: Arc<dyn Transport>,
        api_version: &str,
        user_agent: &str,
        token_source: Option<Arc<dyn TokenSource>>,
    ) -> Self {
        let mut pipeline = Pipeline::new(transport)
            .with_policy(VersionHeaderPolicy::new(api_version))
            .with_policy(UserAgentPolicy::new(user_agent))
            .with_policy(ClientRequestIdPolicy);
        if let Some(source) = token_source {
            pipeline = pipeline.with_policy(BearerTokenPolicy::new(source));
        }
        pipeline.with_policy(FaultPolicy)
    }

    pub fn with_policy<P: Policy + 'static>(mut self, policy: P) -> Self {
        self.policies.push(Arc::new(policy));
        self
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Run `request` through every policy and the transport.
    pub async fn send(&self, mut request: Request) -> Result<Response> {
        let mut ctx = PipelineContext::default();
        for policy in &self.policies {
            policy.on_request(&mut request, &mut ctx).await?;
        }

        let mut response = self.transport.send(&request).await?;

        for policy in self.policies.iter().rev() {
            response = policy.on_response(&request, response, &ctx)?;
        }
        Ok(response)
    }
}
