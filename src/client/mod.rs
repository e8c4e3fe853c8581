//! Typed client over the management API.
//!
//! - [`ServiceManagementClient`] - one method per service contract
//! - [`polling`] - waiting for asynchronous operations

mod polling;

pub use polling::{poll_operation, PollOptions};

use crate::azure::{
    AuthMethod, AzureCliCredential, ClientSecretCredential, StaticToken, Subscription, TokenSource,
};
use crate::config::Settings;
use crate::contract::{self, Contract};
use crate::error::{Error, Result};
use crate::models::{
    from_xml, to_xml, CreateHostedService, CreateStorageServiceInput, Deployment, DeploymentSlot,
    DeploymentStatus, HostedService, HostedServiceList, Location, LocationList, Operation,
    StorageService, StorageServiceList, UpdateDeploymentStatus,
};
use crate::pipeline::{Pipeline, ReqwestTransport, Request, Response, Transport};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const XML_CONTENT_TYPE: &str = "application/xml";

/// Client bound to one subscription.
#[derive(Clone)]
pub struct ServiceManagementClient {
    endpoint: String,
    subscription_id: String,
    pipeline: Pipeline,
    poll_options: PollOptions,
}

impl ServiceManagementClient {
    pub fn new(endpoint: &str, subscription_id: &str, pipeline: Pipeline) -> Result<Self> {
        if endpoint.trim().is_empty() {
            return Err(Error::invalid_argument("Management endpoint must not be empty"));
        }
        if subscription_id.trim().is_empty() {
            return Err(Error::invalid_argument("Subscription id must not be empty"));
        }
        Ok(ServiceManagementClient {
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            subscription_id: subscription_id.trim().to_string(),
            pipeline,
            poll_options: PollOptions::default(),
        })
    }

    /// Build the transport and credentials a profile subscription asks for.
    pub fn from_subscription(subscription: &Subscription, settings: &Settings) -> Result<Self> {
        let (transport, token_source): (Arc<dyn Transport>, Option<Arc<dyn TokenSource>>) =
            match &subscription.auth {
                AuthMethod::Certificate { path, password_env } => {
                    let pkcs12 = std::fs::read(path).map_err(|e| {
                        Error::auth(format!("Cannot read certificate {}: {e}", path.display()))
                    })?;
                    let password = password_env
                        .as_deref()
                        .and_then(|name| std::env::var(name).ok())
                        .unwrap_or_default();
                    let transport = ReqwestTransport::with_certificate(
                        settings.request_timeout,
                        &pkcs12,
                        &password,
                    )?;
                    (Arc::new(transport), None)
                }
                AuthMethod::ClientSecret {
                    tenant_id,
                    client_id,
                    secret_env,
                    authority,
                } => {
                    let credential = client_secret_credential(
                        tenant_id,
                        client_id,
                        secret_env,
                        authority.as_deref(),
                    )?;
                    (
                        Arc::new(ReqwestTransport::new(settings.request_timeout)?),
                        Some(Arc::new(credential)),
                    )
                }
                AuthMethod::AzCli => (
                    Arc::new(ReqwestTransport::new(settings.request_timeout)?),
                    Some(Arc::new(AzureCliCredential::new(Some(&subscription.id)))),
                ),
                AuthMethod::Token { token_env } => {
                    let token = StaticToken::new(read_env(token_env)?)?;
                    (
                        Arc::new(ReqwestTransport::new(settings.request_timeout)?),
                        Some(Arc::new(token)),
                    )
                }
            };

        log::debug!(
            "Subscription '{}' ({}) using {} auth",
            subscription.name,
            subscription.id,
            subscription.auth.kind()
        );

        let pipeline = Pipeline::standard(
            transport,
            &settings.api_version,
            &settings.user_agent,
            token_source,
        );
        let endpoint = subscription
            .management_endpoint
            .as_deref()
            .unwrap_or(&settings.endpoint);
        Ok(ServiceManagementClient::new(endpoint, &subscription.id, pipeline)?
            .with_poll_options(PollOptions::from_settings(settings)))
    }

    pub fn with_poll_options(mut self, options: PollOptions) -> Self {
        self.poll_options = options;
        self
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn poll_options(&self) -> &PollOptions {
        &self.poll_options
    }

    // ── Plumbing ─────────────────────────────────────────────────────

    async fn call(
        &self,
        contract: &Contract,
        params: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<Response> {
        let mut all_params = vec![("subscriptionId", self.subscription_id.as_str())];
        all_params.extend_from_slice(params);
        let url = contract.url(&self.endpoint, &all_params)?;

        let mut request = Request::new(contract.method.clone(), url);
        if let Some(body) = body {
            request = request.with_body(XML_CONTENT_TYPE, body.into_bytes());
        }

        log::debug!("{} -> {} {}", contract.name, request.method, request.url);
        let response = self.pipeline.send(request).await?;
        if contract.is_async {
            let request_id = tracking_id(contract, &response)?;
            log::info!(
                "{} accepted (HTTP {}), tracking id {request_id}",
                contract.name,
                response.status
            );
        }
        Ok(response)
    }

    async fn call_xml<T: DeserializeOwned>(
        &self,
        contract: &Contract,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.call(contract, params, None).await?;
        let text = response.text();
        from_xml(&text).map_err(|e| {
            log::error!("{} returned an unreadable document: {e}", contract.name);
            log::debug!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", text);
            Error::serialization(format!("{}: {e}", contract.name))
        })
    }

    /// Call an asynchronous contract and return its tracking ID.
    async fn call_async(
        &self,
        contract: &Contract,
        params: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<String> {
        if !contract.is_async {
            return Err(Error::invalid_argument(format!(
                "{} does not start an asynchronous operation",
                contract.name
            )));
        }
        let response = self.call(contract, params, body).await?;
        tracking_id(contract, &response)
    }

    // ── Operations ───────────────────────────────────────────────────

    pub async fn get_operation_status(&self, request_id: &str) -> Result<Operation> {
        let response = self
            .call(
                &contract::get_operation_status(),
                &[("requestId", request_id)],
                None,
            )
            .await?;
        Operation::from_body(&response.text())
    }

    /// Poll `request_id` with the client's poll options.
    pub async fn wait_for_operation(
        &self,
        request_id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Operation> {
        self.wait_for_operation_with(request_id, &self.poll_options, cancel)
            .await
    }

    pub async fn wait_for_operation_with(
        &self,
        request_id: &str,
        options: &PollOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<Operation> {
        log::info!(
            "Waiting for operation {request_id} (timeout {:?})",
            options.timeout
        );
        poll_operation(request_id, options, cancel, || {
            self.get_operation_status(request_id)
        })
        .await
    }

    // ── Locations ────────────────────────────────────────────────────

    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        let list: LocationList = self.call_xml(&contract::list_locations(), &[]).await?;
        Ok(list.locations)
    }

    // ── Hosted services ──────────────────────────────────────────────

    pub async fn list_hosted_services(&self) -> Result<Vec<HostedService>> {
        let list: HostedServiceList = self
            .call_xml(&contract::list_hosted_services(), &[])
            .await?;
        Ok(list.hosted_services)
    }

    pub async fn get_hosted_service(
        &self,
        service_name: &str,
        embed_detail: bool,
    ) -> Result<HostedService> {
        require("service name", service_name)?;
        let embed = if embed_detail { "true" } else { "false" };
        self.call_xml(
            &contract::get_hosted_service(),
            &[("serviceName", service_name), ("embedDetail", embed)],
        )
        .await
    }

    pub async fn create_hosted_service(&self, input: &CreateHostedService) -> Result<()> {
        require("service name", &input.service_name)?;
        require("location", &input.location)?;
        self.call(&contract::create_hosted_service(), &[], Some(to_xml(input)?))
            .await?;
        log::info!("Created hosted service {}", input.service_name);
        Ok(())
    }

    pub async fn delete_hosted_service(&self, service_name: &str) -> Result<()> {
        require("service name", service_name)?;
        self.call(
            &contract::delete_hosted_service(),
            &[("serviceName", service_name)],
            None,
        )
        .await?;
        log::info!("Deleted hosted service {service_name}");
        Ok(())
    }

    // ── Deployments ──────────────────────────────────────────────────

    pub async fn get_deployment(
        &self,
        service_name: &str,
        slot: DeploymentSlot,
    ) -> Result<Deployment> {
        require("service name", service_name)?;
        self.call_xml(
            &contract::get_deployment_by_slot(),
            &[("serviceName", service_name), ("deploymentSlot", slot.as_str())],
        )
        .await
    }

    /// Start the status change and return its tracking ID.
    pub async fn update_deployment_status(
        &self,
        service_name: &str,
        slot: DeploymentSlot,
        status: DeploymentStatus,
    ) -> Result<String> {
        require("service name", service_name)?;
        let body = to_xml(&UpdateDeploymentStatus::new(status))?;
        self.call_async(
            &contract::update_deployment_status(),
            &[("serviceName", service_name), ("deploymentSlot", slot.as_str())],
            Some(body),
        )
        .await
    }

    pub async fn delete_deployment(
        &self,
        service_name: &str,
        slot: DeploymentSlot,
    ) -> Result<String> {
        require("service name", service_name)?;
        self.call_async(
            &contract::delete_deployment(),
            &[("serviceName", service_name), ("deploymentSlot", slot.as_str())],
            None,
        )
        .await
    }

    // ── Storage ──────────────────────────────────────────────────────

    pub async fn list_storage_services(&self) -> Result<Vec<StorageService>> {
        let list: StorageServiceList = self
            .call_xml(&contract::list_storage_services(), &[])
            .await?;
        Ok(list.storage_services)
    }

    pub async fn get_storage_service(&self, service_name: &str) -> Result<StorageService> {
        require("storage account name", service_name)?;
        self.call_xml(
            &contract::get_storage_service(),
            &[("serviceName", service_name)],
        )
        .await
    }

    /// Start account creation and return its tracking ID.
    pub async fn create_storage_service(
        &self,
        input: &CreateStorageServiceInput,
    ) -> Result<String> {
        validate_storage_name(&input.service_name)?;
        require("location", &input.location)?;
        self.call_async(
            &contract::create_storage_service(),
            &[],
            Some(to_xml(input)?),
        )
        .await
    }

    pub async fn delete_storage_service(&self, service_name: &str) -> Result<()> {
        require("storage account name", service_name)?;
        self.call(
            &contract::delete_storage_service(),
            &[("serviceName", service_name)],
            None,
        )
        .await?;
        log::info!("Deleted storage account {service_name}");
        Ok(())
    }
}

fn tracking_id(contract: &Contract, response: &Response) -> Result<String> {
    response.request_id().ok_or_else(|| {
        Error::Transport(format!(
            "{} answered HTTP {} without x-ms-request-id",
            contract.name, response.status
        ))
    })
}

fn client_secret_credential(
    tenant_id: &str,
    client_id: &str,
    secret_env: &str,
    authority: Option<&str>,
) -> Result<ClientSecretCredential> {
    let credential = ClientSecretCredential::new(tenant_id, client_id, &read_env(secret_env)?)?;
    Ok(match authority {
        Some(authority) => credential.with_authority(authority),
        None => credential,
    })
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::invalid_argument(format!("{what} must not be empty")))
    } else {
        Ok(())
    }
}

fn read_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::auth(format!("Environment variable {name} is not set")))
}

/// Storage account names are 3-24 lowercase letters and digits.
fn validate_storage_name(name: &str) -> Result<()> {
    let ok = (3..=24).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "Storage account name '{name}' must be 3-24 lowercase letters or digits"
        )))
    }
}
