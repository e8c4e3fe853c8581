//! Access token acquisition.
//!
//! - [`StaticToken`] - a token supplied by the caller
//! - [`ClientSecretCredential`] - OAuth2 client-credentials grant against the
//!   Microsoft identity platform
//! - [`AzureCliCredential`] - a token borrowed from an `az login` session

use super::cli;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
/// Resource of the classic management API.
pub const MANAGEMENT_RESOURCE: &str = "https://management.core.windows.net/";
/// Tokens this close to expiry are refreshed.
const EXPIRY_MARGIN_SECS: i64 = 300;

/// A bearer token and its expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        AccessToken {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// True when the token expires within the refresh margin.
    pub fn is_expiring(&self) -> bool {
        match self.expires_at {
            Some(exp) => Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= exp,
            None => false,
        }
    }
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<AccessToken>;
}

/// A token that never refreshes.
#[derive(Debug, Clone)]
pub struct StaticToken(AccessToken);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::invalid_argument("Access token must not be empty"));
        }
        Ok(StaticToken(AccessToken::new(token.trim(), None)))
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<AccessToken> {
        Ok(self.0.clone())
    }
}

/// Raw token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Service principal login with a client secret.
pub struct ClientSecretCredential {
    http: reqwest::Client,
    authority: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<AccessToken>>,
}

impl ClientSecretCredential {
    pub fn new(tenant_id: &str, client_id: &str, client_secret: &str) -> Result<Self> {
        if tenant_id.is_empty() || client_id.is_empty() || client_secret.is_empty() {
            return Err(Error::invalid_argument(
                "tenant_id, client_id and client_secret are all required",
            ));
        }
        Ok(ClientSecretCredential {
            http: reqwest::Client::new(),
            authority: DEFAULT_AUTHORITY.to_string(),
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            cached: Mutex::new(None),
        })
    }

    /// Use another identity authority (sovereign clouds).
    pub fn with_authority(mut self, authority: &str) -> Self {
        self.authority = authority.trim_end_matches('/').to_string();
        self
    }

    pub fn token_url(&self) -> String {
        token_url(&self.authority, &self.tenant_id)
    }

    async fn request_token(&self) -> Result<AccessToken> {
        let url = self.token_url();
        log::debug!("Token request -> {url}");

        let scope = format!("{MANAGEMENT_RESOURCE}/.default");
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let resp = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::auth(format!("Token request to {url} failed: {e}")))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            let detail: TokenErrorResponse = serde_json::from_str(&body).unwrap_or_default();
            return Err(Error::auth(format!(
                "Token request rejected (HTTP {}): {} {}",
                status.as_u16(),
                detail.error.unwrap_or_default(),
                detail.error_description.unwrap_or_default()
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::auth(format!("Unexpected token response: {e}")))?;
        Ok(token_from_response(parsed))
    }
}

#[async_trait]
impl TokenSource for ClientSecretCredential {
    async fn token(&self) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;
        if let Some(ref token) = *cached {
            if !token.is_expiring() {
                return Ok(token.clone());
            }
            log::info!("Access token for client {} is expiring, refreshing", self.client_id);
        }
        let token = self.request_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

fn token_url(authority: &str, tenant_id: &str) -> String {
    format!("{authority}/{tenant_id}/oauth2/v2.0/token")
}

fn token_from_response(resp: TokenResponse) -> AccessToken {
    let expires_at = resp
        .expires_in
        .map(|secs| Utc::now() + Duration::seconds(secs));
    AccessToken::new(resp.access_token, expires_at)
}

/// Output of `az account get-access-token`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzCliToken {
    access_token: String,
    #[serde(default)]
    expires_on: Option<String>,
    /// Unix timestamp, newer CLI versions only.
    #[serde(default, rename = "expires_on")]
    expires_on_unix: Option<i64>,
}

/// Borrows a token from the Azure CLI.
pub struct AzureCliCredential {
    subscription_id: Option<String>,
    cached: Mutex<Option<AccessToken>>,
}

impl AzureCliCredential {
    pub fn new(subscription_id: Option<&str>) -> Self {
        AzureCliCredential {
            subscription_id: subscription_id.map(str::to_string),
            cached: Mutex::new(None),
        }
    }

    pub fn command(&self) -> String {
        let mut cmd = format!(
            "az account get-access-token --resource '{MANAGEMENT_RESOURCE}' --output json"
        );
        if let Some(ref sub) = self.subscription_id {
            cmd.push_str(&format!(" --subscription '{sub}'"));
        }
        cmd
    }
}

#[async_trait]
impl TokenSource for AzureCliCredential {
    async fn token(&self) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;
        if let Some(ref token) = *cached {
            if !token.is_expiring() {
                return Ok(token.clone());
            }
        }
        let output = cli::run(&self.command()).await?;
        let token = parse_az_cli_token(&output)?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

fn parse_az_cli_token(output: &str) -> Result<AccessToken> {
    let mut de = serde_json::Deserializer::from_str(output);
    let parsed: AzCliToken = serde_path_to_error::deserialize(&mut de).map_err(|e| {
        Error::auth(format!(
            "Unexpected az output: path={} error={e}",
            e.path()
        ))
    })?;

    let expires_at = match parsed.expires_on_unix {
        Some(ts) => DateTime::<Utc>::from_timestamp(ts, 0),
        // Older CLI versions print local time without a zone.
        None => parsed.expires_on.as_deref().and_then(|s| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .and_then(|n| n.and_local_timezone(Local).single())
                .map(|d| d.with_timezone(&Utc))
        }),
    };
    Ok(AccessToken::new(parsed.access_token, expires_at))
}
