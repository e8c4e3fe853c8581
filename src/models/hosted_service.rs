//! Hosted (cloud) service data model.

use super::{decode_label, encode_label, parse_timestamp, Deployment, XMLNS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `<HostedServices>` list document.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct HostedServiceList {
    #[serde(rename = "HostedService", default)]
    pub hosted_services: Vec<HostedService>,
}

/// Represents a hosted service and its properties.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct HostedService {
    #[serde(rename = "Url", default)]
    pub url: Option<String>,
    #[serde(rename = "ServiceName")]
    pub service_name: String,
    #[serde(rename = "HostedServiceProperties", default)]
    pub properties: HostedServiceProperties,
    /// Present when the service is fetched with `embed-detail=true`.
    #[serde(rename = "Deployments", default)]
    pub deployments: Option<DeploymentList>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct HostedServiceProperties {
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Location", default)]
    pub location: Option<String>,
    #[serde(rename = "AffinityGroup", default)]
    pub affinity_group: Option<String>,
    /// Base64 encoded on the wire.
    #[serde(rename = "Label", default)]
    pub label: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "DateCreated", default)]
    pub date_created: Option<String>,
    #[serde(rename = "DateLastModified", default)]
    pub date_last_modified: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DeploymentList {
    #[serde(rename = "Deployment", default)]
    pub deployments: Vec<Deployment>,
}

impl HostedService {
    pub fn label(&self) -> Option<String> {
        self.properties.label.as_deref().map(decode_label)
    }

    /// Location, or the affinity group when the service is pinned to one.
    pub fn placement(&self) -> String {
        self.properties
            .location
            .clone()
            .filter(|l| !l.is_empty())
            .or_else(|| {
                self.properties
                    .affinity_group
                    .clone()
                    .map(|g| format!("affinity:{g}"))
            })
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.properties.date_created.as_deref().and_then(parse_timestamp)
    }
}

/// Body of `POST {subscriptionId}/services/hostedservices`.
#[derive(Serialize, Debug, Clone)]
#[serde(rename = "CreateHostedService")]
pub struct CreateHostedService {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,
    #[serde(rename = "ServiceName")]
    pub service_name: String,
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Location")]
    pub location: String,
}

impl CreateHostedService {
    /// `label` defaults to the service name and is base64 encoded here.
    pub fn new(
        service_name: &str,
        location: &str,
        label: Option<&str>,
        description: Option<&str>,
    ) -> Self {
        CreateHostedService {
            xmlns: XMLNS.to_string(),
            service_name: service_name.to_string(),
            label: encode_label(label.unwrap_or(service_name)),
            description: description.map(str::to_string),
            location: location.to_string(),
        }
    }
}
