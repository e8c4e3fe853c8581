//! Storage account data model.

use super::{decode_label, encode_label, XMLNS};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct StorageServiceList {
    #[serde(rename = "StorageService", default)]
    pub storage_services: Vec<StorageService>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct StorageService {
    #[serde(rename = "Url", default)]
    pub url: Option<String>,
    #[serde(rename = "ServiceName")]
    pub service_name: String,
    #[serde(rename = "StorageServiceProperties", default)]
    pub properties: StorageServiceProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct StorageServiceProperties {
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Location", default)]
    pub location: Option<String>,
    #[serde(rename = "AffinityGroup", default)]
    pub affinity_group: Option<String>,
    #[serde(rename = "Label", default)]
    pub label: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "Endpoints", default)]
    pub endpoints: Endpoints,
    #[serde(rename = "AccountType", default)]
    pub account_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Endpoints {
    #[serde(rename = "Endpoint", default)]
    pub endpoints: Vec<String>,
}

impl StorageService {
    pub fn label(&self) -> Option<String> {
        self.properties.label.as_deref().map(decode_label)
    }

    /// The blob endpoint, if the account exposes one.
    pub fn blob_endpoint(&self) -> Option<&str> {
        self.properties
            .endpoints
            .endpoints
            .iter()
            .map(String::as_str)
            .find(|e| e.contains(".blob."))
    }
}

/// Body of `POST {subscriptionId}/services/storageservices`.
#[derive(Serialize, Debug, Clone)]
#[serde(rename = "CreateStorageServiceInput")]
pub struct CreateStorageServiceInput {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,
    #[serde(rename = "ServiceName")]
    pub service_name: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "AccountType")]
    pub account_type: String,
}

pub const DEFAULT_ACCOUNT_TYPE: &str = "Standard_GRS";

impl CreateStorageServiceInput {
    pub fn new(
        service_name: &str,
        location: &str,
        label: Option<&str>,
        account_type: Option<&str>,
    ) -> Self {
        CreateStorageServiceInput {
            xmlns: XMLNS.to_string(),
            service_name: service_name.to_string(),
            description: None,
            label: encode_label(label.unwrap_or(service_name)),
            location: location.to_string(),
            account_type: account_type.unwrap_or(DEFAULT_ACCOUNT_TYPE).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::from_xml;

    #[test]
    fn test_parse_storage_services() {
        let list: StorageServiceList =
            from_xml(include_str!("../tests/test_data/storage_services.xml"))
                .expect("Error parsing storage services");
        assert_eq!(list.storage_services.len(), 1);
        let account = &list.storage_services[0];
        assert_eq!(account.service_name, "contosostore");
        assert_eq!(account.label().as_deref(), Some("contosostore"));
        assert_eq!(account.properties.endpoints.endpoints.len(), 3);
        assert_eq!(
            account.blob_endpoint(),
            Some("https://contosostore.blob.core.windows.net/")
        );
        assert_eq!(account.properties.account_type.as_deref(), Some("Standard_LRS"));
    }

    #[test]
    fn test_create_body_defaults() {
        let body = CreateStorageServiceInput::new("acct", "East US", None, None);
        assert_eq!(body.account_type, "Standard_GRS");
        let xml = quick_xml::se::to_string(&body).unwrap();
        assert!(xml.starts_with("<CreateStorageServiceInput"));
        assert!(xml.contains("<AccountType>Standard_GRS</AccountType>"));
        assert!(!xml.contains("<Description>"));
    }
}
