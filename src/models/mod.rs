//! Wire models of the management API.
//!
//! This module contains the data transfer objects returned and accepted by
//! the service:
//! - [`Operation`] - asynchronous operation status
//! - [`HostedService`] and [`Deployment`] - cloud services
//! - [`StorageService`] - storage accounts
//! - [`Location`] - regions

mod deployment;
mod hosted_service;
mod location;
mod operation;
mod storage;

pub use deployment::{
    Deployment, DeploymentSlot, DeploymentStatus, RoleInstance, RoleInstanceList,
    UpdateDeploymentStatus,
};
pub use hosted_service::{
    CreateHostedService, DeploymentList, HostedService, HostedServiceList, HostedServiceProperties,
};
pub use location::{AvailableServices, Location, LocationList};
pub use operation::{ErrorDetails, Operation, OperationStatus};
pub use storage::{
    CreateStorageServiceInput, Endpoints, StorageService, StorageServiceList,
    StorageServiceProperties, DEFAULT_ACCOUNT_TYPE,
};

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Namespace of every RDFE document.
pub const XMLNS: &str = "http://schemas.microsoft.com/windowsazure";

/// Deserialize an RDFE XML document.
pub fn from_xml<T: DeserializeOwned>(xml: &str) -> Result<T> {
    quick_xml::de::from_str(xml.trim_start_matches('\u{feff}'))
        .map_err(|e| Error::serialization(format!("Error parsing XML: {e}")))
}

/// Serialize a request body, with the XML declaration the service expects.
pub fn to_xml<T: Serialize>(value: &T) -> Result<String> {
    let body = quick_xml::se::to_string(value)
        .map_err(|e| Error::serialization(format!("Error serializing XML: {e}")))?;
    Ok(format!(r#"<?xml version="1.0" encoding="utf-8"?>{body}"#))
}

pub fn encode_label(label: &str) -> String {
    STANDARD.encode(label.as_bytes())
}

/// Decode a base64 label; labels that are not base64 are returned as-is.
pub fn decode_label(label: &str) -> String {
    STANDARD
        .decode(label.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| label.to_string())
}

/// Parse the timestamps RDFE returns (`2014-02-12T23:51:23Z`, sometimes without zone).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|n| n.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip_and_fallback() {
        assert_eq!(encode_label("web"), "d2Vi");
        assert_eq!(decode_label("d2Vi"), "web");
        assert_eq!(decode_label("not base64!"), "not base64!");
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2014-02-12T23:51:23Z").is_some());
        assert!(parse_timestamp("2014-02-12T23:51:23").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_to_xml_declaration() {
        let xml = to_xml(&UpdateDeploymentStatus::new(DeploymentStatus::Suspended)).unwrap();
        let declaration = "<?xml version=\"1.0\" encoding=\"utf-8\"?>";
        assert!(xml.starts_with(&format!("{declaration}<UpdateDeploymentStatus")));
    }
}
