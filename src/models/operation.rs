//! Asynchronous operation status.

use crate::error::{Error, Result, ServiceManagementError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a tracked operation as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed,
    /// Anything this client does not know about.
    Unknown(String),
}

impl OperationStatus {
    /// Case-insensitive parse; unknown values are kept verbatim.
    pub fn parse(value: &str) -> OperationStatus {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("InProgress") {
            OperationStatus::InProgress
        } else if trimmed.eq_ignore_ascii_case("Succeeded") {
            OperationStatus::Succeeded
        } else if trimmed.eq_ignore_ascii_case("Failed") {
            OperationStatus::Failed
        } else {
            OperationStatus::Unknown(trimmed.to_string())
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Succeeded | OperationStatus::Failed)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::InProgress => write!(f, "InProgress"),
            OperationStatus::Succeeded => write!(f, "Succeeded"),
            OperationStatus::Failed => write!(f, "Failed"),
            OperationStatus::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// Error block of a failed operation.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ErrorDetails {
    #[serde(rename = "Code", alias = "code", default)]
    pub code: Option<String>,
    #[serde(rename = "Message", alias = "message", default)]
    pub message: Option<String>,
}

/// Body of `GET {subscriptionId}/operations/{requestId}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Operation {
    #[serde(rename = "ID", alias = "id", default)]
    pub id: String,
    #[serde(rename = "Status", alias = "status", default)]
    pub status: String,
    #[serde(rename = "HttpStatusCode", alias = "httpStatusCode", default)]
    pub http_status_code: Option<u16>,
    #[serde(rename = "Error", alias = "error", default)]
    pub error: Option<ErrorDetails>,
}

impl Operation {
    /// Parse an RDFE XML or CSM JSON operation document.
    pub fn from_body(body: &str) -> Result<Operation> {
        let body = body.trim_start_matches('\u{feff}').trim();
        if body.starts_with('<') {
            return quick_xml::de::from_str(body)
                .map_err(|e| Error::serialization(format!("Error parsing operation XML: {e}")));
        }
        let mut de = serde_json::Deserializer::from_str(body);
        serde_path_to_error::deserialize(&mut de).map_err(|e| {
            Error::serialization(format!(
                "Error parsing operation JSON: path={} error={e}",
                e.path()
            ))
        })
    }

    pub fn status(&self) -> OperationStatus {
        OperationStatus::parse(&self.status)
    }

    /// The remote error of a failed operation, in the common error shape.
    pub fn to_error(&self, operation_id: &str) -> ServiceManagementError {
        let details = self.error.clone().unwrap_or_default();
        let id = if self.id.is_empty() {
            operation_id
        } else {
            &self.id
        };
        ServiceManagementError::new(self.http_status_code.unwrap_or(0))
            .with_details(details.code, details.message)
            .with_operation_id(Some(id.to_string()))
    }
}
