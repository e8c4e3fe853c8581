//! Error types shared by the pipeline, the poller and the CLI.
//!
//! Remote failures, whether reported synchronously as a 4xx/5xx response or
//! asynchronously as a `Failed` operation, are normalised into one shape:
//! [`ServiceManagementError`].

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A remote error as reported by the management API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceManagementError {
    /// HTTP status of the failing response (or the one reported by the operation).
    pub http_status: u16,
    /// Vendor error code, e.g. `ResourceNotFound`.
    pub code: Option<String>,
    /// Vendor error message.
    pub message: Option<String>,
    /// Tracking ID of the request (`x-ms-request-id`).
    pub operation_id: Option<String>,
    /// Correlation token sent by this client (`x-ms-client-request-id`).
    pub client_request_id: Option<String>,
}

impl ServiceManagementError {
    pub fn new(http_status: u16) -> Self {
        Self {
            http_status,
            ..Default::default()
        }
    }

    pub fn with_details(mut self, code: Option<String>, message: Option<String>) -> Self {
        self.code = code.filter(|c| !c.is_empty());
        self.message = message.filter(|m| !m.is_empty());
        self
    }

    pub fn with_operation_id(mut self, id: Option<String>) -> Self {
        self.operation_id = id;
        self
    }

    pub fn with_client_request_id(mut self, id: Option<String>) -> Self {
        self.client_request_id = id;
        self
    }

    /// True when the remote body could not be decoded into code/message.
    pub fn is_partial(&self) -> bool {
        self.code.is_none() && self.message.is_none()
    }
}

impl fmt::Display for ServiceManagementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.http_status)?;
        if let Some(ref code) = self.code {
            write!(f, " [{code}]")?;
        }
        match self.message {
            Some(ref message) => write!(f, ": {message}")?,
            None => write!(f, ": no error details returned")?,
        }
        if let Some(ref id) = self.operation_id {
            write!(f, " (OperationId: {id})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceManagementError {}

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Local validation failed before any network call.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 4xx/5xx response translated by the fault policy.
    #[error("Request failed: {0}")]
    Fault(ServiceManagementError),

    /// An asynchronous operation finished with status `Failed`.
    #[error("Operation failed: {0}")]
    OperationFailed(ServiceManagementError),

    #[error("Operation {operation_id} still in progress after {elapsed:?}")]
    Timeout {
        operation_id: String,
        elapsed: Duration,
    },

    /// The service returned a status this client does not know.
    #[error("Operation {operation_id} returned unrecognized status '{status}'")]
    InvalidOperation {
        operation_id: String,
        status: String,
    },

    #[error("Wait for operation {0} was cancelled")]
    Cancelled(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Profile error: {0}")]
    Profile(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn profile(msg: impl Into<String>) -> Self {
        Self::Profile(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The remote error carried by this error, if any.
    pub fn remote(&self) -> Option<&ServiceManagementError> {
        match self {
            Error::Fault(e) | Error::OperationFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(e: quick_xml::DeError) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_full_details() {
        let e = ServiceManagementError::new(404)
            .with_details(
                Some("ResourceNotFound".into()),
                Some("The hosted service does not exist.".into()),
            )
            .with_operation_id(Some("op-123".into()));
        assert_eq!(
            e.to_string(),
            "HTTP 404 [ResourceNotFound]: The hosted service does not exist. (OperationId: op-123)"
        );
        assert!(!e.is_partial());
    }

    #[test]
    fn test_display_partial() {
        let e = ServiceManagementError::new(503);
        assert_eq!(e.to_string(), "HTTP 503: no error details returned");
        assert!(e.is_partial());
    }

    #[test]
    fn test_empty_details_are_dropped() {
        let e = ServiceManagementError::new(400).with_details(Some(String::new()), None);
        assert!(e.code.is_none());
    }

    #[test]
    fn test_remote_accessor() {
        let e = Error::OperationFailed(ServiceManagementError::new(409));
        assert_eq!(e.remote().map(|r| r.http_status), Some(409));
        assert!(Error::invalid_argument("x").remote().is_none());
    }
}
