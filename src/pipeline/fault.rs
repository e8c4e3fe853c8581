//! Fault translation: 4xx/5xx responses become [`ServiceManagementError`].
//!
//! Error bodies come as RDFE XML (`<Error><Code/><Message/></Error>`) or as
//! CSM JSON (`{"error":{"code":..,"message":..}}`). A body that cannot be
//! decoded still yields an error carrying the HTTP status and tracking ID.

use super::message::{Request, Response};
use super::policy::{Policy, PipelineContext};
use crate::error::{Error, Result, ServiceManagementError};
use async_trait::async_trait;
use serde::Deserialize;

/// Statuses the management API uses to report failure.
pub fn is_fault_status(status: u16) -> bool {
    (400..=599).contains(&status)
}

#[derive(Debug, Default, Deserialize)]
struct XmlErrorBody {
    #[serde(rename = "Code", default)]
    code: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonErrorDetail {
    #[serde(default, alias = "Code")]
    code: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonErrorBody {
    #[serde(default, alias = "Error")]
    error: Option<JsonErrorDetail>,
    #[serde(default, alias = "Code")]
    code: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

/// Decode `(code, message)` from an error body.
///
/// Returns `None` when the body is empty or not a recognised error document.
pub fn parse_error_body(body: &str) -> Option<(Option<String>, Option<String>)> {
    let body = body.trim_start_matches('\u{feff}').trim();
    if body.is_empty() {
        return None;
    }

    let (code, message) = if body.starts_with('<') {
        match quick_xml::de::from_str::<XmlErrorBody>(body) {
            Ok(parsed) => (parsed.code, parsed.message),
            Err(e) => {
                log::debug!("Error body is not RDFE XML: {e}");
                return None;
            }
        }
    } else {
        let mut de = serde_json::Deserializer::from_str(body);
        match serde_path_to_error::deserialize::<_, JsonErrorBody>(&mut de) {
            Ok(parsed) => match parsed.error {
                Some(detail) => (detail.code, detail.message),
                None => (parsed.code, parsed.message),
            },
            Err(e) => {
                log::debug!("Error body is not JSON: path={} error={e}", e.path());
                return None;
            }
        }
    };

    let code = code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
    let message = message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty());
    if code.is_none() && message.is_none() {
        None
    } else {
        Some((code, message))
    }
}

/// Build the typed error for a failing response.
pub fn translate_fault(
    response: &Response,
    client_request_id: Option<String>,
) -> ServiceManagementError {
    let mut error = ServiceManagementError::new(response.status)
        .with_operation_id(response.request_id())
        .with_client_request_id(client_request_id);

    if let Some(ref reason) = response.body_error {
        log::debug!("HTTP {} body unavailable: {reason}", response.status);
        return error;
    }

    match parse_error_body(&response.text()) {
        Some((code, message)) => error = error.with_details(code, message),
        None => log::debug!(
            "HTTP {} body has no error details ({} bytes)",
            response.status,
            response.body.len()
        ),
    }
    error
}

/// Turns fault statuses into [`Error::Fault`].
#[derive(Debug, Clone, Default)]
pub struct FaultPolicy;

#[async_trait]
impl Policy for FaultPolicy {
    fn on_response(
        &self,
        request: &Request,
        response: Response,
        ctx: &PipelineContext,
    ) -> Result<Response> {
        if !is_fault_status(response.status) {
            return Ok(response);
        }
        let error = translate_fault(&response, ctx.client_request_id.clone());
        log::warn!("{} {} failed: {error}", request.method, request.url);
        Err(Error::Fault(error))
    }
}
