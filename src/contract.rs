//! Service contracts: the verb and URI template of each remote operation.

use crate::error::{Error, Result};
use regex::Regex;
use reqwest::Method;
use std::sync::OnceLock;

/// One remote operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub name: &'static str,
    pub method: Method,
    /// Relative to the management endpoint, e.g. `{subscriptionId}/locations`.
    pub uri_template: &'static str,
    /// The service answers `202 Accepted` and the work continues asynchronously.
    pub is_async: bool,
}

macro_rules! contract {
    ($fn_name:ident, $name:literal, $method:ident, $template:expr, $is_async:literal) => {
        pub fn $fn_name() -> Contract {
            Contract {
                name: $name,
                method: Method::$method,
                uri_template: $template,
                is_async: $is_async,
            }
        }
    };
}

contract!(list_locations, "ListLocations", GET, "{subscriptionId}/locations", false);
contract!(
    list_hosted_services,
    "ListHostedServices",
    GET,
    "{subscriptionId}/services/hostedservices",
    false
);
contract!(
    get_hosted_service,
    "GetHostedService",
    GET,
    "{subscriptionId}/services/hostedservices/{serviceName}?embed-detail={embedDetail}",
    false
);
contract!(
    create_hosted_service,
    "CreateHostedService",
    POST,
    "{subscriptionId}/services/hostedservices",
    false
);
contract!(
    delete_hosted_service,
    "DeleteHostedService",
    DELETE,
    "{subscriptionId}/services/hostedservices/{serviceName}",
    false
);
contract!(
    get_deployment_by_slot,
    "GetDeploymentBySlot",
    GET,
    "{subscriptionId}/services/hostedservices/{serviceName}/deploymentslots/{deploymentSlot}",
    false
);
contract!(
    update_deployment_status,
    "UpdateDeploymentStatus",
    POST,
    concat!(
        "{subscriptionId}/services/hostedservices/{serviceName}",
        "/deploymentslots/{deploymentSlot}/?comp=status"
    ),
    true
);
contract!(
    delete_deployment,
    "DeleteDeploymentBySlot",
    DELETE,
    "{subscriptionId}/services/hostedservices/{serviceName}/deploymentslots/{deploymentSlot}",
    true
);
contract!(
    list_storage_services,
    "ListStorageServices",
    GET,
    "{subscriptionId}/services/storageservices",
    false
);
contract!(
    get_storage_service,
    "GetStorageService",
    GET,
    "{subscriptionId}/services/storageservices/{serviceName}",
    false
);
contract!(
    create_storage_service,
    "CreateStorageService",
    POST,
    "{subscriptionId}/services/storageservices",
    true
);
contract!(
    delete_storage_service,
    "DeleteStorageService",
    DELETE,
    "{subscriptionId}/services/storageservices/{serviceName}",
    false
);
contract!(
    get_operation_status,
    "GetOperationStatus",
    GET,
    "{subscriptionId}/operations/{requestId}",
    false
);

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\{([A-Za-z]+)\}").expect("Invalid Regex"))
}

impl Contract {
    /// Placeholder names in template order.
    pub fn parameters(&self) -> Vec<&'static str> {
        get_placeholder_regex()
            .captures_iter(self.uri_template)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Expand the template against `base`. Every placeholder needs a non-empty value.
    pub fn url(&self, base: &str, params: &[(&str, &str)]) -> Result<String> {
        for name in self.parameters() {
            match params.iter().find(|(k, _)| *k == name) {
                Some((_, v)) if !v.trim().is_empty() => {}
                _ => {
                    return Err(Error::invalid_argument(format!(
                        "{}: parameter '{name}' is required",
                        self.name
                    )))
                }
            }
        }

        let path = get_placeholder_regex().replace_all(self.uri_template, |caps: &regex::Captures| {
            let name = &caps[1];
            params
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| urlencoding::encode(v.trim()).into_owned())
                .unwrap_or_default()
        });

        Ok(format!("{}/{}", base.trim_end_matches('/'), path))
    }
}
