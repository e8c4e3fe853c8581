//! Deployment data model.

use super::{decode_label, XMLNS};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A deployment slot of a hosted service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentSlot {
    Production,
    Staging,
}

impl DeploymentSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentSlot::Production => "production",
            DeploymentSlot::Staging => "staging",
        }
    }
}

impl FromStr for DeploymentSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "production" => Ok(DeploymentSlot::Production),
            "staging" => Ok(DeploymentSlot::Staging),
            other => Err(Error::invalid_argument(format!(
                "Unknown deployment slot '{other}', expected production or staging"
            ))),
        }
    }
}

impl fmt::Display for DeploymentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target status of `UpdateDeploymentStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStatus {
    Running,
    Suspended,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Running => "Running",
            DeploymentStatus::Suspended => "Suspended",
        }
    }
}

impl FromStr for DeploymentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "running" => Ok(DeploymentStatus::Running),
            "suspended" => Ok(DeploymentStatus::Suspended),
            other => Err(Error::invalid_argument(format!(
                "Unknown deployment status '{other}', expected running or suspended"
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Deployment {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "DeploymentSlot", default)]
    pub slot: Option<String>,
    #[serde(rename = "PrivateID", default)]
    pub private_id: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "Label", default)]
    pub label: Option<String>,
    #[serde(rename = "Url", default)]
    pub url: Option<String>,
    #[serde(rename = "RoleInstanceList", default)]
    pub role_instances: RoleInstanceList,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RoleInstanceList {
    #[serde(rename = "RoleInstance", default)]
    pub instances: Vec<RoleInstance>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RoleInstance {
    #[serde(rename = "RoleName", default)]
    pub role_name: String,
    #[serde(rename = "InstanceName", default)]
    pub instance_name: String,
    #[serde(rename = "InstanceStatus", default)]
    pub instance_status: Option<String>,
    #[serde(rename = "PowerState", default)]
    pub power_state: Option<String>,
    #[serde(rename = "IpAddress", default)]
    pub ip_address: Option<String>,
}

impl Deployment {
    pub fn label(&self) -> Option<String> {
        self.label.as_deref().map(decode_label)
    }

    /// Instances that are not `ReadyRole`.
    pub fn unhealthy_instances(&self) -> Vec<&RoleInstance> {
        self.role_instances
            .instances
            .iter()
            .filter(|i| i.instance_status.as_deref() != Some("ReadyRole"))
            .collect()
    }
}

/// Body of `POST .../deploymentslots/{slot}/?comp=status`.
#[derive(Serialize, Debug, Clone)]
#[serde(rename = "UpdateDeploymentStatus")]
pub struct UpdateDeploymentStatus {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,
    #[serde(rename = "Status")]
    pub status: String,
}

impl UpdateDeploymentStatus {
    pub fn new(status: DeploymentStatus) -> Self {
        UpdateDeploymentStatus {
            xmlns: XMLNS.to_string(),
            status: status.as_str().to_string(),
        }
    }
}
