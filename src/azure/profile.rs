//! Subscription profile stored on disk.
//!
//! The profile lists the subscriptions this client can talk to, how each one
//! authenticates, and which one is used when none is named.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static GUID_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_guid_regex() -> &'static Regex {
    GUID_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("Invalid Regex")
    })
}

/// How requests for a subscription are authenticated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthMethod {
    /// Management certificate (PKCS#12). The password is read from `password_env`.
    Certificate {
        path: PathBuf,
        #[serde(default)]
        password_env: Option<String>,
    },
    /// Service principal; the secret is read from `secret_env`.
    ClientSecret {
        tenant_id: String,
        client_id: String,
        secret_env: String,
        /// Identity authority for sovereign clouds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        authority: Option<String>,
    },
    /// Token from the Azure CLI login session.
    AzCli,
    /// Bearer token read from `token_env`.
    Token { token_env: String },
}

impl AuthMethod {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthMethod::Certificate { .. } => "certificate",
            AuthMethod::ClientSecret { .. } => "client_secret",
            AuthMethod::AzCli => "az_cli",
            AuthMethod::Token { .. } => "token",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Subscription {
    pub name: String,
    pub id: String,
    /// Overrides the configured endpoint for this subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_endpoint: Option<String>,
    pub auth: AuthMethod,
}

impl Subscription {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_argument("Subscription name must not be empty"));
        }
        if !get_guid_regex().is_match(self.id.trim()) {
            return Err(Error::invalid_argument(format!(
                "Subscription id '{}' is not a GUID",
                self.id
            )));
        }
        Ok(())
    }

    fn matches(&self, name_or_id: &str) -> bool {
        self.name.eq_ignore_ascii_case(name_or_id) || self.id.eq_ignore_ascii_case(name_or_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_subscription: Option<String>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

impl Profile {
    /// Read the profile; a missing file is an empty profile.
    pub fn load(path: &Path) -> Result<Profile> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No profile at {}, starting empty", path.display());
                return Ok(Profile::default());
            }
            Err(e) => return Err(e.into()),
        };
        log::debug!("Reading profile {}", path.display());

        let mut de = serde_json::Deserializer::from_str(&json);
        serde_path_to_error::deserialize(&mut de).map_err(|e| {
            Error::profile(format!(
                "Error parsing {}: path={} error={e}",
                path.display(),
                e.path()
            ))
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Wrote profile {}", path.display());
        Ok(())
    }

    /// Add a subscription, replacing one with the same name. Returns true on replace.
    pub fn upsert(&mut self, subscription: Subscription) -> Result<bool> {
        subscription.validate()?;
        let replaced = match self
            .subscriptions
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(&subscription.name))
        {
            Some(existing) => {
                *existing = subscription;
                true
            }
            None => {
                self.subscriptions.push(subscription);
                false
            }
        };
        Ok(replaced)
    }

    pub fn remove(&mut self, name_or_id: &str) -> Result<Subscription> {
        let index = self
            .subscriptions
            .iter()
            .position(|s| s.matches(name_or_id))
            .ok_or_else(|| Error::profile(format!("Unknown subscription '{name_or_id}'")))?;
        let removed = self.subscriptions.remove(index);
        if self
            .default_subscription
            .as_deref()
            .is_some_and(|d| removed.matches(d))
        {
            self.default_subscription = None;
        }
        Ok(removed)
    }

    pub fn select(&mut self, name_or_id: &str) -> Result<&Subscription> {
        let index = self
            .subscriptions
            .iter()
            .position(|s| s.matches(name_or_id))
            .ok_or_else(|| Error::profile(format!("Unknown subscription '{name_or_id}'")))?;
        self.default_subscription = Some(self.subscriptions[index].name.clone());
        Ok(&self.subscriptions[index])
    }

    /// The named subscription, else the default, else the only one.
    pub fn resolve(&self, name_or_id: Option<&str>) -> Result<&Subscription> {
        if let Some(wanted) = name_or_id.or(self.default_subscription.as_deref()) {
            return self
                .subscriptions
                .iter()
                .find(|s| s.matches(wanted))
                .ok_or_else(|| Error::profile(format!("Unknown subscription '{wanted}'")));
        }
        match self.subscriptions.as_slice() {
            [only] => Ok(only),
            [] => Err(Error::profile("No subscriptions in profile")),
            _ => Err(Error::profile(
                "Several subscriptions in profile and no default selected",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "src/tests/test_data/profile.json";

    fn lab() -> Subscription {
        Subscription {
            name: "lab2".into(),
            id: "12345678-aaaa-bbbb-cccc-1234567890ab".into(),
            management_endpoint: None,
            auth: AuthMethod::Token {
                token_env: "AZSM_TOKEN".into(),
            },
        }
    }

    #[test]
    fn test_load_sample() {
        let profile = Profile::load(Path::new(SAMPLE)).expect("Error reading profile");
        assert_eq!(profile.subscriptions.len(), 3);
        assert_eq!(profile.resolve(None).unwrap().name, "contoso-dev");
        assert_eq!(profile.subscriptions[1].auth.kind(), "client_secret");
        assert_eq!(profile.subscriptions[2].auth, AuthMethod::AzCli);
        let by_id = profile
            .resolve(Some("55555555-6666-7777-8888-999999999999"))
            .unwrap();
        assert_eq!(by_id.name, "contoso-prod");
    }

    #[test]
    fn test_load_missing_is_empty() {
        let profile = Profile::load(Path::new("src/tests/test_data/nope.json")).unwrap();
        assert!(profile.subscriptions.is_empty());
        assert!(profile.resolve(None).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("profile.json");
        let mut profile = Profile::default();
        assert!(!profile.upsert(lab()).unwrap());
        profile.save(&path).unwrap();

        let reloaded = Profile::load(&path).unwrap();
        assert_eq!(reloaded, profile);
        assert_eq!(reloaded.resolve(None).unwrap().name, "lab2");
    }

    #[test]
    fn test_upsert_replaces_and_validates() {
        let mut profile = Profile::default();
        profile.upsert(lab()).unwrap();
        let mut changed = lab();
        changed.auth = AuthMethod::AzCli;
        assert!(profile.upsert(changed).unwrap());
        assert_eq!(profile.subscriptions.len(), 1);
        assert_eq!(profile.subscriptions[0].auth, AuthMethod::AzCli);

        let mut bad = lab();
        bad.id = "not-a-guid".into();
        assert!(matches!(profile.upsert(bad), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_select_and_remove_default() {
        let mut profile = Profile::load(Path::new(SAMPLE)).unwrap();
        profile.select("contoso-lab").unwrap();
        assert_eq!(profile.resolve(None).unwrap().name, "contoso-lab");

        profile.remove("contoso-lab").unwrap();
        assert!(profile.default_subscription.is_none());
        assert!(profile.resolve(None).is_err());
        assert!(profile.remove("contoso-lab").is_err());
    }
}
