//! Azure account plumbing.
//!
//! This module handles everything needed before a request can be sent:
//! - [`cli`] - Command execution for the Azure CLI
//! - [`identity`] - Access token sources
//! - [`profile`] - Subscriptions stored on disk

mod cli;
mod identity;
mod profile;

// Re-export public types and functions
pub use cli::run;
pub use identity::{
    AccessToken, AzureCliCredential, ClientSecretCredential, StaticToken, TokenSource,
    DEFAULT_AUTHORITY, MANAGEMENT_RESOURCE,
};
pub use profile::{AuthMethod, Profile, Subscription};
