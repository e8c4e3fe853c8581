//! Client for the Azure Service Management (RDFE) API.
//!
//! - [`pipeline`] - request policies, transport and fault translation
//! - [`client`] - typed operations and operation polling
//! - [`models`] - wire documents
//! - [`azure`] - profile, credentials and the `az` CLI
//! - [`cli`] - the `azsm` command line

pub mod azure;
pub mod cli;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod pipeline;

pub use client::{poll_operation, PollOptions, ServiceManagementClient};
pub use config::Settings;
pub use error::{Error, Result, ServiceManagementError};
pub use models::{Operation, OperationStatus};
