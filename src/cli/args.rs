//! Command line argument definitions

use crate::models::{DeploymentSlot, DeploymentStatus};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "azsm")]
#[command(about = "Manage cloud services, storage and operations via Service Management")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Subscription name or id from the profile
    #[arg(long, global = true, env = "AZURE_SM_SUBSCRIPTION")]
    pub subscription: Option<String>,

    /// Profile file, overrides AZURE_SM_PROFILE
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Asynchronous operation status
    Operation {
        #[command(subcommand)]
        action: OperationCommand,
    },

    /// Regions
    Location {
        #[command(subcommand)]
        action: LocationCommand,
    },

    /// Hosted (cloud) services
    Service {
        #[command(subcommand)]
        action: ServiceCommand,
    },

    /// Deployments of a hosted service
    Deployment {
        #[command(subcommand)]
        action: DeploymentCommand,
    },

    /// Storage accounts
    Storage {
        #[command(subcommand)]
        action: StorageCommand,
    },

    /// Subscriptions in the local profile
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum OperationCommand {
    /// Show the current status of an operation
    Status { id: String },

    /// Poll an operation until it completes
    Wait {
        id: String,

        #[arg(long, help = "Give up after this many seconds")]
        timeout: Option<u64>,

        #[arg(long, help = "Fixed poll interval in seconds")]
        interval: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum LocationCommand {
    /// List regions available to the subscription
    List {
        #[arg(long, help = "Only regions offering this service, e.g. Compute")]
        service: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ServiceCommand {
    List,

    Show {
        name: String,
    },

    Create {
        name: String,

        #[arg(long)]
        location: String,

        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    Delete {
        name: String,

        #[arg(long, help = "Delete the production and staging deployments first")]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SlotArgs {
    #[arg(long, value_enum, default_value = "production")]
    pub slot: SlotArg,
}

#[derive(Subcommand, Debug)]
pub enum DeploymentCommand {
    Show {
        service: String,

        #[command(flatten)]
        slot: SlotArgs,
    },

    /// Start or suspend the deployment
    SetStatus {
        service: String,

        #[arg(value_enum)]
        status: StatusArg,

        #[command(flatten)]
        slot: SlotArgs,

        #[arg(long, help = "Return the tracking id without waiting")]
        no_wait: bool,
    },

    Delete {
        service: String,

        #[command(flatten)]
        slot: SlotArgs,

        #[arg(long, help = "Return the tracking id without waiting")]
        no_wait: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum StorageCommand {
    List,

    Show {
        name: String,
    },

    Create {
        name: String,

        #[arg(long)]
        location: String,

        #[arg(long)]
        label: Option<String>,

        #[arg(long, help = "Standard_LRS, Standard_ZRS, Standard_GRS or Standard_RAGRS")]
        account_type: Option<String>,

        #[arg(long, help = "Return the tracking id without waiting")]
        no_wait: bool,
    },

    Delete {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// List subscriptions
    Show,

    /// Add or replace a subscription
    Add(ProfileAddArgs),

    Remove {
        name: String,
    },

    /// Make a subscription the default
    Select {
        name: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ProfileAddArgs {
    pub name: String,

    /// Subscription id (GUID)
    pub id: String,

    #[arg(long, value_enum)]
    pub auth: AuthArg,

    #[arg(long, help = "PKCS#12 management certificate")]
    pub certificate: Option<PathBuf>,

    #[arg(long, help = "Variable holding the certificate password")]
    pub password_env: Option<String>,

    #[arg(long)]
    pub tenant_id: Option<String>,

    #[arg(long)]
    pub client_id: Option<String>,

    #[arg(long, help = "Variable holding the client secret")]
    pub secret_env: Option<String>,

    #[arg(long, help = "Identity authority, e.g. https://login.microsoftonline.us")]
    pub authority: Option<String>,

    #[arg(long, help = "Variable holding a bearer token")]
    pub token_env: Option<String>,

    #[arg(long, help = "Management endpoint for this subscription")]
    pub endpoint: Option<String>,

    #[arg(long, help = "Make this the default subscription")]
    pub default: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum AuthArg {
    Certificate,
    ClientSecret,
    AzCli,
    Token,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum SlotArg {
    Production,
    Staging,
}

impl From<SlotArg> for DeploymentSlot {
    fn from(slot: SlotArg) -> Self {
        match slot {
            SlotArg::Production => DeploymentSlot::Production,
            SlotArg::Staging => DeploymentSlot::Staging,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum StatusArg {
    Running,
    Suspended,
}

impl From<StatusArg> for DeploymentStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Running => DeploymentStatus::Running,
            StatusArg::Suspended => DeploymentStatus::Suspended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_operation_wait() {
        let cli = Cli::parse_from([
            "azsm", "--subscription", "dev", "operation", "wait", "op-123", "--timeout", "3",
            "--interval", "1",
        ]);
        assert_eq!(cli.subscription.as_deref(), Some("dev"));
        match cli.command {
            Commands::Operation {
                action: OperationCommand::Wait { id, timeout, interval },
            } => {
                assert_eq!(id, "op-123");
                assert_eq!(timeout, Some(3));
                assert_eq!(interval, Some(1));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_set_status_defaults_to_production() {
        let cli = Cli::parse_from(["azsm", "deployment", "set-status", "web", "suspended"]);
        match cli.command {
            Commands::Deployment {
                action:
                    DeploymentCommand::SetStatus {
                        service,
                        status,
                        slot,
                        no_wait,
                    },
            } => {
                assert_eq!(service, "web");
                assert_eq!(DeploymentStatus::from(status), DeploymentStatus::Suspended);
                assert_eq!(DeploymentSlot::from(slot.slot), DeploymentSlot::Production);
                assert!(!no_wait);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_profile_add() {
        let cli = Cli::parse_from([
            "azsm",
            "profile",
            "add",
            "prod",
            "55555555-6666-7777-8888-999999999999",
            "--auth",
            "client-secret",
            "--tenant-id",
            "t1",
            "--client-id",
            "c1",
            "--secret-env",
            "PROD_SECRET",
            "--default",
        ]);
        match cli.command {
            Commands::Profile {
                action: ProfileCommand::Add(args),
            } => {
                assert_eq!(args.auth, AuthArg::ClientSecret);
                assert_eq!(args.secret_env.as_deref(), Some("PROD_SECRET"));
                assert!(args.default);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_location_filter() {
        let cli = Cli::parse_from(["azsm", "location", "list", "--service", "Storage"]);
        match cli.command {
            Commands::Location {
                action: LocationCommand::List { service },
            } => assert_eq!(service.as_deref(), Some("Storage")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_unknown_slot_rejected() {
        let args = ["azsm", "deployment", "show", "web", "--slot", "blue"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
