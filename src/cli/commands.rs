//! Command implementations

use super::args::*;
use crate::azure::{AuthMethod, Profile, Subscription};
use crate::client::{PollOptions, ServiceManagementClient};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::{
    CreateHostedService, CreateStorageServiceInput, DeploymentSlot, Location, Operation,
};
use crate::output::{self, format_field, print_rows};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// State shared by every command of one invocation.
pub struct Context {
    pub settings: Settings,
    pub subscription: Option<String>,
    pub cancel: CancellationToken,
}

impl Context {
    pub fn new(
        settings: Settings,
        subscription: Option<String>,
        cancel: CancellationToken,
    ) -> Self {
        Context {
            settings,
            subscription,
            cancel,
        }
    }

    pub fn load_profile(&self) -> Result<Profile> {
        Profile::load(&self.settings.profile_path)
    }

    pub fn client(&self) -> Result<ServiceManagementClient> {
        let profile = self.load_profile()?;
        let subscription = profile.resolve(self.subscription.as_deref())?;
        log::info!("Using subscription {} ({})", subscription.name, subscription.id);
        ServiceManagementClient::from_subscription(subscription, &self.settings)
    }
}

pub async fn run(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Operation { action } => operation_command(ctx, action).await,
        Commands::Location { action } => location_command(ctx, action).await,
        Commands::Service { action } => service_command(ctx, action).await,
        Commands::Deployment { action } => deployment_command(ctx, action).await,
        Commands::Storage { action } => storage_command(ctx, action).await,
        Commands::Profile { action } => profile_command(ctx, action),
    }
}

/// Wait for `request_id` unless `no_wait`; either way report the outcome.
async fn finish(
    ctx: &Context,
    client: &ServiceManagementClient,
    request_id: &str,
    no_wait: bool,
) -> Result<()> {
    if no_wait {
        println!("Started operation {request_id}");
        return Ok(());
    }
    let operation = client
        .wait_for_operation(request_id, Some(&ctx.cancel))
        .await?;
    print_rows(&output::operation_details(&operation));
    Ok(())
}

async fn operation_command(ctx: &Context, action: OperationCommand) -> Result<()> {
    let client = ctx.client()?;
    match action {
        OperationCommand::Status { id } => {
            let operation = client.get_operation_status(&id).await?;
            print_rows(&output::operation_details(&operation));
            if let Some(hint) = pending_hint(&operation) {
                println!("{hint}");
            }
        }
        OperationCommand::Wait {
            id,
            timeout,
            interval,
        } => {
            let options = wait_options(client.poll_options(), timeout, interval);
            let operation = client
                .wait_for_operation_with(&id, &options, Some(&ctx.cancel))
                .await?;
            print_rows(&output::operation_details(&operation));
        }
    }
    Ok(())
}

/// Suggest `operation wait` while the operation is still running.
pub fn pending_hint(operation: &Operation) -> Option<String> {
    if operation.status().is_terminal() {
        None
    } else {
        Some(format!("Run `azsm operation wait {}` to wait for completion", operation.id))
    }
}

/// Apply `--timeout` and `--interval`; an explicit interval disables backoff.
pub fn wait_options(
    base: &PollOptions,
    timeout: Option<u64>,
    interval: Option<u64>,
) -> PollOptions {
    let mut options = base.clone();
    if let Some(secs) = interval {
        options = PollOptions::fixed(Duration::from_secs(secs), options.timeout);
    }
    if let Some(secs) = timeout {
        options = options.with_timeout(Duration::from_secs(secs));
    }
    options
}

async fn location_command(ctx: &Context, action: LocationCommand) -> Result<()> {
    let client = ctx.client()?;
    match action {
        LocationCommand::List { service } => {
            let locations = offering(client.list_locations().await?, service.as_deref());
            print_rows(&output::locations_table(&locations));
        }
    }
    Ok(())
}

/// Keep the regions that offer `service`, or all of them without a filter.
pub fn offering(locations: Vec<Location>, service: Option<&str>) -> Vec<Location> {
    match service {
        Some(service) => locations.into_iter().filter(|l| l.offers(service)).collect(),
        None => locations,
    }
}

async fn service_command(ctx: &Context, action: ServiceCommand) -> Result<()> {
    let client = ctx.client()?;
    match action {
        ServiceCommand::List => {
            let services = client.list_hosted_services().await?;
            print_rows(&output::hosted_services_table(&services));
        }
        ServiceCommand::Show { name } => {
            let service = client.get_hosted_service(&name, true).await?;
            print_rows(&output::hosted_service_details(&service));
        }
        ServiceCommand::Create {
            name,
            location,
            label,
            description,
        } => {
            let input = CreateHostedService::new(
                &name,
                &location,
                label.as_deref(),
                description.as_deref(),
            );
            client.create_hosted_service(&input).await?;
            println!("Created hosted service {name}");
        }
        ServiceCommand::Delete { name, force } => {
            if force {
                for slot in [DeploymentSlot::Production, DeploymentSlot::Staging] {
                    delete_deployment_if_present(ctx, &client, &name, slot).await?;
                }
            }
            client.delete_hosted_service(&name).await?;
            println!("Deleted hosted service {name}");
        }
    }
    Ok(())
}

async fn delete_deployment_if_present(
    ctx: &Context,
    client: &ServiceManagementClient,
    service: &str,
    slot: DeploymentSlot,
) -> Result<()> {
    match client.get_deployment(service, slot).await {
        Ok(deployment) => {
            log::info!("Deleting deployment {} in {slot}", deployment.name);
            let request_id = client.delete_deployment(service, slot).await?;
            finish(ctx, client, &request_id, false).await
        }
        Err(e) if e.remote().is_some_and(|r| r.http_status == 404) => {
            log::debug!("No deployment in {slot} for {service}");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn deployment_command(ctx: &Context, action: DeploymentCommand) -> Result<()> {
    let client = ctx.client()?;
    match action {
        DeploymentCommand::Show { service, slot } => {
            let deployment = client.get_deployment(&service, slot.slot.into()).await?;
            print_rows(&output::deployment_details(&deployment));
            for instance in deployment.unhealthy_instances() {
                log::warn!(
                    "Instance {} is {}",
                    instance.instance_name,
                    instance.instance_status.as_deref().unwrap_or("unknown")
                );
            }
        }
        DeploymentCommand::SetStatus {
            service,
            status,
            slot,
            no_wait,
        } => {
            let request_id = client
                .update_deployment_status(&service, slot.slot.into(), status.into())
                .await?;
            finish(ctx, &client, &request_id, no_wait).await?;
        }
        DeploymentCommand::Delete {
            service,
            slot,
            no_wait,
        } => {
            let request_id = client.delete_deployment(&service, slot.slot.into()).await?;
            finish(ctx, &client, &request_id, no_wait).await?;
        }
    }
    Ok(())
}

async fn storage_command(ctx: &Context, action: StorageCommand) -> Result<()> {
    let client = ctx.client()?;
    match action {
        StorageCommand::List => {
            let accounts = client.list_storage_services().await?;
            print_rows(&output::storage_services_table(&accounts));
        }
        StorageCommand::Show { name } => {
            let account = client.get_storage_service(&name).await?;
            print_rows(&output::storage_services_table(std::slice::from_ref(&account)));
        }
        StorageCommand::Create {
            name,
            location,
            label,
            account_type,
            no_wait,
        } => {
            let input = CreateStorageServiceInput::new(
                &name,
                &location,
                label.as_deref(),
                account_type.as_deref(),
            );
            let request_id = client.create_storage_service(&input).await?;
            finish(ctx, &client, &request_id, no_wait).await?;
        }
        StorageCommand::Delete { name } => {
            client.delete_storage_service(&name).await?;
            println!("Deleted storage account {name}");
        }
    }
    Ok(())
}

fn profile_command(ctx: &Context, action: ProfileCommand) -> Result<()> {
    let path = &ctx.settings.profile_path;
    let mut profile = ctx.load_profile()?;
    match action {
        ProfileCommand::Show => {
            print_rows(&profile_rows(&profile));
            return Ok(());
        }
        ProfileCommand::Add(args) => {
            let make_default = args.default;
            let subscription = subscription_from_args(args)?;
            let name = subscription.name.clone();
            if profile.upsert(subscription)? {
                println!("Replaced subscription {name}");
            } else {
                println!("Added subscription {name}");
            }
            if make_default {
                profile.select(&name)?;
            }
        }
        ProfileCommand::Remove { name } => {
            let removed = profile.remove(&name)?;
            println!("Removed subscription {}", removed.name);
        }
        ProfileCommand::Select { name } => {
            let selected = profile.select(&name)?;
            println!("Default subscription is now {}", selected.name);
        }
    }
    profile.save(path)
}

pub fn profile_rows(profile: &Profile) -> Vec<String> {
    let mut rows = vec![format!(
        "  {} {} {}",
        format_field("NAME", 20),
        format_field("ID", 38),
        "AUTH"
    )];
    for s in &profile.subscriptions {
        let marker = if profile
            .default_subscription
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case(&s.name))
        {
            "*"
        } else {
            " "
        };
        rows.push(format!(
            "{marker} {} {} {}",
            format_field(&s.name, 20),
            format_field(&s.id, 38),
            s.auth.kind()
        ));
    }
    rows
}

fn required(value: Option<String>, flag: &str, auth: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::invalid_argument(format!("--{flag} is required for {auth} auth")))
}

pub fn subscription_from_args(args: ProfileAddArgs) -> Result<Subscription> {
    let auth = match args.auth {
        AuthArg::Certificate => AuthMethod::Certificate {
            path: args.certificate.ok_or_else(|| {
                Error::invalid_argument("--certificate is required for certificate auth")
            })?,
            password_env: args.password_env,
        },
        AuthArg::ClientSecret => AuthMethod::ClientSecret {
            tenant_id: required(args.tenant_id, "tenant-id", "client-secret")?,
            client_id: required(args.client_id, "client-id", "client-secret")?,
            secret_env: required(args.secret_env, "secret-env", "client-secret")?,
            authority: args.authority,
        },
        AuthArg::AzCli => AuthMethod::AzCli,
        AuthArg::Token => AuthMethod::Token {
            token_env: required(args.token_env, "token-env", "token")?,
        },
    };
    let subscription = Subscription {
        name: args.name,
        id: args.id,
        management_endpoint: args.endpoint,
        auth,
    };
    subscription.validate()?;
    Ok(subscription)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{from_xml, LocationList};
    use std::path::Path;

    const DEV_ID: &str = "00000000-1111-2222-3333-444444444444";

    fn add_args(name: &str, auth: AuthArg) -> ProfileAddArgs {
        ProfileAddArgs {
            name: name.into(),
            id: DEV_ID.into(),
            auth,
            certificate: None,
            password_env: None,
            tenant_id: None,
            client_id: None,
            secret_env: None,
            authority: None,
            token_env: None,
            endpoint: None,
            default: false,
        }
    }

    fn context(path: &Path) -> Context {
        let settings = Settings {
            profile_path: path.to_path_buf(),
            ..Default::default()
        };
        Context::new(settings, None, CancellationToken::new())
    }

    #[test]
    fn test_subscription_from_args() {
        let sub = subscription_from_args(add_args("lab", AuthArg::AzCli)).unwrap();
        assert_eq!(sub.auth, AuthMethod::AzCli);

        let err = subscription_from_args(add_args("prod", AuthArg::ClientSecret)).unwrap_err();
        assert!(err.to_string().contains("--tenant-id"));

        let mut gov = add_args("gov", AuthArg::ClientSecret);
        gov.tenant_id = Some("t1".into());
        gov.client_id = Some("c1".into());
        gov.secret_env = Some("GOV_SECRET".into());
        gov.authority = Some("https://login.microsoftonline.us".into());
        match subscription_from_args(gov).unwrap().auth {
            AuthMethod::ClientSecret { authority, .. } => {
                assert_eq!(authority.as_deref(), Some("https://login.microsoftonline.us"))
            }
            other => panic!("unexpected auth {other:?}"),
        }

        let mut token = add_args("ci", AuthArg::Token);
        token.token_env = Some("CI_TOKEN".into());
        assert_eq!(
            subscription_from_args(token).unwrap().auth,
            AuthMethod::Token {
                token_env: "CI_TOKEN".into()
            }
        );

        let mut bad_id = add_args("x", AuthArg::AzCli);
        bad_id.id = "not-a-guid".into();
        assert!(subscription_from_args(bad_id).is_err());
    }

    #[test]
    fn test_profile_add_select_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let ctx = context(&path);

        let mut args = add_args("lab", AuthArg::AzCli);
        args.default = true;
        profile_command(&ctx, ProfileCommand::Add(args)).unwrap();

        let profile = Profile::load(&path).unwrap();
        assert_eq!(profile.subscriptions.len(), 1);
        assert_eq!(profile.default_subscription.as_deref(), Some("lab"));
        let rows = profile_rows(&profile);
        assert!(rows[1].starts_with("* lab"));
        assert!(rows[1].ends_with("az_cli"));

        profile_command(&ctx, ProfileCommand::Remove { name: "lab".into() }).unwrap();
        let profile = Profile::load(&path).unwrap();
        assert!(profile.subscriptions.is_empty());
        assert!(profile.default_subscription.is_none());
    }

    #[test]
    fn test_select_unknown_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir.path().join("profile.json"));
        assert!(matches!(
            profile_command(&ctx, ProfileCommand::Select { name: "nope".into() }),
            Err(Error::Profile(_))
        ));
    }

    #[test]
    fn test_client_without_subscriptions() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir.path().join("profile.json"));
        assert!(matches!(ctx.client(), Err(Error::Profile(_))));
    }

    #[test]
    fn test_pending_hint_only_while_running() {
        let running =
            Operation::from_body(include_str!("../tests/test_data/operation_in_progress.xml"))
                .unwrap();
        let hint = pending_hint(&running).unwrap();
        assert!(hint.contains("azsm operation wait op-123"));

        let done = Operation::from_body(include_str!("../tests/test_data/operation_succeeded.xml"))
            .unwrap();
        assert!(pending_hint(&done).is_none());
    }

    #[test]
    fn test_location_filter() {
        let list: LocationList =
            from_xml(include_str!("../tests/test_data/locations.xml")).unwrap();
        assert_eq!(offering(list.locations.clone(), None).len(), 2);
        assert_eq!(offering(list.locations.clone(), Some("compute")).len(), 2);

        let vm = offering(list.locations.clone(), Some("PersistentVMRole"));
        assert_eq!(vm.len(), 1);
        assert_eq!(vm[0].name, "West US");
        assert!(offering(list.locations, Some("HDInsight")).is_empty());
    }

    #[test]
    fn test_wait_options() {
        let base = PollOptions::default();
        let options = wait_options(&base, Some(3), Some(1));
        assert_eq!(options.interval, Duration::from_secs(1));
        assert_eq!(options.max_interval, Duration::from_secs(1));
        assert_eq!(options.timeout, Duration::from_secs(3));
        assert_eq!(wait_options(&base, None, None), base);
    }
}
