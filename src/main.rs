use azure_service_management::cli::{args::Cli, commands, exit_code, run_until_cancelled};
use azure_service_management::{logging, Settings};
use clap::Parser;
use colored::Colorize;
use std::error::Error;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logger(cli.verbose, cli.quiet)?;
    log::info!("#Start main()");

    let mut settings = Settings::from_env()?;
    if let Some(path) = cli.profile {
        settings.profile_path = path;
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Received Ctrl+C, cancelling");
            on_ctrl_c.cancel();
        }
    });

    let ctx = commands::Context::new(settings, cli.subscription, cancel);
    let command = commands::run(&ctx, cli.command);
    if let Err(e) = run_until_cancelled(command, &ctx.cancel).await {
        log::error!("{e:?}");
        eprintln!("{} {e}", "Error:".red());
        std::process::exit(exit_code(&e));
    }

    Ok(())
}
