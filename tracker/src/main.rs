//! deploytrack - Entry Point
//!
//! Follows a resource manager template deployment until it finishes,
//! printing each operation of the deployment and of its nested deployments.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use arm_models::ProvisioningState;
use deploytrack::app::options::AppOptions;
use deploytrack::app::run::run;
use deploytrack::filesys::file::File;
use deploytrack::logs::{init_logging, LogLevel, LogOptions};
use deploytrack::storage::settings::Settings;
use deploytrack::utils::version_info;
use secrecy::SecretString;

use tracing::{error, info};

const TOKEN_ENV: &str = "ARM_ACCESS_TOKEN";
const SUBSCRIPTION_ENV: &str = "ARM_SUBSCRIPTION_ID";

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("{}", e),
        }
        return ExitCode::SUCCESS;
    }

    if cli_args.contains_key("help") {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let settings = match load_settings(&cli_args).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    let log_level = match cli_args.get("log-level") {
        Some(level) => match level.parse::<LogLevel>() {
            Ok(level) => level,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => settings.log_level.clone(),
    };
    let log_options = LogOptions {
        log_level,
        log_dir: settings.log.log_dir.clone(),
        json_format: settings.log.json_format || cli_args.contains_key("json"),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let options = match build_options(&settings, &cli_args) {
        Ok(options) => options,
        Err(e) => {
            error!("{:#}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Tracking {}/{} every {:?}",
        options.resource_group, options.deployment_name, options.tracker.interval
    );
    match run(options, await_shutdown_signal()).await {
        Ok(deployment) if deployment.provisioning_state() == &ProvisioningState::Succeeded => {
            ExitCode::SUCCESS
        }
        Ok(deployment) => {
            error!(
                "Deployment {} ended {}",
                deployment.name,
                deployment.provisioning_state()
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Failed to track deployment: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn load_settings(cli_args: &HashMap<String, String>) -> anyhow::Result<Settings> {
    let Some(path) = cli_args.get("settings") else {
        return Ok(Settings::default());
    };

    let file = File::new(PathBuf::from(path));
    let settings = file
        .read_json::<Settings>()
        .await
        .with_context(|| format!("reading {}", file.path().display()))?;
    Ok(settings)
}

fn build_options(
    settings: &Settings,
    cli_args: &HashMap<String, String>,
) -> anyhow::Result<AppOptions> {
    let resource_group = cli_args
        .get("resource-group")
        .ok_or_else(|| anyhow!("--resource-group is required"))?;
    let deployment_name = cli_args
        .get("deployment")
        .ok_or_else(|| anyhow!("--deployment is required"))?;

    let token = cli_args
        .get("token")
        .cloned()
        .or_else(|| env::var(TOKEN_ENV).ok())
        .ok_or_else(|| anyhow!("an access token is required (--token or {})", TOKEN_ENV))?;

    let mut options = AppOptions::from_settings(
        settings,
        resource_group.as_str(),
        deployment_name.as_str(),
        SecretString::from(token),
    );

    if let Some(subscription) = cli_args
        .get("subscription")
        .cloned()
        .or_else(|| env::var(SUBSCRIPTION_ENV).ok())
    {
        options.client.subscription_id = subscription;
    }
    if let Some(interval) = cli_args.get("poll-interval-ms") {
        let millis: u64 = interval
            .parse()
            .with_context(|| format!("invalid --poll-interval-ms: {}", interval))?;
        options.tracker.interval = std::time::Duration::from_millis(millis);
    }
    if let Some(depth) = cli_args.get("max-depth") {
        options.tracker.max_nesting_depth = depth
            .parse()
            .with_context(|| format!("invalid --max-depth: {}", depth))?;
    }
    options.await_creation = cli_args.contains_key("await-creation");
    options.color = !cli_args.contains_key("no-color");

    Ok(options)
}

fn print_usage() {
    eprintln!(
        "Usage: deploytrack --resource-group=<group> --deployment=<name> [--settings=<file>]\n\
         \x20                  [--subscription=<id>] [--token=<token>] [--poll-interval-ms=<ms>]\n\
         \x20                  [--max-depth=<n>] [--log-level=<level>] [--json] [--await-creation]\n\
         \x20                  [--no-color] [--version]"
    );
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Unable to install signal handlers");
                    return std::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            return std::future::pending().await;
        }
        info!("Ctrl+C received, shutting down...");
    }
}
