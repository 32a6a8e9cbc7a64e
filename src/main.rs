//! cinder-huawei-backend - hook entry point
//!
//! Renders the Huawei driver configuration for a Cinder storage backend and
//! prints the relation data the principal should receive.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use cinder_huawei_backend::cli::{self, Cli, Commands};
use cinder_huawei_backend::template::DEFAULT_TEMPLATE;
use cinder_huawei_backend::translator::select_protocol;
use cinder_huawei_backend::validator::{PresenceValidator, Validator};
use cinder_huawei_backend::{
    CinderHuaweiPlugin, ConfigInput, ConfigOutcome, ConfigTranslator, MANDATORY_CONFIG,
};

/// Exit status when mandatory options are missing
const EXIT_BLOCKED: u8 = 2;

/// Initialize logging; stdout is reserved for machine-readable output
fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_logger();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Render {
            config,
            app_name,
            base_dir,
            owner,
            group,
            no_chown,
            template,
            dry_run,
        } => {
            let settings = cli::translator_settings(base_dir, owner, group, no_chown, template);
            let plugin = CinderHuaweiPlugin::new(ConfigTranslator::new(settings));
            let config = load_config(&config)?;

            if dry_run {
                return preview(&plugin, &config, &app_name);
            }
            render(&plugin, &config, &app_name)
        }
        Commands::Validate { config } => {
            let plugin = CinderHuaweiPlugin::new(ConfigTranslator::default());
            validate(&plugin, &config)
        }
        Commands::ShowTemplate => {
            print!("{}", DEFAULT_TEMPLATE);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: &Path) -> Result<ConfigInput> {
    info!("Loading configuration from: {:?}", path);
    ConfigInput::load_from_file(path)
        .with_context(|| format!("Failed to load configuration from {:?}", path))
}

fn render(plugin: &CinderHuaweiPlugin, config: &ConfigInput, app_name: &str) -> Result<ExitCode> {
    let outcome = plugin
        .on_config(config, app_name)
        .with_context(|| format!("Failed to configure backend for {app_name}"))?;

    match outcome {
        ConfigOutcome::Ready {
            status,
            relation,
            conf_file,
            ..
        } => {
            println!("{}", serde_json::to_string_pretty(&relation)?);
            eprintln!("✓ {} ({})", status.message(), conf_file.display());
            Ok(ExitCode::SUCCESS)
        }
        ConfigOutcome::Blocked { status, .. } => {
            eprintln!("✗ {}", status.message());
            Ok(ExitCode::from(EXIT_BLOCKED))
        }
    }
}

fn preview(plugin: &CinderHuaweiPlugin, config: &ConfigInput, app_name: &str) -> Result<ExitCode> {
    let missing = PresenceValidator.missing(config, MANDATORY_CONFIG);
    if !missing.is_empty() {
        eprintln!("✗ Missing option(s): {}", missing.join(", "));
        return Ok(ExitCode::from(EXIT_BLOCKED));
    }

    let plan = plugin
        .translator()
        .plan(config, app_name)
        .context("Failed to render driver configuration")?;
    let relation = plugin.relation_data(config, app_name, &plan.options)?;

    eprintln!("--- {} (not written)", plan.path.display());
    eprint!("{}", String::from_utf8_lossy(&plan.content));
    println!("{}", serde_json::to_string_pretty(&relation)?);
    Ok(ExitCode::SUCCESS)
}

fn validate(plugin: &CinderHuaweiPlugin, path: &Path) -> Result<ExitCode> {
    let config = load_config(path)?;

    let missing = PresenceValidator.missing(&config, MANDATORY_CONFIG);
    let protocol = select_protocol(&config);

    if missing.is_empty() && protocol.is_ok() {
        println!("✓ Configuration file is valid: {:?}", path);
        println!("  Required packages: {}", plugin.packages().join(" "));
        return Ok(ExitCode::SUCCESS);
    }
    if !missing.is_empty() {
        eprintln!("✗ Missing option(s): {}", missing.join(", "));
    }
    if let Err(e) = protocol {
        eprintln!("✗ {}", e);
    }
    Ok(ExitCode::from(EXIT_BLOCKED))
}
