use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::fs_util::FileOwner;
use crate::template::TemplateSource;
use crate::translator::{DEFAULT_BASE_DIR, TranslatorSettings};

/// Configure the Huawei storage backend for Cinder
#[derive(Parser)]
#[command(name = "cinder-huawei-backend")]
#[command(about = "Render the Huawei driver configuration and backend options")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Handle a configuration change: write the driver file and print relation data
    Render {
        /// JSON file with the operator configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Application name; selects the per-application directory
        #[arg(short, long)]
        app_name: String,

        /// Directory holding per-application subdirectories
        #[arg(long, default_value = DEFAULT_BASE_DIR)]
        base_dir: PathBuf,

        /// Account that owns the rendered file
        #[arg(long, default_value = "cinder")]
        owner: String,

        /// Group that owns the rendered file
        #[arg(long, default_value = "root")]
        group: String,

        /// Leave ownership unchanged (for unprivileged runs)
        #[arg(long)]
        no_chown: bool,

        /// Template to render instead of the built-in one
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Print the rendered file and options without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Check a configuration file for missing options and an unsupported protocol
    Validate {
        /// JSON file with the operator configuration
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the built-in driver configuration template
    ShowTemplate,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Build translator settings from `render` arguments
pub fn translator_settings(
    base_dir: PathBuf,
    owner: String,
    group: String,
    no_chown: bool,
    template: Option<PathBuf>,
) -> TranslatorSettings {
    TranslatorSettings {
        base_dir,
        owner: (!no_chown).then(|| FileOwner::new(owner, group)),
        template: template.map_or(TemplateSource::Embedded, TemplateSource::File),
        ..TranslatorSettings::default()
    }
}
