use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::{browse::BrowseCommand, patients::PatientsCommand, visits::VisitsCommand};
use crate::api::ApiClient;
use crate::config::Config;
use crate::store::PatientsStore;

/// Clinic - browse and edit patient and visit records from the terminal
#[derive(Parser)]
#[command(
    name = "clinic",
    version,
    about = "Browse and edit patient and visit records from the terminal",
    long_about = r#"Clinic talks to a patient records server and lets you page through patients,
search them, open a patient with their visit history and record new visits.

Examples:
  clinic patients list --search ivan         # Server-side search, first page
  clinic patients list --all --page 3        # Cache every patient, show page 3
  clinic patients show <id>                  # Patient with their latest visits
  clinic browse                              # Interactive browser"#
)]
pub struct Cli {
    /// Current working directory
    #[arg(short = 'c', long = "cwd", global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List, show and edit patients
    Patients(PatientsCommand),

    /// Record and edit visits
    Visits(VisitsCommand),

    /// Browse every patient interactively
    Browse(BrowseCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        // Change working directory if specified
        if let Some(cwd) = &self.cwd {
            std::env::set_current_dir(cwd)
                .map_err(|e| anyhow::anyhow!("Failed to change directory to {}: {}", cwd.display(), e))?;
            info!("Changed working directory to: {}", cwd.display());
        }

        let config = Config::init().await?;
        config.validate()?;
        debug!("Configuration initialized: {}", config.api_base_url);

        let client = Arc::new(ApiClient::new(&config)?);
        let store = PatientsStore::from_config(client, &config);

        match &self.command {
            Commands::Patients(cmd) => cmd.execute(&store, &config).await,
            Commands::Visits(cmd) => cmd.execute(&store).await,
            Commands::Browse(cmd) => cmd.execute(&store, &config).await,
        }
    }
}
