use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use std::io::{self, BufRead, Write};
use tracing::{debug, info};
use uuid::Uuid;

use super::forms::PatientForm;
use super::render;
use crate::config::Config;
use crate::store::{LoadOptions, PatientsStore, StoreError};

/// Browse and edit patients
#[derive(Args)]
pub struct PatientsCommand {
    #[command(subcommand)]
    pub action: PatientsAction,
}

#[derive(Subcommand)]
pub enum PatientsAction {
    /// Show one page of patients
    List(ListArgs),

    /// Show a patient with a page of their visits
    Show {
        id: String,

        #[arg(long, default_value_t = 1)]
        visits_page: usize,

        #[arg(long)]
        visits_page_size: Option<usize>,
    },

    /// Register a new patient
    Add(PatientForm),

    /// Change some fields of a patient
    Edit {
        id: String,

        #[command(flatten)]
        form: PatientForm,
    },

    /// Delete a patient and their visits
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,

    #[arg(short = 's', long)]
    pub page_size: Option<usize>,

    /// Match first name, last name, phone or email
    #[arg(long)]
    pub search: Option<String>,

    /// Fetch every patient and filter locally
    #[arg(long)]
    pub all: bool,
}

/// Patient ids are UUIDs; reject anything else before calling the server
pub fn parse_patient_id(id: &str) -> Result<String> {
    let id = id.trim();
    Uuid::parse_str(id).map_err(|_| anyhow!("Invalid patient id: {}", id))?;
    Ok(id.to_string())
}

impl PatientsCommand {
    pub async fn execute(&self, store: &PatientsStore, config: &Config) -> Result<()> {
        match &self.action {
            PatientsAction::List(args) => Self::list(args, store, config).await,
            PatientsAction::Show {
                id,
                visits_page,
                visits_page_size,
            } => {
                let id = parse_patient_id(id)?;
                show(store, &id, Some(*visits_page), *visits_page_size).await
            }
            PatientsAction::Add(form) => {
                let input = form.clone().into_input(true)?;
                let patient = store.save_patient(None, &input).await?;
                info!("Created patient {}", patient.id);
                println!("{}", render::patient_row(&patient));
                Ok(())
            }
            PatientsAction::Edit { id, form } => {
                let id = parse_patient_id(id)?;
                let input = form.clone().into_input(false)?;
                let patient = store.save_patient(Some(&id), &input).await?;
                println!("{}", render::patient_row(&patient));
                Ok(())
            }
            PatientsAction::Delete { id, yes } => {
                let id = parse_patient_id(id)?;
                if !yes && !confirm(&format!("Delete patient {} and all their visits?", id))? {
                    println!("Cancelled");
                    return Ok(());
                }
                store.delete_patient(&id).await?;
                println!("Deleted {}", id);
                Ok(())
            }
        }
    }

    async fn list(args: &ListArgs, store: &PatientsStore, config: &Config) -> Result<()> {
        let page_size = args.page_size.unwrap_or(config.default_page_size);
        debug!(
            "Listing patients page {} of size {} (all: {})",
            args.page, page_size, args.all
        );

        if args.all {
            store.load_all_patients().await?;
            if let Some(search) = &args.search {
                store.set_search(search.trim()).await;
            }
            store.filter_patients(Some(args.page), Some(page_size)).await?;
        } else {
            let mut options = LoadOptions::page(args.page, page_size);
            if let Some(search) = &args.search {
                options = options.with_search(search.trim());
            }
            store.load_patients(options).await?;
        }

        println!("{}", render::patients_page(&store.list().await));
        Ok(())
    }
}

/// Load a patient and a page of their visits, then print both
pub async fn show(
    store: &PatientsStore,
    id: &str,
    visits_page: Option<usize>,
    visits_page_size: Option<usize>,
) -> Result<()> {
    let (details, visits) = tokio::join!(
        store.load_patient_details(id),
        store.load_visits(id, visits_page, visits_page_size)
    );
    if let Err(StoreError::Api(e)) = &details {
        if e.is_not_found() {
            return Err(anyhow!("No patient with id {}", id));
        }
    }
    details?;
    visits?;

    println!("{}", render::patient_details(&store.details().await));
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
