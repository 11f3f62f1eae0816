use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use super::forms::VisitForm;
use super::patients::{parse_patient_id, show};
use super::render;
use crate::store::PatientsStore;

/// Record and edit visits
#[derive(Args)]
pub struct VisitsCommand {
    #[command(subcommand)]
    pub action: VisitsAction,
}

#[derive(Subcommand)]
pub enum VisitsAction {
    /// Record a visit of a patient
    Add {
        patient_id: String,

        #[command(flatten)]
        form: VisitForm,

        /// Print the patient's first visits page afterwards
        #[arg(long)]
        show: bool,
    },

    /// Change some fields of a visit
    Edit {
        patient_id: String,

        visit_id: String,

        #[command(flatten)]
        form: VisitForm,
    },
}

impl VisitsCommand {
    pub async fn execute(&self, store: &PatientsStore) -> Result<()> {
        match &self.action {
            VisitsAction::Add {
                patient_id,
                form,
                show: then_show,
            } => {
                let patient_id = parse_patient_id(patient_id)?;
                let input = form.clone().into_input(true)?;
                let visit = store.save_visit(&patient_id, None, &input).await?;
                println!("{}  {}", visit.id, render::visit_row(&visit));
                if *then_show {
                    show(store, &patient_id, None, None).await?;
                }
                Ok(())
            }
            VisitsAction::Edit {
                patient_id,
                visit_id,
                form,
            } => {
                let patient_id = parse_patient_id(patient_id)?;
                let visit_id = visit_id.trim();
                Uuid::parse_str(visit_id).map_err(|_| anyhow!("Invalid visit id: {}", visit_id))?;
                let input = form.clone().into_input(false)?;
                let visit = store.save_visit(&patient_id, Some(visit_id), &input).await?;
                println!("{}  {}", visit.id, render::visit_row(&visit));
                Ok(())
            }
        }
    }
}
