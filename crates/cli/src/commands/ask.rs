//! Ask command handler.
//!
//! Answers a single question for one patient.

use crate::commands::build_orchestrator;
use clap::Args;
use clinrag_core::{config::AppConfig, AppError, AppResult};
use clinrag_knowledge::{PatientId, RagOptions};

/// Answer one question for a patient
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Patient identifier
    pub patient_id: i64,

    /// The question to ask
    pub question: String,

    /// Number of literature chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON, including the retrieved sources
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        if self.question.trim().is_empty() {
            return Err(AppError::Config("No question provided".to_string()));
        }

        let mut options = RagOptions::from(&config.retrieval);
        if let Some(top_k) = self.top_k {
            if top_k == 0 {
                return Err(AppError::Config("--top-k must be at least 1".to_string()));
            }
            options.top_k = top_k;
        }

        let orchestrator = build_orchestrator(config, options).await?;
        let answer = orchestrator
            .answer_detailed(PatientId(self.patient_id), &self.question)
            .await?;

        if self.json {
            let json = serde_json::to_string_pretty(&answer)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", answer.text);

            if tracing::enabled!(tracing::Level::DEBUG) {
                for source in &answer.sources {
                    tracing::debug!(
                        "Source: {} chunk {} (distance {:.4})",
                        source.title,
                        source.chunk_index,
                        source.distance
                    );
                }
            }
        }

        Ok(())
    }
}
