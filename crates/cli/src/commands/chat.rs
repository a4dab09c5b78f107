//! Chat command handler.
//!
//! Reads questions from stdin and answers them against one orchestrator, so
//! only the first question pays for ingestion.

use crate::commands::build_orchestrator;
use clap::Args;
use clinrag_core::{config::AppConfig, AppResult};
use clinrag_knowledge::{PatientId, RagOptions};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Ask questions for a patient interactively
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Patient identifier
    pub patient_id: i64,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting chat for patient {}", self.patient_id);

        let orchestrator =
            build_orchestrator(config, RagOptions::from(&config.retrieval)).await?;
        let patient_id = PatientId(self.patient_id);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush().ok();

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();
            if question.is_empty() || is_exit(question) {
                break;
            }

            let answer = orchestrator.answer_detailed(patient_id, question).await?;
            tracing::debug!(path = ?answer.path, sources = answer.sources.len(), "Answered");
            println!("{}\n", answer.text);
        }

        tracing::info!("Chat ended");
        Ok(())
    }
}

fn is_exit(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}
