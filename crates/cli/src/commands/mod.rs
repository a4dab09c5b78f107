//! Command handlers for the clinrag CLI.

pub mod ask;
pub mod chat;

pub use ask::AskCommand;
pub use chat::ChatCommand;

use clinrag_core::{config::AppConfig, AppResult};
use clinrag_knowledge::{
    InMemoryPatientStore, LiteratureDirectory, PatientStore, RagContext, RagOptions,
    RagOrchestrator, SupabasePatientStore,
};
use std::sync::Arc;

/// Wire an orchestrator from configuration.
///
/// Patients come from Supabase when its credentials are in the
/// environment, otherwise from the local patient file.
pub async fn build_orchestrator(config: &AppConfig, options: RagOptions) -> AppResult<RagOrchestrator> {
    let context = RagContext::from_config(config).await?;

    let patients: Arc<dyn PatientStore> = match config.resolve_patient_store() {
        Some((url, key)) => {
            tracing::info!("Reading patients from Supabase table '{}'", config.patients.table);
            Arc::new(SupabasePatientStore::new(
                &url,
                &key,
                &config.patients.table,
                config.patients.timeout(),
            )?)
        }
        None => {
            let path = config.patients_file();
            if path.exists() {
                Arc::new(InMemoryPatientStore::from_yaml_file(&path)?)
            } else {
                tracing::warn!("No patient store configured and {:?} is missing", path);
                Arc::new(InMemoryPatientStore::new())
            }
        }
    };

    let fetcher = Arc::new(LiteratureDirectory::new(config.literature_dir()));
    tracing::debug!("Literature directory: {:?}", fetcher.root());

    Ok(RagOrchestrator::new(context, patients, fetcher, options))
}
