//! Patient record lookup.
//!
//! The answering pipeline only needs one fact about a patient: the disease
//! label their literature is fetched for. Lookups never fail outward; a
//! broken store reads as "no such patient".

use crate::types::PatientId;
use clinrag_core::{AppError, AppResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;

/// Source of a patient's recorded disease.
#[async_trait::async_trait]
pub trait PatientStore: Send + Sync {
    /// Disease label for `id`, or `None` when unknown or unavailable.
    async fn get_disease(&self, id: PatientId) -> Option<String>;
}

/// Patient records held in memory.
#[derive(Debug, Default)]
pub struct InMemoryPatientStore {
    records: RwLock<HashMap<PatientId, String>>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records<I, D>(records: I) -> Self
    where
        I: IntoIterator<Item = (PatientId, D)>,
        D: Into<String>,
    {
        let store = Self::new();
        for (id, disease) in records {
            store.insert(id, disease);
        }
        store
    }

    /// Load an `id: disease` YAML map.
    pub fn from_yaml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Patient(format!("Failed to read patient file {:?}: {}", path, e))
        })?;

        let records: BTreeMap<i64, String> = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Patient(format!("Failed to parse patient file {:?}: {}", path, e))
        })?;

        tracing::info!("Loaded {} patient records from {:?}", records.len(), path);

        Ok(Self::with_records(
            records.into_iter().map(|(id, disease)| (PatientId(id), disease)),
        ))
    }

    /// Insert or replace a patient's disease.
    pub fn insert(&self, id: PatientId, disease: impl Into<String>) {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, disease.into());
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn get_disease(&self, id: PatientId) -> Option<String> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
    }
}

#[derive(Debug, Deserialize)]
struct DiseaseRow {
    #[serde(default)]
    disease: Option<String>,
}

/// Patient records behind a Supabase (PostgREST) table.
#[derive(Debug, Clone)]
pub struct SupabasePatientStore {
    client: reqwest::Client,
    endpoint: String,
}

impl SupabasePatientStore {
    /// Store reading `table` from the project at `base_url`.
    pub fn new(base_url: &str, api_key: &str, table: &str, timeout: Duration) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key.trim())
            .map_err(|e| AppError::Config(format!("Invalid Supabase key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| AppError::Config(format!("Invalid Supabase key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Patient(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
        })
    }

    async fn fetch_disease(&self, id: PatientId) -> AppResult<Option<String>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("patient_id", format!("eq.{}", id)),
                ("select", "disease".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(format!("patient lookup for {}", id))
                } else {
                    AppError::Patient(format!("Patient lookup failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Patient(format!(
                "Patient store error ({}): {}",
                status, body
            )));
        }

        let rows: Vec<DiseaseRow> = response
            .json()
            .await
            .map_err(|e| AppError::Patient(format!("Failed to parse patient rows: {}", e)))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.disease)
            .map(|disease| disease.trim().to_string())
            .find(|disease| !disease.is_empty()))
    }
}

#[async_trait::async_trait]
impl PatientStore for SupabasePatientStore {
    async fn get_disease(&self, id: PatientId) -> Option<String> {
        match self.fetch_disease(id).await {
            Ok(disease) => disease,
            Err(e) => {
                tracing::warn!(patient_id = %id, "Patient lookup failed: {}", e);
                None
            }
        }
    }
}
