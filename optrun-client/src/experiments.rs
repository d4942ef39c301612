//! Experiment-tracking service endpoints

use async_trait::async_trait;
use optrun_core::ApiResponse;
use serde_json::Value;
use tracing::debug;

use crate::ApiClient;
use crate::error::Result;

/// Remote API surface consumed by the CLI
///
/// A trait so the workflow and the wait loop can be exercised against
/// scripted fakes.
#[async_trait]
pub trait ExperimentApi: Send + Sync {
    /// Fetches the experiment matching the document, creating it if absent
    async fn get_or_create_experiment(&self, experiment: &Value) -> Result<ApiResponse>;

    /// Submits one trial of the optimizer against an experiment
    async fn run_trial(&self, experiment_id: &str, optimizer: &Value) -> Result<ApiResponse>;

    /// Lists currently running experiment jobs
    async fn running_experiments(&self) -> Result<ApiResponse>;

    /// Lists failed experiment jobs with their error info
    async fn failed_experiments(&self) -> Result<ApiResponse>;
}

#[async_trait]
impl ExperimentApi for ApiClient {
    async fn get_or_create_experiment(&self, experiment: &Value) -> Result<ApiResponse> {
        debug!("creating or fetching experiment");
        self.post("/api/experiments", experiment).await
    }

    async fn run_trial(&self, experiment_id: &str, optimizer: &Value) -> Result<ApiResponse> {
        debug!(experiment_id, "submitting trial");
        self.post(&format!("/api/experiments/{experiment_id}/trials"), optimizer)
            .await
    }

    async fn running_experiments(&self) -> Result<ApiResponse> {
        self.get("/api/experiments/running").await
    }

    async fn failed_experiments(&self) -> Result<ApiResponse> {
        self.get("/api/experiments/failed").await
    }
}
