//! Trial submission workflow
//!
//! Loads the experiment and optimizer documents, ensures a logged-in session,
//! submits one trial, and (when asked to wait) polls until the job finishes
//! before checking the failed-experiments list for the verdict.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde_json::Value;

use optrun_auth::{AuthClient, CredentialManager, FileTokenStore, ProviderConfig};
use optrun_client::{ApiClient, ExperimentApi};
use optrun_core::{DocumentError, FILE_TYPE_MSG, load_document};

use crate::config::Config;
use crate::output::{banner, print_response};
use crate::wait::{WaitOptions, wait_for_job};

/// Arguments for the default (trial submission) invocation
pub struct RunArgs {
    pub experiment: PathBuf,
    pub optimizer: PathBuf,
    pub maxwait: i64,
    pub sleepdur: u64,
}

/// Handles the default invocation
///
/// Bad input file types exit immediately with code 1; any failure inside the
/// workflow prints the error marker before propagating.
pub async fn handle_run(args: RunArgs, config: &Config) -> Result<()> {
    let experiment = load_input(&args.experiment)?;
    let optimizer = load_input(&args.optimizer)?;

    let wait = (args.maxwait != 0).then(|| WaitOptions::from_minutes(args.maxwait, args.sleepdur));

    let outcome = run_workflow(config, &experiment, &optimizer, wait).await;
    if outcome.is_err() {
        println!("---- Error ----");
    }
    outcome
}

/// Builds an authorized client and runs the trial workflow against it
async fn run_workflow(
    config: &Config,
    experiment: &Value,
    optimizer: &Value,
    wait: Option<WaitOptions>,
) -> Result<()> {
    banner("Creating client");
    let store = FileTokenStore::open_default()?;
    let provider = AuthClient::new(ProviderConfig::default());
    let manager = CredentialManager::new(store, provider);
    let authorizer = manager.ensure_authorizer().await?;
    let client = ApiClient::new(&config.service_url, Arc::new(authorizer));

    run_trial_workflow(&client, experiment, optimizer, wait).await
}

/// Loads one input document, exiting with code 1 on an unsupported extension
fn load_input(path: &Path) -> Result<Value> {
    match load_document(path) {
        Ok(document) => Ok(document),
        Err(DocumentError::UnsupportedExtension { .. }) => {
            println!("{FILE_TYPE_MSG}");
            std::process::exit(1);
        }
        Err(err) => Err(err).with_context(|| format!("failed to load {}", path.display())),
    }
}

/// Submits a trial and optionally waits for its job to finish
async fn run_trial_workflow(
    api: &dyn ExperimentApi,
    experiment: &Value,
    optimizer: &Value,
    wait: Option<WaitOptions>,
) -> Result<()> {
    banner("Creating/getting experiment");
    let exp_res = api.get_or_create_experiment(experiment).await?;
    print_response(&exp_res);
    if !exp_res.is_ok() {
        bail!("Failed to create experiment (status code not ok)");
    }
    let experiment_id = exp_res
        .body_json()
        .and_then(|body| body.get("id"))
        .and_then(id_as_string)
        .context("Expected experiment response to contain 'id'")?;

    banner("Running job");
    let trial_res = api.run_trial(&experiment_id, optimizer).await?;
    print_response(&trial_res);
    if !trial_res.is_ok() {
        bail!("Failed to run trial:\n {}", trial_res.pretty_body());
    }
    let job_id = trial_res
        .body_json()
        .and_then(|body| body.pointer("/job/job_id"))
        .and_then(Value::as_str)
        .context("Expected trial response to contain 'job.job_id'")?
        .to_string();

    banner("Starting to wait for job to finish");
    match wait {
        Some(options) => {
            wait_for_job(api, &job_id, options).await?;

            banner("Checking if job was successful");
            check_for_failure(api, &job_id).await?;
        }
        None => println!("Max wait == 0, not waiting for job to finish..."),
    }

    banner("Finished");
    Ok(())
}

/// Scans the failed-experiments list for the submitted job
///
/// A non-success or non-list response skips the check (the job already left
/// the running list); only a positive match is treated as a trial failure.
async fn check_for_failure(api: &dyn ExperimentApi, job_id: &str) -> Result<()> {
    let res = api.failed_experiments().await?;

    if !res.is_ok() {
        println!("{}", "Unable to get failed experiments, skipping...".yellow());
        return Ok(());
    }
    let Some(failed) = res.body_array() else {
        println!("{}", "Expected response to be list, skipping...".yellow());
        return Ok(());
    };

    for record in failed {
        if record.get("job_id").and_then(Value::as_str) == Some(job_id) {
            let info = match record.get("job_exc_info") {
                Some(Value::String(text)) => text.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            bail!(
                "Server failed to run trials. See error info below (from server):\n{}",
                info.replace('\n', "\n| ")
            );
        }
    }

    println!("{}", "Successfully ran optimizations".green());
    Ok(())
}

/// Experiment ids may come back as strings or numbers
fn id_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use optrun_core::ApiResponse;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fake service covering the whole workflow
    struct FakeService {
        calls: Mutex<Vec<String>>,
        running: Vec<ApiResponse>,
        poll: Mutex<usize>,
        failed: ApiResponse,
    }

    impl FakeService {
        fn new(running: Vec<ApiResponse>, failed: ApiResponse) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                running,
                poll: Mutex::new(0),
                failed,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExperimentApi for FakeService {
        async fn get_or_create_experiment(
            &self,
            experiment: &Value,
        ) -> optrun_client::Result<ApiResponse> {
            assert_eq!(experiment.get("name"), Some(&json!("exp1")));
            self.calls.lock().unwrap().push("experiment".to_string());
            Ok(ApiResponse::json(200, json!({"id": "exp1"})))
        }

        async fn run_trial(
            &self,
            experiment_id: &str,
            _optimizer: &Value,
        ) -> optrun_client::Result<ApiResponse> {
            assert_eq!(experiment_id, "exp1");
            self.calls.lock().unwrap().push("trial".to_string());
            Ok(ApiResponse::json(200, json!({"job": {"job_id": "job1"}})))
        }

        async fn running_experiments(&self) -> optrun_client::Result<ApiResponse> {
            self.calls.lock().unwrap().push("running".to_string());
            let mut poll = self.poll.lock().unwrap();
            let response = self.running[(*poll).min(self.running.len() - 1)].clone();
            *poll += 1;
            Ok(response)
        }

        async fn failed_experiments(&self) -> optrun_client::Result<ApiResponse> {
            self.calls.lock().unwrap().push("failed".to_string());
            Ok(self.failed.clone())
        }
    }

    fn fast_wait() -> Option<WaitOptions> {
        Some(WaitOptions {
            max_wait: Some(Duration::from_millis(5_000)),
            poll_interval: Duration::from_millis(1),
        })
    }

    fn docs() -> (Value, Value) {
        (json!({"name": "exp1"}), json!({"kind": "grid"}))
    }

    #[tokio::test]
    async fn test_successful_run_checks_failed_list() {
        let api = FakeService::new(
            vec![ApiResponse::json(200, json!([]))],
            ApiResponse::json(200, json!([])),
        );
        let (experiment, optimizer) = docs();

        run_trial_workflow(&api, &experiment, &optimizer, fast_wait())
            .await
            .unwrap();

        assert_eq!(api.calls(), ["experiment", "trial", "running", "failed"]);
    }

    #[tokio::test]
    async fn test_failed_trial_surfaces_server_error_info() {
        let api = FakeService::new(
            vec![ApiResponse::json(200, json!([]))],
            ApiResponse::json(
                200,
                json!([{"job_id": "job1", "job_exc_info": "Traceback\nboom"}]),
            ),
        );
        let (experiment, optimizer) = docs();

        let err = run_trial_workflow(&api, &experiment, &optimizer, fast_wait())
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Server failed to run trials"));
        assert!(message.contains("\n| boom"));
    }

    #[tokio::test]
    async fn test_maxwait_zero_skips_polling() {
        let api = FakeService::new(
            vec![ApiResponse::json(200, json!([]))],
            ApiResponse::json(200, json!([])),
        );
        let (experiment, optimizer) = docs();

        run_trial_workflow(&api, &experiment, &optimizer, None)
            .await
            .unwrap();

        assert_eq!(api.calls(), ["experiment", "trial"]);
    }

    #[tokio::test]
    async fn test_unreadable_failed_list_is_skipped() {
        let api = FakeService::new(
            vec![ApiResponse::json(200, json!([]))],
            ApiResponse::from_payload(500, "internal error".to_string()),
        );
        let (experiment, optimizer) = docs();

        // Failure check is advisory once the job left the running list
        run_trial_workflow(&api, &experiment, &optimizer, fast_wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_experiment_without_id_is_fatal() {
        struct NoIdService;

        #[async_trait]
        impl ExperimentApi for NoIdService {
            async fn get_or_create_experiment(
                &self,
                _experiment: &Value,
            ) -> optrun_client::Result<ApiResponse> {
                Ok(ApiResponse::json(200, json!({"name": "exp1"})))
            }

            async fn run_trial(
                &self,
                _experiment_id: &str,
                _optimizer: &Value,
            ) -> optrun_client::Result<ApiResponse> {
                unreachable!("workflow must stop before submitting a trial")
            }

            async fn running_experiments(&self) -> optrun_client::Result<ApiResponse> {
                unreachable!()
            }

            async fn failed_experiments(&self) -> optrun_client::Result<ApiResponse> {
                unreachable!()
            }
        }

        let (experiment, optimizer) = docs();
        let err = run_trial_workflow(&NoIdService, &experiment, &optimizer, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("contain 'id'"));
    }

    #[test]
    fn test_numeric_experiment_id_accepted() {
        assert_eq!(id_as_string(&json!("exp1")), Some("exp1".to_string()));
        assert_eq!(id_as_string(&json!(42)), Some("42".to_string()));
        assert_eq!(id_as_string(&json!(["exp1"])), None);
    }
}
