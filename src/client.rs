use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::KieConfig;
use crate::error::{KieError, Result};
use crate::poll::poll_until_ready;
use crate::types::*;

/// Async client for kie.ai image generation tasks.
///
/// Submits generation jobs, queries their status, and waits for a result
/// URL by polling. Each status check re-queries the service; nothing about
/// a task is cached beyond its id.
///
/// # Example
/// ```no_run
/// use kieai_rs::{GenerateOptions, KieClient, KieConfig};
///
/// # async fn example() -> kieai_rs::Result<()> {
/// let client = KieClient::new(KieConfig::builder().with_api_key("sk-...").build());
/// let url = client
///     .generate("a reading fox poster", &GenerateOptions::new(), |s| println!("{}", s))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct KieClient {
    http: Client,
    config: KieConfig,
    labels: StatusLabels,
}

impl KieClient {
    /// Create a new client with the given configuration.
    pub fn new(config: KieConfig) -> Self {
        Self {
            http: Client::new(),
            config,
            labels: StatusLabels::default(),
        }
    }

    /// Use a custom `reqwest::Client` (for connection pooling, proxies, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Replace the progress text reported for each task state.
    pub fn with_labels(mut self, labels: StatusLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &KieConfig {
        &self.config
    }

    pub fn labels(&self) -> &StatusLabels {
        &self.labels
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Create a generation task. Returns the service-issued `taskId`.
    pub async fn submit(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        if !self.config.has_api_key() {
            return Err(KieError::MissingApiKey);
        }

        let body = CreateTaskRequest {
            model: self.config.model.clone(),
            input: TaskInput {
                prompt: prompt.to_string(),
                aspect_ratio: options
                    .aspect_ratio
                    .clone()
                    .unwrap_or_else(|| self.config.aspect_ratio.clone()),
                resolution: options
                    .resolution
                    .clone()
                    .unwrap_or_else(|| self.config.resolution.clone()),
                output_format: options
                    .output_format
                    .clone()
                    .unwrap_or_else(|| self.config.output_format.clone()),
                image_input: options.image_inputs.clone(),
            },
        };

        let request = self
            .http
            .post(&self.config.api_urls.create_task)
            .json(&body);
        let resp = self
            .send(request, "Failed to create kie.ai task")
            .await?;
        let envelope: ApiResponse<CreateTaskData> =
            read_envelope(resp, "Failed to parse createTask response").await?;

        let task_id = match (envelope.code, envelope.data) {
            (200, Some(CreateTaskData { task_id: Some(id) })) if !id.is_empty() => id,
            (_, _) => {
                return Err(KieError::Submission(
                    envelope
                        .msg
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "Failed to create task".into()),
                ))
            }
        };

        tracing::debug!(task_id = %task_id, model = %self.config.model, "Task created");
        Ok(task_id)
    }

    // ── Status ──────────────────────────────────────────────────────

    /// Query the current state of a task.
    pub async fn check_status(&self, task_id: &str) -> Result<TaskStatus> {
        let request = self
            .http
            .get(&self.config.api_urls.query_status)
            .query(&[("taskId", task_id)]);
        let resp = self
            .send(request, "Failed to query kie.ai task status")
            .await?;
        let envelope: ApiResponse<TaskRecord> =
            read_envelope(resp, "Failed to parse recordInfo response").await?;

        match (envelope.code, envelope.data) {
            (200, Some(record)) => Ok(TaskStatus::from_record(record)),
            (code, _) => Err(KieError::Api {
                code,
                message: envelope
                    .msg
                    .unwrap_or_else(|| "Failed to query task status".into()),
            }),
        }
    }

    // ── Completion waiting ──────────────────────────────────────────

    /// Poll until the task succeeds, fails, or `poll.timeout` elapses.
    /// Returns the first result URL.
    ///
    /// Failed status queries are retried on the next tick; a `fail` state or
    /// an unusable success payload ends polling immediately.
    pub async fn await_completion<P>(
        &self,
        task_id: &str,
        poll: &PollConfig,
        on_progress: P,
    ) -> Result<String>
    where
        P: FnMut(&str),
    {
        poll_until_ready(poll, move || self.poll_step(task_id), on_progress).await
    }

    /// [`await_completion`](Self::await_completion) with the configured
    /// polling interval and timeout.
    pub async fn wait_for_completion<P>(&self, task_id: &str, on_progress: P) -> Result<String>
    where
        P: FnMut(&str),
    {
        self.await_completion(task_id, &self.config.poll_config(), on_progress)
            .await
    }

    /// Submit a task and wait for its result URL.
    pub async fn generate<P>(
        &self,
        prompt: &str,
        options: &GenerateOptions,
        mut on_progress: P,
    ) -> Result<String>
    where
        P: FnMut(&str),
    {
        let task_id = self.submit(prompt, options).await?;
        on_progress(self.labels.submitted.as_str());

        let defaults = self.config.poll_config();
        let poll = PollConfig::new(
            options.poll_interval.unwrap_or(defaults.interval),
            options.poll_timeout.unwrap_or(defaults.timeout),
        );
        self.await_completion(&task_id, &poll, on_progress).await
    }

    async fn poll_step(&self, task_id: &str) -> Result<PollStep<String>> {
        let status = self.check_status(task_id).await?;
        let step = match status {
            TaskStatus::Pending { state } => {
                return Ok(PollStep::pending().with_status(self.labels.label(&state)))
            }
            TaskStatus::Succeeded { urls } => match urls.into_iter().next() {
                Some(url) => PollStep::ready(url),
                None => PollStep::failed("No image URL found in result"),
            },
            TaskStatus::Failed { message } => {
                tracing::debug!(task_id, error = %message, "Task reached failed state");
                PollStep::failed(message)
            }
        };
        let state = if matches!(step.state, StepState::Ready(_)) {
            "success"
        } else {
            "fail"
        };
        Ok(step.with_status(self.labels.label(state)))
    }

    // ── Transport ───────────────────────────────────────────────────

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        request
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| KieError::Network {
                context: context.to_string(),
                source: e,
            })
    }
}

/// Decode an API envelope. A non-success HTTP status whose body is not an
/// envelope becomes [`KieError::Http`].
async fn read_envelope<T: DeserializeOwned>(
    resp: Response,
    context: &str,
) -> Result<ApiResponse<T>> {
    let status = resp.status();
    let body = resp.text().await.map_err(|e| KieError::Network {
        context: context.to_string(),
        source: e,
    })?;

    match serde_json::from_str::<ApiResponse<T>>(&body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(KieError::Http {
            status: status.as_u16(),
            body,
        }),
        Err(e) => Err(KieError::Json(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_builder() {
        let client = KieClient::new(
            KieConfig::builder()
                .with_api_key("key")
                .with_api_base("http://127.0.0.1:9000")
                .build(),
        )
        .with_labels(StatusLabels {
            waiting: "working".into(),
            ..Default::default()
        });

        assert_eq!(
            client.config().api_urls.create_task,
            "http://127.0.0.1:9000/api/v1/jobs/createTask"
        );
        assert_eq!(client.labels().waiting, "working");
    }

    #[tokio::test]
    async fn test_submit_without_api_key() {
        let client = KieClient::new(KieConfig::default());
        let err = client
            .submit("prompt", &GenerateOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, KieError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_generate_without_api_key_reports_nothing() {
        let client = KieClient::new(KieConfig::default());
        let mut reports = Vec::new();
        let err = client
            .generate(
                "prompt",
                &GenerateOptions::new().poll_timeout(Duration::from_millis(10)),
                |s| reports.push(s.to_string()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, KieError::MissingApiKey));
        assert!(reports.is_empty());
    }
}
