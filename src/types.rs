use serde::{Deserialize, Serialize};
use std::time::Duration;

// ── Wire format ─────────────────────────────────────────────────────

/// Envelope wrapping every kie.ai API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

/// Body of a `createTask` request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskRequest {
    pub model: String,
    pub input: TaskInput,
}

/// Generation parameters sent with a submission.
#[derive(Debug, Clone, Serialize)]
pub struct TaskInput {
    pub prompt: String,
    pub aspect_ratio: String,
    pub resolution: String,
    pub output_format: String,
    pub image_input: Vec<String>,
}

/// `data` payload of a `createTask` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskData {
    #[serde(default)]
    pub task_id: Option<String>,
}

/// `data` payload of a `recordInfo` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub result_json: Option<String>,
    #[serde(default)]
    pub fail_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultPayload {
    #[serde(default)]
    result_urls: Vec<String>,
}

// ── Task status ─────────────────────────────────────────────────────

/// Client-side view of a task's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Still running. `state` is the raw service state (`waiting`, or any
    /// state this client does not know about). Empty if none was reported.
    Pending { state: String },
    /// Finished with at least one result URL.
    Succeeded { urls: Vec<String> },
    /// Failed, or reported success with an unusable result payload.
    Failed { message: String },
}

impl TaskStatus {
    /// Interpret a raw status record. Malformed success payloads become
    /// [`TaskStatus::Failed`] so they end polling instead of looping.
    pub fn from_record(record: TaskRecord) -> Self {
        match record.state.as_deref() {
            Some("success") => {
                let raw = match record.result_json.as_deref() {
                    Some(raw) if !raw.trim().is_empty() => raw,
                    _ => {
                        return TaskStatus::Failed {
                            message: "No image URL found in result".into(),
                        }
                    }
                };
                match serde_json::from_str::<ResultPayload>(raw) {
                    Ok(payload) if !payload.result_urls.is_empty() => TaskStatus::Succeeded {
                        urls: payload.result_urls,
                    },
                    Ok(_) => TaskStatus::Failed {
                        message: "No image URL found in result".into(),
                    },
                    Err(e) => TaskStatus::Failed {
                        message: format!("Failed to parse resultJson: {}", e),
                    },
                }
            }
            Some("fail") => TaskStatus::Failed {
                message: record
                    .fail_msg
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Task failed".into()),
            },
            other => TaskStatus::Pending {
                state: other.unwrap_or_default().to_string(),
            },
        }
    }

    /// Whether no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending { .. })
    }
}

/// Human-readable progress text for each service state.
#[derive(Debug, Clone)]
pub struct StatusLabels {
    /// Reported right after a task is created.
    pub submitted: String,
    pub waiting: String,
    pub success: String,
    pub fail: String,
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            submitted: "Task created, generating...".into(),
            waiting: "Task processing...".into(),
            success: "Task complete".into(),
            fail: "Task failed".into(),
        }
    }
}

impl StatusLabels {
    /// Label for a raw service state. Unknown states are returned verbatim;
    /// an empty state has nothing worth reporting.
    pub fn label(&self, state: &str) -> Option<String> {
        match state {
            "" => None,
            "waiting" => Some(self.waiting.clone()),
            "success" => Some(self.success.clone()),
            "fail" => Some(self.fail.clone()),
            other => Some(other.to_string()),
        }
    }
}

// ── Polling & retry ─────────────────────────────────────────────────

/// Timing for a polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between consecutive checks. Must be non-zero.
    pub interval: Duration,
    /// Wall-clock budget measured from the start of polling.
    pub timeout: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(300))
    }
}

/// Exponential backoff settings for [`retry`](crate::retry::retry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// Delay after failed attempt `attempt` (0-indexed):
    /// `min(base_delay * 2^attempt, max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// Definitive-or-not outcome of one check inside a polling session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepState<T> {
    /// Not ready yet; keep polling.
    Pending,
    /// Definitive result; polling stops and returns it.
    Ready(T),
    /// Explicit terminal failure; polling stops with this message.
    Failed(String),
}

/// What a polling check returns: a [`StepState`] plus optional status text
/// for the progress sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollStep<T> {
    pub state: StepState<T>,
    pub status: Option<String>,
}

impl<T> PollStep<T> {
    pub fn pending() -> Self {
        Self {
            state: StepState::Pending,
            status: None,
        }
    }

    pub fn ready(value: T) -> Self {
        Self {
            state: StepState::Ready(value),
            status: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            state: StepState::Failed(message.into()),
            status: None,
        }
    }

    /// Attach status text, reported through the progress callback.
    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }
}

// ── Generation options ──────────────────────────────────────────────

/// Per-call overrides for a generation. Unset fields fall back to
/// [`KieConfig`](crate::KieConfig).
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub aspect_ratio: Option<String>,
    pub resolution: Option<String>,
    pub output_format: Option<String>,
    /// Reference image URLs sent as `image_input`.
    pub image_inputs: Vec<String>,
    pub poll_interval: Option<Duration>,
    pub poll_timeout: Option<Duration>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(ratio.into());
        self
    }

    pub fn resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    /// Add a reference image URL.
    pub fn image_input(mut self, url: impl Into<String>) -> Self {
        self.image_inputs.push(url.into());
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, result_json: Option<&str>, fail_msg: Option<&str>) -> TaskRecord {
        TaskRecord {
            state: Some(state.to_string()),
            result_json: result_json.map(String::from),
            fail_msg: fail_msg.map(String::from),
        }
    }

    #[test]
    fn test_status_success_takes_all_urls() {
        let status = TaskStatus::from_record(record(
            "success",
            Some(r#"{"resultUrls":["https://x/a.png","https://x/b.png"]}"#),
            None,
        ));
        assert_eq!(
            status,
            TaskStatus::Succeeded {
                urls: vec!["https://x/a.png".into(), "https://x/b.png".into()]
            }
        );
        assert!(status.is_terminal());
    }

    #[test]
    fn test_status_success_with_bad_payload() {
        let status = TaskStatus::from_record(record("success", Some("not json"), None));
        match status {
            TaskStatus::Failed { message } => assert!(message.contains("parse resultJson")),
            other => panic!("expected Failed, got {:?}", other),
        }

        let status = TaskStatus::from_record(record("success", Some(r#"{"resultUrls":[]}"#), None));
        assert_eq!(
            status,
            TaskStatus::Failed {
                message: "No image URL found in result".into()
            }
        );

        let status = TaskStatus::from_record(record("success", None, None));
        assert!(matches!(status, TaskStatus::Failed { .. }));
    }

    #[test]
    fn test_status_fail_message() {
        let status = TaskStatus::from_record(record("fail", None, Some("quota exceeded")));
        assert_eq!(
            status,
            TaskStatus::Failed {
                message: "quota exceeded".into()
            }
        );

        let status = TaskStatus::from_record(record("fail", None, Some("")));
        assert_eq!(
            status,
            TaskStatus::Failed {
                message: "Task failed".into()
            }
        );
    }

    #[test]
    fn test_status_unknown_states_pending() {
        let status = TaskStatus::from_record(record("queuing", None, None));
        assert_eq!(
            status,
            TaskStatus::Pending {
                state: "queuing".into()
            }
        );
        assert!(!status.is_terminal());

        let status = TaskStatus::from_record(TaskRecord::default());
        assert_eq!(status, TaskStatus::Pending { state: String::new() });
    }

    #[test]
    fn test_parse_record_info_response() {
        let resp: ApiResponse<TaskRecord> = serde_json::from_str(
            r#"{
            "code": 200,
            "msg": "success",
            "data": {
                "taskId": "task_123",
                "state": "success",
                "resultJson": "{\"resultUrls\":[\"https://x/img.png\"]}",
                "failMsg": ""
            }
        }"#,
        )
        .unwrap();

        assert_eq!(resp.code, 200);
        let status = TaskStatus::from_record(resp.data.unwrap());
        assert_eq!(
            status,
            TaskStatus::Succeeded {
                urls: vec!["https://x/img.png".into()]
            }
        );
    }

    #[test]
    fn test_parse_create_task_response_without_data() {
        let resp: ApiResponse<CreateTaskData> =
            serde_json::from_str(r#"{"code": 401, "msg": "Unauthorized"}"#).unwrap();
        assert_eq!(resp.code, 401);
        assert!(resp.data.is_none());
        assert_eq!(resp.msg.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn test_parse_envelope_missing_or_null_data() {
        let resp: ApiResponse<TaskRecord> = serde_json::from_str(r#"{"code": 500}"#).unwrap();
        assert!(resp.data.is_none());
        assert!(resp.msg.is_none());

        let resp: ApiResponse<CreateTaskData> =
            serde_json::from_str(r#"{"code": 200, "data": null}"#).unwrap();
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_create_task_request_serialization() {
        let req = CreateTaskRequest {
            model: "nano-banana-pro".into(),
            input: TaskInput {
                prompt: "a fox".into(),
                aspect_ratio: "2:3".into(),
                resolution: "1K".into(),
                output_format: "png".into(),
                image_input: Vec::new(),
            },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "nano-banana-pro");
        assert_eq!(json["input"]["aspect_ratio"], "2:3");
        assert_eq!(json["input"]["image_input"], serde_json::json!([]));
    }

    #[test]
    fn test_labels() {
        let labels = StatusLabels::default();
        assert_eq!(labels.label("waiting").as_deref(), Some("Task processing..."));
        assert_eq!(labels.label("generating").as_deref(), Some("generating"));
        assert_eq!(labels.label(""), None);
    }

    #[test]
    fn test_retry_delay_formula() {
        let config = RetryConfig::new(5, Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(config.delay_for(0), Duration::from_millis(100));
        assert_eq!(config.delay_for(1), Duration::from_millis(200));
        assert_eq!(config.delay_for(2), Duration::from_millis(400));
        assert_eq!(config.delay_for(3), Duration::from_millis(500));
        assert_eq!(config.delay_for(40), Duration::from_millis(500));
    }

    #[test]
    fn test_generate_options_builder() {
        let opts = GenerateOptions::new()
            .aspect_ratio("16:9")
            .image_input("https://x/ref.png")
            .poll_timeout(Duration::from_secs(10));
        assert_eq!(opts.aspect_ratio.as_deref(), Some("16:9"));
        assert!(opts.resolution.is_none());
        assert_eq!(opts.image_inputs, vec!["https://x/ref.png".to_string()]);
        assert_eq!(opts.poll_timeout, Some(Duration::from_secs(10)));
    }
}
