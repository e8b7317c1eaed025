use std::time::Duration;

use crate::types::PollConfig;

/// Default kie.ai API host.
pub const DEFAULT_API_BASE: &str = "https://api.kie.ai";

const CREATE_TASK_PATH: &str = "/api/v1/jobs/createTask";
const QUERY_STATUS_PATH: &str = "/api/v1/jobs/recordInfo";

/// Endpoints for task creation and status queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUrls {
    pub create_task: String,
    pub query_status: String,
}

impl ApiUrls {
    /// Derive both job endpoints from an API host such as `https://api.kie.ai`.
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            create_task: format!("{}{}", base, CREATE_TASK_PATH),
            query_status: format!("{}{}", base, QUERY_STATUS_PATH),
        }
    }
}

impl Default for ApiUrls {
    fn default() -> Self {
        Self::from_base(DEFAULT_API_BASE)
    }
}

/// Client configuration.
///
/// Use [`KieConfig::builder()`] for ergonomic construction,
/// [`KieConfig::from_env()`] to read `KIE_*` variables, or
/// [`KieConfig::default()`] for the stock settings (no API key).
#[derive(Clone)]
pub struct KieConfig {
    /// Bearer token sent with every request.
    pub api_key: String,

    pub api_urls: ApiUrls,

    /// Model identifier sent with each submission.
    pub model: String,

    /// Output resolution (`1K`, `2K`, `4K`).
    pub resolution: String,

    pub aspect_ratio: String,

    /// Output image format (`png`, `jpg`).
    pub output_format: String,

    /// Delay between status checks.
    pub polling_interval: Duration,

    /// Wall-clock budget for one polling session.
    pub polling_timeout: Duration,

    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl std::fmt::Debug for KieConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KieConfig")
            .field("api_key", &if self.has_api_key() { "<redacted>" } else { "" })
            .field("api_urls", &self.api_urls)
            .field("model", &self.model)
            .field("resolution", &self.resolution)
            .field("aspect_ratio", &self.aspect_ratio)
            .field("output_format", &self.output_format)
            .field("polling_interval", &self.polling_interval)
            .field("polling_timeout", &self.polling_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for KieConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_urls: ApiUrls::default(),
            model: "nano-banana-pro".to_string(),
            resolution: "1K".to_string(),
            aspect_ratio: "2:3".to_string(),
            output_format: "png".to_string(),
            polling_interval: Duration::from_secs(2),
            polling_timeout: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl KieConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> KieConfigBuilder {
        KieConfigBuilder::default()
    }

    /// Read overrides from `KIE_API_KEY`, `KIE_API_BASE`, `KIE_MODEL`,
    /// `KIE_RESOLUTION`, `KIE_ASPECT_RATIO` and `KIE_OUTPUT_FORMAT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), but reads values through `lookup`.
    /// Empty values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(key) = get("KIE_API_KEY") {
            config.api_key = key;
        }
        if let Some(base) = get("KIE_API_BASE") {
            config.api_urls = ApiUrls::from_base(&base);
        }
        if let Some(model) = get("KIE_MODEL") {
            config.model = model;
        }
        if let Some(resolution) = get("KIE_RESOLUTION") {
            config.resolution = resolution;
        }
        if let Some(ratio) = get("KIE_ASPECT_RATIO") {
            config.aspect_ratio = ratio;
        }
        if let Some(format) = get("KIE_OUTPUT_FORMAT") {
            config.output_format = format;
        }
        config
    }

    /// Whether a non-empty API key is configured.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Poll settings taken from `polling_interval` / `polling_timeout`.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig::new(self.polling_interval, self.polling_timeout)
    }
}

/// Builder for [`KieConfig`].
#[derive(Default)]
pub struct KieConfigBuilder {
    config: KieConfig,
}

impl KieConfigBuilder {
    /// Set the API key. Surrounding whitespace is trimmed.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into().trim().to_string();
        self
    }

    /// Point both job endpoints at a different host (e.g. a mock server).
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.config.api_urls = ApiUrls::from_base(base);
        self
    }

    /// Set the endpoints explicitly.
    pub fn with_api_urls(mut self, urls: ApiUrls) -> Self {
        self.config.api_urls = urls;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.config.resolution = resolution.into();
        self
    }

    pub fn with_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.config.aspect_ratio = ratio.into();
        self
    }

    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.config.output_format = format.into();
        self
    }

    /// Set the delay between status checks.
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.config.polling_interval = interval;
        self
    }

    /// Set the wall-clock budget for waiting on a task.
    pub fn with_polling_timeout(mut self, timeout: Duration) -> Self {
        self.config.polling_timeout = timeout;
        self
    }

    /// Set the per-request HTTP timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the final [`KieConfig`].
    pub fn build(self) -> KieConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = KieConfig::default();
        assert_eq!(
            config.api_urls.create_task,
            "https://api.kie.ai/api/v1/jobs/createTask"
        );
        assert_eq!(
            config.api_urls.query_status,
            "https://api.kie.ai/api/v1/jobs/recordInfo"
        );
        assert_eq!(config.model, "nano-banana-pro");
        assert_eq!(config.resolution, "1K");
        assert_eq!(config.aspect_ratio, "2:3");
        assert_eq!(config.output_format, "png");
        assert_eq!(config.polling_interval, Duration::from_secs(2));
        assert_eq!(config.polling_timeout, Duration::from_secs(300));
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_builder() {
        let config = KieConfig::builder()
            .with_api_key("  secret  ")
            .with_api_base("http://localhost:9000/")
            .with_resolution("2K")
            .with_polling_interval(Duration::from_millis(500))
            .build();

        assert_eq!(config.api_key, "secret");
        assert!(config.has_api_key());
        assert_eq!(
            config.api_urls.create_task,
            "http://localhost:9000/api/v1/jobs/createTask"
        );
        assert_eq!(config.resolution, "2K");
        assert_eq!(config.poll_config().interval, Duration::from_millis(500));
        assert_eq!(config.poll_config().timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("KIE_API_KEY", "abc"),
            ("KIE_API_BASE", "http://mock"),
            ("KIE_ASPECT_RATIO", "16:9"),
            ("KIE_MODEL", "   "),
        ]
        .into_iter()
        .collect();

        let config = KieConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.api_urls.query_status, "http://mock/api/v1/jobs/recordInfo");
        assert_eq!(config.aspect_ratio, "16:9");
        // Blank values fall back to defaults
        assert_eq!(config.model, "nano-banana-pro");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = KieConfig::builder().with_api_key("super-secret").build();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
