use std::time::Duration;

use thiserror::Error;

/// Errors returned by kie.ai task operations.
#[derive(Error, Debug)]
pub enum KieError {
    /// A non-success HTTP status without a usable body.
    #[error("Server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local filesystem error while saving a download.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No API key configured.
    #[error("No kie.ai API key configured")]
    MissingApiKey,

    /// Invalid client, poll, or download settings.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The task could not be created.
    #[error("Task submission failed: {0}")]
    Submission(String),

    /// The service answered a request with a non-200 API code.
    #[error("kie.ai API error {code}: {message}")]
    Api { code: i64, message: String },

    /// The task reached a terminal failure state, or its result was unusable.
    #[error("Generation failed: {0}")]
    TaskFailed(String),

    /// Polling exceeded its wall-clock budget.
    #[error("Polling timed out after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    /// Retrieval failed and the URL could not be opened for manual saving either.
    #[error("Download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    /// Retrieval failed; the URL was opened so the user can save it manually.
    #[error("Direct download of {url} failed ({reason}); opened it for manual saving")]
    DownloadFallback { url: String, reason: String },
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, KieError>;
