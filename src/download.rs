use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use reqwest::Client;

use crate::error::{KieError, Result};
use crate::retry::retry;
use crate::types::RetryConfig;

/// Opens a URL outside the process so the user can save it by hand.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Opens URLs with the platform's default handler (`open`, `xdg-open`,
/// or the `url.dll` protocol handler).
///
/// Returns once the handler has started. The child is reaped on a
/// background thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> std::io::Result<()> {
        spawn_reaped(opener_command(url)).map(|_| ())
    }
}

fn spawn_reaped(
    mut cmd: Command,
) -> std::io::Result<JoinHandle<std::io::Result<ExitStatus>>> {
    let mut child = cmd.spawn()?;
    Ok(std::thread::spawn(move || child.wait()))
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

// Not `cmd /C start`: cmd.exe would split the URL on `&`.
#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("rundll32");
    cmd.arg("url.dll,FileProtocolHandler").arg(url);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}

/// Downloads generated images into a directory.
///
/// When the bytes cannot be fetched, the URL is handed to a [`UrlOpener`]
/// and the save still reports an error, so callers can tell the user to
/// save the image manually.
///
/// # Example
/// ```no_run
/// use kieai_rs::FileSaver;
///
/// # async fn example() -> kieai_rs::Result<()> {
/// let saver = FileSaver::new("./posters");
/// let path = saver.save("https://example.com/img.png", "fox-poster.png").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FileSaver {
    http: Client,
    dir: PathBuf,
    retry: RetryConfig,
    opener: Arc<dyn UrlOpener>,
    timeout: Duration,
}

impl std::fmt::Debug for FileSaver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSaver")
            .field("dir", &self.dir)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl FileSaver {
    /// Save into `dir`. Fetches are attempted once; see [`with_retry`](Self::with_retry).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            http: Client::new(),
            dir: dir.into(),
            retry: RetryConfig::none(),
            opener: Arc::new(SystemOpener),
            timeout: Duration::from_secs(60),
        }
    }

    /// Use a custom `reqwest::Client`.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Retry failed fetches with backoff before falling back.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the handler used when the fetch fails.
    pub fn with_opener(mut self, opener: Arc<dyn UrlOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Per-request HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fetch `url` and store it as `filename` inside the target directory.
    /// Only the final component of `filename` is used.
    ///
    /// # Errors
    ///
    /// - [`KieError::DownloadFallback`] when the fetch failed and the URL was
    ///   opened for manual saving
    /// - [`KieError::Download`] when the fetch failed and opening it failed too
    /// - [`KieError::Config`] for an empty filename
    /// - [`KieError::Io`] if the file cannot be written
    pub async fn save(&self, url: &str, filename: &str) -> Result<PathBuf> {
        let name = Path::new(filename).file_name().ok_or_else(|| {
            KieError::Config(format!("Invalid download filename {:?}", filename))
        })?;
        let target = self.dir.join(name);

        let bytes = match retry(&self.retry, || self.fetch(url)).await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fall_back(url, e)),
        };

        let len = bytes.len();
        let dir = self.dir.clone();
        let dest = target.clone();
        tokio::task::spawn_blocking(move || persist_bytes(&dir, &dest, &bytes))
            .await
            .map_err(|e| KieError::Io(std::io::Error::other(e)))??;

        tracing::info!(url, path = %target.display(), bytes = len, "Saved image");
        Ok(target)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| KieError::Network {
                context: format!("Failed to fetch {}", url),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(KieError::Http {
                status: status.as_u16(),
                body: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| KieError::Network {
            context: "Failed to read image bytes".into(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }

    fn fall_back(&self, url: &str, err: KieError) -> KieError {
        let reason = err.to_string();
        tracing::warn!(url, error = %reason, "Direct download failed, opening URL for manual save");

        match self.opener.open(url) {
            Ok(()) => KieError::DownloadFallback {
                url: url.to_string(),
                reason,
            },
            Err(e) => {
                tracing::warn!(url, error = %e, "Could not open URL");
                KieError::Download {
                    url: url.to_string(),
                    reason: format!("{}; could not open URL: {}", reason, e),
                }
            }
        }
    }
}

/// Write through a temp file in `dir`, then rename onto `target`. The temp
/// file is removed if anything fails before the rename.
fn persist_bytes(dir: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| KieError::Io(e.error))?;
    Ok(())
}
