//! # kieai-rs
//!
//! Async Rust client for [kie.ai](https://kie.ai) image generation tasks,
//! used to render children's literacy posters with the `nano-banana-pro`
//! model.
//!
//! Provides task submission, status polling with a wall-clock timeout and
//! progress callbacks, a generic retry-with-backoff helper, and a file
//! saver that falls back to opening the image URL when the download fails.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kieai_rs::{FileSaver, GenerateOptions, KieClient, KieConfig};
//!
//! # async fn example() -> kieai_rs::Result<()> {
//! let client = KieClient::new(KieConfig::from_env());
//!
//! let options = GenerateOptions::new().aspect_ratio("2:3").resolution("2K");
//! let url = client
//!     .generate("A colorful poster teaching the word 'apple'", &options, |status| {
//!         println!("{}", status)
//!     })
//!     .await?;
//!
//! let path = FileSaver::new("./posters").save(&url, "apple.png").await?;
//! println!("Saved to {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod delay;
pub mod download;
pub mod error;
pub mod poll;
pub mod retry;
pub mod types;

pub use client::KieClient;
pub use config::{ApiUrls, KieConfig};
pub use delay::delay;
pub use download::{FileSaver, SystemOpener, UrlOpener};
pub use error::{KieError, Result};
pub use poll::poll_until_ready;
pub use types::{
    GenerateOptions, PollConfig, PollStep, RetryConfig, StatusLabels, StepState, TaskStatus,
};
