//! # reel-pipeline
//!
//! Async client that drives a remote story-to-video generation service
//! through its five stages: story selection, narration, subtitles, image
//! generation, and video compilation.
//!
//! ## Features
//!
//! - **One poller for every stage** — fixed-interval status checks with an
//!   attempt budget, returning a single terminal result
//! - **Progress windows** — each stage's local 0–100 progress is mapped into
//!   its slice of total progress, which only moves forward within a run
//! - **Fail fast** — the first rejected submission, rejected status query,
//!   task error, or timeout ends the run and resets progress
//! - **Single-run guard** — a second `generate()` while one is active is
//!   rejected, and cleanup runs on every exit path
//! - **Pluggable presentation** — everything user-facing goes through the
//!   [`Reporter`] trait, so the core runs headless in tests
//!
//! ## Quick Start
//!
//! ```no_run
//! use reel_pipeline::{MemoryReporter, Pipeline, PipelineConfig, ReelClient, RunOutcome};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .with_endpoint("http://127.0.0.1:5000")
//!         .with_poll_interval(Duration::from_secs(5))
//!         .with_voice("af_bella")
//!         .build()?;
//!
//!     let client = ReelClient::from_config(&config);
//!     let pipeline = Pipeline::new(client, MemoryReporter::new(), config)?;
//!
//!     match pipeline.generate().await {
//!         RunOutcome::Completed(artifacts) => println!("Video: {}", artifacts.video_url),
//!         RunOutcome::Failed(e) => eprintln!("Failed: {}", e),
//!         RunOutcome::Rejected => {}
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod poller;
pub mod progress;
pub mod report;
pub mod stage;
pub mod types;

pub use api::JobApi;
pub use client::ReelClient;
pub use config::{GenerationSettings, PipelineConfig, PipelineConfigBuilder};
pub use error::{PipelineError, Result};
pub use events::{EventLogger, LogBuffer, LogEntry, Severity};
pub use pipeline::{Pipeline, PipelineState, RunOutcome};
pub use poller::{poll, PollPolicy};
pub use progress::{ProgressTracker, ProgressWindow};
pub use report::{MemoryReporter, Reporter};
pub use stage::{run_stage, StageKind, StageOutput, StageSpec};
pub use types::{Artifacts, SubmitResponse, TaskState, TaskStatus};
