//! The five pipeline stages and the runner that drives one of them.

use serde_json::{json, Value};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::api::JobApi;
use crate::config::GenerationSettings;
use crate::error::{PipelineError, Result};
use crate::events::{EventLogger, Severity};
use crate::poller::{poll, PollPolicy};
use crate::progress::ProgressWindow;
use crate::report::Reporter;
use crate::types::TaskStatus;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Story,
    Narration,
    Subtitles,
    Images,
    Video,
}

impl StageKind {
    pub const ALL: [StageKind; 5] = [
        StageKind::Story,
        StageKind::Narration,
        StageKind::Subtitles,
        StageKind::Images,
        StageKind::Video,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Story => "story",
            StageKind::Narration => "narration",
            StageKind::Subtitles => "subtitles",
            StageKind::Images => "images",
            StageKind::Video => "video",
        }
    }

    /// Path of the endpoint that starts this stage's job.
    pub fn submit_path(&self) -> &'static str {
        match self {
            StageKind::Story => "/api/generate_story",
            StageKind::Narration => "/api/narration",
            StageKind::Subtitles => "/api/subtitles",
            StageKind::Images => "/api/images",
            StageKind::Video => "/api/video",
        }
    }

    /// Path of the status endpoint. The story stage answers synchronously
    /// and has none.
    pub fn status_path(&self) -> Option<&'static str> {
        match self {
            StageKind::Story => None,
            StageKind::Narration => Some("/api/narration/status"),
            StageKind::Subtitles => Some("/api/subtitles/status"),
            StageKind::Images => Some("/api/images/status"),
            StageKind::Video => Some("/api/video/status"),
        }
    }

    pub fn is_polled(&self) -> bool {
        self.status_path().is_some()
    }

    /// Fixed slice of total progress this stage may fill.
    pub fn window(&self) -> ProgressWindow {
        match self {
            StageKind::Story => ProgressWindow::new(10.0, 10.0),
            StageKind::Narration => ProgressWindow::new(30.0, 10.0),
            StageKind::Subtitles => ProgressWindow::new(50.0, 10.0),
            StageKind::Images => ProgressWindow::new(70.0, 10.0),
            StageKind::Video => ProgressWindow::new(90.0, 10.0),
        }
    }

    fn start_message(&self) -> &'static str {
        match self {
            StageKind::Story => "Fetching and enhancing story...",
            StageKind::Narration => "Generating voice narration...",
            StageKind::Subtitles => "Generating subtitles and scene descriptions...",
            StageKind::Images => "Generating images...",
            StageKind::Video => "Compiling final video...",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            StageKind::Story => "Story",
            StageKind::Narration => "Narration",
            StageKind::Subtitles => "Subtitles",
            StageKind::Images => "Image",
            StageKind::Video => "Video",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        StageKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| PipelineError::Other(format!("Unknown stage: {}", s)))
    }
}

/// One entry of the pipeline plan: which stage, where its progress goes,
/// and what body its submit call carries.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub kind: StageKind,
    pub window: ProgressWindow,
    pub request: Value,
}

impl StageSpec {
    pub fn new(kind: StageKind, settings: &GenerationSettings) -> Self {
        let request = match kind {
            StageKind::Story => Value::Null,
            StageKind::Narration => json!({
                "voice": settings.voice,
                "speed": settings.speed,
            }),
            StageKind::Subtitles => json!({}),
            StageKind::Images => json!({ "style": settings.image_style }),
            StageKind::Video => json!({
                "quality": settings.video_quality,
                "use_dust_overlay": settings.dust_overlay,
            }),
        };
        Self {
            kind,
            window: kind.window(),
            request,
        }
    }

    /// All five stages in order.
    pub fn standard_plan(settings: &GenerationSettings) -> Vec<StageSpec> {
        StageKind::ALL
            .into_iter()
            .map(|kind| StageSpec::new(kind, settings))
            .collect()
    }
}

/// What a stage produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Story { title: String },
    Narration { audio_url: Option<String> },
    Subtitles,
    Images { urls: Vec<String> },
    Video { url: String },
}

impl StageOutput {
    /// Pull the stage's result out of its completion payload.
    fn from_status(kind: StageKind, status: TaskStatus) -> Result<Self> {
        match kind {
            StageKind::Story => Err(PipelineError::InvalidResponse(
                "story stage has no status payload".to_string(),
            )),
            StageKind::Narration => Ok(StageOutput::Narration {
                audio_url: status.audio_url,
            }),
            StageKind::Subtitles => Ok(StageOutput::Subtitles),
            StageKind::Images => status
                .image_urls
                .map(|urls| StageOutput::Images { urls })
                .ok_or_else(|| {
                    PipelineError::InvalidResponse(
                        "Completed images status missing image_urls".to_string(),
                    )
                }),
            StageKind::Video => status
                .video_url
                .map(|url| StageOutput::Video { url })
                .ok_or_else(|| {
                    PipelineError::InvalidResponse(
                        "Completed video status missing video_url".to_string(),
                    )
                }),
        }
    }

    fn summary(&self) -> String {
        match self {
            StageOutput::Story { title } => format!("Story selected: \"{}\"", title),
            StageOutput::Narration { .. } => "Narration generated".to_string(),
            StageOutput::Subtitles => "Subtitles and scene descriptions generated".to_string(),
            StageOutput::Images { urls } => format!("{} images generated", urls.len()),
            StageOutput::Video { .. } => "Video compiled".to_string(),
        }
    }
}

/// Run one stage: submit, wait for completion, extract the result.
///
/// `on_progress` receives total pipeline progress, already remapped from
/// the stage-local 0–100 scale into `stage.window`. Poll messages replace
/// each other in the log after the first one.
pub async fn run_stage<A, R, P>(
    api: &A,
    stage: &StageSpec,
    project_id: &str,
    policy: PollPolicy,
    logger: &EventLogger<'_, R>,
    on_progress: P,
) -> Result<StageOutput>
where
    A: JobApi,
    R: Reporter + ?Sized,
    P: FnMut(f64),
{
    let kind = stage.kind;
    logger.info(kind.start_message());

    let result = submit_and_wait(api, stage, project_id, policy, logger, on_progress).await;
    match &result {
        Ok(output) => {
            info!(stage = %kind, project_id, "stage completed");
            logger.success(output.summary());
        }
        Err(e) => {
            warn!(stage = %kind, project_id, error = %e, "stage failed");
            logger.log(format!("{} stage failed", kind.label()), Severity::Warning, false);
        }
    }
    result
}

async fn submit_and_wait<A, R, P>(
    api: &A,
    stage: &StageSpec,
    project_id: &str,
    policy: PollPolicy,
    logger: &EventLogger<'_, R>,
    mut on_progress: P,
) -> Result<StageOutput>
where
    A: JobApi,
    R: Reporter + ?Sized,
    P: FnMut(f64),
{
    let kind = stage.kind;
    info!(stage = %kind, project_id, "submitting job");
    let submitted = api.submit(kind, project_id, &stage.request).await?;
    if !submitted.success {
        return Err(PipelineError::Submission {
            stage: kind.to_string(),
            message: submitted.message_or("submission rejected"),
        });
    }

    if !kind.is_polled() {
        let title = submitted.title.ok_or_else(|| {
            PipelineError::InvalidResponse(format!("{} response missing title", kind))
        })?;
        return Ok(StageOutput::Story { title });
    }

    let window = stage.window;
    let mut appended_message = false;
    let mut attempt = 0u32;
    let status = poll(
        kind,
        policy,
        move || {
            attempt += 1;
            let attempt = attempt;
            async move {
                let status = api.status(kind, project_id).await?;
                debug!(
                    stage = %kind,
                    project_id,
                    attempt,
                    status = status.status.as_str(),
                    progress = status.progress,
                    "status check"
                );
                Ok::<_, PipelineError>(status)
            }
        },
        |local| on_progress(window.remap(local)),
        |message| {
            logger.log(message, Severity::Info, appended_message);
            appended_message = true;
        },
    )
    .await?;

    StageOutput::from_status(kind, status)
}
