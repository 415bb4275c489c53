use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::api::JobApi;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::events::EventLogger;
use crate::poller::PollPolicy;
use crate::progress::{validate_windows, ProgressTracker};
use crate::report::Reporter;
use crate::stage::{run_stage, StageKind, StageOutput, StageSpec};
use crate::types::Artifacts;

/// Where the orchestrator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Creating,
    Running(StageKind),
    Completed,
    Failed,
}

impl PipelineState {
    pub fn is_active(&self) -> bool {
        matches!(self, PipelineState::Creating | PipelineState::Running(_))
    }
}

/// Result of one [`Pipeline::generate`] call.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(Artifacts),
    Failed(PipelineError),
    /// Another run was already in progress; nothing was done.
    Rejected,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

/// Releases the in-progress flag and re-enables the start control when a
/// run ends, however it ends. A run abandoned mid-flight (its future
/// dropped) is recorded as `Failed`.
struct RunGuard<'a, R: Reporter> {
    running: &'a AtomicBool,
    state: &'a Mutex<PipelineState>,
    reporter: &'a R,
}

impl<'a, R: Reporter> RunGuard<'a, R> {
    fn acquire(
        running: &'a AtomicBool,
        state: &'a Mutex<PipelineState>,
        reporter: &'a R,
    ) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        reporter.set_control_enabled(false);
        Some(Self {
            running,
            state,
            reporter,
        })
    }
}

impl<R: Reporter> Drop for RunGuard<'_, R> {
    fn drop(&mut self) {
        {
            let mut state = lock(self.state);
            if state.is_active() {
                warn!(state = ?*state, "run abandoned before finishing");
                *state = PipelineState::Failed;
            }
        }
        self.reporter.set_control_enabled(true);
        self.running.store(false, Ordering::Release);
    }
}

/// Drives the five-stage generation pipeline end to end.
///
/// Stages run strictly in order: story, narration, subtitles, images,
/// video. The first failure ends the run; later stages are never
/// submitted. Only one run may be active at a time.
///
/// # Example
/// ```no_run
/// use reel_pipeline::{MemoryReporter, Pipeline, PipelineConfig, ReelClient, RunOutcome};
///
/// # async fn example() -> reel_pipeline::Result<()> {
/// let config = PipelineConfig::default();
/// let pipeline = Pipeline::new(ReelClient::from_config(&config), MemoryReporter::new(), config)?;
///
/// if let RunOutcome::Completed(artifacts) = pipeline.generate().await {
///     println!("video at {}", artifacts.video_url);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<A: JobApi, R: Reporter> {
    api: A,
    reporter: R,
    plan: Vec<StageSpec>,
    policy: PollPolicy,
    state: Mutex<PipelineState>,
    progress: Mutex<ProgressTracker>,
    running: AtomicBool,
}

impl<A: JobApi, R: Reporter> std::fmt::Debug for Pipeline<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "stages",
                &self.plan.iter().map(|s| s.kind).collect::<Vec<_>>(),
            )
            .field("policy", &self.policy)
            .field("state", &self.state())
            .field("running", &self.is_running())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl<A: JobApi, R: Reporter> Pipeline<A, R> {
    /// Create a pipeline with the standard five-stage plan.
    pub fn new(api: A, reporter: R, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let plan = StageSpec::standard_plan(&config.generation);
        Self::with_plan(api, reporter, plan, PollPolicy::from_config(&config)?)
    }

    /// Create a pipeline with a custom plan. The plan must list every stage
    /// once, in order, with valid progress windows.
    pub fn with_plan(api: A, reporter: R, plan: Vec<StageSpec>, policy: PollPolicy) -> Result<Self> {
        let kinds: Vec<_> = plan.iter().map(|s| s.kind).collect();
        if kinds != StageKind::ALL {
            return Err(PipelineError::InvalidConfig(format!(
                "stages must be {:?}, got {:?}",
                StageKind::ALL,
                kinds
            )));
        }
        validate_windows(plan.iter().map(|s| &s.window))?;

        Ok(Self {
            api,
            reporter,
            plan,
            policy,
            state: Mutex::new(PipelineState::Idle),
            progress: Mutex::new(ProgressTracker::new()),
            running: AtomicBool::new(false),
        })
    }

    pub fn state(&self) -> PipelineState {
        *lock(&self.state)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Current total progress, 0–100.
    pub fn progress(&self) -> f64 {
        lock(&self.progress).current()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.plan
    }

    fn set_state(&self, state: PipelineState) {
        debug!(?state, "pipeline state");
        *lock(&self.state) = state;
    }

    fn advance_progress(&self, percent: f64) {
        let changed = lock(&self.progress).advance(percent);
        if let Some(value) = changed {
            self.reporter.report_progress(value);
        }
    }

    fn reset_progress(&self) {
        let value = lock(&self.progress).reset();
        self.reporter.report_progress(value);
    }

    /// Run the whole pipeline once.
    ///
    /// Returns [`RunOutcome::Rejected`] without side effects if a run is
    /// already active. Failures are logged, reset progress to 0, and are
    /// returned in [`RunOutcome::Failed`]; the pipeline is ready for
    /// another call either way.
    pub async fn generate(&self) -> RunOutcome {
        let Some(_guard) = RunGuard::acquire(&self.running, &self.state, &self.reporter) else {
            debug!("generation already in progress, ignoring request");
            return RunOutcome::Rejected;
        };

        let logger = EventLogger::new(&self.reporter);
        self.reporter.clear_results();
        self.reset_progress();
        logger.info("Starting video generation process...");

        match self.execute(&logger).await {
            Ok(artifacts) => {
                self.set_state(PipelineState::Completed);
                self.advance_progress(100.0);
                self.reporter.show_video(&artifacts.video_url);
                logger.success("Video generation complete!");
                info!(project_id = %artifacts.project_id, video_url = %artifacts.video_url, "pipeline completed");
                RunOutcome::Completed(artifacts)
            }
            Err(e) => {
                self.set_state(PipelineState::Failed);
                warn!(error = %e, stage = ?e.stage(), "pipeline failed");
                logger.error(format!("Error generating video: {}", e));
                self.reset_progress();
                RunOutcome::Failed(e)
            }
        }
    }

    async fn execute(&self, logger: &EventLogger<'_, R>) -> Result<Artifacts> {
        self.set_state(PipelineState::Creating);
        let project_id = self.create_project().await?;
        let mut artifacts = Artifacts {
            project_id: project_id.clone(),
            ..Default::default()
        };

        for stage in &self.plan {
            self.set_state(PipelineState::Running(stage.kind));
            self.advance_progress(stage.window.start);

            let output = run_stage(
                &self.api,
                stage,
                &project_id,
                self.policy,
                logger,
                |percent| self.advance_progress(percent),
            )
            .await?;

            self.advance_progress(stage.window.end());

            match output {
                StageOutput::Story { title } => artifacts.title = Some(title),
                StageOutput::Narration { audio_url } => artifacts.audio_url = audio_url,
                StageOutput::Subtitles => {}
                StageOutput::Images { urls } => {
                    self.reporter.show_images(&urls);
                    artifacts.image_urls = urls;
                }
                StageOutput::Video { url } => artifacts.video_url = url,
            }
        }

        Ok(artifacts)
    }

    async fn create_project(&self) -> Result<String> {
        let resp = self.api.create_project().await?;
        if !resp.success {
            return Err(PipelineError::Submission {
                stage: "project".to_string(),
                message: resp.message_or("project creation rejected"),
            });
        }
        let project_id = resp.project_id.ok_or_else(|| {
            PipelineError::InvalidResponse("Project response missing project_id".to_string())
        })?;
        info!(project_id = %project_id, "project created");
        Ok(project_id)
    }
}
