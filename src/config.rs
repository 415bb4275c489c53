use std::time::Duration;

use crate::error::{PipelineError, Result};

/// Default server address of the generation service.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";

/// Knobs forwarded to the remote stages.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Narrator voice id.
    pub voice: String,
    /// Narration speed multiplier.
    pub speed: f64,
    /// Visual style for image generation.
    pub image_style: String,
    /// Video bitrate, e.g. `"4000k"`.
    pub video_quality: String,
    /// Overlay film dust on the compiled video.
    pub dust_overlay: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            voice: "af_bella".to_string(),
            speed: 0.85,
            image_style: "Cinematic".to_string(),
            video_quality: "4000k".to_string(),
            dust_overlay: true,
        }
    }
}

/// Configuration for a pipeline run.
///
/// Use [`PipelineConfig::builder()`] for validated construction, or
/// [`PipelineConfig::default()`] for the stock settings (local server,
/// 5 s poll interval, 60 attempts per stage).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub endpoint: String,

    /// Delay between status checks.
    pub poll_interval: Duration,

    /// Status checks per stage before giving up.
    pub max_attempts: u32,

    /// Per-request HTTP timeout.
    pub request_timeout: Duration,

    pub generation: GenerationSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval: Duration::from_secs(5),
            max_attempts: 60,
            request_timeout: Duration::from_secs(30),
            generation: GenerationSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Worst-case time a single stage may spend polling.
    pub fn max_stage_wait(&self) -> Duration {
        self.poll_interval * self.max_attempts
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(PipelineError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(PipelineError::InvalidConfig(
                "max attempts must be greater than zero".to_string(),
            ));
        }
        let speed = self.generation.speed;
        if !(speed > 0.0 && speed <= 2.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "narration speed {} is outside (0, 2]",
                speed
            )));
        }
        if self.endpoint.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "endpoint must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.config.max_attempts = max;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.config.generation.voice = voice.into();
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.config.generation.speed = speed;
        self
    }

    pub fn with_image_style(mut self, style: impl Into<String>) -> Self {
        self.config.generation.image_style = style.into();
        self
    }

    pub fn with_video_quality(mut self, quality: impl Into<String>) -> Self {
        self.config.generation.video_quality = quality.into();
        self
    }

    pub fn with_dust_overlay(mut self, enabled: bool) -> Self {
        self.config.generation.dust_overlay = enabled;
        self
    }

    /// Build the final [`PipelineConfig`], rejecting invalid values.
    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
