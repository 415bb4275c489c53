use serde::{Deserialize, Serialize};

/// Lifecycle state reported by a status endpoint.
///
/// The server also emits `starting` and `processing`; anything that is not
/// `completed` or `error` counts as pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum TaskState {
    #[default]
    Pending,
    Completed,
    Error,
}

impl TaskState {
    pub fn as_str(&self) -> &str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Completed => "completed",
            TaskState::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskState::Pending)
    }
}

impl From<String> for TaskState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "completed" => TaskState::Completed,
            "error" => TaskState::Error,
            _ => TaskState::Pending,
        }
    }
}

/// One snapshot returned by a stage's status endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: TaskState,
    /// Stage-local completion, 0–100.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl TaskStatus {
    pub fn pending(progress: f64) -> Self {
        Self {
            success: true,
            progress,
            ..Default::default()
        }
    }

    pub fn completed() -> Self {
        Self {
            success: true,
            status: TaskState::Completed,
            progress: 100.0,
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: true,
            status: TaskState::Error,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_image_urls(mut self, urls: Vec<String>) -> Self {
        self.image_urls = Some(urls);
        self
    }

    pub fn with_video_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = Some(url.into());
        self
    }

    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    pub(crate) fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// Reply to a submit call (project creation or a stage job).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl SubmitResponse {
    pub fn accepted() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_project_id(mut self, id: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub(crate) fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Artifacts {
    pub project_id: String,
    pub title: Option<String>,
    pub audio_url: Option<String>,
    pub image_urls: Vec<String>,
    pub video_url: String,
}
