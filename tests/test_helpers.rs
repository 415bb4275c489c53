use reel_pipeline::*;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// A call the fake server received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateProject,
    Submit(StageKind, Value),
    Status(StageKind),
}

/// In-memory server. Each stage answers from its script; once a script is
/// exhausted the stage reports `completed` with a default payload.
#[derive(Default)]
pub struct ScriptedApi {
    project: Mutex<Option<SubmitResponse>>,
    submits: Mutex<HashMap<StageKind, SubmitResponse>>,
    statuses: Mutex<HashMap<StageKind, VecDeque<Result<TaskStatus>>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(self, resp: SubmitResponse) -> Self {
        *self.project.lock().unwrap() = Some(resp);
        self
    }

    pub fn with_submit(self, stage: StageKind, resp: SubmitResponse) -> Self {
        self.submits.lock().unwrap().insert(stage, resp);
        self
    }

    pub fn with_statuses(self, stage: StageKind, script: Vec<Result<TaskStatus>>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(stage, VecDeque::from(script));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn project_creations(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::CreateProject))
            .count()
    }

    pub fn submitted(&self, stage: StageKind) -> bool {
        self.calls()
            .iter()
            .any(|c| matches!(c, Call::Submit(s, _) if *s == stage))
    }

    pub fn status_queries(&self, stage: StageKind) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Status(s) if *s == stage))
            .count()
    }

    fn default_completion(stage: StageKind) -> TaskStatus {
        match stage {
            StageKind::Narration => {
                TaskStatus::completed().with_audio_url("/output/audio/narration.wav")
            }
            StageKind::Images => TaskStatus::completed().with_image_urls(vec![
                "/output/images/scene_1.png".to_string(),
                "/output/images/scene_2.png".to_string(),
            ]),
            StageKind::Video => TaskStatus::completed().with_video_url("/output/videos/final.mp4"),
            _ => TaskStatus::completed(),
        }
    }
}

impl JobApi for ScriptedApi {
    async fn create_project(&self) -> Result<SubmitResponse> {
        self.calls.lock().unwrap().push(Call::CreateProject);
        let resp = self.project.lock().unwrap().clone();
        Ok(resp.unwrap_or_else(|| SubmitResponse::accepted().with_project_id("project-1")))
    }

    async fn submit(&self, stage: StageKind, _project_id: &str, body: &Value) -> Result<SubmitResponse> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Submit(stage, body.clone()));
        let resp = self.submits.lock().unwrap().get(&stage).cloned();
        Ok(resp.unwrap_or_else(|| match stage {
            StageKind::Story => SubmitResponse::accepted().with_title("The Night Shift"),
            _ => SubmitResponse::accepted(),
        }))
    }

    async fn status(&self, stage: StageKind, _project_id: &str) -> Result<TaskStatus> {
        self.calls.lock().unwrap().push(Call::Status(stage));
        let next = self
            .statuses
            .lock()
            .unwrap()
            .get_mut(&stage)
            .and_then(|script| script.pop_front());
        next.unwrap_or_else(|| Ok(Self::default_completion(stage)))
    }
}

/// Collects formatted `tracing` output for assertions.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| l.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Install a debug-level subscriber for the current thread.
pub fn capture_tracing() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}
