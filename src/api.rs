use serde_json::Value;
use std::future::Future;

use crate::error::Result;
use crate::stage::StageKind;
use crate::types::{SubmitResponse, TaskStatus};

/// Remote job API the pipeline drives.
///
/// [`ReelClient`](crate::ReelClient) implements this over HTTP. Tests and
/// embedders can supply their own implementation.
///
/// Protocol-level refusals (`success=false`) are returned as `Ok` values;
/// `Err` is reserved for transport and decoding failures.
pub trait JobApi: Send + Sync {
    /// Ask the server for a fresh project id.
    fn create_project(&self) -> impl Future<Output = Result<SubmitResponse>> + Send;

    /// Submit the job for `stage` within `project_id`.
    fn submit(
        &self,
        stage: StageKind,
        project_id: &str,
        body: &Value,
    ) -> impl Future<Output = Result<SubmitResponse>> + Send;

    /// Query the status of the job for `stage`. Must be free of side effects.
    fn status(
        &self,
        stage: StageKind,
        project_id: &str,
    ) -> impl Future<Output = Result<TaskStatus>> + Send;
}
