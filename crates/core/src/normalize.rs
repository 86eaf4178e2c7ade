//! Decoding of workflow run listing pages.
//!
//! The listing endpoints usually wrap runs as `{"total_count": N, "workflow_runs": [...]}`,
//! but some responses carry the runs as a bare array. Both are accepted here so
//! that nothing downstream has to care which one arrived.

use serde::Deserialize;

use crate::{
    error::CancelError,
    models::{RunRecord, WorkflowRun},
};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RunPage {
    Bare(Vec<WorkflowRun>),
    Wrapped { workflow_runs: Vec<WorkflowRun> },
}

impl RunPage {
    pub fn into_records(self) -> Vec<RunRecord> {
        let runs = match self {
            Self::Bare(runs) => runs,
            Self::Wrapped { workflow_runs } => workflow_runs,
        };
        runs.into_iter().map(RunRecord::from).collect()
    }
}

/// Decodes one listing page into run records.
pub fn normalize(page: serde_json::Value) -> Result<Vec<RunRecord>, CancelError> {
    let kind = match &page {
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
        _ => "scalar",
    };
    serde_json::from_value::<RunPage>(page)
        .map(RunPage::into_records)
        .map_err(|e| CancelError::MalformedPage(format!("unrecognized {kind} payload: {e}")))
}
