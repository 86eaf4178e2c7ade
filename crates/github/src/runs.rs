use anyhow::{Context, Result};
use cancel_runs_core::{index::RunIndex, models::RunStatus, normalize::normalize};

use crate::api::{ActionsApi, PER_PAGE, RunQuery};

/// Lists every active run of a workflow, one query per active status, merged by
/// run number.
///
/// A page that cannot be decoded aborts collection: acting on a partial view could
/// keep the wrong run alive.
pub async fn collect_runs<A: ActionsApi>(
    api: &A,
    workflow_ref: &str,
    branch: Option<&str>,
) -> Result<RunIndex> {
    let mut index = RunIndex::new();
    for &status in RunStatus::ACTIVE {
        let query = RunQuery { workflow_ref: Some(workflow_ref), status, branch, event: None };
        let mut page = 1;
        loop {
            let payload = api.list_runs_page(&query, page).await?;
            let records = normalize(payload)
                .with_context(|| format!("Failed to decode {status} runs page {page}"))?;
            let count = records.len();
            index.extend(records);
            if count < PER_PAGE as usize {
                break;
            }
            page += 1;
        }
    }
    tracing::info!(
        "Found {} active runs of workflow {}{}",
        index.len(),
        workflow_ref,
        branch.map(|b| format!(" on {b}")).unwrap_or_default()
    );
    Ok(index)
}
