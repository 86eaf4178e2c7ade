use anyhow::Result;
use cancel_runs_core::{
    CancelError,
    models::{Origin, PullRequestRef, RunId},
};

use crate::api::ActionsApi;

/// Establishes the head coordinates, trigger and workflow of a run.
///
/// For `pull_request` runs the open pull request whose head matches the run is
/// looked up as well.
pub async fn resolve_origin<A: ActionsApi>(api: &A, run_id: RunId) -> Result<Origin> {
    let run = api.get_run(run_id).await?.ok_or(CancelError::OriginNotFound(run_id))?;
    let head_repo = run.head_repository.map(|r| r.full_name).unwrap_or_default();
    let head_branch = run.head_branch.unwrap_or_default();
    let pull_request = if run.event == "pull_request" {
        find_pull_request(api, &head_repo, &head_branch, &run.head_sha).await?
    } else {
        None
    };
    tracing::info!(
        "Source run {}: {} on {}/{} ({})",
        run_id,
        run.event,
        head_repo,
        head_branch,
        run.head_sha
    );
    Ok(Origin {
        run_id,
        head_repo,
        head_branch,
        head_sha: run.head_sha,
        event: run.event,
        workflow_ref: run.workflow_id.map(|id| id.to_string()),
        pull_request,
    })
}

/// Resolves the id of the workflow a run belongs to.
pub async fn resolve_workflow_ref<A: ActionsApi>(api: &A, run_id: RunId) -> Result<String> {
    let run = api.get_run(run_id).await?.ok_or(CancelError::OriginNotFound(run_id))?;
    let workflow_id = run.workflow_id.ok_or(CancelError::WorkflowResolution(run_id))?;
    Ok(workflow_id.to_string())
}

/// Finds the open pull request whose head is `head_branch` in `head_repo` at `head_sha`.
pub async fn find_pull_request<A: ActionsApi>(
    api: &A,
    head_repo: &str,
    head_branch: &str,
    head_sha: &str,
) -> Result<Option<PullRequestRef>> {
    let head_owner = head_repo.split('/').next().unwrap_or_default();
    let head = format!("{head_owner}:{head_branch}");
    let pull_requests = api.list_pull_requests(&head).await?;
    let found = pull_requests.into_iter().find(|pr| pr.head_sha == head_sha);
    match &found {
        Some(pr) => tracing::debug!("Found pull request #{} for {}", pr.number, head),
        None => tracing::debug!("No pull request with head {} at {}", head, head_sha),
    }
    Ok(found)
}
