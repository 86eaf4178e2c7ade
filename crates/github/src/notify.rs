use std::collections::BTreeSet;

use cancel_runs_core::{
    config::GitHubConfig,
    models::{Origin, RunId},
};

use crate::{api::ActionsApi, cancel::CancellationOutcome, origin::find_pull_request};

/// Web URL of a workflow run.
pub fn run_url(config: &GitHubConfig, owner: &str, repo: &str, run_id: RunId) -> String {
    format!("{}/{}/{}/actions/runs/{}", config.server_url(), owner, repo, run_id)
}

/// Comments once on the pull request of every cancelled `pull_request` run.
///
/// Failures are logged and skipped. Returns the numbers of the pull requests
/// that were commented on.
pub async fn notify_cancelled<A: ActionsApi>(
    api: &A,
    outcome: &CancellationOutcome,
    run_url: &str,
    reason: &str,
) -> Vec<u64> {
    let body = format!("[The workflow run]({run_url}) is cancelling this PR. {reason}");
    let mut notified = BTreeSet::new();
    for run in outcome.cancelled().filter(|r| r.event == "pull_request") {
        let pull_request = match find_pull_request(
            api,
            &run.head_repo_full_name,
            &run.head_branch,
            &run.head_sha,
        )
        .await
        {
            Ok(Some(pull_request)) => pull_request,
            Ok(None) => {
                tracing::warn!("No open pull request found for cancelled run {}", run.id);
                continue;
            }
            Err(e) => {
                tracing::warn!("Failed to find pull request for run {}: {:?}", run.id, e);
                continue;
            }
        };
        if notified.contains(&pull_request.number) {
            continue;
        }
        match api.create_comment(pull_request.number, &body).await {
            Ok(()) => {
                tracing::info!("Notified pull request #{}", pull_request.number);
                notified.insert(pull_request.number);
            }
            Err(e) => tracing::warn!("{:?}", e),
        }
    }
    notified.into_iter().collect()
}

/// Posts `message` on the source run's pull request, if it has one.
pub async fn notify_start<A: ActionsApi>(
    api: &A,
    origin: &Origin,
    run_url: &str,
    message: &str,
) -> bool {
    let Some(pull_request) = &origin.pull_request else {
        tracing::debug!("Run {} has no pull request to notify", origin.run_id);
        return false;
    };
    let body = format!("{message} [The workflow run]({run_url})");
    match api.create_comment(pull_request.number, &body).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("{:?}", e);
            false
        }
    }
}
