use anyhow::{Context, Result};
use cancel_runs_core::{
    CancelError,
    config::{CancelConfig, CancelMode},
    models::{HeadKey, Origin, RunId},
    policy::CancelPolicy,
};

use crate::{
    api::ActionsApi,
    cancel::{CancellationOutcome, execute},
    evaluate::Evaluator,
    notify::{notify_cancelled, notify_start},
    origin::resolve_origin,
    runs::collect_runs,
};

/// Everything one canceller invocation acts on.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// The run executing the canceller.
    pub run_id: RunId,
    /// Event that triggered the invoking run.
    pub event: String,
    pub run_url: String,
    pub cancel: CancelConfig,
}

/// Values reported back to the workflow.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    pub source_head_repo: String,
    pub source_head_branch: String,
    pub source_head_sha: String,
    pub source_event: String,
    pub pull_request_number: Option<u64>,
    pub merge_commit_sha: Option<String>,
    pub cancelled_runs: Vec<RunId>,
}

impl Outputs {
    fn new(origin: &Origin, outcome: &CancellationOutcome) -> Self {
        Self {
            source_head_repo: origin.head_repo.clone(),
            source_head_branch: origin.head_branch.clone(),
            source_head_sha: origin.head_sha.clone(),
            source_event: origin.event.clone(),
            pull_request_number: origin.pull_request.as_ref().map(|pr| pr.number),
            merge_commit_sha: origin
                .pull_request
                .as_ref()
                .and_then(|pr| pr.merge_commit_sha.clone()),
            cancelled_runs: outcome.cancelled_ids(),
        }
    }

    /// Output names and values, in `$GITHUB_OUTPUT` order.
    pub fn pairs(&self) -> Result<Vec<(&'static str, String)>> {
        let pull_request_number =
            self.pull_request_number.map(|n| n.to_string()).unwrap_or_default();
        Ok(vec![
            ("sourceHeadRepo", self.source_head_repo.clone()),
            ("sourceHeadBranch", self.source_head_branch.clone()),
            ("sourceHeadSha", self.source_head_sha.clone()),
            ("sourceEvent", self.source_event.clone()),
            ("pullRequestNumber", pull_request_number),
            ("mergeCommitSha", self.merge_commit_sha.clone().unwrap_or_default()),
            (
                "cancelledRuns",
                serde_json::to_string(&self.cancelled_runs)
                    .context("Failed to serialize cancelled runs")?,
            ),
        ])
    }
}

/// Runs one cancellation pass.
///
/// The policy is validated before any request is made, so configuration errors
/// never touch the API.
pub async fn cancel_runs<A: ActionsApi>(api: &A, invocation: &Invocation) -> Result<Outputs> {
    let config = &invocation.cancel;
    let source_run_id = config.source_run_id.unwrap_or(invocation.run_id);
    let policy = CancelPolicy::from_config(config, source_run_id, &invocation.event)?;
    tracing::info!("Cancelling runs in {} mode on behalf of run {}", policy.mode(), source_run_id);

    let origin = resolve_origin(api, source_run_id).await?;
    if let Some(message) = config.notify_pr_message_start.as_deref().filter(|m| !m.is_empty()) {
        notify_start(api, &origin, &invocation.run_url, message).await;
    }

    let workflow_ref = match config.workflow_file_name.as_deref().filter(|f| !f.is_empty()) {
        Some(file_name) => file_name.to_string(),
        None => origin
            .workflow_ref
            .clone()
            .ok_or(CancelError::WorkflowResolution(source_run_id))?,
    };

    let policy = policy.with_head_repo(&origin.head_repo);
    let (branch, source_head) = match policy.mode() {
        CancelMode::Duplicates => {
            let branch = Some(origin.head_branch.as_str()).filter(|b| !b.is_empty());
            (branch, Some(origin.head_key()))
        }
        _ => (None, None::<HeadKey>),
    };

    let index = collect_runs(api, &workflow_ref, branch).await?;
    let mut evaluator = Evaluator::new(&policy, source_head, &config.skip_event_types);
    let outcome = execute(api, &mut evaluator, &index).await?;

    if config.notify_pr_cancel && !outcome.is_empty() {
        let reason = match config.notify_pr_cancel_message.as_deref().filter(|m| !m.is_empty()) {
            Some(message) => message.to_string(),
            None => policy.reason(),
        };
        notify_cancelled(api, &outcome, &invocation.run_url, &reason).await;
    }

    Ok(Outputs::new(&origin, &outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeApi, job, pr, run};

    fn invocation(mode: CancelMode) -> Invocation {
        Invocation {
            run_id: 50,
            event: "push".to_string(),
            run_url: "https://github.com/octo/project/actions/runs/50".to_string(),
            cancel: CancelConfig { mode, ..Default::default() },
        }
    }

    fn feature_runs(event: &str) -> FakeApi {
        FakeApi::default()
            .with_run(run(40, 4, "in_progress", event, "octo/project", "feature-x"))
            .with_run(run(45, 5, "queued", event, "octo/project", "feature-x"))
            .with_run(run(50, 6, "in_progress", event, "octo/project", "feature-x"))
            .with_run(run(55, 7, "queued", event, "octo/project", "feature-x"))
            .with_run(run(60, 8, "queued", event, "octo/project", "feature-y"))
    }

    #[tokio::test]
    async fn test_duplicates_cancels_earlier_runs_on_same_head() {
        let api = feature_runs("push");
        let outputs = cancel_runs(&api, &invocation(CancelMode::Duplicates)).await.unwrap();
        assert_eq!(api.cancel_attempts(), [40, 45]);
        assert_eq!(outputs.cancelled_runs, [40, 45]);
        assert_eq!(outputs.source_head_branch, "feature-x");
        assert_eq!(outputs.pull_request_number, None);
        assert_eq!(api.run_queries(), [
            ("queued".to_string(), Some("feature-x".to_string()), 1),
            ("in_progress".to_string(), Some("feature-x".to_string()), 1)
        ]);
    }

    #[tokio::test]
    async fn test_second_invocation_is_idempotent() {
        let api = feature_runs("push");
        cancel_runs(&api, &invocation(CancelMode::Duplicates)).await.unwrap();
        let outputs = cancel_runs(&api, &invocation(CancelMode::Duplicates)).await.unwrap();
        assert!(outputs.cancelled_runs.is_empty());
        assert_eq!(api.cancel_attempts(), [40, 45]);
    }

    #[tokio::test]
    async fn test_self_mode() {
        let api = feature_runs("push");
        let outputs = cancel_runs(&api, &invocation(CancelMode::SelfRun)).await.unwrap();
        assert_eq!(outputs.cancelled_runs, [50]);
    }

    #[tokio::test]
    async fn test_configuration_errors_make_no_requests() {
        let api = feature_runs("push");
        let mut bad_patterns = invocation(CancelMode::Duplicates);
        bad_patterns.cancel.job_name_patterns = vec!["^Build$".to_string()];
        let mut scheduled = invocation(CancelMode::SelfRun);
        scheduled.event = "schedule".to_string();
        let mut invalid = invocation(CancelMode::NamedJobs);
        invalid.cancel.job_name_patterns = vec!["(".to_string()];
        for invocation in [bad_patterns, scheduled, invalid] {
            let err = cancel_runs(&api, &invocation).await.unwrap_err();
            assert!(err.downcast_ref::<CancelError>().is_some(), "{err:?}");
        }
        assert!(api.run_fetches().is_empty());
        assert!(api.run_queries().is_empty());
    }

    #[tokio::test]
    async fn test_scheduled_sweep_by_workflow_file() {
        let api = feature_runs("push").with_workflow_file("ci.yml", 7);
        let mut invocation = invocation(CancelMode::AllDuplicates);
        invocation.event = "schedule".to_string();
        invocation.cancel.workflow_file_name = Some("ci.yml".to_string());
        let outputs = cancel_runs(&api, &invocation).await.unwrap();
        assert_eq!(outputs.cancelled_runs, [40, 45, 50]);
        assert_eq!(api.run_queries()[0].1, None);
    }

    #[tokio::test]
    async fn test_failed_jobs_with_notification() {
        let api = feature_runs("pull_request")
            .with_jobs(45, vec![job("Static checks", Some("failure"))])
            .with_pull_request("octo:feature-x", pr(9, "sha45"));
        let mut invocation = invocation(CancelMode::FailedJobs);
        invocation.cancel.job_name_patterns = vec!["^Static checks$".to_string()];
        invocation.cancel.notify_pr_cancel = true;
        let outputs = cancel_runs(&api, &invocation).await.unwrap();
        assert_eq!(outputs.cancelled_runs, [45]);
        assert_eq!(api.comments(), [(
            9,
            "[The workflow run](https://github.com/octo/project/actions/runs/50) is cancelling \
             this PR. It has failed jobs matching `^Static checks$`."
                .to_string()
        )]);
    }

    #[tokio::test]
    async fn test_pull_request_outputs_and_custom_messages() {
        let api = feature_runs("pull_request").with_pull_request("octo:feature-x", pr(9, "sha50"));
        let mut invocation = invocation(CancelMode::SelfRun);
        invocation.cancel.notify_pr_cancel = true;
        invocation.cancel.notify_pr_cancel_message = Some("Cancelled by request.".to_string());
        invocation.cancel.notify_pr_message_start = Some("Starting.".to_string());
        let outputs = cancel_runs(&api, &invocation).await.unwrap();
        assert_eq!(outputs.pull_request_number, Some(9));
        assert_eq!(outputs.merge_commit_sha.as_deref(), Some("merge9"));
        let comments = api.comments().into_iter().map(|(_, body)| body).collect::<Vec<_>>();
        assert_eq!(comments, [
            "Starting. [The workflow run](https://github.com/octo/project/actions/runs/50)",
            "[The workflow run](https://github.com/octo/project/actions/runs/50) is cancelling \
             this PR. Cancelled by request.",
        ]);
    }

    #[test]
    fn test_output_pairs() {
        let outputs = Outputs {
            source_head_repo: "octo/project".to_string(),
            source_head_branch: "main".to_string(),
            source_head_sha: "abc".to_string(),
            source_event: "push".to_string(),
            pull_request_number: None,
            merge_commit_sha: None,
            cancelled_runs: vec![40, 45],
        };
        let pairs = outputs.pairs().unwrap();
        assert_eq!(pairs[4], ("pullRequestNumber", String::new()));
        assert_eq!(pairs[6], ("cancelledRuns", "[40,45]".to_string()));
    }
}
