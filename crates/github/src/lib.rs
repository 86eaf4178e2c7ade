pub mod api;
pub mod cancel;
pub mod evaluate;
pub mod invocation;
pub mod jobs;
pub mod notify;
pub mod origin;
pub mod runs;

#[cfg(test)]
mod fake;

use anyhow::{Context, Result};
use cancel_runs_core::{
    config::GitHubConfig,
    models::{JobRecord, PullRequestRef, RunId, WorkflowRun},
};
use http::StatusCode;
use octocrab::{GitHubError, Octocrab, params};

use crate::api::{ActionsApi, PER_PAGE, RunQuery};

/// Octocrab client scoped to the repository whose runs are being cancelled.
#[derive(Clone)]
pub struct GitHub {
    pub client: Octocrab,
    pub owner: String,
    pub repo: String,
}

#[derive(serde::Serialize)]
struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    per_page: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
}

#[derive(serde::Serialize)]
struct RunListParams<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<&'a str>,
    per_page: u8,
    page: u32,
}

#[derive(serde::Deserialize)]
struct JobsPage {
    jobs: Vec<JobRecord>,
}

impl GitHub {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let token = config.token.clone().context("No GitHub token configured")?;
        let (owner, repo) =
            config.owner_repo().context("Repository must be given as owner/name")?;
        let mut builder = Octocrab::builder().personal_token(token);
        if let Some(api_url) = &config.api_url {
            builder = builder
                .base_uri(api_url.as_str())
                .with_context(|| format!("Invalid GitHub API URL {api_url}"))?;
        }
        let client = builder.build().context("Failed to create GitHub client")?;
        tracing::debug!("Created GitHub client for {}/{}", owner, repo);
        Ok(Self { client, owner: owner.to_string(), repo: repo.to_string() })
    }

    fn route(&self, path: &str) -> String {
        format!("/repos/{}/{}/{}", self.owner, self.repo, path)
    }
}

impl ActionsApi for GitHub {
    async fn list_runs_page(&self, query: &RunQuery<'_>, page: u32) -> Result<serde_json::Value> {
        let route = match query.workflow_ref {
            Some(workflow_ref) => self.route(&format!("actions/workflows/{workflow_ref}/runs")),
            None => self.route("actions/runs"),
        };
        let params = RunListParams {
            status: query.status.as_str(),
            branch: query.branch,
            event: query.event,
            per_page: PER_PAGE,
            page,
        };
        self.client
            .get(route, Some(&params))
            .await
            .with_context(|| format!("Failed to fetch {} runs page {page}", query.status))
    }

    async fn list_jobs_page(&self, run_id: RunId, page: u32) -> Result<Vec<JobRecord>> {
        let response: JobsPage = self
            .client
            .get(
                self.route(&format!("actions/runs/{run_id}/jobs")),
                Some(&PageParams { per_page: Some(PER_PAGE), page: Some(page) }),
            )
            .await
            .with_context(|| format!("Failed to fetch jobs page {page} of run {run_id}"))?;
        Ok(response.jobs)
    }

    async fn get_run(&self, run_id: RunId) -> Result<Option<WorkflowRun>> {
        match self.client.get(self.route(&format!("actions/runs/{run_id}")), None::<&()>).await {
            Ok(run) => Ok(Some(run)),
            Err(octocrab::Error::GitHub { source, .. })
                if matches!(*source, GitHubError { status_code: StatusCode::NOT_FOUND, .. }) =>
            {
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to fetch run {run_id}")),
        }
    }

    async fn cancel_run(&self, run_id: RunId) -> Result<()> {
        self.client
            .actions()
            .cancel_workflow_run(&self.owner, &self.repo, run_id.into())
            .await
            .with_context(|| format!("Failed to cancel run {run_id}"))
    }

    async fn list_pull_requests(&self, head: &str) -> Result<Vec<PullRequestRef>> {
        let page = self
            .client
            .pulls(&self.owner, &self.repo)
            .list()
            .state(params::State::Open)
            .head(head)
            .per_page(PER_PAGE)
            .send()
            .await
            .with_context(|| format!("Failed to fetch pull requests for {head}"))?;
        let pull_requests = self.client.all_pages(page).await?;
        tracing::debug!("Found {} pull requests for {}", pull_requests.len(), head);
        Ok(pull_requests
            .into_iter()
            .map(|pr| PullRequestRef {
                number: pr.number,
                merge_commit_sha: pr.merge_commit_sha,
                head_sha: pr.head.sha,
            })
            .collect())
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<()> {
        self.client
            .issues(&self.owner, &self.repo)
            .create_comment(issue_number, body)
            .await
            .with_context(|| format!("Failed to comment on pull request #{issue_number}"))?;
        Ok(())
    }
}
