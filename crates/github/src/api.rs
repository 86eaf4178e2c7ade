use anyhow::Result;
use cancel_runs_core::models::{JobRecord, PullRequestRef, RunId, RunStatus, WorkflowRun};

/// Page size requested from every paginated endpoint.
pub const PER_PAGE: u8 = 100;

/// Filters for one workflow run listing query.
#[derive(Debug, Clone, Copy)]
pub struct RunQuery<'a> {
    /// Workflow id or file name; all workflows of the repository when absent.
    pub workflow_ref: Option<&'a str>,
    pub status: RunStatus,
    pub branch: Option<&'a str>,
    pub event: Option<&'a str>,
}

/// The Actions and pull request endpoints used by the canceller, scoped to one
/// repository.
///
/// Calls are awaited one at a time by the caller; implementations need not be
/// safe for concurrent use.
#[allow(async_fn_in_trait)]
pub trait ActionsApi {
    /// Fetches one page (1-based) of a run listing as raw JSON.
    async fn list_runs_page(&self, query: &RunQuery<'_>, page: u32) -> Result<serde_json::Value>;

    /// Fetches one page (1-based) of the jobs of a run.
    async fn list_jobs_page(&self, run_id: RunId, page: u32) -> Result<Vec<JobRecord>>;

    /// Fetches a single run, or `None` if it does not exist.
    async fn get_run(&self, run_id: RunId) -> Result<Option<WorkflowRun>>;

    async fn cancel_run(&self, run_id: RunId) -> Result<()>;

    /// Lists open pull requests whose head is `owner:branch`.
    async fn list_pull_requests(&self, head: &str) -> Result<Vec<PullRequestRef>>;

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<()>;
}
