//! In-memory [`ActionsApi`] used by the tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use anyhow::{Result, bail};
use cancel_runs_core::models::{
    HeadRepository, JobRecord, PullRequestRef, RunId, RunStatus, WorkflowRun,
};

use crate::api::{ActionsApi, PER_PAGE, RunQuery};

#[derive(Default)]
pub struct FakeApi {
    runs: Mutex<Vec<WorkflowRun>>,
    jobs: HashMap<RunId, Vec<JobRecord>>,
    pull_requests: HashMap<String, Vec<PullRequestRef>>,
    bare_pages: bool,
    runs_payload: Option<serde_json::Value>,
    failing_cancels: HashSet<RunId>,
    failing_comments: bool,
    workflow_files: HashMap<String, u64>,
    calls: Mutex<Calls>,
}

#[derive(Default)]
struct Calls {
    run_fetches: Vec<RunId>,
    run_queries: Vec<(String, Option<String>, u32)>,
    job_pages: Vec<(RunId, u32)>,
    cancel_attempts: Vec<RunId>,
    pull_request_queries: Vec<String>,
    comments: Vec<(u64, String)>,
}

pub fn run(
    id: RunId,
    run_number: u64,
    status: &str,
    event: &str,
    head_repo: &str,
    head_branch: &str,
) -> WorkflowRun {
    WorkflowRun {
        id,
        run_number,
        status: serde_json::from_value(serde_json::Value::String(status.to_string())).unwrap(),
        event: event.to_string(),
        workflow_id: Some(7),
        head_branch: Some(head_branch.to_string()),
        head_sha: format!("sha{id}"),
        head_repository: Some(HeadRepository { full_name: head_repo.to_string() }),
    }
}

pub fn job(name: &str, conclusion: Option<&str>) -> JobRecord {
    JobRecord { name: name.to_string(), conclusion: conclusion.map(str::to_string) }
}

pub fn pr(number: u64, head_sha: &str) -> PullRequestRef {
    PullRequestRef {
        number,
        head_sha: head_sha.to_string(),
        merge_commit_sha: Some(format!("merge{number}")),
    }
}

impl FakeApi {
    pub fn with_run(self, run: WorkflowRun) -> Self {
        self.runs.lock().unwrap().push(run);
        self
    }

    pub fn with_jobs(mut self, run_id: RunId, jobs: Vec<JobRecord>) -> Self {
        self.jobs.insert(run_id, jobs);
        self
    }

    pub fn with_pull_request(mut self, head: &str, pull_request: PullRequestRef) -> Self {
        self.pull_requests.entry(head.to_string()).or_default().push(pull_request);
        self
    }

    pub fn with_bare_pages(mut self) -> Self {
        self.bare_pages = true;
        self
    }

    /// Replaces every run listing page with `payload`.
    pub fn with_runs_payload(mut self, payload: serde_json::Value) -> Self {
        self.runs_payload = Some(payload);
        self
    }

    pub fn with_failing_cancel(mut self, run_id: RunId) -> Self {
        self.failing_cancels.insert(run_id);
        self
    }

    pub fn with_failing_comments(mut self) -> Self {
        self.failing_comments = true;
        self
    }

    /// Lets listings address workflow `id` by its file name.
    pub fn with_workflow_file(mut self, file_name: &str, id: u64) -> Self {
        self.workflow_files.insert(file_name.to_string(), id);
        self
    }

    fn workflow_id(&self, workflow_ref: &str) -> Option<u64> {
        self.workflow_files.get(workflow_ref).copied().or_else(|| workflow_ref.parse().ok())
    }

    pub fn run_fetches(&self) -> Vec<RunId> { self.calls.lock().unwrap().run_fetches.clone() }

    pub fn run_queries(&self) -> Vec<(String, Option<String>, u32)> {
        self.calls.lock().unwrap().run_queries.clone()
    }

    pub fn job_pages(&self) -> Vec<(RunId, u32)> { self.calls.lock().unwrap().job_pages.clone() }

    pub fn cancel_attempts(&self) -> Vec<RunId> {
        self.calls.lock().unwrap().cancel_attempts.clone()
    }

    pub fn pull_request_queries(&self) -> Vec<String> {
        self.calls.lock().unwrap().pull_request_queries.clone()
    }

    pub fn comments(&self) -> Vec<(u64, String)> { self.calls.lock().unwrap().comments.clone() }
}

fn page_of<T: Clone>(items: &[T], page: u32) -> Vec<T> {
    let per_page = PER_PAGE as usize;
    items.iter().skip((page as usize - 1) * per_page).take(per_page).cloned().collect()
}

impl ActionsApi for FakeApi {
    async fn list_runs_page(&self, query: &RunQuery<'_>, page: u32) -> Result<serde_json::Value> {
        self.calls.lock().unwrap().run_queries.push((
            query.status.as_str().to_string(),
            query.branch.map(str::to_string),
            page,
        ));
        if let Some(payload) = &self.runs_payload {
            return Ok(payload.clone());
        }
        let mut runs = self
            .runs
            .lock()
            .unwrap()
            .iter()
            .filter(|run| run.status == query.status)
            .filter(|run| query.workflow_ref.is_none_or(|w| self.workflow_id(w) == run.workflow_id))
            .filter(|run| query.branch.is_none_or(|b| run.head_branch.as_deref() == Some(b)))
            .filter(|run| query.event.is_none_or(|e| run.event == e))
            .cloned()
            .collect::<Vec<_>>();
        runs.sort_by(|a, b| b.id.cmp(&a.id));
        let runs = page_of(&runs, page);
        Ok(if self.bare_pages {
            serde_json::to_value(&runs)?
        } else {
            serde_json::json!({ "total_count": runs.len(), "workflow_runs": runs })
        })
    }

    async fn list_jobs_page(&self, run_id: RunId, page: u32) -> Result<Vec<JobRecord>> {
        self.calls.lock().unwrap().job_pages.push((run_id, page));
        Ok(self.jobs.get(&run_id).map(|jobs| page_of(jobs, page)).unwrap_or_default())
    }

    async fn get_run(&self, run_id: RunId) -> Result<Option<WorkflowRun>> {
        self.calls.lock().unwrap().run_fetches.push(run_id);
        Ok(self.runs.lock().unwrap().iter().find(|run| run.id == run_id).cloned())
    }

    async fn cancel_run(&self, run_id: RunId) -> Result<()> {
        self.calls.lock().unwrap().cancel_attempts.push(run_id);
        if self.failing_cancels.contains(&run_id) {
            bail!("Cannot cancel a workflow run that is completed. (409)");
        }
        let mut runs = self.runs.lock().unwrap();
        if let Some(run) = runs.iter_mut().find(|run| run.id == run_id) {
            run.status = RunStatus::Completed;
        }
        Ok(())
    }

    async fn list_pull_requests(&self, head: &str) -> Result<Vec<PullRequestRef>> {
        self.calls.lock().unwrap().pull_request_queries.push(head.to_string());
        Ok(self.pull_requests.get(head).cloned().unwrap_or_default())
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<()> {
        if self.failing_comments {
            bail!("Resource not accessible by integration (403)");
        }
        self.calls.lock().unwrap().comments.push((issue_number, body.to_string()));
        Ok(())
    }
}
