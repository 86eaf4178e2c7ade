use std::fmt;

use serde::{Deserialize, Serialize};

pub type RunId = u64;

/// Trigger events whose runs may be cancelled.
pub const CANCELLABLE_EVENTS: &[&str] =
    &["push", "pull_request", "workflow_run", "schedule", "workflow_dispatch"];

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Requested,
    Queued,
    Waiting,
    Pending,
    InProgress,
    Completed,
    #[serde(other)]
    Other,
}

impl RunStatus {
    /// Statuses queried when collecting runs that can still be cancelled.
    pub const ACTIVE: &'static [Self] = &[Self::Queued, Self::InProgress];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Queued => "queued",
            Self::Waiting => "waiting",
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A workflow run as returned by the Actions API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowRun {
    pub id: RunId,
    pub run_number: u64,
    pub status: RunStatus,
    pub event: String,
    #[serde(default)]
    pub workflow_id: Option<u64>,
    #[serde(default)]
    pub head_branch: Option<String>,
    pub head_sha: String,
    #[serde(default)]
    pub head_repository: Option<HeadRepository>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeadRepository {
    pub full_name: String,
}

/// One observed workflow run, flattened for ordering and comparison.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RunRecord {
    pub id: RunId,
    pub run_number: u64,
    pub status: RunStatus,
    pub event: String,
    pub workflow_ref: Option<String>,
    pub head_repo_full_name: String,
    pub head_branch: String,
    pub head_sha: String,
}

impl RunRecord {
    pub fn head_key(&self) -> HeadKey { HeadKey::new(&self.head_repo_full_name, &self.head_branch) }

    pub fn is_completed(&self) -> bool { self.status == RunStatus::Completed }
}

impl From<WorkflowRun> for RunRecord {
    fn from(run: WorkflowRun) -> Self {
        Self {
            id: run.id,
            run_number: run.run_number,
            status: run.status,
            event: run.event,
            workflow_ref: run.workflow_id.map(|id| id.to_string()),
            head_repo_full_name: run.head_repository.map(|r| r.full_name).unwrap_or_default(),
            head_branch: run.head_branch.unwrap_or_default(),
            head_sha: run.head_sha,
        }
    }
}

/// Groups runs that represent the same logical work: `owner/repo/branch`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct HeadKey(String);

impl HeadKey {
    pub fn new(head_repo_full_name: &str, head_branch: &str) -> Self {
        Self(format!("{head_repo_full_name}/{head_branch}"))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for HeadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct JobRecord {
    pub name: String,
    #[serde(default)]
    pub conclusion: Option<String>,
}

impl JobRecord {
    pub fn is_failure(&self) -> bool { self.conclusion.as_deref() == Some("failure") }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PullRequestRef {
    pub number: u64,
    pub head_sha: String,
    pub merge_commit_sha: Option<String>,
}

/// Context established from the run an invocation acts on behalf of.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Origin {
    pub run_id: RunId,
    pub head_repo: String,
    pub head_branch: String,
    pub head_sha: String,
    pub event: String,
    pub workflow_ref: Option<String>,
    pub pull_request: Option<PullRequestRef>,
}

impl Origin {
    pub fn head_key(&self) -> HeadKey { HeadKey::new(&self.head_repo, &self.head_branch) }
}
