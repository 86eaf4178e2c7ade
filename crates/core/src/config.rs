use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::models::RunId;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub cancel: CancelConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GitHubConfig {
    pub token: Option<String>,
    /// Repository in `owner/name` form.
    pub repository: Option<String>,
    pub api_url: Option<String>,
    pub server_url: Option<String>,
}

impl GitHubConfig {
    pub const DEFAULT_SERVER_URL: &'static str = "https://github.com";

    /// Splits `repository` into owner and name.
    pub fn owner_repo(&self) -> Option<(&str, &str)> {
        let (owner, repo) = self.repository.as_deref()?.split_once('/')?;
        (!owner.is_empty() && !repo.is_empty() && !repo.contains('/')).then_some((owner, repo))
    }

    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(Self::DEFAULT_SERVER_URL).trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CancelConfig {
    #[serde(default)]
    pub mode: CancelMode,
    #[serde(default)]
    pub job_name_patterns: Vec<String>,
    /// Run to act on behalf of; defaults to the invoking run.
    pub source_run_id: Option<RunId>,
    #[serde(default)]
    pub notify_pr_cancel: bool,
    pub notify_pr_cancel_message: Option<String>,
    pub notify_pr_message_start: Option<String>,
    #[serde(default)]
    pub skip_event_types: Vec<String>,
    pub workflow_file_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CancelMode {
    #[default]
    Duplicates,
    AllDuplicates,
    #[serde(rename = "self")]
    SelfRun,
    FailedJobs,
    NamedJobs,
}

impl CancelMode {
    pub const fn variants() -> &'static [Self] {
        &[Self::Duplicates, Self::AllDuplicates, Self::SelfRun, Self::FailedJobs, Self::NamedJobs]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicates => "duplicates",
            Self::AllDuplicates => "allDuplicates",
            Self::SelfRun => "self",
            Self::FailedJobs => "failedJobs",
            Self::NamedJobs => "namedJobs",
        }
    }

    /// Whether the mode cancels runs relative to a single source run.
    pub fn needs_source_run(&self) -> bool { matches!(self, Self::Duplicates | Self::SelfRun) }
}

impl FromStr for CancelMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::variants().iter().find(|mode| mode.as_str() == s).copied().ok_or(())
    }
}

impl fmt::Display for CancelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
