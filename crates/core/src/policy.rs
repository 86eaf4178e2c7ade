use regex::Regex;

use crate::{
    config::{CancelConfig, CancelMode},
    error::CancelError,
    models::{CANCELLABLE_EVENTS, HeadKey, RunId, RunRecord},
};

/// Decides which runs an invocation cancels.
#[derive(Debug, Clone)]
pub enum CancelPolicy {
    /// Cancel exactly the source run.
    SelfRun { source_run_id: RunId },
    /// Cancel runs older than the source run that share its head.
    Duplicates { source_run_id: RunId, head_repo: Option<String> },
    /// Cancel runs with a failed job matching one of the patterns.
    FailedJobs { job_name_patterns: Vec<Regex> },
    /// Cancel runs containing a job matching one of the patterns.
    NamedJobs { job_name_patterns: Vec<Regex> },
    /// Keep only the newest run per head. With patterns, the kept run is cancelled
    /// as well once one of its matching jobs has failed.
    AllDuplicates { job_name_patterns: Vec<Regex> },
}

/// Iteration order over the run index.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Order {
    Ascending,
    Descending,
}

impl CancelPolicy {
    /// Builds the policy from configuration. No network access happens before this
    /// succeeds, so every configuration error surfaces here.
    pub fn from_config(
        config: &CancelConfig,
        source_run_id: RunId,
        invoking_event: &str,
    ) -> Result<Self, CancelError> {
        let mode = config.mode;
        if invoking_event == "schedule" {
            if mode.needs_source_run() {
                return Err(CancelError::ScheduleMode(mode));
            }
            if config.workflow_file_name.as_deref().is_none_or(str::is_empty) {
                return Err(CancelError::MissingWorkflowRef);
            }
        }
        let job_name_patterns = compile_patterns(&config.job_name_patterns)?;
        Ok(match mode {
            CancelMode::SelfRun | CancelMode::Duplicates if !job_name_patterns.is_empty() => {
                return Err(CancelError::IncompatiblePatterns(mode));
            }
            CancelMode::FailedJobs | CancelMode::NamedJobs if job_name_patterns.is_empty() => {
                return Err(CancelError::MissingPatterns(mode));
            }
            CancelMode::SelfRun => Self::SelfRun { source_run_id },
            CancelMode::Duplicates => Self::Duplicates { source_run_id, head_repo: None },
            CancelMode::FailedJobs => Self::FailedJobs { job_name_patterns },
            CancelMode::NamedJobs => Self::NamedJobs { job_name_patterns },
            CancelMode::AllDuplicates => Self::AllDuplicates { job_name_patterns },
        })
    }

    /// Restricts a duplicates policy to runs from the given head repository.
    pub fn with_head_repo(self, repo: &str) -> Self {
        match self {
            Self::Duplicates { source_run_id, .. } => {
                Self::Duplicates { source_run_id, head_repo: Some(repo.to_string()) }
            }
            other => other,
        }
    }

    pub fn mode(&self) -> CancelMode {
        match self {
            Self::SelfRun { .. } => CancelMode::SelfRun,
            Self::Duplicates { .. } => CancelMode::Duplicates,
            Self::FailedJobs { .. } => CancelMode::FailedJobs,
            Self::NamedJobs { .. } => CancelMode::NamedJobs,
            Self::AllDuplicates { .. } => CancelMode::AllDuplicates,
        }
    }

    pub fn order(&self) -> Order {
        match self {
            Self::AllDuplicates { .. } => Order::Descending,
            _ => Order::Ascending,
        }
    }

    pub fn job_name_patterns(&self) -> &[Regex] {
        match self {
            Self::FailedJobs { job_name_patterns }
            | Self::NamedJobs { job_name_patterns }
            | Self::AllDuplicates { job_name_patterns } => job_name_patterns.as_slice(),
            Self::SelfRun { .. } | Self::Duplicates { .. } => &[],
        }
    }

    /// Human-readable explanation posted on pull requests whose runs were cancelled.
    pub fn reason(&self) -> String {
        let patterns =
            self.job_name_patterns().iter().map(|p| format!("`{p}`")).collect::<Vec<_>>();
        match self {
            Self::SelfRun { .. } => "The run cancelled itself.".to_string(),
            Self::Duplicates { .. } => {
                "It is an earlier duplicate of a run for the same branch.".to_string()
            }
            Self::FailedJobs { .. } => {
                format!("It has failed jobs matching {}.", patterns.join(", "))
            }
            Self::NamedJobs { .. } => format!("It has jobs matching {}.", patterns.join(", ")),
            Self::AllDuplicates { .. } if patterns.is_empty() => {
                "A newer run exists for the same branch.".to_string()
            }
            Self::AllDuplicates { .. } => format!(
                "A newer run exists for the same branch, or it has failed jobs matching {}.",
                patterns.join(", ")
            ),
        }
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, CancelError> {
    patterns
        .iter()
        .filter(|p| !p.is_empty())
        .map(|pattern| {
            Regex::new(pattern)
                .map_err(|source| CancelError::InvalidPattern { pattern: pattern.clone(), source })
        })
        .collect()
}

/// Whether a run may be cancelled at all: it must still be active and have been
/// started by a cancellable event that this invocation does not skip.
pub fn is_cancellable(record: &RunRecord, skip_event_types: &[String]) -> bool {
    !record.is_completed()
        && CANCELLABLE_EVENTS.contains(&record.event.as_str())
        && !skip_event_types.iter().any(|e| *e == record.event)
}

/// Duplicate check relative to a source run.
///
/// Run ids grow with creation time across the whole installation, so they order
/// runs of different workflows too; run numbers would not.
pub fn is_earlier_duplicate(
    record: &RunRecord,
    source_run_id: RunId,
    expected_head_repo: Option<&str>,
    source_head: Option<&HeadKey>,
) -> bool {
    if expected_head_repo.is_some_and(|repo| record.head_repo_full_name != repo) {
        return false;
    }
    if source_head.is_some_and(|head| record.head_key() != *head) {
        return false;
    }
    record.id < source_run_id
}
