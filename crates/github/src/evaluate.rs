use std::collections::HashSet;

use anyhow::Result;
use cancel_runs_core::{
    models::{HeadKey, RunRecord},
    policy::{CancelPolicy, is_cancellable, is_earlier_duplicate},
};

use crate::{api::ActionsApi, jobs::jobs_match};

/// Applies a [`CancelPolicy`] to runs one at a time.
///
/// The head-deduplicating sweep is stateful: runs must be fed newest first, in the
/// order given by [`CancelPolicy::order`].
pub struct Evaluator<'a> {
    policy: &'a CancelPolicy,
    source_head: Option<HeadKey>,
    skip_event_types: &'a [String],
    kept_heads: HashSet<HeadKey>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        policy: &'a CancelPolicy,
        source_head: Option<HeadKey>,
        skip_event_types: &'a [String],
    ) -> Self {
        Self { policy, source_head, skip_event_types, kept_heads: HashSet::new() }
    }

    pub fn policy(&self) -> &CancelPolicy { self.policy }

    pub async fn should_cancel<A: ActionsApi>(
        &mut self,
        api: &A,
        record: &RunRecord,
    ) -> Result<bool> {
        if !is_cancellable(record, self.skip_event_types) {
            return Ok(false);
        }
        let policy = self.policy;
        match policy {
            CancelPolicy::SelfRun { source_run_id } => Ok(record.id == *source_run_id),
            CancelPolicy::Duplicates { source_run_id, head_repo } => Ok(is_earlier_duplicate(
                record,
                *source_run_id,
                head_repo.as_deref(),
                self.source_head.as_ref(),
            )),
            CancelPolicy::FailedJobs { job_name_patterns } => {
                jobs_match(api, record.id, job_name_patterns, true).await
            }
            CancelPolicy::NamedJobs { job_name_patterns } => {
                jobs_match(api, record.id, job_name_patterns, false).await
            }
            CancelPolicy::AllDuplicates { job_name_patterns } => {
                let head = record.head_key();
                if !self.kept_heads.insert(head.clone()) {
                    tracing::debug!("Run {} is superseded by a newer run on {}", record.id, head);
                    return Ok(true);
                }
                if job_name_patterns.is_empty() {
                    return Ok(false);
                }
                jobs_match(api, record.id, job_name_patterns, true).await
            }
        }
    }
}
