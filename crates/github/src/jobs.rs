use anyhow::Result;
use cancel_runs_core::models::RunId;
use regex::Regex;

use crate::api::{ActionsApi, PER_PAGE};

/// Pages through the jobs of a run looking for one whose name matches any of
/// `patterns`.
///
/// With `require_failure`, only a matching job that concluded with `failure`
/// counts, and scanning continues past matching jobs that did not fail.
pub async fn jobs_match<A: ActionsApi>(
    api: &A,
    run_id: RunId,
    patterns: &[Regex],
    require_failure: bool,
) -> Result<bool> {
    let mut page = 1;
    loop {
        let jobs = api.list_jobs_page(run_id, page).await?;
        for job in &jobs {
            if !patterns.iter().any(|p| p.is_match(&job.name)) {
                continue;
            }
            if !require_failure {
                tracing::info!("Run {} has job {:?} matching the patterns", run_id, job.name);
                return Ok(true);
            }
            if job.is_failure() {
                tracing::info!("Run {} has failed job {:?} matching patterns", run_id, job.name);
                return Ok(true);
            }
            tracing::debug!(
                "Run {} job {:?} matches but concluded {}",
                run_id,
                job.name,
                job.conclusion.as_deref().unwrap_or("[pending]")
            );
        }
        if jobs.len() < PER_PAGE as usize {
            return Ok(false);
        }
        page += 1;
    }
}
