use anyhow::Result;
use cancel_runs_core::{
    index::RunIndex,
    models::{RunId, RunRecord},
    policy::Order,
};

use crate::{api::ActionsApi, evaluate::Evaluator};

/// One cancellation request and its result.
#[derive(Debug, Clone)]
pub struct CancelAttempt {
    pub run: RunRecord,
    /// Error message when the API rejected the request.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CancellationOutcome {
    pub attempts: Vec<CancelAttempt>,
}

impl CancellationOutcome {
    /// Runs whose cancellation request was accepted.
    pub fn cancelled(&self) -> impl Iterator<Item = &RunRecord> {
        self.attempts.iter().filter(|a| a.error.is_none()).map(|a| &a.run)
    }

    pub fn cancelled_ids(&self) -> Vec<RunId> { self.cancelled().map(|r| r.id).collect() }

    pub fn is_empty(&self) -> bool { self.attempts.is_empty() }
}

/// Walks the index in the policy's order and returns the runs to cancel, oldest
/// first.
pub async fn select_candidates<A: ActionsApi>(
    api: &A,
    evaluator: &mut Evaluator<'_>,
    index: &RunIndex,
) -> Result<Vec<RunRecord>> {
    let runs: Box<dyn Iterator<Item = &RunRecord>> = match evaluator.policy().order() {
        Order::Ascending => Box::new(index.forward()),
        Order::Descending => Box::new(index.backward()),
    };
    let mut candidates = vec![];
    for run in runs {
        if evaluator.should_cancel(api, run).await? {
            candidates.push(run.clone());
        }
    }
    candidates.sort_by_key(|run| run.id);
    Ok(candidates)
}

/// Cancels every selected run, one request at a time.
///
/// A rejected request is recorded on the outcome and does not stop the batch.
pub async fn execute<A: ActionsApi>(
    api: &A,
    evaluator: &mut Evaluator<'_>,
    index: &RunIndex,
) -> Result<CancellationOutcome> {
    let candidates = select_candidates(api, evaluator, index).await?;
    if candidates.is_empty() {
        tracing::info!("No runs to cancel");
        return Ok(CancellationOutcome::default());
    }
    tracing::info!(
        "Cancelling {} runs: {}",
        candidates.len(),
        candidates.iter().map(|r| r.id.to_string()).collect::<Vec<_>>().join(", ")
    );
    let mut outcome = CancellationOutcome::default();
    for run in candidates {
        let error = match api.cancel_run(run.id).await {
            Ok(()) => {
                tracing::info!("Cancelled run {} (#{})", run.id, run.run_number);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to cancel run {}: {:?}", run.id, e);
                Some(format!("{e:#}"))
            }
        };
        outcome.attempts.push(CancelAttempt { run, error });
    }
    Ok(outcome)
}
