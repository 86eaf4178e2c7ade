use crate::{config::CancelMode, models::RunId};

/// Fatal errors that stop an invocation before or while it establishes context.
///
/// Failures of individual cancellations and pull request notifications are not
/// represented here; those are logged and recovered where they happen.
#[derive(Debug, thiserror::Error)]
pub enum CancelError {
    #[error("job name patterns cannot be used with the {0} mode")]
    IncompatiblePatterns(CancelMode),
    #[error("the {0} mode requires at least one job name pattern")]
    MissingPatterns(CancelMode),
    #[error("invalid job name pattern {pattern:?}: {source}")]
    InvalidPattern { pattern: String, source: regex::Error },
    #[error("the {0} mode cannot be used for scheduled invocations")]
    ScheduleMode(CancelMode),
    #[error("scheduled invocations require a workflow file name")]
    MissingWorkflowRef,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("workflow run {0} not found")]
    OriginNotFound(RunId),
    #[error("unable to resolve the workflow of run {0}")]
    WorkflowResolution(RunId),
    #[error("malformed workflow run page: {0}")]
    MalformedPage(String),
}
