use std::{
    fs::OpenOptions,
    io::{Write, stdout},
};

use anyhow::{Context, Result};
use argp::FromArgs;
use cancel_runs_core::{
    CancelError,
    config::{CancelMode, Config},
    models::RunId,
};
use cancel_runs_github::{
    GitHub,
    invocation::{Invocation, Outputs, cancel_runs},
    notify::run_url,
};
use typed_path::Utf8NativePathBuf;

use crate::{
    config::{apply_env, load_config},
    util::{native_path, parse_mode},
};

#[derive(FromArgs, PartialEq, Debug, Default)]
/// Cancel obsolete runs of the invoking workflow.
#[argp(subcommand, name = "cancel")]
pub struct Args {
    #[argp(option, short = 'c', from_str_fn(native_path))]
    /// YAML config file
    config: Option<Utf8NativePathBuf>,
    #[argp(option, short = 'm', from_str_fn(parse_mode))]
    /// duplicates, allDuplicates, self, failedJobs or namedJobs
    mode: Option<CancelMode>,
    #[argp(option, short = 'j')]
    /// job name regex (repeatable)
    job_name_regexp: Vec<String>,
    #[argp(option)]
    /// run to act on behalf of (default: the invoking run)
    source_run_id: Option<RunId>,
    #[argp(switch)]
    /// comment on pull requests whose runs were cancelled
    notify_pr_cancel: bool,
    #[argp(option)]
    /// reason posted in cancellation comments
    notify_pr_cancel_message: Option<String>,
    #[argp(option)]
    /// comment posted on the source pull request before cancelling
    notify_pr_message_start: Option<String>,
    #[argp(option)]
    /// never cancel runs triggered by this event (repeatable)
    skip_event_type: Vec<String>,
    #[argp(option)]
    /// workflow file whose runs are considered
    workflow_file_name: Option<String>,
    #[argp(option, short = 'r')]
    /// repository as owner/name (default: $GITHUB_REPOSITORY)
    repository: Option<String>,
    #[argp(option)]
    /// invoking run id (default: $GITHUB_RUN_ID)
    run_id: Option<RunId>,
    #[argp(option)]
    /// invoking event (default: $GITHUB_EVENT_NAME)
    event_name: Option<String>,
    #[argp(option, short = 'o', from_str_fn(native_path))]
    /// append outputs to this file (default: $GITHUB_OUTPUT, else stdout)
    output: Option<Utf8NativePathBuf>,
}

fn apply_args(config: &mut Config, args: &Args) {
    let cancel = &mut config.cancel;
    if let Some(mode) = args.mode {
        cancel.mode = mode;
    }
    if !args.job_name_regexp.is_empty() {
        cancel.job_name_patterns = args.job_name_regexp.clone();
    }
    if args.source_run_id.is_some() {
        cancel.source_run_id = args.source_run_id;
    }
    cancel.notify_pr_cancel |= args.notify_pr_cancel;
    if args.notify_pr_cancel_message.is_some() {
        cancel.notify_pr_cancel_message = args.notify_pr_cancel_message.clone();
    }
    if args.notify_pr_message_start.is_some() {
        cancel.notify_pr_message_start = args.notify_pr_message_start.clone();
    }
    if !args.skip_event_type.is_empty() {
        cancel.skip_event_types = args.skip_event_type.clone();
    }
    if args.workflow_file_name.is_some() {
        cancel.workflow_file_name = args.workflow_file_name.clone();
    }
    if args.repository.is_some() {
        config.github.repository = args.repository.clone();
    }
}

fn write_outputs<W: Write>(outputs: &Outputs, mut w: W) -> Result<()> {
    for (key, value) in outputs.pairs()? {
        writeln!(w, "{key}={value}")?;
    }
    w.flush()?;
    Ok(())
}

pub async fn run(args: Args) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    let actions = apply_env(&mut config, |name| std::env::var(name).ok())?;
    apply_args(&mut config, &args);

    let run_id = args.run_id.or(actions.run_id).ok_or_else(|| {
        CancelError::Config("no invoking run id, pass --run-id or set GITHUB_RUN_ID".to_string())
    })?;
    let event = args.event_name.clone().or(actions.event_name).ok_or_else(|| {
        CancelError::Config(
            "no invoking event, pass --event-name or set GITHUB_EVENT_NAME".to_string(),
        )
    })?;

    let github = GitHub::new(&config.github)?;
    let invocation = Invocation {
        run_id,
        event,
        run_url: run_url(&config.github, &github.owner, &github.repo, run_id),
        cancel: config.cancel,
    };
    let outputs = cancel_runs(&github, &invocation).await?;
    tracing::info!("Cancelled {} runs", outputs.cancelled_runs.len());

    match args.output.or(actions.output) {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path.with_platform_encoding())
                .with_context(|| format!("Failed to open output file '{}'", path))?;
            write_outputs(&outputs, file)
                .with_context(|| format!("Failed to write output file '{}'", path))
        }
        None => write_outputs(&outputs, stdout().lock()),
    }
}
