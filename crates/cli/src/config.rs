use std::{fs::File, io::BufReader};

use anyhow::{Context, Result};
use cancel_runs_core::{CancelError, config::Config, models::RunId};
use typed_path::Utf8NativePathBuf;

/// Values provided by the Actions runner for the invoking run.
#[derive(Debug, Default, PartialEq)]
pub struct ActionsEnv {
    pub run_id: Option<RunId>,
    pub event_name: Option<String>,
    pub output: Option<Utf8NativePathBuf>,
}

pub fn load_config(path: Option<&Utf8NativePathBuf>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let file = File::open(path.with_platform_encoding())
        .with_context(|| format!("Failed to open config file '{}'", path))?;
    serde_yaml::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse config file '{}'", path))
}

/// Fills settings missing from the config file from the runner environment.
pub fn apply_env<F>(config: &mut Config, env: F) -> Result<ActionsEnv>
where F: Fn(&str) -> Option<String> {
    let var = |name: &str| env(name).filter(|v| !v.is_empty());
    let github = &mut config.github;
    github.token = github.token.take().or_else(|| var("GITHUB_TOKEN"));
    github.repository = github.repository.take().or_else(|| var("GITHUB_REPOSITORY"));
    github.api_url = github.api_url.take().or_else(|| var("GITHUB_API_URL"));
    github.server_url = github.server_url.take().or_else(|| var("GITHUB_SERVER_URL"));
    let run_id = var("GITHUB_RUN_ID")
        .map(|v| {
            v.parse::<RunId>()
                .map_err(|_| CancelError::Config(format!("GITHUB_RUN_ID is not a run id: {v}")))
        })
        .transpose()?;
    Ok(ActionsEnv {
        run_id,
        event_name: var("GITHUB_EVENT_NAME"),
        output: var("GITHUB_OUTPUT").map(Utf8NativePathBuf::from),
    })
}
