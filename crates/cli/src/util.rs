use cancel_runs_core::config::CancelMode;
use typed_path::Utf8NativePathBuf;

// For argp::FromArgs
pub fn native_path(value: &str) -> Result<Utf8NativePathBuf, String> {
    Ok(Utf8NativePathBuf::from(value))
}

// For argp::FromArgs
pub fn parse_mode(value: &str) -> Result<CancelMode, String> {
    value.parse().map_err(|()| {
        let modes = CancelMode::variants().iter().map(|m| m.as_str()).collect::<Vec<_>>();
        format!("unknown mode '{}', expected one of: {}", value, modes.join(", "))
    })
}
