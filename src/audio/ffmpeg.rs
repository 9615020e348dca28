//! Thin wrapper around the external `ffmpeg` binary.
//!
//! Used for the containers the pure-Rust codecs do not cover: FLAC output
//! and WMA input.

use log::{debug, info};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{PrepError, Result};

static FFMPEG: Lazy<Option<PathBuf>> = Lazy::new(|| match check_command_in_path("ffmpeg") {
    Some(path) => {
        info!("Found ffmpeg at {}", path.display());
        Some(path)
    }
    None => {
        info!("ffmpeg not found in PATH");
        None
    }
});

fn check_command_in_path(command: &str) -> Option<PathBuf> {
    let output = if cfg!(target_os = "windows") {
        Command::new("where").arg(command).output()
    } else {
        Command::new("which").arg(command).output()
    };

    match output {
        Ok(output) if output.status.success() => {
            let path_str = String::from_utf8_lossy(&output.stdout);
            // `where` may list several matches
            let first = path_str.lines().next()?.trim();
            if first.is_empty() {
                None
            } else {
                Some(PathBuf::from(first))
            }
        }
        _ => None,
    }
}

/// Path of the ffmpeg executable, if one is installed
pub fn ffmpeg_path() -> Result<&'static Path> {
    FFMPEG
        .as_deref()
        .ok_or_else(|| PrepError::ToolNotFound("ffmpeg (install it and make sure it is in PATH)".into()))
}

/// Run ffmpeg with `args`, quiet and non-interactive
pub fn run_ffmpeg<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let ffmpeg = ffmpeg_path()?;
    let mut command = Command::new(ffmpeg);
    command
        .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y"])
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    debug!("Running {:?}", command);

    let output = command.output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PrepError::ToolFailed {
            tool: "ffmpeg".into(),
            details: format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            ),
        });
    }
    Ok(())
}
