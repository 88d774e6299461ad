//! # repomon-git
//!
//! Git subprocess execution for the repomon engine.
//!
//! Every piece of repository state repomon reports is derived by invoking
//! the `git` command-line tool and parsing its output. This crate owns that
//! boundary: spawning the process, capturing stdout/stderr, and turning a
//! non-zero exit into a typed error.
//!
//! ## Key items
//!
//! - [`run`] - execute a git subcommand in a working directory
//! - [`parse_count`] - parse numeric git output (e.g. `rev-list --count`)
//! - [`split_lines`] - split multi-line git output into non-empty lines
//! - [`GitError`] - spawn, exit-code, and parse failures
//!
//! There are no retries and no timeout: a hung git process blocks the task
//! that invoked it until the process exits.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use thiserror::Error;
use tokio::process::Command;
use tracing::{error, trace};

/// Errors from running a git subcommand
#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to spawn git process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git exited with code {code}: {stderr}")]
    Command { code: i32, stderr: String },

    #[error("expected numeric git output, got '{output}'")]
    NonNumeric { output: String },
}

/// Run `git <args>` in `working_dir` and capture its output.
///
/// On exit code 0, returns stdout with trailing line terminators stripped.
/// On a non-zero exit, returns [`GitError::Command`] with the exit code and
/// the captured stderr text; partial stdout is discarded. Callers that need
/// the command and wall-clock time logged can enable TRACE for this crate.
pub async fn run(args: &[&str], working_dir: &Path) -> Result<String, GitError> {
    let start = Instant::now();

    let output = Command::new("git")
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    trace!(
        command = %args.join(" "),
        working_dir = %working_dir.display(),
        duration_ms = start.elapsed().as_millis() as u64,
        "git command completed"
    );

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        error!(command = %args.join(" "), code, stderr = %stderr, "git command failed");
        return Err(GitError::Command { code, stderr });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.trim_end_matches(['\r', '\n']).to_string())
}

/// Parse a non-negative decimal count from git output.
///
/// Git's `rev-list --count` output is asserted numeric; anything else is a
/// defect and fails loudly rather than defaulting to zero.
pub fn parse_count(output: &str) -> Result<i64, GitError> {
    let trimmed = output.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| GitError::NonNumeric {
            output: trimmed.to_string(),
        })
}

/// Split git output into non-empty lines.
pub fn split_lines(output: &str) -> Vec<String> {
    output
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_accepts_decimal() {
        assert_eq!(parse_count("42").unwrap(), 42);
        assert_eq!(parse_count(" 7\n").unwrap(), 7);
        assert_eq!(parse_count("0").unwrap(), 0);
    }

    #[test]
    fn parse_count_rejects_garbage() {
        assert!(matches!(
            parse_count("abc"),
            Err(GitError::NonNumeric { .. })
        ));
        assert!(matches!(parse_count(""), Err(GitError::NonNumeric { .. })));
        assert!(matches!(
            parse_count("-3"),
            Err(GitError::NonNumeric { .. })
        ));
    }

    #[test]
    fn split_lines_drops_empty_lines() {
        assert_eq!(
            split_lines("a\r\nb\n\nc"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(split_lines("").is_empty());
    }
}
