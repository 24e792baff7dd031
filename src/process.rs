// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! External command execution with separate output capture.

use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, WatchtowerError};

/// Run a command, discarding its output on success.
pub async fn run(program: &str, args: &[&str]) -> Result<()> {
    let (stdout, _stderr) = run_result(program, args).await?;
    if !stdout.is_empty() {
        debug!("{} output: {}", program, stdout.trim_end());
    }
    Ok(())
}

/// Run a command and capture stdout and stderr separately. A non-zero
/// exit becomes an error carrying the captured stderr.
pub async fn run_result(program: &str, args: &[&str]) -> Result<(String, String)> {
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| WatchtowerError::CommandError(format!("failed to run {}: {}", program, e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(WatchtowerError::CommandError(format!(
            "{} {}: {}",
            program,
            output.status,
            stderr.trim_end()
        )));
    }

    Ok((stdout, stderr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_result_captures_streams_separately() {
        let (stdout, stderr) = run_result("sh", &["-c", "echo out; echo err >&2"])
            .await
            .unwrap();
        assert_eq!(stdout, "out\n");
        assert_eq!(stderr, "err\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit_embeds_stderr() {
        let err = run_result("sh", &["-c", "echo boom >&2; exit 3"])
            .await
            .unwrap_err();
        assert!(matches!(err, WatchtowerError::CommandError(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_missing_program_is_a_command_error() {
        let err = run("watchtower-no-such-binary", &[]).await.unwrap_err();
        assert!(matches!(err, WatchtowerError::CommandError(_)));
    }

    #[tokio::test]
    async fn test_run_succeeds_quietly() {
        run("sh", &["-c", "true"]).await.unwrap();
    }
}
