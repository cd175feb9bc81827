//! Process spawning and the cancellation poll loop.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::process::{Child, Command};

use filemorph_commons::CommandSpec;

use crate::cancel::CancelWatch;
use crate::drain::{DRAIN_JOIN_TIMEOUT, DRAIN_KILL_FLUSH_TIMEOUT, OutputDrain};
use crate::result::ExecutionResult;

// The cancel predicate is checked this many times within each poll
// interval, so cancellation latency is bounded by one fine-grained slice
// even though process-alive is only re-evaluated per interval.
const CANCEL_CHECKS_PER_TICK: u32 = 5;

fn spawn_child(spec: &CommandSpec, working_dir: Option<&Path>) -> Result<Child> {
    let mut command = match spec {
        CommandSpec::Shell(script) => {
            let mut command = Command::new("sh");
            command.arg("-c").arg(script);
            command
        }
        CommandSpec::Argv(args) => {
            let mut parts = args.iter();
            let Some(program) = parts.next() else {
                bail!("missing program for command execution");
            };
            let mut command = Command::new(program);
            command.args(parts);
            command
        }
    };

    if let Some(dir) = working_dir {
        command.current_dir(dir);
    }

    // Stdin is never inherited: conversion tools must see EOF instead of
    // blocking on terminal input.
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    command.spawn().with_context(|| {
        format!(
            "failed to spawn conversion command `{}`",
            spec.display_string()
        )
    })
}

fn finish(
    status: ExitStatus,
    stdout: String,
    stderr: String,
    command: String,
) -> ExecutionResult {
    let exit_code = status.code().unwrap_or(-1);
    tracing::debug!(exit_code, command = %command, "conversion process exited");
    ExecutionResult::completed(exit_code, stdout, stderr, command)
}

/// Execute a command to completion, without cancellation support.
///
/// The path for short trusted commands. With `timeout` set, expiry kills
/// the child and marks the result timed out rather than leaving the
/// process running. Spawn failures (tool not found, permission denied)
/// come back as failed results, never as errors; the caller decides
/// whether a missing tool is recoverable.
pub async fn run(
    spec: &CommandSpec,
    working_dir: Option<&Path>,
    timeout: Option<Duration>,
) -> ExecutionResult {
    let command_str = spec.display_string();

    let mut child = match spawn_child(spec, working_dir) {
        Ok(child) => child,
        Err(error) => {
            tracing::debug!(command = %command_str, "spawn failed: {error:#}");
            return ExecutionResult::failure(command_str, format!("{error:#}"));
        }
    };
    let drain = OutputDrain::start(&mut child);

    let status = match timeout {
        None => child.wait().await,
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                tracing::debug!(command = %command_str, "hard timeout after {limit:?}, killing");
                let _ = child.kill().await;
                let _ = drain.join(DRAIN_KILL_FLUSH_TIMEOUT).await;
                return ExecutionResult::hard_timeout(command_str);
            }
        },
    };

    match status {
        Ok(status) => {
            let (stdout, stderr) = drain.join(DRAIN_JOIN_TIMEOUT).await;
            finish(status, stdout, stderr, command_str)
        }
        Err(error) => {
            let _ = drain.join(DRAIN_KILL_FLUSH_TIMEOUT).await;
            ExecutionResult::failure(command_str, error.to_string())
        }
    }
}

/// Execute a command with live cancellation support.
///
/// The cancel predicate is queried once before spawning; an already
/// cancelled watch means no process ever starts. While the child runs, the
/// poll loop re-checks the predicate at a fine-grained slice of the poll
/// interval and kills outright on the first `true`: conversion tools are
/// typically non-cooperative CPU/IO-bound processes for which a graceful
/// signal is unreliable. Process-alive is checked before the cancel
/// predicate on every iteration, so a cancel arriving after the child has
/// already exited resolves to the real exit code, never a spurious
/// cancelled result.
pub async fn run_cancellable(
    spec: &CommandSpec,
    working_dir: Option<&Path>,
    watch: &CancelWatch<'_>,
) -> ExecutionResult {
    let command_str = spec.display_string();

    if watch.is_cancelled() {
        return ExecutionResult::user_cancelled(command_str);
    }

    let mut child = match spawn_child(spec, working_dir) {
        Ok(child) => child,
        Err(error) => {
            tracing::debug!(command = %command_str, "spawn failed: {error:#}");
            return ExecutionResult::failure(command_str, format!("{error:#}"));
        }
    };
    let drain = OutputDrain::start(&mut child);

    let slice = (watch.poll_interval() / CANCEL_CHECKS_PER_TICK).max(Duration::from_millis(1));

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let (stdout, stderr) = drain.join(DRAIN_JOIN_TIMEOUT).await;
                return finish(status, stdout, stderr, command_str);
            }
            Ok(None) => {}
            Err(error) => {
                let _ = child.kill().await;
                let _ = drain.join(DRAIN_KILL_FLUSH_TIMEOUT).await;
                return ExecutionResult::failure(command_str, error.to_string());
            }
        }

        watch.tick_progress();

        for _ in 0..CANCEL_CHECKS_PER_TICK {
            if watch.is_cancelled() {
                tracing::debug!(command = %command_str, "cancellation observed, killing conversion process");
                let _ = child.kill().await;
                let _ = drain.join(DRAIN_KILL_FLUSH_TIMEOUT).await;
                return ExecutionResult::user_cancelled(command_str);
            }
            tokio::time::sleep(slice).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_tool_is_a_failed_result_not_an_error() {
        let spec = CommandSpec::argv(["filemorph-no-such-tool", "--version"]);
        let result = run(&spec, None, None).await;
        assert_eq!(result.exit_code, -1);
        assert!(!result.success());
        assert!(result.stderr.contains("filemorph-no-such-tool"));
    }

    #[tokio::test]
    async fn empty_argv_is_a_failed_result() {
        let spec = CommandSpec::argv(Vec::<String>::new());
        let result = run(&spec, None, None).await;
        assert!(!result.success());
        assert!(result.stderr.contains("missing program"));
    }

    #[tokio::test]
    async fn working_directory_is_honored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spec = CommandSpec::argv(["pwd"]);
        let result = run(&spec, Some(dir.path()), None).await;
        assert!(result.success());
        let reported = std::path::Path::new(result.stdout.trim());
        let expected = dir.path().canonicalize().expect("canonicalize");
        assert_eq!(reported.canonicalize().expect("canonicalize"), expected);
    }
}
