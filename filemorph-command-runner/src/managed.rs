//! Lifecycle owner for long-running helper processes.
//!
//! Unlike conversion runs, which are killed outright on cancellation,
//! managed processes are caller-trusted helpers (preview servers, format
//! probes) that deserve a graceful stop: SIGTERM first, SIGKILL only after
//! the grace period. This is the one place in the engine that terminates
//! gracefully.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::process::{Child, Command};

use filemorph_commons::{CommandSpec, text};

use crate::drain::{DRAIN_JOIN_TIMEOUT, OutputDrain};
use crate::result::ExecutionResult;

pub struct ManagedProcess {
    spec: CommandSpec,
    working_dir: Option<PathBuf>,
    capture_output: bool,
    child: Option<Child>,
    drain: Option<OutputDrain>,
}

impl ManagedProcess {
    pub fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            working_dir: None,
            capture_output: true,
            child: None,
            drain: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Let the child's output pass through instead of capturing it.
    pub fn without_capture(mut self) -> Self {
        self.capture_output = false;
        self
    }

    pub fn is_started(&self) -> bool {
        self.child.is_some()
    }

    /// OS process id of the running child, if any.
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Spawn the process. The child is killed if this handle is dropped
    /// while it is still running.
    pub fn start(&mut self) -> Result<()> {
        if self.child.is_some() {
            bail!("process already started");
        }

        let mut command = match &self.spec {
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

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let (stdout, stderr) = if self.capture_output {
            (Stdio::piped(), Stdio::piped())
        } else {
            (Stdio::inherit(), Stdio::inherit())
        };
        command
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true);

        let mut child = command.spawn().with_context(|| {
            format!("failed to start process `{}`", self.spec.display_string())
        })?;
        tracing::debug!(command = %self.spec.display_string(), pid = child.id(), "managed process started");

        if self.capture_output {
            self.drain = Some(OutputDrain::start(&mut child));
        }
        self.child = Some(child);
        Ok(())
    }

    /// Stop the process gracefully: SIGTERM, wait up to `grace`, then
    /// SIGKILL. No-op when nothing is running.
    pub async fn terminate(&mut self, grace: Duration) {
        let Some(child) = self.child.as_mut() else {
            return;
        };

        #[cfg(unix)]
        if let Some(pid) = child.id() {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;
            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        }
        #[cfg(not(unix))]
        {
            let _ = child.start_kill();
        }

        if tokio::time::timeout(grace, child.wait()).await.is_err() {
            tracing::debug!("managed process ignored SIGTERM, killing");
            let _ = child.kill().await;
            let _ = tokio::time::timeout(grace, child.wait()).await;
        }
    }

    /// Wait up to `timeout` for the process to finish and collect its
    /// result. On a wait-bound expiry the child keeps running and the
    /// returned result says so; the caller may `terminate` and ask again.
    pub async fn wait_result(&mut self, timeout: Duration) -> ExecutionResult {
        let command_str = self.spec.display_string();
        let Some(child) = self.child.as_mut() else {
            return ExecutionResult::failure(command_str, text::PROCESS_NOT_STARTED);
        };

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let (stdout, stderr) = match self.drain.take() {
                    Some(drain) => drain.join(DRAIN_JOIN_TIMEOUT).await,
                    None => (String::new(), String::new()),
                };
                ExecutionResult::completed(
                    status.code().unwrap_or(-1),
                    stdout,
                    stderr,
                    command_str,
                )
            }
            Ok(Err(error)) => ExecutionResult::failure(command_str, error.to_string()),
            Err(_) => ExecutionResult::failure(command_str, text::PROCESS_OUTPUT_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn result_before_start_reports_not_started() {
        let mut process = ManagedProcess::new(CommandSpec::argv(["true"]));
        let result = process.wait_result(Duration::from_millis(100)).await;
        assert_eq!(result.stderr, text::PROCESS_NOT_STARTED);
    }

    #[tokio::test]
    async fn captures_output_of_short_process() {
        let mut process = ManagedProcess::new(CommandSpec::argv(["echo", "ready"]));
        process.start().expect("start");
        let result = process.wait_result(Duration::from_secs(5)).await;
        assert!(result.success());
        assert_eq!(result.stdout, "ready\n");
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let mut process = ManagedProcess::new(CommandSpec::argv(["sleep", "5"]));
        process.start().expect("start");
        assert!(process.start().is_err());
        process.terminate(Duration::from_millis(500)).await;
    }

    #[tokio::test]
    async fn terminate_stops_a_cooperative_process() {
        let mut process = ManagedProcess::new(CommandSpec::argv(["sleep", "30"]));
        process.start().expect("start");
        assert!(process.id().is_some());

        process.terminate(Duration::from_millis(500)).await;
        let result = process.wait_result(Duration::from_secs(1)).await;
        // Killed by signal, so no exit code.
        assert_eq!(result.exit_code, -1);
    }

    #[tokio::test]
    async fn wait_bound_expiry_leaves_the_process_running() {
        let mut process = ManagedProcess::new(CommandSpec::argv(["sleep", "5"]));
        process.start().expect("start");

        let result = process.wait_result(Duration::from_millis(50)).await;
        assert_eq!(result.stderr, text::PROCESS_OUTPUT_TIMEOUT);
        assert!(process.is_started());

        process.terminate(Duration::from_millis(200)).await;
    }
}
