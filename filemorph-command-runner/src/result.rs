//! Value type returned by every execution entry point.

use filemorph_commons::text;

/// Outcome of one external-process execution attempt.
///
/// Created once per attempt and immutable afterwards; the caller that
/// invoked the runner owns it. `success` and `error_output` are derived,
/// not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionResult {
    /// Exit code of the child; `-1` when the child never ran, was killed,
    /// or terminated on a signal.
    pub exit_code: i32,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// The resolved command string this result belongs to.
    pub command: String,
    /// True when the run ended through the caller's cancel signal.
    /// Callers use this to report a neutral "cancelled" status instead of
    /// an error.
    pub cancelled: bool,
    /// True when the run ended through hard-timeout expiry. Result-level
    /// treatment matches cancellation; the flag keeps the cause
    /// distinguishable for logging.
    pub timed_out: bool,
}

impl ExecutionResult {
    /// Result of a child that ran to completion (any exit code).
    pub fn completed(
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            command: command.into(),
            cancelled: false,
            timed_out: false,
        }
    }

    /// Failed result for a child that never produced an exit status
    /// (spawn failure, wait error, runner-level failure text).
    pub fn failure(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: stderr.into(),
            command: command.into(),
            cancelled: false,
            timed_out: false,
        }
    }

    /// Result of a run ended by the caller's cancel signal.
    pub fn user_cancelled(command: impl Into<String>) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: text::OPERATION_CANCELLED_BY_USER.to_string(),
            command: command.into(),
            cancelled: true,
            timed_out: false,
        }
    }

    /// Result of a run ended by hard-timeout expiry.
    pub fn hard_timeout(command: impl Into<String>) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: text::COMMAND_TIMED_OUT.to_string(),
            command: command.into(),
            cancelled: false,
            timed_out: true,
        }
    }

    /// True iff the child exited with code zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Text to show a user for a failed result: stderr when present,
    /// stdout otherwise, and a generic fallback when the child said
    /// nothing at all.
    pub fn error_output(&self) -> &str {
        if !self.stderr.is_empty() {
            &self.stderr
        } else if !self.stdout.is_empty() {
            &self.stdout
        } else {
            text::OPERATION_FAILED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn success_is_derived_from_exit_code() {
        assert!(ExecutionResult::completed(0, "", "", "true").success());
        assert!(!ExecutionResult::completed(1, "", "", "false").success());
        assert!(!ExecutionResult::failure("tool", "not found").success());
        assert!(!ExecutionResult::user_cancelled("sleep 5").success());
    }

    #[test]
    fn error_output_prefers_stderr() {
        let result = ExecutionResult::completed(1, "partial frames", "codec error", "ffmpeg");
        assert_eq!(result.error_output(), "codec error");
    }

    #[test]
    fn error_output_falls_back_to_stdout() {
        let result = ExecutionResult::completed(1, "wrote 3 pages", "", "pandoc");
        assert_eq!(result.error_output(), "wrote 3 pages");
    }

    #[test]
    fn error_output_generic_fallback() {
        let result = ExecutionResult::completed(1, "", "", "convert");
        assert_eq!(result.error_output(), text::OPERATION_FAILED);
    }

    #[test]
    fn cancelled_and_timed_out_are_distinguishable() {
        let cancelled = ExecutionResult::user_cancelled("ffmpeg -i a.mp4 b.webm");
        assert!(cancelled.cancelled && !cancelled.timed_out);
        assert_eq!(cancelled.exit_code, -1);
        assert_eq!(cancelled.stderr, text::OPERATION_CANCELLED_BY_USER);

        let timed_out = ExecutionResult::hard_timeout("magick identify big.tiff");
        assert!(timed_out.timed_out && !timed_out.cancelled);
        assert_eq!(timed_out.exit_code, -1);
        assert_eq!(timed_out.stderr, text::COMMAND_TIMED_OUT);
    }
}
