//! User-facing strings embedded in execution results.
//!
//! Collaborating UI layers display these verbatim, so they live in one
//! place rather than scattered across the component crates.

/// Generic fallback when a failed command produced no output at all.
pub const OPERATION_FAILED: &str = "Operation failed";

/// Stderr text of a result produced by user-initiated cancellation.
pub const OPERATION_CANCELLED_BY_USER: &str = "Operation cancelled by user";

/// Stderr text of a result produced by hard-timeout expiry.
pub const COMMAND_TIMED_OUT: &str = "Command timed out";

/// Result text for querying a managed process that was never started.
pub const PROCESS_NOT_STARTED: &str = "Process not started";

/// Result text when a managed process did not finish within the wait bound.
pub const PROCESS_OUTPUT_TIMEOUT: &str = "Timeout waiting for process output";

/// Failure summary for one step of a chained conversion, with 1-based step
/// attribution so callers can report "step N of M failed".
pub fn chained_step_failed(step: usize, total: usize, error: &str, command: &str) -> String {
    format!("Step {step}/{total} failed.\n\nError: {error}\n\nCommand: {command}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failure_message_carries_attribution() {
        let message = chained_step_failed(2, 3, "exit status 1", "tar czf out.tar.gz .");
        assert!(message.starts_with("Step 2/3 failed."));
        assert!(message.contains("exit status 1"));
        assert!(message.contains("tar czf out.tar.gz ."));
    }
}
