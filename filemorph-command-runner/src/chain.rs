//! Strictly sequential execution of multi-step conversions.
//!
//! Archive conversions are the canonical user: extract the source, then
//! recompress the contents. A step only starts after the previous step
//! succeeded; the first failure stops the chain and is surfaced with its
//! 1-based step index so callers can report "step N of M failed".
//!
//! When any step starts with a shell builtin (e.g. `cd` between archive
//! steps), sequential argv launches cannot work, so the whole chain is
//! joined with `&&` and executed as one shell command. The mode is decided
//! up front from the step list, never as a reaction to a step's behavior.

use std::collections::HashSet;
use std::path::Path;

use filemorph_commons::{CommandSpec, text};

use crate::result::ExecutionResult;
use crate::runner::run;

/// Outcome of a chained conversion.
#[derive(Debug, Clone)]
pub struct ChainResult {
    /// Result of the last step that ran. On failure its stderr carries the
    /// step-attribution message.
    pub result: ExecutionResult,
    /// 1-based index of the failing step, `None` when the chain succeeded.
    /// In joined-shell mode a failure is attributed to step 1: the shell
    /// reports one exit status for the whole chain.
    pub failed_step: Option<usize>,
    pub total_steps: usize,
}

impl ChainResult {
    pub fn success(&self) -> bool {
        self.failed_step.is_none() && self.result.success()
    }
}

fn step_failure(result: ExecutionResult, step: usize, total: usize) -> ChainResult {
    let message = text::chained_step_failed(step, total, result.error_output(), &result.command);
    ChainResult {
        result: ExecutionResult {
            stderr: message,
            ..result
        },
        failed_step: Some(step),
        total_steps: total,
    }
}

/// Execute conversion steps strictly in order.
///
/// `shell_builtins` is the caller's set of shell builtin names; a step
/// whose program is in the set forces joined-shell mode for the whole
/// chain.
///
/// # Panics
///
/// Panics on an empty step list: that is a caller bug, not a runtime
/// condition.
pub async fn run_chain(
    steps: &[Vec<String>],
    working_dir: Option<&Path>,
    shell_builtins: &HashSet<String>,
) -> ChainResult {
    assert!(!steps.is_empty(), "run_chain requires at least one step");
    let total = steps.len();

    let needs_shell = steps.iter().any(|step| {
        step.first()
            .is_some_and(|program| shell_builtins.contains(program))
    });

    if needs_shell {
        let joined = steps
            .iter()
            .map(|step| step.join(" "))
            .collect::<Vec<_>>()
            .join(" && ");
        tracing::debug!(total, "running chain as one shell command");

        let result = run(&CommandSpec::shell(joined), working_dir, None).await;
        if result.success() {
            return ChainResult {
                result,
                failed_step: None,
                total_steps: total,
            };
        }
        return step_failure(result, 1, total);
    }

    let mut last = None;
    for (index, step) in steps.iter().enumerate() {
        let result = run(&CommandSpec::argv(step.clone()), working_dir, None).await;
        if !result.success() {
            return step_failure(result, index + 1, total);
        }
        last = Some(result);
    }

    ChainResult {
        result: last.expect("chain has at least one step"),
        failed_step: None,
        total_steps: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_builtins() -> HashSet<String> {
        HashSet::new()
    }

    #[tokio::test]
    async fn all_steps_succeed() {
        let steps = vec![
            vec!["true".to_string()],
            vec!["echo".to_string(), "done".to_string()],
        ];
        let chain = run_chain(&steps, None, &no_builtins()).await;
        assert!(chain.success());
        assert_eq!(chain.failed_step, None);
        assert_eq!(chain.total_steps, 2);
        assert_eq!(chain.result.stdout, "done\n");
    }

    #[tokio::test]
    async fn failure_stops_the_chain_with_attribution() {
        let dir = tempfile::tempdir().expect("tempdir");
        let steps = vec![
            vec!["true".to_string()],
            vec!["false".to_string()],
            vec!["touch".to_string(), "should-not-exist".to_string()],
        ];
        let chain = run_chain(&steps, Some(dir.path()), &no_builtins()).await;

        assert!(!chain.success());
        assert_eq!(chain.failed_step, Some(2));
        assert_eq!(chain.total_steps, 3);
        assert!(chain.result.stderr.starts_with("Step 2/3 failed."));
        assert!(
            !dir.path().join("should-not-exist").exists(),
            "step after the failure must not run"
        );
    }

    #[tokio::test]
    async fn builtin_step_switches_to_joined_shell_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("inner")).expect("mkdir");

        let builtins: HashSet<String> = ["cd".to_string()].into();
        let steps = vec![
            vec!["cd".to_string(), "inner".to_string()],
            vec!["touch".to_string(), "made-here".to_string()],
        ];
        let chain = run_chain(&steps, Some(dir.path()), &builtins).await;

        assert!(chain.success());
        assert!(
            dir.path().join("inner").join("made-here").exists(),
            "the cd must affect the following step"
        );
    }

    #[tokio::test]
    async fn joined_shell_failure_is_attributed_to_step_one() {
        let builtins: HashSet<String> = ["cd".to_string()].into();
        let steps = vec![
            vec!["cd".to_string(), "/definitely/not/a/real/path".to_string()],
            vec!["true".to_string()],
        ];
        let chain = run_chain(&steps, None, &builtins).await;
        assert!(!chain.success());
        assert_eq!(chain.failed_step, Some(1));
    }

    #[tokio::test]
    #[should_panic(expected = "at least one step")]
    async fn empty_step_list_panics() {
        let _ = run_chain(&[], None, &no_builtins()).await;
    }
}
