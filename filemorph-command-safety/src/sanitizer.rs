//! Sub-command scanning behind the [`check_command`](crate::check_command)
//! chokepoint.
//!
//! A command string is split on shell control operators, each segment's
//! executable extracted (skipping `KEY=value` environment assignments) and
//! reduced to a basename, and the first basename found in the
//! dangerous-command table short-circuits to a blocked verdict.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use filemorph_commons::is_env_assignment;

use crate::dangerous_commands::dangerous_command_category;

/// Outcome of a safety check. Produced fresh per check and never cached:
/// the same executable name can appear in different contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandVerdict {
    /// No dangerous executable found; the command may be executed.
    Safe,
    /// A dangerous executable was found; the command must not be executed.
    Blocked {
        /// Human-readable sentence naming the executable and its category,
        /// e.g. `Blocked command 'rm' detected (file deletion)`.
        reason: String,
    },
}

impl CommandVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// The block reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Safe => None,
            Self::Blocked { reason } => Some(reason),
        }
    }
}

// Splits on `&&`, `||`, `|` and `;` with surrounding whitespace. Operators
// inside quoted strings are split on too; see the crate docs for why this
// stays a plain split rather than a shell parse.
static SPLIT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:&&|\|\||\||;)\s*").expect("operator split pattern is valid"));

pub(crate) fn check_command_string(command: &str) -> CommandVerdict {
    if command.trim().is_empty() {
        return CommandVerdict::Safe;
    }

    for sub_command in SPLIT_PATTERN.split(command) {
        let sub_command = sub_command.trim();
        if sub_command.is_empty() {
            continue;
        }

        // A segment of nothing but environment assignments has no
        // executable to flag.
        let Some(executable) = extract_executable(sub_command) else {
            continue;
        };
        let basename = strip_path_prefix(executable);

        if let Some(category) = dangerous_command_category(basename) {
            tracing::warn!(
                executable = basename,
                category,
                "dangerous command blocked: {:.100}",
                command
            );
            return CommandVerdict::Blocked {
                reason: format!("Blocked command '{basename}' detected ({category})"),
            };
        }
    }

    CommandVerdict::Safe
}

/// First whitespace token of a sub-command that is not a `KEY=value`
/// environment assignment.
fn extract_executable(sub_command: &str) -> Option<&str> {
    sub_command
        .split_whitespace()
        .find(|token| !is_env_assignment(token))
}

/// `/usr/bin/rm` -> `rm`.
fn strip_path_prefix(executable: &str) -> &str {
    Path::new(executable)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(executable)
}
