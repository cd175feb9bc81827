//! Command value type shared by the safety gate and the process runner.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Shell control and redirection operators. A command template that expands
/// to a string containing any of these must run under a shell; everything
/// else runs as a plain argv launch.
pub const SHELL_OPERATORS: [&str; 7] = ["|", "&&", "||", ">", ">>", "<", "<<"];

/// Error from [`CommandSpec::parse`]. A malformed template is a caller bug
/// surfaced as a typed error rather than a failed execution result.
#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("empty command template")]
    Empty,
    #[error("unbalanced quoting in command template: {0}")]
    Quoting(#[from] shell_words::ParseError),
}

/// A fully resolved conversion command.
///
/// `Argv` commands are launched directly and are never interpreted by a
/// shell; `Shell` commands are handed to `sh -c` because they structurally
/// need shell operators (e.g. chained archive steps). The distinction is
/// part of the type so callers cannot accidentally route literal arguments
/// through an interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandSpec {
    /// Shell-form command string, executed via `sh -c`.
    Shell(String),
    /// Program plus literal arguments, executed without a shell.
    Argv(Vec<String>),
}

impl CommandSpec {
    /// Build a shell-form command.
    pub fn shell(command: impl Into<String>) -> Self {
        Self::Shell(command.into())
    }

    /// Build an argv-form command.
    pub fn argv(args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Argv(args.into_iter().map(Into::into).collect())
    }

    /// Classify a template-expanded command string.
    ///
    /// Strings containing a shell operator become [`CommandSpec::Shell`];
    /// everything else is word-split into [`CommandSpec::Argv`].
    pub fn parse(command: &str) -> Result<Self, CommandParseError> {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return Err(CommandParseError::Empty);
        }

        if requires_shell(trimmed) {
            return Ok(Self::Shell(trimmed.to_string()));
        }

        let args = shell_words::split(trimmed)?;
        if args.is_empty() {
            return Err(CommandParseError::Empty);
        }
        Ok(Self::Argv(args))
    }

    /// The resolved command string carried into execution results.
    pub fn display_string(&self) -> String {
        match self {
            Self::Shell(command) => command.clone(),
            Self::Argv(args) => args.join(" "),
        }
    }

    /// Basename of the program this command will launch, skipping leading
    /// `KEY=value` environment assignments. Used by collaborators for
    /// tool-availability checks before execution.
    pub fn program(&self) -> Option<&str> {
        let token = match self {
            Self::Shell(command) => command
                .split_whitespace()
                .find(|token| !is_env_assignment(token)),
            Self::Argv(args) => args
                .iter()
                .map(String::as_str)
                .find(|token| !is_env_assignment(token)),
        };
        let token = token?;
        Path::new(token).file_name().and_then(|name| name.to_str())
    }

    /// True when there is nothing to execute.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Shell(command) => command.trim().is_empty(),
            Self::Argv(args) => args.iter().all(|arg| arg.trim().is_empty()),
        }
    }

    /// True for shell-form commands.
    pub fn is_shell(&self) -> bool {
        matches!(self, Self::Shell(_))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

/// True when the string contains a shell control or redirection operator
/// and therefore cannot run as a plain argv launch.
pub fn requires_shell(command: &str) -> bool {
    SHELL_OPERATORS.iter().any(|op| command.contains(op))
}

/// True for `KEY=value` environment-assignment tokens that may precede the
/// executable in a shell command (`FOO=bar ffmpeg ...`).
pub fn is_env_assignment(token: &str) -> bool {
    token.contains('=') && !token.starts_with('-')
}
