//! Command safety gate for the filemorph conversion engine.
//!
//! Every code path that finalizes a conversion command calls
//! [`check_command`] before handing the command to the runner, making this
//! crate the single chokepoint between template expansion and process
//! execution. Detection is by executable basename: each sub-command of a
//! shell-operator-joined string is scanned and its executable checked
//! against a static table of dangerous commands (privilege escalation,
//! deletion, raw disk access, network exfiltration, ...).
//!
//! The operator splitter does not understand quoting: a dangerous name
//! inside a quoted string literal is still flagged, and a cleverly quoted
//! command could in principle evade the split. That trade-off is
//! deliberate: the gate is a guard against template accidents and
//! obviously hostile inputs, not a full shell parser.

pub mod dangerous_commands;
pub mod sanitizer;


use filemorph_commons::CommandSpec;

pub use dangerous_commands::{dangerous_command_category, is_dangerous};
pub use sanitizer::CommandVerdict;

use sanitizer::check_command_string;

/// Check a finalized command for dangerous executables.
///
/// Argv-form commands of length two are additionally checked with the
/// second element as a full shell string, covering the
/// `(tool, shell command)` pair shape produced by archive templates.
pub fn check_command(command: &CommandSpec) -> CommandVerdict {
    match command {
        CommandSpec::Shell(command) => check_command_string(command),
        CommandSpec::Argv(args) => {
            if args.len() == 2
                && let Some(script) = args.get(1)
            {
                let verdict = check_command_string(script);
                if verdict.is_blocked() {
                    return verdict;
                }
            }
            check_command_string(&args.join(" "))
        }
    }
}

/// String-form convenience for callers that have not built a
/// [`CommandSpec`] yet.
pub fn check_command_str(command: &str) -> CommandVerdict {
    check_command_string(command)
}
