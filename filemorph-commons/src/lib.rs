//! Shared value types for the filemorph conversion engine.
//!
//! The crate exposes the [`CommandSpec`] type that the template layer hands
//! to the safety and runner crates, plus the centralized user-facing strings
//! those crates embed in results. Keeping both here lets the component
//! crates stay independent of each other while agreeing on the wire shape
//! of a command.

pub mod command;
pub mod text;

pub use command::{
    CommandParseError, CommandSpec, SHELL_OPERATORS, is_env_assignment, requires_shell,
};
