//! Cancellable external-process execution for the filemorph conversion
//! engine.
//!
//! Conversions delegate to external tools (ffmpeg, ImageMagick, 7z,
//! pandoc, ...) and those tools have two awkward properties: they write
//! verbose progress to stderr fast enough to fill the OS pipe buffer, and
//! they mostly ignore graceful termination signals. The runner handles
//! both: every child gets two concurrent stream drainers for its whole
//! lifetime, and cancellation kills outright after a fine-grained polling
//! loop observes the caller's cancel predicate.
//!
//! Entry points: [`run`] for short trusted commands (optional hard
//! timeout), [`run_cancellable`] for interactive conversions, and
//! [`run_chain`] for multi-step conversions such as extract-then-
//! recompress. All three resolve to a value-typed [`ExecutionResult`];
//! missing tools, non-zero exits and cancellations are results, never
//! errors. Commands are expected to have passed
//! `filemorph_command_safety::check_command` already; the runner does not
//! re-check.

pub mod cancel;
pub mod chain;
pub mod managed;
pub mod result;
pub mod runner;

mod drain;

pub use cancel::{CancelToken, CancelWatch, DEFAULT_POLL_INTERVAL};
pub use chain::{ChainResult, run_chain};
pub use managed::ManagedProcess;
pub use result::ExecutionResult;
pub use runner::{run, run_cancellable};
