//! Line-oriented shell script runner.
//!
//! A script is a text file of commands, one per line. [`ScriptRunner`] feeds
//! each command to a [`CommandExecutor`], records every response in
//! `<script>.out`, and stops at the first command that returns a negative
//! status. Blank lines and lines starting with `#` are skipped.
//!
//! [`Shell`] is the bundled executor: a small registry of built-in commands
//! whose output is captured per command. [`Console`] puts an interactive
//! prompt and the `zsh <path>` command on top of it, and [`ScriptSniffer`]
//! recognizes script files by their header line without running them.

mod builtin;
pub mod capture;
pub mod command;
pub mod config;
mod console;
pub mod env;
pub mod errno;
mod error;
mod executor;
pub mod line;
pub mod logging;
mod runner;
mod session;
mod shell;
mod sniffer;
mod transcript;

pub use config::{AuthConfig, CredentialSource, OverflowPolicy, RunnerConfig};
pub use console::{Console, RUN_SCRIPT_COMMAND};
pub use error::{IoOp, ScriptError};
pub use executor::{CommandExecutor, ExecutionResult};
pub use runner::{RESULT_FILE_SUFFIX, RunSummary, ScriptRunner, result_path_for};
pub use session::{Session, SessionGuard};
pub use shell::Shell;
pub use sniffer::{DEFAULT_HEADER_PATTERN, ScriptSniffer};
pub use transcript::TranscriptWriter;
