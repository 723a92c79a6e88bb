use crate::errno::{self, E2BIG, EINVAL};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The file operation that failed during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    CreateResult,
    OpenScript,
    ReadScript,
    WriteResult,
    CloseResult,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IoOp::CreateResult => "create result file",
            IoOp::OpenScript => "open script",
            IoOp::ReadScript => "read script",
            IoOp::WriteResult => "write result file",
            IoOp::CloseResult => "close result file",
        })
    }
}

/// Why a script run ended in failure.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The derived result path does not fit the configured bound.
    #[error("result file path for {} exceeds {limit} bytes", .path.display())]
    PathTooLong { path: PathBuf, limit: usize },

    #[error("could not {op} {}: {source}", .path.display())]
    Io {
        op: IoOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Raised only under [`crate::OverflowPolicy::Reject`].
    #[error("line {line} exceeds {limit} bytes")]
    LineTooLong { line: usize, limit: usize },

    /// A command returned a negative status; the run halted after recording it.
    #[error("line {line}: `{command}` failed with status {status}")]
    Command {
        line: usize,
        command: String,
        status: i32,
    },
}

impl ScriptError {
    pub(crate) fn io(op: IoOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        ScriptError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Fill in the file an I/O error from a stream-level run refers to.
    pub(crate) fn locate(self, script: &Path, result: &Path) -> Self {
        match self {
            ScriptError::Io { op, path, source } if path.as_os_str().is_empty() => {
                let path = match op {
                    IoOp::OpenScript | IoOp::ReadScript => script,
                    IoOp::CreateResult | IoOp::WriteResult | IoOp::CloseResult => result,
                };
                ScriptError::io(op, path, source)
            }
            other => other,
        }
    }

    /// The single negative status code reported to the caller for this failure.
    pub fn code(&self) -> i32 {
        match self {
            ScriptError::PathTooLong { .. } => -EINVAL,
            ScriptError::Io { source, .. } => errno::status_from_io(source),
            ScriptError::LineTooLong { .. } => -E2BIG,
            ScriptError::Command { status, .. } => *status,
        }
    }

    pub fn is_command_failure(&self) -> bool {
        matches!(self, ScriptError::Command { .. })
    }
}
