//! The halt-on-error script execution loop.
//!
//! A run creates `<script>.out`, opens the script, optionally logs in, then
//! executes the script's command lines one by one, recording each response.
//! The first command with a negative status is recorded and ends the run.

use crate::config::RunnerConfig;
use crate::error::{IoOp, ScriptError};
use crate::executor::{CommandExecutor, ExecutionResult};
use crate::line::{LineError, LineKind, LineSource};
use crate::session::SessionGuard;
use crate::transcript::TranscriptWriter;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const RESULT_FILE_SUFFIX: &str = ".out";

/// Where the transcript of `script` goes, if the path fits in `max_path_len`.
pub fn result_path_for(script: &Path, max_path_len: usize) -> Result<PathBuf, ScriptError> {
    let mut result = OsString::from(script.as_os_str());
    result.push(RESULT_FILE_SUFFIX);
    if result.len() > max_path_len + RESULT_FILE_SUFFIX.len() {
        return Err(ScriptError::PathTooLong {
            path: script.to_path_buf(),
            limit: max_path_len,
        });
    }
    Ok(PathBuf::from(result))
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Physical lines read, including skipped ones.
    pub lines_read: usize,
    /// Commands dispatched.
    pub executed: usize,
    pub result_path: PathBuf,
}

/// Runs scripts against a borrowed command dispatch channel.
///
/// The runner keeps the executor mutably borrowed for its whole lifetime,
/// so only one run at a time can use a given channel.
pub struct ScriptRunner<'a, E: CommandExecutor + ?Sized> {
    executor: &'a mut E,
    config: RunnerConfig,
    echo: Option<&'a mut dyn Write>,
}

impl<'a, E: CommandExecutor + ?Sized> ScriptRunner<'a, E> {
    pub fn new(executor: &'a mut E, config: RunnerConfig) -> Self {
        Self {
            executor,
            config,
            echo: None,
        }
    }

    /// Also print every command response to `sink` as it is produced.
    pub fn with_echo(mut self, sink: &'a mut dyn Write) -> Self {
        self.echo = Some(sink);
        self
    }

    /// Run the script at `path`, writing its transcript to `<path>.out`.
    ///
    /// Both files are closed on every exit path. When several things go wrong
    /// the returned error is, in order of preference, the failed command, the
    /// first I/O failure, then a failure to close the result file.
    pub fn run(&mut self, path: &Path) -> Result<RunSummary, ScriptError> {
        let outcome = self.run_files(path);
        match &outcome {
            Ok(summary) => info!(
                path = %path.display(),
                executed = summary.executed,
                "script finished"
            ),
            Err(err) => error!(path = %path.display(), code = err.code(), "script failed: {err}"),
        }
        outcome
    }

    fn run_files(&mut self, path: &Path) -> Result<RunSummary, ScriptError> {
        let result_path = result_path_for(path, self.config.max_path_len)?;

        debug!(path = %result_path.display(), "creating result file");
        let transcript = TranscriptWriter::create(&result_path)
            .map_err(|source| ScriptError::io(IoOp::CreateResult, &result_path, source))?;
        let script = File::open(path).map(BufReader::new);
        self.run_opened(path, &result_path, script, transcript)
    }

    /// Run an opened (or failed-to-open) script, then close the transcript.
    fn run_opened<R: Read, W: Write>(
        &mut self,
        path: &Path,
        result_path: &Path,
        script: io::Result<R>,
        mut transcript: TranscriptWriter<W>,
    ) -> Result<RunSummary, ScriptError> {
        let outcome = match script {
            Ok(script) => {
                info!(path = %path.display(), "running script");
                self.run_streams(script, &mut transcript)
                    .map(|summary| RunSummary {
                        result_path: result_path.to_path_buf(),
                        ..summary
                    })
                    .map_err(|err| err.locate(path, result_path))
            }
            Err(source) => Err(ScriptError::io(IoOp::OpenScript, path, source)),
        };

        let closed = transcript
            .close()
            .map_err(|source| ScriptError::io(IoOp::CloseResult, result_path, source));
        match (outcome, closed) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                error!("{close_err}");
                Err(err)
            }
        }
    }

    /// Execute every command line of `script`, recording responses in `transcript`.
    ///
    /// The session guard, when configured, brackets the loop. The transcript
    /// is left open for the caller to close.
    pub fn run_streams<R: Read, W: Write>(
        &mut self,
        script: R,
        transcript: &mut TranscriptWriter<W>,
    ) -> Result<RunSummary, ScriptError> {
        let guard = match &self.config.auth {
            Some(auth) => Some(SessionGuard::engage(auth, &mut *self.executor)),
            None => None,
        };

        let mut lines = LineSource::new(script, self.config.max_line_len, self.config.overflow);
        let outcome = self.execute_lines(&mut lines, transcript);

        if let Some(guard) = guard {
            guard.release(&mut *self.executor);
        }
        outcome
    }

    fn execute_lines<R: Read, W: Write>(
        &mut self,
        lines: &mut LineSource<R>,
        transcript: &mut TranscriptWriter<W>,
    ) -> Result<RunSummary, ScriptError> {
        let mut summary = RunSummary::default();
        loop {
            let line = match lines.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(LineError::Read(source)) => {
                    return Err(ScriptError::io(IoOp::ReadScript, PathBuf::new(), source));
                }
                Err(LineError::TooLong { limit }) => {
                    return Err(ScriptError::LineTooLong {
                        line: lines.line_number(),
                        limit,
                    });
                }
            };
            summary.lines_read = lines.line_number();

            let command = match line.classify() {
                LineKind::Blank | LineKind::Comment => continue,
                LineKind::Command(command) => command,
            };

            debug!(line = summary.lines_read, command, "executing");
            let result = self.executor.execute(command);
            summary.executed += 1;
            debug!(
                status = result.status,
                resp_size = result.output.len(),
                resp = %result.output,
                "result"
            );
            self.echo(&result);

            let recorded = transcript.record(&result);
            if result.failed() {
                if let Err(source) = recorded {
                    error!("could not record failure of `{command}`: {source}");
                }
                return Err(ScriptError::Command {
                    line: summary.lines_read,
                    command: command.to_string(),
                    status: result.status,
                });
            }
            recorded.map_err(|source| ScriptError::io(IoOp::WriteResult, PathBuf::new(), source))?;
        }
        Ok(summary)
    }

    fn echo(&mut self, result: &ExecutionResult) {
        let Some(sink) = self.echo.as_mut() else {
            return;
        };
        let written = sink
            .write_all(result.output.as_bytes())
            .and_then(|()| sink.flush());
        if let Err(err) = written {
            warn!("could not echo command response: {err}");
        }
    }
}
