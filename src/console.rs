use crate::command::ExitCode;
use crate::config::RunnerConfig;
use crate::errno::{EACCES, EINVAL};
use crate::executor::CommandExecutor;
use crate::runner::ScriptRunner;
use crate::shell::Shell;
use argh::{EarlyExit, FromArgs};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};
use std::path::Path;
use tracing::warn;

/// Name of the command that runs a script from the console.
pub const RUN_SCRIPT_COMMAND: &str = "zsh";

#[derive(FromArgs)]
/// run a shell script, stopping at the first failing command.
/// responses are written to the script path with an .out suffix.
struct RunScript {
    #[argh(positional)]
    /// path of the script, relative to the shell's current directory.
    path: String,
}

/// Interactive front end: a [`Shell`] plus the `zsh <path>` command.
///
/// Scripts run against the console's own shell, so state such as the
/// current directory or a login carries over between the prompt and a run.
pub struct Console {
    shell: Shell,
    config: RunnerConfig,
}

impl Console {
    pub fn new(shell: Shell, config: RunnerConfig) -> Self {
        Self { shell, config }
    }

    /// Run the script at `path`, echoing each response to `out`, then print
    /// `Ok` or `Error [<code>]`. Returns 0 or the run's negative code.
    pub fn run_script(&mut self, path: &Path, out: &mut dyn Write) -> io::Result<ExitCode> {
        let outcome = ScriptRunner::new(&mut self.shell, self.config.clone())
            .with_echo(&mut *out)
            .run(path);
        match outcome {
            Ok(_) => {
                writeln!(out, "Ok")?;
                Ok(0)
            }
            Err(err) => {
                writeln!(out, "Error [{}]", err.code())?;
                Ok(err.code())
            }
        }
    }

    /// Handle one line typed at the prompt.
    pub fn handle_line(&mut self, line: &str, out: &mut dyn Write) -> io::Result<ExitCode> {
        let words = shell_words::split(line).unwrap_or_default();
        if let Some((name, args)) = words.split_first() {
            if name == RUN_SCRIPT_COMMAND {
                if self.shell.env().login_required() {
                    writeln!(out, "{RUN_SCRIPT_COMMAND}: login required")?;
                    return Ok(-EACCES);
                }
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                return match RunScript::from_args(&[RUN_SCRIPT_COMMAND], &args) {
                    Ok(cmd) => {
                        let path = self.shell.env().resolve(&cmd.path);
                        self.run_script(&path, out)
                    }
                    Err(EarlyExit { output, status }) => {
                        writeln!(out, "{}", output.trim_end())?;
                        Ok(if status.is_err() { -EINVAL } else { 0 })
                    }
                };
            }
        }

        let result = self.shell.execute(line);
        out.write_all(result.output.as_bytes())?;
        Ok(result.status)
    }

    /// Read-Eval-Print Loop on the terminal until EOF or Ctrl-C.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;
        let mut stdout = io::stdout();

        loop {
            match rl.readline("$ ") {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    if let Err(err) = self.handle_line(&line, &mut stdout) {
                        warn!("could not write response: {err}");
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}
