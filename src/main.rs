use anyhow::Context;
use argh::FromArgs;
use shell_script_runner::config::{DEFAULT_MAX_LINE_LEN, DEFAULT_MAX_PATH_LEN};
use shell_script_runner::{
    AuthConfig, Console, CredentialSource, OverflowPolicy, RunnerConfig, ScriptSniffer, Shell,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(FromArgs)]
/// run a line-oriented shell script, or start an interactive shell when no script is given.
struct Args {
    #[argh(option)]
    /// password the shell requires (via `login`) before running other commands.
    password: Option<String>,

    #[argh(option)]
    /// password used to log in around each script run.
    auth_password: Option<String>,

    #[argh(option)]
    /// environment variable holding the password used to log in around each script run.
    auth_password_env: Option<String>,

    #[argh(option, default = "DEFAULT_MAX_LINE_LEN")]
    /// maximum length of a script line in bytes.
    max_line: usize,

    #[argh(option, default = "DEFAULT_MAX_PATH_LEN")]
    /// maximum length of a script path in bytes.
    max_path: usize,

    #[argh(switch)]
    /// fail the run on over-long lines instead of truncating them.
    reject_long_lines: bool,

    #[argh(switch)]
    /// only report whether the file looks like a script.
    check: bool,

    #[argh(positional)]
    /// script to run.
    script: Option<PathBuf>,
}

impl Args {
    fn runner_config(&self) -> RunnerConfig {
        let credential = match (&self.auth_password, &self.auth_password_env) {
            (Some(password), _) => Some(CredentialSource::Literal(password.clone())),
            (None, Some(var)) => Some(CredentialSource::Env(var.clone())),
            (None, None) => None,
        };
        RunnerConfig {
            max_line_len: self.max_line,
            max_path_len: self.max_path,
            overflow: if self.reject_long_lines {
                OverflowPolicy::Reject
            } else {
                OverflowPolicy::Truncate
            },
            auth: credential.map(AuthConfig::new),
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    shell_script_runner::logging::init_tracing();
    let args: Args = argh::from_env();

    if args.check {
        let script = args.script.context("--check needs a script path")?;
        let sniffer = ScriptSniffer::default().with_max_header_len(args.max_line);
        return Ok(if sniffer.is_script(&script) {
            println!("{}: script", script.display());
            ExitCode::SUCCESS
        } else {
            println!("{}: not a script", script.display());
            ExitCode::FAILURE
        });
    }

    let mut shell = Shell::default();
    if let Some(password) = &args.password {
        shell = shell.with_password(password.clone());
    }
    let mut console = Console::new(shell, args.runner_config());

    match &args.script {
        Some(script) => {
            let code = console.run_script(script, &mut std::io::stdout())?;
            Ok(if code < 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        None => {
            console.repl()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
