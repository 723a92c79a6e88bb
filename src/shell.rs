use crate::builtin::{BuiltinCommand, Login};
use crate::capture::CaptureBuffer;
use crate::command::{CommandFactory, ExitCode};
use crate::env::Environment;
use crate::errno::{self, EACCES, EINVAL, ENOEXEC};
use crate::executor::{CommandExecutor, ExecutionResult};
use crate::session::Session;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the builtin commands defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A small command shell used as the default dispatch channel for scripts.
///
/// The shell maintains an [`Environment`], an explicit registry of
/// [`CommandFactory`] objects queried by command name, and the buffer every
/// command's response is captured into. See [`Default`] for the built-in
/// commands included out of the box.
///
/// Example
/// ```
/// use shell_script_runner::{CommandExecutor, Shell};
/// let mut sh = Shell::default();
/// let result = sh.execute("echo hello world");
/// assert_eq!(result.status, 0);
/// assert_eq!(result.output, "hello world\n");
/// ```
pub struct Shell {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
    capture: CaptureBuffer,
}

impl Shell {
    /// Create a shell with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            commands,
            capture: CaptureBuffer::new(),
        }
    }

    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Gate every command but `login` behind `password`.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.env.set_password(password);
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// The response is appended to the capture buffer.
    pub fn run(&mut self, name: &str, args: &[&str]) -> ExitCode {
        if self.env.login_required() && name != Login::name() {
            self.capture.push_str(&format!("{name}: login required\n"));
            return -EACCES;
        }
        let Some(cmd) = self
            .commands
            .iter()
            .find_map(|factory| factory.try_create(&self.env, name, args))
        else {
            self.capture.push_str(&format!("{name}: command not found\n"));
            return -ENOEXEC;
        };
        match cmd.execute(&mut self.capture, &mut self.env) {
            Ok(code) => code,
            Err(err) => {
                self.capture.push_str(&format!("{err:#}\n"));
                errno::status_from_anyhow(&err)
            }
        }
    }

    fn dispatch(&mut self, line: &str) -> ExitCode {
        let words = match shell_words::split(line) {
            Ok(words) => words,
            Err(err) => {
                self.capture.push_str(&format!("{err}\n"));
                return -EINVAL;
            }
        };
        let Some((name, args)) = words.split_first() else {
            return 0;
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(name, &args)
    }
}

impl CommandExecutor for Shell {
    fn execute(&mut self, command: &str) -> ExecutionResult {
        self.capture.clear();
        let status = self.dispatch(command);
        ExecutionResult::new(status, self.capture.take_text())
    }

    fn session(&self) -> Session {
        self.env.session
    }
}

impl Default for Shell {
    /// Create a shell with the default set of commands:
    /// `pwd`, `cd`, `echo`, `cat`, `wc`, `login` and `logout`.
    fn default() -> Self {
        use crate::builtin::*;
        Self::new(vec![
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Echo>::default()),
            Box::new(Factory::<Cat>::default()),
            Box::new(Factory::<Wc>::default()),
            Box::new(Factory::<Login>::default()),
            Box::new(Factory::<Logout>::default()),
        ])
    }
}
