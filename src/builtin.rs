use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::errno::{self, EACCES, EINVAL};
use crate::shell::Factory;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// in-process, writing their response into the shell's capture buffer.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "login".
    fn name() -> &'static str;

    /// Executes the command using the provided output and environment.
    ///
    /// Return value follows errno conventions: 0 for success, negative for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        match <T as BuiltinCommand>::execute(*self, stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "{e:#}")?;
                Ok(errno::status_from_anyhow(&e))
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(if self.is_error { -EINVAL } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// print the shell's current directory.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// change the shell's current directory.
/// if no target is provided, changes to the directory specified by the HOME variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => {
                    return Err(anyhow::anyhow!("cd: no target and HOME not set"));
                }
            },
        };

        let new_dir = env.resolve(target);
        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: can't canonicalize {}", new_dir.display()))?;
        if !canonical.is_dir() {
            return Err(anyhow::anyhow!("cd: {}: not a directory", canonical.display()));
        }
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// write the arguments to standard output, separated by spaces.
/// by default, a trailing newline is printed.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// print the contents of files.
pub struct Cat {
    #[argh(positional, greedy)]
    /// files to print, relative to the current directory.
    pub files: Vec<String>,
}

impl BuiltinCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        for fname in &self.files {
            let data = fs::read(env.resolve(fname)).with_context(|| format!("cat: {fname}"))?;
            stdout.write_all(&data)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// count lines, words and bytes of files.
pub struct Wc {
    #[argh(positional, greedy)]
    /// files to count, relative to the current directory.
    pub files: Vec<String>,
}

impl BuiltinCommand for Wc {
    fn name() -> &'static str {
        "wc"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        for fname in &self.files {
            let bytes = fs::read(env.resolve(fname)).with_context(|| format!("wc: {fname}"))?;
            let s = String::from_utf8_lossy(&bytes);
            let lines = s.lines().count();
            let words = s.split_whitespace().count();
            writeln!(stdout, "{} {} {} {}", lines, words, bytes.len(), fname)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// authenticate the shell session.
pub struct Login {
    #[argh(positional)]
    /// session password.
    pub password: String,
}

impl BuiltinCommand for Login {
    fn name() -> &'static str {
        "login"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        if !env.check_password(&self.password) {
            writeln!(stdout, "login: invalid password")?;
            return Ok(-EACCES);
        }
        env.session.authenticated = true;
        writeln!(stdout, "logged in")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// end the authenticated shell session.
pub struct Logout {}

impl BuiltinCommand for Logout {
    fn name() -> &'static str {
        "logout"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.session.authenticated = false;
        writeln!(stdout, "logged out")?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errno::ENOENT;

    fn run<T: BuiltinCommand + 'static>(
        args: &[&str],
        env: &mut Environment,
    ) -> (ExitCode, String) {
        let cmd = Factory::<T>::default()
            .try_create(env, T::name(), args)
            .unwrap();
        let mut out = Vec::new();
        let code = cmd.execute(&mut out, env).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_factory_ignores_other_names() {
        let env = Environment::isolated("/");
        assert!(Factory::<Echo>::default().try_create(&env, "cat", &[]).is_none());
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let mut env = Environment::isolated("/lfs/scripts");
        assert_eq!(run::<Pwd>(&[], &mut env), (0, "/lfs/scripts\n".to_string()));
    }

    #[test]
    fn test_echo_with_and_without_newline() {
        let mut env = Environment::isolated("/");
        assert_eq!(
            run::<Echo>(&["hello", "world"], &mut env),
            (0, "hello world\n".to_string())
        );
        assert_eq!(
            run::<Echo>(&["-n", "foo", "bar"], &mut env),
            (0, "foo bar".to_string())
        );
    }

    #[test]
    fn test_help_is_captured_as_success() {
        let mut env = Environment::isolated("/");
        let (code, out) = run::<Echo>(&["--help"], &mut env);
        assert_eq!(code, 0);
        assert!(out.contains("Usage: echo"));
    }

    #[test]
    fn test_bad_arguments_are_einval() {
        let mut env = Environment::isolated("/");
        let (code, _) = run::<Login>(&[], &mut env);
        assert_eq!(code, -EINVAL);
    }

    #[test]
    fn test_cd_is_shell_local() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let before = std::env::current_dir().unwrap();
        let mut env = Environment::isolated(dir.path());

        assert_eq!(run::<Cd>(&["sub"], &mut env).0, 0);

        assert_eq!(env.current_dir, fs::canonicalize(dir.path().join("sub")).unwrap());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_cd_to_home_when_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = Environment::isolated("/");
        env.set_var("HOME", dir.path().to_string_lossy());

        assert_eq!(run::<Cd>(&[], &mut env).0, 0);
        assert_eq!(env.current_dir, fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = Environment::isolated(dir.path());
        let (code, out) = run::<Cd>(&["missing"], &mut env);
        assert_eq!(code, -ENOENT);
        assert!(out.starts_with("cd: can't canonicalize"));
        assert_eq!(env.current_dir, dir.path());
    }

    #[test]
    fn test_cat_and_wc_read_relative_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("motd"), "hello there\nfriend\n").unwrap();
        let mut env = Environment::isolated(dir.path());

        assert_eq!(
            run::<Cat>(&["motd"], &mut env),
            (0, "hello there\nfriend\n".to_string())
        );
        assert_eq!(run::<Wc>(&["motd"], &mut env), (0, "2 3 19 motd\n".to_string()));
    }

    #[test]
    fn test_cat_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = Environment::isolated(dir.path());
        let (code, out) = run::<Cat>(&["nope"], &mut env);
        assert_eq!(code, -ENOENT);
        assert!(out.starts_with("cat: nope: "));
    }

    #[test]
    fn test_login_and_logout() {
        let mut env = Environment::isolated("/");
        env.set_password("s3cret");

        assert_eq!(
            run::<Login>(&["guess"], &mut env),
            (-EACCES, "login: invalid password\n".to_string())
        );
        assert!(!env.session.authenticated);

        assert_eq!(run::<Login>(&["s3cret"], &mut env).0, 0);
        assert!(env.session.authenticated);

        assert_eq!(run::<Logout>(&[], &mut env), (0, "logged out\n".to_string()));
        assert!(!env.session.authenticated);
    }
}
