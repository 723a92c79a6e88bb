use crate::session::Session;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Mutable state a [`crate::Shell`] keeps between commands.
///
/// The environment contains:
/// - `vars`: variables visible to commands.
/// - `current_dir`: the directory relative paths are resolved against. It is
///   private to the shell; the process working directory is never changed.
/// - `session`: whether a `login` has succeeded.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub session: Session,
    password: Option<String>,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// No password is set, so every command is allowed.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars: stdenv::vars().collect(),
            current_dir,
            session: Session::default(),
            password: None,
        }
    }

    /// An empty environment rooted at `dir`.
    pub fn isolated(dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: dir.into(),
            session: Session::default(),
            password: None,
        }
    }

    /// Get the value of a variable.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override a variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Require `password` to be given to `login` before other commands run.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Some(password.into());
        self.session.authenticated = false;
    }

    pub fn login_required(&self) -> bool {
        self.password.is_some() && !self.session.authenticated
    }

    /// Compare `given` with the configured password. Any password is accepted
    /// when none is configured.
    pub fn check_password(&self, given: &str) -> bool {
        self.password.as_deref().is_none_or(|expected| expected == given)
    }

    /// `path` as seen from the shell's current directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.current_dir.join(path)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
