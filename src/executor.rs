use crate::session::Session;

/// Status code and captured textual response of one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    /// Negative on failure.
    pub status: i32,
    pub output: String,
}

impl ExecutionResult {
    pub fn new(status: i32, output: impl Into<String>) -> Self {
        Self {
            status,
            output: output.into(),
        }
    }

    pub fn failed(&self) -> bool {
        self.status < 0
    }
}

/// The command dispatch channel a script is run against.
///
/// Implementors own their output capture. [`crate::ScriptRunner`] holds the
/// executor by `&mut` for the whole run, so no other run can interleave
/// commands on the same channel.
pub trait CommandExecutor {
    /// Execute one command line and return what it printed.
    fn execute(&mut self, command: &str) -> ExecutionResult;

    /// Current authentication state of the channel.
    fn session(&self) -> Session;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;

    /// Executor with canned responses that records every call.
    ///
    /// Unknown commands fail with -8. `login <secret>` and `logout` toggle the
    /// session when a secret is set.
    #[derive(Default)]
    pub(crate) struct ScriptedExecutor {
        responses: HashMap<String, ExecutionResult>,
        pub(crate) calls: Vec<String>,
        pub(crate) session: Session,
        secret: Option<String>,
    }

    impl ScriptedExecutor {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn respond(mut self, command: &str, status: i32, output: &str) -> Self {
            self.responses
                .insert(command.to_string(), ExecutionResult::new(status, output));
            self
        }

        pub(crate) fn with_secret(mut self, secret: &str) -> Self {
            self.secret = Some(secret.to_string());
            self
        }
    }

    impl CommandExecutor for ScriptedExecutor {
        fn execute(&mut self, command: &str) -> ExecutionResult {
            self.calls.push(command.to_string());
            if let Some(secret) = &self.secret {
                if let Some(given) = command.strip_prefix("login ") {
                    return if given == secret {
                        self.session.authenticated = true;
                        ExecutionResult::new(0, "logged in\n")
                    } else {
                        ExecutionResult::new(-13, "login: invalid password\n")
                    };
                }
                if command == "logout" {
                    self.session.authenticated = false;
                    return ExecutionResult::new(0, "logged out\n");
                }
            }
            self.responses
                .get(command)
                .cloned()
                .unwrap_or_else(|| ExecutionResult::new(-8, format!("{command}: command not found\n")))
        }

        fn session(&self) -> Session {
            self.session
        }
    }
}
