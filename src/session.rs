use crate::config::AuthConfig;
use crate::executor::CommandExecutor;
use tracing::{debug, warn};

/// Authentication state of a command dispatch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Session {
    pub authenticated: bool,
}

/// Brackets a run with a login, undoing it afterwards only if it was ours.
///
/// A failed login is not an error: the run goes ahead and any command that
/// needed the privilege fails on its own.
#[derive(Debug)]
#[must_use = "a guard that logged in must be released"]
pub struct SessionGuard {
    logout_command: String,
    self_authenticated: bool,
}

impl SessionGuard {
    pub fn engage<E: CommandExecutor + ?Sized>(config: &AuthConfig, executor: &mut E) -> Self {
        let mut guard = SessionGuard {
            logout_command: config.logout_command.clone(),
            self_authenticated: false,
        };
        if executor.session().authenticated {
            debug!("session already authenticated");
            return guard;
        }

        let Some(secret) = config.credential.resolve() else {
            warn!(credential = ?config.credential, "credential unavailable, running unauthenticated");
            return guard;
        };
        let command = shell_words::join([config.login_command.as_str(), secret.as_str()]);
        let result = executor.execute(&command);
        if result.failed() {
            warn!(
                command = %config.login_command,
                status = result.status,
                "login failed, running unauthenticated"
            );
        } else {
            debug!(command = %config.login_command, "logged in for script run");
            guard.self_authenticated = true;
        }
        guard
    }

    pub fn self_authenticated(&self) -> bool {
        self.self_authenticated
    }

    /// Logs out if [`SessionGuard::engage`] logged in. Failures are only logged.
    pub fn release<E: CommandExecutor + ?Sized>(self, executor: &mut E) {
        if !self.self_authenticated {
            return;
        }
        let result = executor.execute(&self.logout_command);
        if result.failed() {
            warn!(status = result.status, "logout after script run failed");
        } else {
            debug!("logged out after script run");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialSource;
    use crate::executor::testing::ScriptedExecutor;

    fn auth(secret: &str) -> AuthConfig {
        AuthConfig::new(CredentialSource::Literal(secret.to_string()))
    }

    #[test]
    fn test_logs_in_and_out_when_unauthenticated() {
        let mut exec = ScriptedExecutor::new().with_secret("s3cret");
        let guard = SessionGuard::engage(&auth("s3cret"), &mut exec);
        assert!(guard.self_authenticated());
        assert!(exec.session.authenticated);

        guard.release(&mut exec);
        assert!(!exec.session.authenticated);
        assert_eq!(exec.calls, vec!["login s3cret", "logout"]);
    }

    #[test]
    fn test_leaves_existing_session_alone() {
        let mut exec = ScriptedExecutor::new().with_secret("s3cret");
        exec.session.authenticated = true;

        let guard = SessionGuard::engage(&auth("s3cret"), &mut exec);
        assert!(!guard.self_authenticated());
        guard.release(&mut exec);

        assert!(exec.calls.is_empty());
        assert!(exec.session.authenticated);
    }

    #[test]
    fn test_failed_login_is_not_an_error() {
        let mut exec = ScriptedExecutor::new().with_secret("s3cret");
        let guard = SessionGuard::engage(&auth("wrong"), &mut exec);
        assert!(!guard.self_authenticated());
        guard.release(&mut exec);
        assert_eq!(exec.calls, vec!["login wrong"]);
    }

    #[test]
    fn test_credential_is_shell_quoted() {
        let mut exec = ScriptedExecutor::new();
        let guard = SessionGuard::engage(&auth("two words"), &mut exec);
        assert!(!guard.self_authenticated());
        assert_eq!(exec.calls, vec!["login 'two words'"]);
    }

    #[test]
    fn test_missing_env_credential_skips_login() {
        let mut exec = ScriptedExecutor::new().with_secret("s3cret");
        let config = AuthConfig::new(CredentialSource::Env(
            "SHELL_SCRIPT_RUNNER_NO_SUCH_SECRET".to_string(),
        ));
        let guard = SessionGuard::engage(&config, &mut exec);
        assert!(!guard.self_authenticated());
        assert!(exec.calls.is_empty());
    }
}
