use std::env;

/// Default bound on the command text of a single script line, in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 256;

/// Default bound on the script path, in bytes. The result path may exceed it by
/// the length of the `.out` suffix.
pub const DEFAULT_MAX_PATH_LEN: usize = 255;

pub const DEFAULT_LOGIN_COMMAND: &str = "login";
pub const DEFAULT_LOGOUT_COMMAND: &str = "logout";

/// What happens to a physical line longer than the configured bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Keep the first `max_line_len` bytes and drop the rest of the physical line.
    #[default]
    Truncate,
    /// Halt the run with [`crate::ScriptError::LineTooLong`].
    Reject,
}

/// Where the session guard takes its credential from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Literal(String),
    /// Name of an environment variable read at the start of every run.
    Env(String),
}

impl CredentialSource {
    /// Returns `None` when the credential is unavailable.
    pub fn resolve(&self) -> Option<String> {
        match self {
            CredentialSource::Literal(secret) => Some(secret.clone()),
            CredentialSource::Env(var) => env::var(var).ok(),
        }
    }
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Literal(_) => f.write_str("Literal(<redacted>)"),
            CredentialSource::Env(var) => f.debug_tuple("Env").field(var).finish(),
        }
    }
}

/// Settings for bracketing a run with an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub credential: CredentialSource,
    pub login_command: String,
    pub logout_command: String,
}

impl AuthConfig {
    pub fn new(credential: CredentialSource) -> Self {
        Self {
            credential,
            login_command: DEFAULT_LOGIN_COMMAND.to_string(),
            logout_command: DEFAULT_LOGOUT_COMMAND.to_string(),
        }
    }
}

/// Configuration of a [`crate::ScriptRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub max_line_len: usize,
    pub max_path_len: usize,
    pub overflow: OverflowPolicy,
    /// `None` disables the session guard.
    pub auth: Option<AuthConfig>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
            max_path_len: DEFAULT_MAX_PATH_LEN,
            overflow: OverflowPolicy::default(),
            auth: None,
        }
    }
}
