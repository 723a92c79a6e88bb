use crate::config::{DEFAULT_MAX_LINE_LEN, OverflowPolicy};
use crate::line::LineSource;
use regex::Regex;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Header recognized by default: an interpreter line naming `zsh`, e.g.
/// `#!zsh` or `#! /bin/zsh`.
pub const DEFAULT_HEADER_PATTERN: &str = r"^#!\s*(?:\S*/)?zsh\b";

static DEFAULT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_HEADER_PATTERN).expect("Invalid default header regex"));

/// Tells scripts apart from other files by their first line alone.
///
/// The header line starts with the comment marker, so a script run skips it.
#[derive(Debug, Clone)]
pub struct ScriptSniffer {
    header: Regex,
    max_header_len: usize,
}

impl Default for ScriptSniffer {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.clone(),
            max_header_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl ScriptSniffer {
    /// Sniffer recognizing first lines that match `pattern`.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            header: Regex::new(pattern)?,
            ..Self::default()
        })
    }

    pub fn with_max_header_len(mut self, max_header_len: usize) -> Self {
        self.max_header_len = max_header_len;
        self
    }

    /// Whether `path` starts with a recognized header. Unreadable files are not scripts.
    pub fn is_script(&self, path: &Path) -> bool {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                debug!(path = %path.display(), "not a script: {err}");
                return false;
            }
        };
        let mut lines = LineSource::new(
            BufReader::new(file),
            self.max_header_len,
            OverflowPolicy::Truncate,
        );
        match lines.next_line() {
            Ok(Some(line)) => self.header.is_match(line.command_text()),
            Ok(None) => false,
            Err(err) => {
                debug!(path = %path.display(), "not a script: {err}");
                false
            }
        }
    }
}
