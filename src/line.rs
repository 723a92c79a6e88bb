//! Line extraction and classification for script files.
//!
//! A script is consumed one byte at a time: every carriage return or line feed
//! ends a line, so `\r\n` produces a line followed by an empty one, which the
//! classifier reports as [`LineKind::Blank`].

use crate::config::OverflowPolicy;
use std::io::{self, Read};
use thiserror::Error;
use tracing::warn;

pub const COMMENT_START: char = '#';

fn is_crlf(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

#[derive(Debug, Error)]
pub enum LineError {
    #[error("read failed: {0}")]
    Read(#[from] io::Error),
    #[error("line exceeds {limit} bytes")]
    TooLong { limit: usize },
}

/// What a line means to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Comment,
    Command(&'a str),
}

/// One line of a script with its terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    text: String,
    truncated: bool,
}

impl Line {
    pub fn command_text(&self) -> &str {
        &self.text
    }

    /// True when bytes past the configured bound were dropped.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn is_comment(&self) -> bool {
        self.text.starts_with(COMMENT_START)
    }

    pub fn classify(&self) -> LineKind<'_> {
        if self.is_blank() {
            LineKind::Blank
        } else if self.is_comment() {
            LineKind::Comment
        } else {
            LineKind::Command(&self.text)
        }
    }
}

/// Lazy, forward-only sequence of lines read from a byte stream.
///
/// The reader is pulled one byte at a time, so callers should hand in a
/// buffered reader. Once end-of-stream or an error is reached the source
/// yields nothing more.
pub struct LineSource<R> {
    reader: R,
    max_len: usize,
    policy: OverflowPolicy,
    line_number: usize,
    finished: bool,
}

impl<R: Read> LineSource<R> {
    pub fn new(reader: R, max_len: usize, policy: OverflowPolicy) -> Self {
        Self {
            reader,
            max_len,
            policy,
            line_number: 0,
            finished: false,
        }
    }

    /// Number of the line most recently started, counting from 1.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn next_line(&mut self) -> Result<Option<Line>, LineError> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = Vec::new();
        let mut truncated = false;
        let mut started = false;
        loop {
            let byte = match self.read_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => {
                    self.finished = true;
                    if !started {
                        return Ok(None);
                    }
                    break;
                }
                Err(err) => {
                    self.finished = true;
                    return Err(err.into());
                }
            };
            if !started {
                started = true;
                self.line_number += 1;
            }
            if is_crlf(byte) {
                break;
            }
            if buf.len() < self.max_len {
                buf.push(byte);
                continue;
            }
            match self.policy {
                OverflowPolicy::Truncate => truncated = true,
                OverflowPolicy::Reject => {
                    self.finished = true;
                    return Err(LineError::TooLong {
                        limit: self.max_len,
                    });
                }
            }
        }

        if truncated {
            warn!(
                line = self.line_number,
                limit = self.max_len,
                "line truncated, remainder discarded"
            );
        }
        Ok(Some(Line {
            text: String::from_utf8_lossy(&buf).into_owned(),
            truncated,
        }))
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl<R: Read> Iterator for LineSource<R> {
    type Item = Result<Line, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lines(input: &str, max_len: usize) -> Vec<Line> {
        LineSource::new(Cursor::new(input.as_bytes().to_vec()), max_len, OverflowPolicy::Truncate)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn texts(input: &str, max_len: usize) -> Vec<String> {
        lines(input, max_len)
            .into_iter()
            .map(|l| l.command_text().to_string())
            .collect()
    }

    struct FailingReader {
        good: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.good.read(buf)? {
                0 => Err(io::Error::other("flash gone")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_splits_on_lf_and_cr() {
        assert_eq!(texts("a\nb\rc", 16), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_crlf_yields_blank_line() {
        let got = lines("echo hi\r\nnext\r\n", 16);
        let kinds: Vec<_> = got.iter().map(|l| l.classify()).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Command("echo hi"),
                LineKind::Blank,
                LineKind::Command("next"),
                LineKind::Blank,
            ]
        );
    }

    #[test]
    fn test_empty_input_has_no_lines() {
        assert!(lines("", 16).is_empty());
    }

    #[test]
    fn test_classify() {
        let got = lines("# note\n   \n\t\nls -l\n #indented\n", 32);
        assert_eq!(got[0].classify(), LineKind::Comment);
        assert_eq!(got[1].classify(), LineKind::Blank);
        assert_eq!(got[2].classify(), LineKind::Blank);
        assert_eq!(got[3].classify(), LineKind::Command("ls -l"));
        // Only a marker in the first column makes a comment.
        assert_eq!(got[4].classify(), LineKind::Command(" #indented"));
    }

    #[test]
    fn test_line_of_exactly_max_len_is_kept_whole() {
        let got = lines("abcd\nef", 4);
        assert_eq!(got[0].command_text(), "abcd");
        assert!(!got[0].truncated());
        assert_eq!(got[1].command_text(), "ef");

        let got = lines("abcd", 4);
        assert_eq!(got.len(), 1);
        assert!(!got[0].truncated());
    }

    #[test]
    fn test_over_long_line_is_truncated_and_remainder_discarded() {
        let got = lines("abcdefgh\nnext\n", 4);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].command_text(), "abcd");
        assert!(got[0].truncated());
        assert_eq!(got[1].command_text(), "next");
        assert!(!got[1].truncated());
    }

    #[test]
    fn test_reject_policy_fails_on_over_long_line() {
        let mut source = LineSource::new(
            Cursor::new(b"ok\ntoolong\nafter\n".to_vec()),
            4,
            OverflowPolicy::Reject,
        );
        assert_eq!(source.next_line().unwrap().unwrap().command_text(), "ok");
        match source.next_line() {
            Err(LineError::TooLong { limit }) => assert_eq!(limit, 4),
            other => panic!("expected TooLong, got {other:?}"),
        }
        assert_eq!(source.line_number(), 2);
        assert!(source.next_line().unwrap().is_none());
    }

    #[test]
    fn test_reject_policy_accepts_exact_fit() {
        let mut source =
            LineSource::new(Cursor::new(b"abcd\n".to_vec()), 4, OverflowPolicy::Reject);
        assert_eq!(source.next_line().unwrap().unwrap().command_text(), "abcd");
        assert!(source.next_line().unwrap().is_none());
    }

    #[test]
    fn test_read_error_propagates_and_fuses() {
        let reader = FailingReader {
            good: Cursor::new(b"first\nsec".to_vec()),
        };
        let mut source = LineSource::new(reader, 16, OverflowPolicy::Truncate);
        assert_eq!(source.next().unwrap().unwrap().command_text(), "first");
        assert!(matches!(source.next(), Some(Err(LineError::Read(_)))));
        assert!(source.next().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let mut source = LineSource::new(
            Cursor::new(vec![b'e', 0xff, b'o', b'\n']),
            16,
            OverflowPolicy::Truncate,
        );
        let line = source.next_line().unwrap().unwrap();
        assert_eq!(line.command_text(), "e\u{fffd}o");
    }
}
