use std::io::{Result as IoResult, Write};

/// Memory-backed output channel the shell dispatches commands into.
///
/// Cleared before every command and drained right after, so each response
/// holds exactly what one command printed.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    buf: Vec<u8>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn push_str(&mut self, text: &str) {
        self.buf.extend_from_slice(text.as_bytes());
    }

    /// Take the captured bytes as text, leaving the buffer empty.
    pub fn take_text(&mut self) -> String {
        let bytes = std::mem::take(&mut self.buf);
        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_text_drains() {
        let mut capture = CaptureBuffer::new();
        write!(capture, "uptime {}", 42).unwrap();
        assert_eq!(capture.take_text(), "uptime 42");
        assert_eq!(capture.take_text(), "");
    }

    #[test]
    fn test_take_text_is_lossy() {
        let mut capture = CaptureBuffer::new();
        capture.write_all(&[b'o', 0xfe, b'k']).unwrap();
        assert_eq!(capture.take_text(), "o\u{fffd}k");
    }
}
