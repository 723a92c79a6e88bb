use crate::executor::ExecutionResult;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Appends command responses to a script's result file.
///
/// Successful commands contribute their output verbatim. A failed command is
/// preceded by an `Err: <status>` line. Every entry is flushed as it is
/// recorded, so a full or broken result file fails the command that hit it.
pub struct TranscriptWriter<W: Write> {
    inner: W,
}

impl TranscriptWriter<BufWriter<File>> {
    /// Create `path`, truncating any transcript left by an earlier run.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> TranscriptWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn record(&mut self, result: &ExecutionResult) -> io::Result<()> {
        if result.failed() {
            writeln!(self.inner, "Err: {}", result.status)?;
        }
        self.inner.write_all(result.output.as_bytes())?;
        self.inner.flush()
    }

    /// Flush everything recorded so far and release the writer.
    pub fn close(mut self) -> io::Result<()> {
        self.inner.flush()
    }

    #[cfg(test)]
    pub(crate) fn get_ref(&self) -> &W {
        &self.inner
    }
}
