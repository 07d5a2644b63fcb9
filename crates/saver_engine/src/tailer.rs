//! Incremental reader over a capture process's combined output buffer.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};

use tempfile::NamedTempFile;

/// Temp-file buffer plus a read cursor that only ever moves forward.
///
/// The child writes through a separate append-mode handle, so seeking the
/// reader never moves the writer's position.
#[derive(Debug)]
pub struct LogTailer {
    buffer: NamedTempFile,
    cursor: u64,
}

impl LogTailer {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            buffer: NamedTempFile::new()?,
            cursor: 0,
        })
    }

    /// A fresh append-mode handle for the child's stdout and stderr.
    pub fn writer(&self) -> io::Result<File> {
        OpenOptions::new().append(true).open(self.buffer.path())
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Next complete line past the cursor; a partial trailing line is left
    /// for a later call.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        self.read_line(false)
    }

    /// Every remaining line, including an unterminated tail.
    pub fn drain_remaining(&mut self) -> io::Result<Vec<String>> {
        let mut lines = Vec::new();
        while let Some(line) = self.read_line(true)? {
            lines.push(line);
        }
        Ok(lines)
    }

    fn read_line(&mut self, accept_partial: bool) -> io::Result<Option<String>> {
        let mut file = self.buffer.as_file();
        file.seek(SeekFrom::Start(self.cursor))?;
        let mut raw = Vec::new();
        let read = BufReader::new(file).read_until(b'\n', &mut raw)?;
        if read == 0 {
            return Ok(None);
        }
        if !raw.ends_with(b"\n") && !accept_partial {
            return Ok(None);
        }
        self.cursor += read as u64;
        let text = String::from_utf8_lossy(&raw);
        Ok(Some(text.trim_end_matches(['\r', '\n']).to_string()))
    }
}
