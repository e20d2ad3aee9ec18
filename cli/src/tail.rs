//! Follows a file as another process appends lines to it.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TailError {
    #[error("data file {} does not exist", .0.display())]
    Missing(PathBuf),
    #[error("io error reading {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type TailResult<T> = Result<T, TailError>;

/// A read cursor over an append-only file.
///
/// Opening positions the cursor at the current end of the file: whatever was
/// written before is never seen. Only newline-terminated lines are handed out;
/// a trailing fragment is held back until the writer completes it.
pub struct Tail {
    path: PathBuf,
    reader: BufReader<File>,
    offset: u64,
    pending: Vec<u8>,
}

impl Tail {
    pub fn open<P: AsRef<Path>>(path: P) -> TailResult<Tail> {
        let path = path.as_ref().to_path_buf();
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(TailError::Missing(path)),
            Err(source) => return Err(TailError::Io { path, source }),
        };
        let mut reader = BufReader::new(file);
        let offset = match reader.seek(SeekFrom::End(0)) {
            Ok(o) => o,
            Err(source) => return Err(TailError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), offset, "tail positioned at end of file");
        Ok(Tail {
            path,
            reader,
            offset,
            pending: vec![],
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next unread byte, including any buffered fragment.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The next complete line, without its line terminator, or `None` if no
    /// complete line is available yet.
    pub fn next_line(&mut self) -> TailResult<Option<String>> {
        let read = self
            .reader
            .read_until(b'\n', &mut self.pending)
            .map_err(|source| TailError::Io {
                path: self.path.clone(),
                source,
            })?;
        self.offset += read as u64;
        if self.pending.last() != Some(&b'\n') {
            if !self.pending.is_empty() {
                tracing::trace!(bytes = self.pending.len(), "partial line held back");
            }
            return Ok(None);
        }
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        let line = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(Some(line))
    }
}
