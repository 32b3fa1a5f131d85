use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Error;

/// Environment variable overriding the location of the figure sequence file.
pub const SEQUENCE_FILE_ENV: &str = "DOCX_SEQ_FILE";

/// Source of figure numbers for auto-numbered captions.
pub trait SequenceCounter {
    /// Return the current number and advance the counter.
    fn next(&mut self) -> Result<u32, Error>;
}

/// Counter persisted as a decimal number in a scratch file.
///
/// A missing or unreadable file starts the sequence at 1. The file is not
/// locked, so concurrent runs sharing one path race on it.
#[derive(Clone, Debug)]
pub struct FileCounter {
    path: PathBuf,
}

impl FileCounter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCounter { path: path.into() }
    }

    pub fn from_env() -> Self {
        match std::env::var_os(SEQUENCE_FILE_ENV) {
            Some(path) => FileCounter::new(path),
            None => FileCounter::new(std::env::temp_dir().join("docx_seq")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn current(&self) -> u32 {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.lines().next().and_then(|l| l.trim().parse().ok()))
            .unwrap_or(1)
    }
}

impl SequenceCounter for FileCounter {
    fn next(&mut self) -> Result<u32, Error> {
        let value = self.current();
        let next = value.checked_add(1).ok_or(Error::SequenceOverflow)?;
        std::fs::write(&self.path, next.to_string())?;
        debug!("figure sequence {} -> {}", value, next);
        Ok(value)
    }
}

/// In-process counter, used where no state should reach the filesystem.
#[derive(Clone, Debug)]
pub struct MemoryCounter {
    next: u32,
}

impl MemoryCounter {
    pub fn starting_at(next: u32) -> Self {
        MemoryCounter { next }
    }
}

impl Default for MemoryCounter {
    fn default() -> Self {
        MemoryCounter::starting_at(1)
    }
}

impl SequenceCounter for MemoryCounter {
    fn next(&mut self) -> Result<u32, Error> {
        let value = self.next;
        self.next = value.checked_add(1).ok_or(Error::SequenceOverflow)?;
        Ok(value)
    }
}
