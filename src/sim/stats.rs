use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::frontend::error::FrontendError;

/// Destination of the shutdown report: a buffered file, or an in-memory buffer when no path is
/// configured.
pub enum StatsSink {
    File {
        path: PathBuf,
        writer: BufWriter<File>,
    },
    Memory(Vec<u8>),
}

impl StatsSink {
    pub fn open(path: Option<&Path>) -> Result<Self, FrontendError> {
        let Some(path) = path else {
            return Ok(Self::Memory(Vec::new()));
        };
        let stats_err = |source: io::Error| FrontendError::StatsSink {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(stats_err)?;
        }
        let file = File::create(path).map_err(stats_err)?;
        Ok(Self::File {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Memory(_) => None,
        }
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self {
            Self::File { writer, .. } => writeln!(writer, "{line}"),
            Self::Memory(buf) => writeln!(buf, "{line}"),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::File { writer, .. } => writer.flush(),
            Self::Memory(_) => Ok(()),
        }
    }
}

pub fn write_json<T: Serialize>(path: &Path, record: &T) -> Result<(), FrontendError> {
    let stats_err = |source: io::Error| FrontendError::StatsSink {
        path: path.to_path_buf(),
        source,
    };
    let payload = serde_json::to_string_pretty(record).map_err(|e| stats_err(e.into()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(stats_err)?;
    }
    fs::write(path, payload).map_err(stats_err)
}
