//! Output files and where they live on disk.
//!
//! Each URL is stored under the download directory at a path mirroring the
//! URL itself (`host/dir/file`). Chunks of the same URL are written through
//! independent duplicates of one file handle, each using positional writes,
//! so no shared file cursor is involved.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// File name used for URLs whose path ends in `/`.
pub const INDEX_FILE_NAME: &str = "index.html";

/// Map a URL onto a path below `output_dir`.
///
/// The scheme is dropped, and empty, `.` and `..` components are ignored so
/// the result cannot escape `output_dir`.
pub fn output_path(output_dir: &Path, url: &str) -> PathBuf {
    let trimmed = url.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);

    let mut path = output_dir.to_path_buf();
    let mut components = 0;
    for component in without_scheme.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            continue;
        }
        path.push(component);
        components += 1;
    }

    if components <= 1 || without_scheme.ends_with('/') {
        path.push(INDEX_FILE_NAME);
    }
    path
}

/// A writable output file supporting positional writes.
#[derive(Debug)]
pub struct OutputFile {
    file: File,
    path: PathBuf,
}

impl OutputFile {
    /// Create (or truncate) the file at `path`, creating parent directories.
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Duplicate the underlying OS handle.
    ///
    /// The duplicate can be closed independently of the original.
    pub fn try_clone(&self) -> io::Result<Self> {
        Ok(Self {
            file: self.file.try_clone()?,
            path: self.path.clone(),
        })
    }

    /// Set the file length, zero-filling any extension.
    pub fn set_len(&self, len: u64) -> io::Result<()> {
        self.file.set_len(len)
    }

    /// Write `buf` at `offset` with a single positional write.
    ///
    /// Returns the number of bytes written, which may be less than
    /// `buf.len()`.
    #[cfg(unix)]
    pub fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.write_at(buf, offset)
    }

    /// Write `buf` at `offset` with a single positional write.
    ///
    /// Returns the number of bytes written, which may be less than
    /// `buf.len()`.
    #[cfg(windows)]
    pub fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_write(buf, offset)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
