//! Chunk download tasks.

use std::fmt;

use crate::http::{ByteRange, RemoteUrl};
use crate::output::OutputFile;

/// Identifies a task as `<url index>-<chunk index>` in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    pub url_index: usize,
    pub chunk_index: u64,
}

impl TaskId {
    pub fn new(url_index: usize, chunk_index: u64) -> Self {
        Self {
            url_index,
            chunk_index,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}-{:03}", self.url_index, self.chunk_index)
    }
}

/// One chunk of one download.
///
/// A task exclusively owns its duplicate of the output file handle; dropping
/// the task closes that handle without affecting sibling tasks.
#[derive(Debug)]
pub struct Task {
    pub id: TaskId,
    /// The URL as given by the caller.
    pub url: String,
    pub remote: RemoteUrl,
    /// Bytes of the resource this task covers.
    pub range: ByteRange,
    /// Whether the request must carry a `Range` header.
    pub ranged: bool,
    pub output: OutputFile,
}

impl Task {
    pub fn new(
        id: TaskId,
        url: impl Into<String>,
        remote: RemoteUrl,
        range: ByteRange,
        ranged: bool,
        output: OutputFile,
    ) -> Self {
        Self {
            id,
            url: url.into(),
            remote,
            range,
            ranged,
            output,
        }
    }

    /// The range to send in the request, if any.
    pub fn request_range(&self) -> Option<ByteRange> {
        self.ranged.then_some(self.range)
    }
}
