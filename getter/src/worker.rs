//! Executing a single chunk task.
//!
//! A chunk is fetched with one GET, its body is located inside the raw
//! response and written at the chunk's offset in the output file with a
//! single positional write. Failures are reported and the chunk is dropped;
//! there is no retry, so a failed chunk leaves a hole in the output file.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::http::{status_code, ByteRange, HttpClient, HttpError};
use crate::pool::TaskHandler;
use crate::task::{Task, TaskId};

/// Errors that abort a single chunk.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The GET request failed or was refused.
    #[error("[{task}] downloading {range} of {url} failed: {source}")]
    Http {
        task: TaskId,
        url: String,
        range: ByteRange,
        #[source]
        source: HttpError,
    },

    /// The positional write itself failed.
    #[error("[{task}] could not write {range} of {url} to {}: {source}", .path.display())]
    Write {
        task: TaskId,
        url: String,
        range: ByteRange,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A ranged request was answered with `200` and a body too short to
    /// contain the requested range.
    #[error("[{task}] server ignored range {range} of {url} and sent only {received} bytes")]
    RangeIgnored {
        task: TaskId,
        url: String,
        range: ByteRange,
        received: usize,
    },

    /// The file accepted fewer bytes than were downloaded.
    #[error("[{task}] CORRUPTION: only {written} of {expected} bytes written at offset {offset} for {url}")]
    Corruption {
        task: TaskId,
        url: String,
        offset: u64,
        written: usize,
        expected: usize,
    },
}

/// Result type for chunk execution.
pub type ChunkResult<T> = Result<T, ChunkError>;

/// Downloads chunk tasks and writes them into their output files.
#[derive(Debug, Clone, Default)]
pub struct ChunkDownloader {
    client: HttpClient,
}

impl ChunkDownloader {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Fetch one chunk and write it at its offset. Returns bytes written.
    pub fn execute(&self, task: &Task) -> ChunkResult<u64> {
        let http_error = |source| ChunkError::Http {
            task: task.id,
            url: task.url.clone(),
            range: task.range,
            source,
        };

        let response = self
            .client
            .get(&task.remote, task.request_range())
            .map_err(http_error)?;

        let headers = response.header_text();
        let status = status_code(&headers);
        if let Some(status) = status {
            if !(200..300).contains(&status) {
                return Err(http_error(HttpError::Status { status }));
            }
        }

        let mut body = response.body();
        let expected = task.range.len();
        if task.ranged && status == Some(200) {
            // A full response to a ranged request: the chunk sits at its
            // own offset inside the body.
            let (start, end) = (task.range.start as usize, task.range.end as usize);
            if body.len() < end {
                return Err(ChunkError::RangeIgnored {
                    task: task.id,
                    url: task.url.clone(),
                    range: task.range,
                    received: body.len(),
                });
            }
            warn!(
                task = %task.id,
                url = %task.url,
                received = body.len(),
                expected,
                "Server ignored range, extracting chunk from full response"
            );
            body = &body[start..end];
        } else if task.ranged && body.len() as u64 > expected {
            warn!(
                task = %task.id,
                url = %task.url,
                received = body.len(),
                expected,
                "Body longer than requested range, truncating"
            );
            body = &body[..expected as usize];
        } else if (body.len() as u64) < expected {
            warn!(
                task = %task.id,
                url = %task.url,
                received = body.len(),
                expected,
                "Body shorter than requested range"
            );
        }

        write_chunk(task, body, |buf, offset| task.output.write_at(buf, offset))?;
        Ok(body.len() as u64)
    }
}

/// Write `body` at the task's offset with one positional write.
///
/// A short write is reported as corruption and not retried.
fn write_chunk<W>(task: &Task, body: &[u8], write_at: W) -> ChunkResult<()>
where
    W: FnOnce(&[u8], u64) -> io::Result<usize>,
{
    match write_at(body, task.range.start) {
        Ok(written) if written == body.len() => Ok(()),
        Ok(written) => Err(ChunkError::Corruption {
            task: task.id,
            url: task.url.clone(),
            offset: task.range.start,
            written,
            expected: body.len(),
        }),
        Err(source) => Err(ChunkError::Write {
            task: task.id,
            url: task.url.clone(),
            range: task.range,
            path: task.output.path().to_path_buf(),
            source,
        }),
    }
}

impl TaskHandler<Task> for ChunkDownloader {
    type Error = ChunkError;

    fn handle(&self, task: Task) -> ChunkResult<u64> {
        // `task` is dropped at the end of this call, closing its file handle.
        match self.execute(&task) {
            Ok(bytes) => {
                info!(task = %task.id, bytes, url = %task.url, "Downloaded chunk");
                Ok(bytes)
            }
            Err(e @ ChunkError::Corruption { .. }) => {
                error!(task = %task.id, range = %task.range, corruption = true, "{}", e);
                Err(e)
            }
            Err(e) => {
                error!(task = %task.id, range = %task.range, "{}", e);
                Err(e)
            }
        }
    }
}
