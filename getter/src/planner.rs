//! Chunk planning.
//!
//! A HEAD request tells us how large a resource is and whether the server
//! honours byte ranges. From that the planner decides how many chunks to
//! request and how large each one is:
//!
//! - no range support, or a single worker: one chunk covering everything
//! - otherwise: the smallest chunk count `>= workers` whose chunk size fits
//!   under the chunk cap
//!
//! Small files therefore use about one request per worker, while huge files
//! fan out further so no single request exceeds the cap.

use thiserror::Error;
use tracing::{debug, warn};

use crate::http::{
    accepts_ranges, content_length, status_code, ByteRange, HttpClient, HttpError, RemoteUrl,
};

/// Default chunk cap: 40 MiB.
pub const MAX_CHUNK_BYTES: u64 = 41_943_040;

/// Errors that prevent a resource from being planned.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The HEAD request could not be made.
    #[error("HEAD request failed: {0}")]
    Head(#[from] HttpError),

    /// The HEAD request was answered with a non-success status.
    #[error("HEAD request answered with status {0}")]
    Status(u16),

    /// The server did not report a usable `Content-Length`.
    #[error("content length unknown")]
    UnknownSize,
}

/// Result type for planning.
pub type PlanResult<T> = Result<T, PlanError>;

// =============================================================================
// Chunk Plan
// =============================================================================

/// How one resource is split into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Total size of the resource in bytes.
    pub content_length: u64,
    /// Size of every chunk except possibly the last.
    pub chunk_size: u64,
    /// Number of non-empty chunks.
    pub chunk_count: u64,
}

impl ChunkPlan {
    /// A plan downloading everything in one request.
    pub fn single(content_length: u64) -> Self {
        Self {
            content_length,
            chunk_size: content_length,
            chunk_count: 1,
        }
    }

    /// Whether chunks must be requested with a `Range` header.
    pub fn is_ranged(&self) -> bool {
        self.chunk_count > 1
    }

    /// The chunk ranges, in order, tiling `[0, content_length)`.
    pub fn ranges(&self) -> impl Iterator<Item = ByteRange> + '_ {
        (0..self.chunk_count).map(move |i| {
            let start = i * self.chunk_size;
            let end = (start + self.chunk_size).min(self.content_length);
            ByteRange::new(start, end)
        })
    }
}

fn div_ceil(dividend: u64, divisor: u64) -> u64 {
    dividend / divisor + u64::from(dividend % divisor != 0)
}

/// Compute a plan from discovered resource properties.
///
/// The divisor is the smallest value `>= workers` with
/// `ceil(content_length / divisor) <= max_chunk_bytes`, which is
/// `max(workers, ceil(content_length / max_chunk_bytes))`.
pub fn compute_plan(
    content_length: u64,
    ranges_supported: bool,
    workers: usize,
    max_chunk_bytes: u64,
) -> PlanResult<ChunkPlan> {
    if content_length == 0 {
        return Err(PlanError::UnknownSize);
    }

    if !ranges_supported || workers <= 1 {
        return Ok(ChunkPlan::single(content_length));
    }

    let cap = max_chunk_bytes.max(1);
    let divisor = (workers as u64).max(div_ceil(content_length, cap));
    let chunk_size = div_ceil(content_length, divisor);

    Ok(ChunkPlan {
        content_length,
        chunk_size,
        // Fewer than `divisor` when trailing chunks would be empty.
        chunk_count: div_ceil(content_length, chunk_size),
    })
}

// =============================================================================
// Planner
// =============================================================================

/// Plans downloads by querying the server with HEAD requests.
#[derive(Debug, Clone)]
pub struct Planner {
    client: HttpClient,
    max_chunk_bytes: u64,
}

impl Planner {
    pub fn new(client: HttpClient, max_chunk_bytes: u64) -> Self {
        Self {
            client,
            max_chunk_bytes,
        }
    }

    /// The chunk cap this planner enforces.
    pub fn max_chunk_bytes(&self) -> u64 {
        self.max_chunk_bytes
    }

    /// Send a HEAD request to `url` and decide how to split it across `workers`.
    pub fn plan(&self, url: &RemoteUrl, workers: usize) -> PlanResult<ChunkPlan> {
        let response = self.client.head(url)?;
        let headers = response.header_text();

        match status_code(&headers) {
            Some(status) if !(200..300).contains(&status) => {
                return Err(PlanError::Status(status));
            }
            Some(_) => {}
            None => warn!(url = %url, "HEAD response has no status line, inspecting anyway"),
        }

        let length = content_length(&headers);
        let ranges = accepts_ranges(&headers);
        let plan = compute_plan(length, ranges, workers, self.max_chunk_bytes)?;

        debug!(
            url = %url,
            content_length = length,
            accepts_ranges = ranges,
            chunks = plan.chunk_count,
            chunk_size = plan.chunk_size,
            "Planned download"
        );
        Ok(plan)
    }
}
