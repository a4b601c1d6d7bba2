//! Turning a list of URLs into chunk tasks.
//!
//! The dispatcher runs on the caller's thread. For each URL it plans the
//! download, creates and pre-sizes the output file, and submits one task per
//! chunk to the worker pool, blocking whenever the queue is full. A URL that
//! cannot be planned or opened is reported and skipped; the remaining URLs
//! are still processed.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::DownloaderConfig;
use crate::http::{split_url, HttpClient};
use crate::output::{output_path, OutputFile};
use crate::planner::{ChunkPlan, PlanError, Planner};
use crate::pool::{PoolResult, PoolSummary, WorkerPool};
use crate::task::{Task, TaskId};
use crate::worker::ChunkDownloader;

/// Errors that stop a single URL from being fully queued.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The resource could not be planned.
    #[error("planning failed: {0}")]
    Plan(#[from] PlanError),

    /// The output file could not be created or sized.
    #[error("cannot open output file {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file handle for a chunk could not be duplicated.
    ///
    /// Chunks queued before the failure still run.
    #[error("cannot duplicate handle for chunk {queued} of {}: {source}", .path.display())]
    Duplicate {
        path: PathBuf,
        /// Chunks queued before the failure; also the failed chunk's index.
        queued: u64,
        #[source]
        source: io::Error,
    },
}

/// Outcome of dispatching one URL.
#[derive(Debug)]
pub struct UrlReport {
    pub url: String,
    /// The plan whose chunks were all queued, or why that did not happen.
    pub outcome: Result<ChunkPlan, DispatchError>,
}

impl UrlReport {
    /// Number of chunk tasks queued for this URL.
    pub fn queued(&self) -> u64 {
        match &self.outcome {
            Ok(plan) => plan.chunk_count,
            Err(DispatchError::Duplicate { queued, .. }) => *queued,
            Err(_) => 0,
        }
    }
}

/// Result of a complete run.
#[derive(Debug)]
pub struct DispatchReport {
    pub urls: Vec<UrlReport>,
    pub pool: PoolSummary,
}

impl DispatchReport {
    /// URLs that were not fully queued.
    pub fn failed_urls(&self) -> impl Iterator<Item = &UrlReport> {
        self.urls.iter().filter(|report| report.outcome.is_err())
    }

    /// Whether every URL was queued and every chunk succeeded.
    pub fn is_success(&self) -> bool {
        self.failed_urls().next().is_none() && self.pool.failed == 0
    }
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failed_urls().count();
        write!(
            f,
            "{} URLs ({} skipped), {}",
            self.urls.len(),
            failed,
            self.pool
        )
    }
}

/// Plans URLs and feeds their chunks to a worker pool.
pub struct Dispatcher {
    planner: Planner,
    pool: WorkerPool<Task>,
    output_dir: PathBuf,
    workers: usize,
}

impl Dispatcher {
    /// Build the HTTP client, planner and worker pool described by `config`.
    pub fn new(config: &DownloaderConfig) -> PoolResult<Self> {
        let client = HttpClient::new()
            .with_timeout(config.timeout)
            .with_user_agent(config.user_agent.as_str());

        let pool = WorkerPool::spawn(
            config.workers,
            config.effective_queue_capacity(),
            ChunkDownloader::new(client.clone()),
        )?;

        Ok(Self {
            planner: Planner::new(client, config.max_chunk_bytes),
            pool,
            output_dir: config.output_dir.clone(),
            workers: config.workers,
        })
    }

    /// Plan `url` and queue its chunks. Blocks while the queue is full.
    pub fn dispatch(&self, url_index: usize, url: &str) -> Result<ChunkPlan, DispatchError> {
        let remote = split_url(url).map_err(PlanError::from)?;
        let plan = self.planner.plan(&remote, self.workers)?;

        let path = output_path(&self.output_dir, url);
        let output = OutputFile::create(&path)
            .and_then(|file| file.set_len(plan.content_length).map(|()| file))
            .map_err(|source| DispatchError::Output {
                path: path.clone(),
                source,
            })?;

        let ranged = plan.is_ranged();
        for (chunk, range) in (0u64..).zip(plan.ranges()) {
            let handle = output
                .try_clone()
                .map_err(|source| DispatchError::Duplicate {
                    path: path.clone(),
                    queued: chunk,
                    source,
                })?;

            self.pool.submit(Task::new(
                TaskId::new(url_index, chunk),
                url,
                remote.clone(),
                range,
                ranged,
                handle,
            ));
        }

        info!(
            url,
            path = %path.display(),
            bytes = plan.content_length,
            chunks = plan.chunk_count,
            "Queued download"
        );
        Ok(plan)
    }

    /// Dispatch every URL in order, then wait for all chunks to finish.
    pub fn run<I, S>(self, urls: I) -> DispatchReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut reports = Vec::new();

        for (index, url) in urls.into_iter().enumerate() {
            let url = url.into();
            let outcome = self.dispatch(index, &url);
            match &outcome {
                Ok(_) => {}
                Err(e @ DispatchError::Plan(_)) => warn!(url = %url, "Skipping URL: {}", e),
                Err(e) => error!(url = %url, "{}", e),
            }
            reports.push(UrlReport { url, outcome });
        }

        let pool = self.pool.shutdown();
        DispatchReport {
            urls: reports,
            pool,
        }
    }
}
