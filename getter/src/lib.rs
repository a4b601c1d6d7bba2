//! Getter - parallel chunked HTTP downloader
//!
//! Each URL is inspected with a HEAD request, split into byte ranges sized for
//! the worker pool, and fetched over plain HTTP/1.0 by a fixed set of worker
//! threads. Every chunk is written straight to its offset in the output file.
//!
//! ```no_run
//! use getter::config::DownloaderConfig;
//! use getter::dispatcher::Dispatcher;
//!
//! let config = DownloaderConfig::new()
//!     .with_workers(4)
//!     .with_output_dir("downloads");
//! let dispatcher = Dispatcher::new(&config)?;
//! let report = dispatcher.run(vec!["example.com/file.bin"]);
//! println!("{}", report);
//! # Ok::<(), getter::pool::PoolError>(())
//! ```

pub mod config;
pub mod dispatcher;
pub mod http;
pub mod logging;
pub mod output;
pub mod planner;
pub mod pool;
pub mod queue;
pub mod task;
pub mod urls;
pub mod worker;

pub use config::{ConfigError, ConfigFile, DownloaderConfig};
pub use dispatcher::{DispatchError, DispatchReport, Dispatcher, UrlReport};
pub use planner::{ChunkPlan, PlanError, Planner, MAX_CHUNK_BYTES};
pub use pool::{PoolError, PoolSummary, TaskHandler, WorkerPool};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
