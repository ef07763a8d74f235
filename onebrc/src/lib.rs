//! Chunked parallel aggregation of `key;value` files.
//!
//! The input is split into record-aligned byte ranges ([`plan`]), each range
//! is scanned ([`RecordScanner`]) and folded into a private [`AggregateMap`]
//! on its own blocking task, and the partial maps are merged pairwise
//! ([`tree_merge`]). [`format`] renders the result as sorted
//! `key:min;mean;max` lines.
//!
//! ```no_run
//! # async fn run() -> onebrc::Result<()> {
//! let config = onebrc::EngineConfig::default();
//! let map = onebrc::aggregate_file("measurements.txt", &config).await?;
//! for line in onebrc::format(map) {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod format;
pub mod planner;
pub mod reduce;
pub mod scanner;
pub mod source;
pub mod stats;

pub use aggregate::{aggregate, aggregate_chunk, AggregateMap};
pub use config::{EngineConfig, LoadMode, MalformedPolicy, MergeStrategy};
pub use engine::{aggregate_file, aggregate_input};
pub use error::{Error, MalformedKind, Result};
pub use format::{format, summarize, write_summaries, Hundredths, OutputStyle, Summary};
pub use planner::{plan, ByteRange};
pub use reduce::{merge, tree_merge};
pub use scanner::{Record, RecordScanner};
pub use source::Source;
pub use stats::Stats;
