//! Orchestration: plan, fan out one blocking task per chunk, fan in.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::aggregate::{aggregate_chunk, AggregateMap};
use crate::config::{EngineConfig, MergeStrategy};
use crate::error::{Error, Result};
use crate::planner::plan;
use crate::reduce::{merge, tree_merge};
use crate::source::Source;

/// Aggregates an in-memory input.
///
/// Workers share `input` read-only and each builds a private map. If any
/// chunk holds a malformed record the whole call fails with the one at the
/// lowest byte offset; no partial result is returned.
pub async fn aggregate_input<S>(input: Arc<S>, config: &EngineConfig) -> Result<AggregateMap>
where
    S: AsRef<[u8]> + Send + Sync + 'static + ?Sized,
{
    config.validate()?;
    let started = Instant::now();

    let bytes = (*input).as_ref();
    let ranges = plan(bytes, config.worker_count, config.terminator);
    info!(
        bytes = bytes.len(),
        chunks = ranges.len(),
        workers = config.worker_count,
        "Starting aggregation"
    );

    let mut tasks = JoinSet::new();
    for (index, range) in ranges.iter().copied().enumerate() {
        debug!(chunk = index, start = range.start, end = range.end, "Planned chunk");
        let input = Arc::clone(&input);
        let config = *config;
        tasks.spawn_blocking(move || (index, aggregate_chunk((*input).as_ref(), range, &config)));
    }

    let mut partials = Vec::with_capacity(ranges.len());
    let mut failure: Option<Error> = None;
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined?;
        match result {
            Ok(map) => partials.push((index, map)),
            Err(err) => failure = Some(earliest(failure, err)),
        }
    }
    if let Some(err) = failure {
        return Err(err);
    }

    partials.sort_unstable_by_key(|(index, _)| *index);
    let maps: Vec<AggregateMap> = partials.into_iter().map(|(_, map)| map).collect();

    let merged = match config.merge {
        MergeStrategy::Tree => tree_merge(maps).await?,
        MergeStrategy::Sequential => merge(maps),
    };

    info!(
        keys = merged.len(),
        skipped = merged.skipped(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Aggregation finished"
    );
    Ok(merged)
}

/// Opens `path` per [`EngineConfig::load`] and aggregates it. The mapping is
/// released when the last worker lets go of it, on success and failure alike.
pub async fn aggregate_file(path: impl AsRef<Path>, config: &EngineConfig) -> Result<AggregateMap> {
    config.validate()?;
    let source = Source::open(path, config.load)?;
    aggregate_input(Arc::new(source), config).await
}

/// Keeps whichever error points at the lower byte offset.
fn earliest(current: Option<Error>, candidate: Error) -> Error {
    match current {
        Some(current) if rank(&current) <= rank(&candidate) => current,
        _ => candidate,
    }
}

fn rank(err: &Error) -> usize {
    err.offset().unwrap_or(usize::MAX)
}
