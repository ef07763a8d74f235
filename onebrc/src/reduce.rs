//! Fan-in of per-chunk maps.

use tokio::task::JoinSet;
use tracing::trace;

use crate::aggregate::AggregateMap;
use crate::error::Result;

/// Folds all maps into one on the calling thread.
pub fn merge<I>(maps: I) -> AggregateMap
where
    I: IntoIterator<Item = AggregateMap>,
{
    maps.into_iter().fold(AggregateMap::new(), AggregateMap::merge)
}

/// Pairwise reduction: each round merges disjoint pairs on blocking tasks
/// until one map is left. No map is ever touched by two tasks.
pub async fn tree_merge(mut maps: Vec<AggregateMap>) -> Result<AggregateMap> {
    let mut round = 0;
    while maps.len() > 1 {
        round += 1;
        trace!(round, maps = maps.len(), "Merge round");

        let mut tasks = JoinSet::new();
        let mut next = Vec::with_capacity(maps.len() / 2 + 1);
        let mut drained = maps.into_iter();
        while let Some(left) = drained.next() {
            match drained.next() {
                Some(right) => {
                    tasks.spawn_blocking(move || left.merge(right));
                }
                None => next.push(left),
            }
        }

        while let Some(merged) = tasks.join_next().await {
            next.push(merged?);
        }
        maps = next;
    }

    Ok(maps.pop().unwrap_or_default())
}
