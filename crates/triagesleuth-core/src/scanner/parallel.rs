/// Parallel traversal — the root's children are fanned out to a rayon pool.
///
/// Each top-level child gets its own [`Walker`] with private records,
/// statistics and skip list. Outcomes are collected in sibling order and
/// concatenated, so records come out exactly as a sequential walk would
/// produce them and the merged statistics equal the sequential ones.
///
/// Only the record budget and the cancel flag are shared between workers.
/// When `max_records` truncates a parallel run, which records made the cut
/// depends on scheduling.
use super::traversal::{PendingChild, RunShared, WalkOutcome, Walker};
use crate::domain::Analyzer;
use crate::error::{Result, TriageError};
use crate::model::BoxedNode;
use rayon::prelude::*;
use tracing::{debug, info};

/// Walk `root` with up to `workers` threads.
pub fn walk_parallel(
    analyzer: &dyn Analyzer,
    shared: &RunShared,
    root: BoxedNode,
    workers: usize,
) -> Result<WalkOutcome> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("triagesleuth-worker-{i}"))
        .build()
        .map_err(|err| TriageError::Worker {
            details: format!("failed to build worker pool: {err}"),
        })?;

    let mut head = Walker::new(analyzer, shared);
    let Some(mut root_frame) = head.open_root(root) else {
        return Ok(head.finish());
    };

    let pending: Vec<PendingChild> = root_frame.take_pending();
    let parent_path = root_frame.path().to_string();
    let parent_depth = root_frame.depth();
    let root_id = root_frame.id();
    info!(
        "Walking {} top-level entries on {} workers",
        pending.len(),
        pool.current_num_threads()
    );

    let parts: Vec<WalkOutcome> = pool.install(|| {
        pending
            .into_par_iter()
            .map(|item| {
                let mut walker = Walker::below(analyzer, shared, root_id);
                walker.visit_child(item, &parent_path, parent_depth);
                walker.finish()
            })
            .collect()
    });
    debug!("Merging {} subtree outcomes", parts.len());

    let mut outcome = head.finish();
    for part in parts {
        outcome.append(part);
    }
    Ok(outcome)
}
