/// Scanner module — runs a triage over one tree.
///
/// - [`traversal`] — the depth-first engine shared by every domain.
/// - [`parallel`] — rayon fan-out of the root's children.
/// - [`progress`] — messages sent to whoever watches a background run.
///
/// [`run_triage`] is the synchronous entry point. [`start_triage`] runs the
/// same pipeline on a background thread and hands back a [`TriageHandle`]
/// with a progress channel, a live statistics snapshot and cancellation.
pub mod parallel;
pub mod progress;
pub mod traversal;

use crate::analysis::Statistics;
use crate::config::TriageConfig;
use crate::domain::analyzer_for;
use crate::error::{Result, TriageError};
use crate::model::BoxedNode;
use crate::report::{RunStatus, TriageReport};
use crate::source;
use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use progress::TriageProgress;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::info;
use traversal::{CancelToken, Limits, RunShared, Walker};

/// Statistics readable while a run is still going.
///
/// Walkers fold their counters in every few hundred records under a brief
/// write lock.
pub type LiveStats = Arc<RwLock<Statistics>>;

/// Maximum number of progress messages that may queue up in the channel.
///
/// Messages are sent with `try_send`: when the consumer falls behind,
/// updates are dropped instead of stalling the traversal.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Optional observers of a run.
#[derive(Clone, Default)]
pub struct RunHooks {
    pub cancel: CancelToken,
    pub progress: Option<Sender<TriageProgress>>,
    pub live: Option<LiveStats>,
}

/// Triage an already-opened tree.
///
/// `now` is the evaluation instant for every time-relative rule, fixed
/// once per run.
pub fn triage_tree(
    root: BoxedNode,
    cfg: &TriageConfig,
    now: DateTime<Utc>,
    hooks: RunHooks,
) -> Result<TriageReport> {
    let start = Instant::now();
    let analyzer = analyzer_for(cfg, now);
    let limits = Limits {
        max_depth: cfg.run.max_depth,
        max_records: cfg.run.max_records,
    };
    let shared = RunShared::new(limits, hooks.cancel, hooks.progress, hooks.live);

    let parallel = cfg.run.parallel && !analyzer.needs_running_totals();
    if cfg.run.parallel && !parallel {
        info!(
            "{} analyzer keeps running totals; walking sequentially",
            analyzer.domain().label()
        );
    }

    let outcome = if parallel {
        parallel::walk_parallel(analyzer.as_ref(), &shared, root, cfg.effective_parallelism())?
    } else {
        Walker::new(analyzer.as_ref(), &shared).walk(root)
    };

    let status = shared.status();
    let duration = start.elapsed();
    info!(
        "Triage {:?}: {} records, {} anomalies, {} skipped in {:.2?}",
        status,
        outcome.records.len(),
        outcome.statistics.anomalies,
        outcome.skipped.len(),
        duration
    );

    shared.send(match status {
        RunStatus::Cancelled => TriageProgress::Cancelled,
        RunStatus::Completed | RunStatus::Truncated { .. } => TriageProgress::Complete {
            duration,
            records: outcome.records.len() as u64,
            skipped: outcome.skipped.len() as u64,
            truncated: matches!(status, RunStatus::Truncated { .. }),
        },
    });

    Ok(TriageReport {
        domain: analyzer.domain(),
        records: outcome.records,
        statistics: outcome.statistics,
        skipped: outcome.skipped,
        status,
        duration,
    })
}

/// Open the configured root and triage it on the calling thread.
pub fn run_triage(cfg: &TriageConfig) -> Result<TriageReport> {
    run_with_hooks(cfg, RunHooks::default())
}

fn run_with_hooks(cfg: &TriageConfig, hooks: RunHooks) -> Result<TriageReport> {
    info!(
        "Starting {} triage of {}",
        cfg.run.domain.label(),
        cfg.run.root.display()
    );
    let root = source::open_tree(cfg)?;
    triage_tree(root, cfg, Utc::now(), hooks)
}

/// Handle to a running or completed background triage.
pub struct TriageHandle {
    /// Receiver for progress updates from the run thread.
    pub progress_rx: Receiver<TriageProgress>,
    /// Statistics accumulated so far.
    pub live_stats: LiveStats,
    cancel: CancelToken,
    thread: thread::JoinHandle<Result<TriageReport>>,
}

impl TriageHandle {
    /// Request the run to stop as soon as possible.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the run and take its report.
    pub fn join(self) -> Result<TriageReport> {
        self.thread.join().map_err(|_| TriageError::Worker {
            details: "triage thread panicked".into(),
        })?
    }
}

/// Start a triage on a background thread.
pub fn start_triage(cfg: TriageConfig) -> Result<TriageHandle> {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<TriageProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel = CancelToken::new();
    let live_stats: LiveStats = Arc::new(RwLock::new(Statistics::new()));

    let hooks = RunHooks {
        cancel: cancel.clone(),
        progress: Some(progress_tx),
        live: Some(live_stats.clone()),
    };

    let thread = thread::Builder::new()
        .name("triagesleuth-triage".into())
        .spawn(move || run_with_hooks(&cfg, hooks))
        .map_err(|err| TriageError::Worker {
            details: format!("failed to spawn triage thread: {err}"),
        })?;

    Ok(TriageHandle {
        progress_rx,
        live_stats,
        cancel,
        thread,
    })
}
