/// Triage progress reporting — lightweight messages sent from the run
/// thread to whoever is watching, via a crossbeam channel.
use crate::report::SkipKind;
use std::time::Duration;

/// Progress updates sent from the run thread.
///
/// Full statistics live in the handle's shared snapshot; these messages
/// carry only counters and status.
#[derive(Debug, Clone)]
pub enum TriageProgress {
    /// Periodic update with running totals.
    Update {
        records_emitted: u64,
        anomalies: u64,
        skipped: u64,
        current_path: String,
    },
    /// A node or subtree was skipped. The run continues.
    Skipped {
        path: String,
        kind: SkipKind,
        message: String,
    },
    /// The run finished. `truncated` is set when `max_records` stopped it.
    Complete {
        duration: Duration,
        records: u64,
        skipped: u64,
        truncated: bool,
    },
    /// The run was cancelled through its handle.
    Cancelled,
}
