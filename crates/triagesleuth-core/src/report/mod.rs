/// Run results handed to record sinks.
///
/// A [`TriageReport`] is always produced once the tree was opened: it holds
/// whatever records were extracted, the statistics, every skipped subtree
/// and the reason the run ended.
pub mod sink;

use crate::analysis::{Statistics, StatisticsSnapshot};
use crate::config::Domain;
use crate::model::TriageRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use sink::{
    read_artifact_csv, read_artifacts_json, write_csv, write_json, write_statistics_csv,
    CsvFileSink, JsonFileSink, RecordSink,
};

/// Why a node or subtree was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    /// Leaf content could not be read; the node was not emitted.
    ContentUnavailable,
    /// Child listing failed; the subtree was abandoned.
    SubtreeAccess,
    /// A child entry could not be decoded.
    CorruptEntry,
    /// The node repeats an ancestor.
    Cycle,
    /// The node was emitted but its children lie beyond `max_depth`.
    DepthLimit,
}

impl SkipKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::ContentUnavailable => "content unavailable",
            Self::SubtreeAccess => "subtree inaccessible",
            Self::CorruptEntry => "corrupt entry",
            Self::Cycle => "cycle",
            Self::DepthLimit => "depth limit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSubtree {
    pub path: String,
    pub kind: SkipKind,
    pub message: String,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
    /// `max_records` was reached; the rest of the tree was not visited.
    Truncated { limit: usize },
}

#[derive(Debug, Clone)]
pub struct TriageReport {
    pub domain: Domain,
    pub records: Vec<TriageRecord>,
    pub statistics: Statistics,
    pub skipped: Vec<SkippedSubtree>,
    pub status: RunStatus,
    pub duration: Duration,
}

impl TriageReport {
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &TriageRecord> {
        self.records.iter().filter(|r| !r.findings().is_empty())
    }

    pub fn skipped_of(&self, kind: SkipKind) -> impl Iterator<Item = &SkippedSubtree> {
        self.skipped.iter().filter(move |s| s.kind == kind)
    }

    /// Serializable form with the statistics reduced to `top_n` paths.
    pub fn document(&self, top_n: usize) -> ReportDocument<'_> {
        ReportDocument {
            domain: self.domain,
            status: self.status,
            duration_ms: u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
            records: &self.records,
            statistics: self.statistics.snapshot(top_n),
            skipped: &self.skipped,
        }
    }
}

/// JSON shape of a report.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub domain: Domain,
    pub status: RunStatus,
    pub duration_ms: u64,
    pub records: &'a [TriageRecord],
    pub statistics: StatisticsSnapshot,
    pub skipped: &'a [SkippedSubtree],
}
